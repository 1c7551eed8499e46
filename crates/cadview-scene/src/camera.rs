use cadview_math::{Matrix4, Vec3};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Scene;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Projection {
    /// Vertical field of view in radians.
    Perspective { fov_y: f64 },
    /// Height of the view volume in eye-space units.
    Orthographic { height: f64 },
}

/// Camera operations the viewport controller drives.
pub trait Camera {
    fn projection(&self) -> Projection;
    fn z_near(&self) -> f64;
    fn z_far(&self) -> f64;
    fn aspect_ratio(&self) -> f64;
    fn set_aspect_ratio(&mut self, width: i32, height: i32);
    fn scale_factor(&self) -> f64;
    fn scale(&mut self, factor: f64);
    fn rotate(&mut self, rotation: &Matrix4);
    fn translate(&mut self, offset: Vec3);
    /// Makes the eye-space `point` the new center of rotation. With
    /// `preserve_view` false the camera also moves so the point lies on
    /// the line of sight.
    fn set_center(&mut self, point: Vec3, preserve_view: bool) -> bool;
    fn view_all(&mut self, scene: &dyn Scene) -> bool;
    fn modelview_matrix(&self) -> Matrix4;

    fn projection_matrix(&self) -> Matrix4 {
        let aspect = self.aspect_ratio();
        match self.projection() {
            Projection::Perspective { fov_y } => {
                Matrix4::perspective(fov_y, aspect, self.z_near(), self.z_far())
            }
            Projection::Orthographic { height } => {
                let top = height * 0.5;
                let right = top * aspect;
                Matrix4::orthographic(-right, right, -top, top, self.z_near(), self.z_far())
            }
        }
    }

    /// Horizontal field of view in radians; `None` for orthographic cameras.
    fn fov_x(&self) -> Option<f64> {
        match self.projection() {
            Projection::Perspective { fov_y } => {
                Some(2.0 * ((fov_y * 0.5).tan() * self.aspect_ratio()).atan())
            }
            Projection::Orthographic { .. } => None,
        }
    }
}

/// Examiner-style camera: the world is scaled and rotated about `center`,
/// then placed at `position` in eye space.
#[derive(Clone, Debug, PartialEq)]
pub struct SceneCamera {
    projection: Projection,
    aspect: f64,
    z_near: f64,
    z_far: f64,
    scale: f64,
    rotation: Matrix4,
    center: Vec3,
    position: Vec3,
}

impl Default for SceneCamera {
    fn default() -> Self {
        Self::perspective(45f64.to_radians())
    }
}

impl SceneCamera {
    pub fn perspective(fov_y: f64) -> Self {
        Self::with_projection(Projection::Perspective { fov_y })
    }

    pub fn orthographic(height: f64) -> Self {
        Self::with_projection(Projection::Orthographic { height })
    }

    fn with_projection(projection: Projection) -> Self {
        Self {
            projection,
            aspect: 1.0,
            z_near: 0.1,
            z_far: 1000.0,
            scale: 1.0,
            rotation: Matrix4::IDENTITY,
            center: Vec3::ZERO,
            position: Vec3::new(0.0, 0.0, -10.0),
        }
    }

    pub fn set_clipping(&mut self, z_near: f64, z_far: f64) {
        if z_near > 0.0 && z_far > z_near {
            self.z_near = z_near;
            self.z_far = z_far;
        }
    }

    pub fn center(&self) -> Vec3 {
        self.center
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    pub fn rotation(&self) -> &Matrix4 {
        &self.rotation
    }
}

impl Camera for SceneCamera {
    fn projection(&self) -> Projection {
        self.projection
    }

    fn z_near(&self) -> f64 {
        self.z_near
    }

    fn z_far(&self) -> f64 {
        self.z_far
    }

    fn aspect_ratio(&self) -> f64 {
        self.aspect
    }

    fn set_aspect_ratio(&mut self, width: i32, height: i32) {
        if width > 0 && height > 0 {
            self.aspect = f64::from(width) / f64::from(height);
        }
    }

    fn scale_factor(&self) -> f64 {
        self.scale
    }

    fn scale(&mut self, factor: f64) {
        if !factor.is_finite() || factor <= 0.0 {
            debug!(factor, "ignoring non-positive scale factor");
            return;
        }
        self.scale *= factor;
    }

    fn rotate(&mut self, rotation: &Matrix4) {
        self.rotation.mult_left(rotation);
    }

    fn translate(&mut self, offset: Vec3) {
        self.position += offset;
    }

    fn set_center(&mut self, point: Vec3, preserve_view: bool) -> bool {
        let Some(inverse) = self.modelview_matrix().inverse() else {
            return false;
        };
        self.center = inverse.transform_point(point);
        self.position = if preserve_view {
            point
        } else {
            Vec3::new(0.0, 0.0, point.z)
        };
        true
    }

    fn view_all(&mut self, scene: &dyn Scene) -> bool {
        let Some(bounds) = scene.bounding_box() else {
            return false;
        };
        let radius = bounds.radius().max(1.0e-6);
        let distance = match &mut self.projection {
            Projection::Perspective { fov_y } => radius / (*fov_y * 0.5).sin(),
            Projection::Orthographic { height } => {
                *height = radius * 2.0;
                radius * 2.0
            }
        };
        self.center = bounds.center();
        self.scale = 1.0;
        self.position = Vec3::new(0.0, 0.0, -distance);
        self.z_far = self.z_far.max(distance + radius * 2.0);
        debug!(radius, distance, "camera framed scene");
        true
    }

    fn modelview_matrix(&self) -> Matrix4 {
        let mut m = Matrix4::translation(self.position);
        m.mult_right(&self.rotation);
        m.scale(Vec3::splat(self.scale));
        m.translate(-self.center);
        m
    }
}
