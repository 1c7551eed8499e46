use serde::{Deserialize, Serialize};

use crate::matrix::Matrix4;
use crate::ray::Ray;
use crate::vector::{Vec2, Vec3, Vec4};

/// Pixel rectangle in window coordinates, origin at the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub const fn sized(width: i32, height: i32) -> Self {
        Self::new(0, 0, width, height)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn aspect_ratio(&self) -> Option<f64> {
        (!self.is_empty()).then(|| f64::from(self.width) / f64::from(self.height))
    }

    /// Maps a window pixel to [-1, 1]² with +Y up, as the trackball expects.
    pub fn normalized_point(&self, x: i32, y: i32) -> Option<Vec2> {
        if self.is_empty() {
            return None;
        }
        let w = f64::from(self.width);
        let h = f64::from(self.height);
        Some(Vec2::new(
            (2.0 * f64::from(x) - w) / w,
            (h - 2.0 * f64::from(y)) / h,
        ))
    }
}

/// Eye-space ray through pixel `(x, y)` for a perspective camera.
///
/// The pixel is placed on a window plane at the depth where the viewport
/// height subtends `fov_y`; the ray starts where that line of sight crosses
/// the near plane.
pub fn perspective_ray(x: i32, y: i32, viewport: &Viewport, fov_y: f64, z_near: f64) -> Option<Ray> {
    if viewport.is_empty() {
        return None;
    }
    let px = f64::from(x) - f64::from(viewport.width / 2);
    let py = f64::from(viewport.height / 2) - f64::from(y);
    let tan = (fov_y * 0.5).tan();
    if !tan.is_finite() || tan <= 0.0 {
        return None;
    }
    let z = f64::from(viewport.height / 2) / tan;
    if z <= 0.0 {
        return None;
    }
    let on_window = Vec3::new(px, py, -z);
    let origin = Vec3::new(z_near * px / z, z_near * py / z, -z_near);
    Ray::new(origin, on_window)
}

/// Eye-space ray for an orthographic camera whose view volume is `view_height` tall.
pub fn orthographic_ray(
    x: i32,
    y: i32,
    viewport: &Viewport,
    view_height: f64,
    z_near: f64,
) -> Option<Ray> {
    if viewport.is_empty() || view_height <= 0.0 {
        return None;
    }
    let scale = view_height / f64::from(viewport.height);
    let px = f64::from(x) - f64::from(viewport.width) * 0.5;
    let py = f64::from(viewport.height) * 0.5 - f64::from(y);
    Ray::new(Vec3::new(px * scale, py * scale, -z_near), -Vec3::Z)
}

/// Inverse of the projection pipeline for a window point with depth `win_z` in [0, 1].
///
/// `win_y` is measured from the top of the window.
pub fn unproject(
    win_x: f64,
    win_y: f64,
    win_z: f64,
    modelview: &Matrix4,
    projection: &Matrix4,
    viewport: &Viewport,
) -> Option<Vec3> {
    if viewport.is_empty() {
        return None;
    }
    let inverse = (*projection * *modelview).inverse()?;
    let w = f64::from(viewport.width);
    let h = f64::from(viewport.height);
    let flipped_y = h - win_y - 1.0;
    let ndc = Vec4::new(
        2.0 * (win_x - f64::from(viewport.x)) / w - 1.0,
        2.0 * (flipped_y - f64::from(viewport.y)) / h - 1.0,
        2.0 * win_z - 1.0,
        1.0,
    );
    (inverse * ndc).project()
}

/// Ray from the near-plane to the far-plane unprojection of pixel `(x, y)`.
pub fn unprojected_ray(
    x: i32,
    y: i32,
    modelview: &Matrix4,
    projection: &Matrix4,
    viewport: &Viewport,
) -> Option<Ray> {
    let (wx, wy) = (f64::from(x), f64::from(y));
    let near = unproject(wx, wy, 0.0, modelview, projection, viewport)?;
    let far = unproject(wx, wy, 1.0, modelview, projection, viewport)?;
    Ray::through(near, far)
}
