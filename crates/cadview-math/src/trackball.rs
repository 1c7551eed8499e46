use crate::matrix::Matrix4;
use crate::quaternion::Quaternion;
use crate::vector::{Vec2, Vec3};

pub const DEFAULT_TRACKBALL_RADIUS: f64 = 0.8;

/// Virtual trackball: a sphere blended into a hyperbolic sheet so points far
/// from the center still produce smooth rotations.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Trackball {
    radius: f64,
}

impl Default for Trackball {
    fn default() -> Self {
        Self::new(DEFAULT_TRACKBALL_RADIUS)
    }
}

impl Trackball {
    pub fn new(radius: f64) -> Self {
        Self { radius }
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }

    /// Lifts a normalized window point in [-1, 1]² onto the trackball surface.
    pub fn project(&self, point: Vec2) -> Vec3 {
        let d = point.length();
        let z = if d < self.radius * std::f64::consts::FRAC_1_SQRT_2 {
            (self.radius * self.radius - d * d).sqrt()
        } else {
            let t = self.radius * std::f64::consts::FRAC_1_SQRT_2;
            t * t / d
        };
        point.extend(z)
    }

    pub fn rotation(&self, from: Vec2, to: Vec2) -> Quaternion {
        if from == to {
            return Quaternion::IDENTITY;
        }
        let p1 = self.project(from);
        let p2 = self.project(to);
        let axis = p1.cross(p2);
        let t = ((p1 - p2).length() / (2.0 * self.radius)).clamp(-1.0, 1.0);
        let phi = 2.0 * t.asin();
        Quaternion::from_axis_angle(axis, phi)
    }

    pub fn rotation_matrix(&self, from: Vec2, to: Vec2) -> Matrix4 {
        self.rotation(from, to).to_matrix()
    }
}
