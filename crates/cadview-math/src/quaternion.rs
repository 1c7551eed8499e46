use serde::{Deserialize, Serialize};

use crate::matrix::Matrix4;
use crate::vector::Vec3;

/// Rotation quaternion `(x, y, z)` vector part, `w` scalar part.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Quaternion {
    pub const IDENTITY: Self = Self::new(0.0, 0.0, 0.0, 1.0);

    pub const fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// A zero axis gives the identity.
    pub fn from_axis_angle(axis: Vec3, radians: f64) -> Self {
        let axis = axis.normalized();
        if axis.is_zero() {
            return Self::IDENTITY;
        }
        let half = radians * 0.5;
        let v = axis * half.sin();
        Self::new(v.x, v.y, v.z, half.cos())
    }

    pub fn vector(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    pub fn length(self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }

    pub fn normalized(self) -> Self {
        let len = self.length();
        if len <= f64::EPSILON {
            return Self::IDENTITY;
        }
        Self::new(self.x / len, self.y / len, self.z / len, self.w / len)
    }

    pub fn conjugate(self) -> Self {
        Self::new(-self.x, -self.y, -self.z, self.w)
    }

    /// Rotation angle in radians and unit axis. Identity reports angle 0 about +Z.
    pub fn axis_angle(self) -> (Vec3, f64) {
        let q = self.normalized();
        let sin_half = q.vector().length();
        if sin_half <= f64::EPSILON {
            return (Vec3::Z, 0.0);
        }
        let angle = 2.0 * sin_half.atan2(q.w);
        (q.vector() / sin_half, angle)
    }

    pub fn rotate(self, v: Vec3) -> Vec3 {
        let u = self.vector();
        let t = u.cross(v) * 2.0;
        v + t * self.w + u.cross(t)
    }

    pub fn to_matrix(self) -> Matrix4 {
        let (x, y, z, w) = (self.x, self.y, self.z, self.w);
        let (x2, y2, z2) = (x + x, y + y, z + z);
        let (xx, yy, zz) = (x * x2, y * y2, z * z2);
        let (xy, xz, yz) = (x * y2, x * z2, y * z2);
        let (wx, wy, wz) = (w * x2, w * y2, w * z2);
        Matrix4::from_column_major([
            1.0 - yy - zz,
            xy + wz,
            xz - wy,
            0.0,
            xy - wz,
            1.0 - xx - zz,
            yz + wx,
            0.0,
            xz + wy,
            yz - wx,
            1.0 - xx - yy,
            0.0,
            0.0,
            0.0,
            0.0,
            1.0,
        ])
    }
}

impl From<Quaternion> for Matrix4 {
    fn from(q: Quaternion) -> Self {
        q.to_matrix()
    }
}

impl std::ops::Mul for Quaternion {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let a = self.vector();
        let b = rhs.vector();
        let v = b * self.w + a * rhs.w + a.cross(b);
        Self::new(v.x, v.y, v.z, self.w * rhs.w - a.dot(b))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn from_cg(m: cgmath::Matrix4<f64>) -> Matrix4 {
        Matrix4::from_column_major([
            m.x.x, m.x.y, m.x.z, m.x.w, m.y.x, m.y.y, m.y.z, m.y.w, m.z.x, m.z.y, m.z.z, m.z.w,
            m.w.x, m.w.y, m.w.z, m.w.w,
        ])
    }

    #[test]
    fn matrix_matches_cgmath_expansion() {
        let q = Quaternion::from_axis_angle(Vec3::new(1.0, 2.0, -0.5), 0.9);
        let theirs = cgmath::Matrix4::from(cgmath::Quaternion::new(q.w, q.x, q.y, q.z));
        assert!(q.to_matrix().approx_eq(&from_cg(theirs), 1.0e-12));
    }

    #[test]
    fn matrix_agrees_with_axis_angle_rotation() {
        let axis = Vec3::new(0.0, 1.0, 1.0);
        let q = Quaternion::from_axis_angle(axis, 0.4);
        assert!(q.to_matrix().approx_eq(&Matrix4::rotation(0.4, axis), 1.0e-12));
    }

    #[test]
    fn rotate_vector_quarter_turn() {
        let q = Quaternion::from_axis_angle(Vec3::Z, std::f64::consts::FRAC_PI_2);
        assert!(q.rotate(Vec3::X).approx_eq(Vec3::Y, 1.0e-12));
        let m = Matrix4::from(q);
        assert!(m.transform_vector(Vec3::X).approx_eq(Vec3::Y, 1.0e-12));
    }

    #[test]
    fn axis_angle_round_trip() {
        let q = Quaternion::from_axis_angle(Vec3::new(0.0, 3.0, 0.0), 1.2);
        let (axis, angle) = q.axis_angle();
        assert!(axis.approx_eq(Vec3::Y, 1.0e-12));
        assert_relative_eq!(angle, 1.2, epsilon = 1.0e-12);
        assert_eq!(Quaternion::IDENTITY.axis_angle().1, 0.0);
    }

    #[test]
    fn composition_adds_angles() {
        let a = Quaternion::from_axis_angle(Vec3::X, 0.3);
        let b = Quaternion::from_axis_angle(Vec3::X, 0.5);
        let (_, angle) = (a * b).axis_angle();
        assert_relative_eq!(angle, 0.8, epsilon = 1.0e-12);
        assert!((a * a.conjugate()).to_matrix().is_identity(1.0e-12));
    }

    #[test]
    fn zero_axis_is_identity() {
        assert_eq!(Quaternion::from_axis_angle(Vec3::ZERO, 1.0), Quaternion::IDENTITY);
    }
}
