use serde::{Deserialize, Serialize};

use crate::vector::{Vec3, Vec4};

/// 4x4 matrix stored column-major; translation lives in elements 12, 13 and 14.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix4 {
    m: [f64; 16],
}

impl Default for Matrix4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Matrix4 {
    pub const IDENTITY: Self = Self {
        m: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    pub const ZERO: Self = Self { m: [0.0; 16] };

    pub const fn from_column_major(m: [f64; 16]) -> Self {
        Self { m }
    }

    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut out = Self::ZERO;
        for (r, row) in rows.iter().enumerate() {
            for (c, value) in row.iter().enumerate() {
                out.set(r, c, *value);
            }
        }
        out
    }

    pub fn as_column_major(&self) -> &[f64; 16] {
        &self.m
    }

    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.m[col * 4 + row]
    }

    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.m[col * 4 + row] = value;
    }

    pub fn column(&self, col: usize) -> Vec4 {
        Vec4::new(
            self.m[col * 4],
            self.m[col * 4 + 1],
            self.m[col * 4 + 2],
            self.m[col * 4 + 3],
        )
    }

    pub fn row(&self, row: usize) -> Vec4 {
        Vec4::new(
            self.get(row, 0),
            self.get(row, 1),
            self.get(row, 2),
            self.get(row, 3),
        )
    }

    pub fn translation_part(&self) -> Vec3 {
        Vec3::new(self.m[12], self.m[13], self.m[14])
    }

    pub fn translation(offset: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[12] = offset.x;
        out.m[13] = offset.y;
        out.m[14] = offset.z;
        out
    }

    pub fn scaling(factors: Vec3) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0] = factors.x;
        out.m[5] = factors.y;
        out.m[10] = factors.z;
        out
    }

    /// Rotation from a precomputed cosine/sine pair about a unit axis.
    pub fn rotation_cos_sin(cos: f64, sin: f64, axis: Vec3) -> Self {
        let (x, y, z) = (axis.x, axis.y, axis.z);
        let t = 1.0 - cos;
        Self {
            m: [
                x * x + (1.0 - x * x) * cos,
                x * y * t + z * sin,
                x * z * t - y * sin,
                0.0,
                y * x * t - z * sin,
                y * y + (1.0 - y * y) * cos,
                y * z * t + x * sin,
                0.0,
                z * x * t + y * sin,
                z * y * t - x * sin,
                z * z + (1.0 - z * z) * cos,
                0.0,
                0.0,
                0.0,
                0.0,
                1.0,
            ],
        }
    }

    /// Right-handed rotation of `radians` about `axis`. A zero axis yields identity.
    pub fn rotation(radians: f64, axis: Vec3) -> Self {
        let axis = axis.normalized();
        if axis.is_zero() {
            return Self::IDENTITY;
        }
        Self::rotation_cos_sin(radians.cos(), radians.sin(), axis)
    }

    pub fn look_at(eye: Vec3, center: Vec3, up: Vec3) -> Self {
        let f = (center - eye).normalized();
        let s = f.cross(up).normalized();
        let u = s.cross(f);
        Self::from_rows([
            [s.x, s.y, s.z, -s.dot(eye)],
            [u.x, u.y, u.z, -u.dot(eye)],
            [-f.x, -f.y, -f.z, f.dot(eye)],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn frustum(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let mut out = Self::ZERO;
        out.m[0] = 2.0 * near / (right - left);
        out.m[5] = 2.0 * near / (top - bottom);
        out.m[8] = (right + left) / (right - left);
        out.m[9] = (top + bottom) / (top - bottom);
        out.m[10] = -(far + near) / (far - near);
        out.m[11] = -1.0;
        out.m[14] = -2.0 * far * near / (far - near);
        out
    }

    /// Symmetric frustum from a vertical field of view in radians.
    pub fn perspective(fov_y: f64, aspect: f64, near: f64, far: f64) -> Self {
        let ymax = near * (fov_y * 0.5).tan();
        let xmax = ymax * aspect;
        Self::frustum(-xmax, xmax, -ymax, ymax, near, far)
    }

    pub fn orthographic(left: f64, right: f64, bottom: f64, top: f64, near: f64, far: f64) -> Self {
        let mut out = Self::IDENTITY;
        out.m[0] = 2.0 / (right - left);
        out.m[5] = 2.0 / (top - bottom);
        out.m[10] = -2.0 / (far - near);
        out.m[12] = -(right + left) / (right - left);
        out.m[13] = -(top + bottom) / (top - bottom);
        out.m[14] = -(far + near) / (far - near);
        out
    }

    /// `self = self * other`
    pub fn mult_right(&mut self, other: &Self) {
        *self = *self * *other;
    }

    /// `self = other * self`
    pub fn mult_left(&mut self, other: &Self) {
        *self = *other * *self;
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.mult_right(&Self::translation(offset));
    }

    pub fn scale(&mut self, factors: Vec3) {
        self.mult_right(&Self::scaling(factors));
    }

    pub fn rotate(&mut self, radians: f64, axis: Vec3) {
        self.mult_right(&Self::rotation(radians, axis));
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    pub fn determinant(&self) -> f64 {
        (0..4).map(|c| self.get(0, c) * self.cofactor(0, c)).sum()
    }

    fn minor(&self, row: usize, col: usize) -> f64 {
        let mut sub = [[0.0; 3]; 3];
        let rows = (0..4).filter(|r| *r != row);
        for (i, r) in rows.enumerate() {
            let cols = (0..4).filter(|c| *c != col);
            for (j, c) in cols.enumerate() {
                sub[i][j] = self.get(r, c);
            }
        }
        det3(sub)
    }

    fn cofactor(&self, row: usize, col: usize) -> f64 {
        let sign = if (row + col) % 2 == 0 { 1.0 } else { -1.0 };
        sign * self.minor(row, col)
    }

    /// Adjugate over determinant; `None` when the determinant is zero.
    pub fn inverse(&self) -> Option<Self> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }
        let mut out = Self::ZERO;
        for r in 0..4 {
            for c in 0..4 {
                out.set(r, c, self.cofactor(c, r) / det);
            }
        }
        Some(out)
    }

    /// Inverts in place. Leaves the matrix untouched and returns false when singular.
    pub fn invert(&mut self) -> bool {
        match self.inverse() {
            Some(inverse) => {
                *self = inverse;
                true
            }
            None => false,
        }
    }

    /// Full homogeneous transform with divide by w. A zero w skips the divide.
    pub fn transform_point(&self, point: Vec3) -> Vec3 {
        let v = *self * point.extend(1.0);
        v.project().unwrap_or_else(|| v.xyz())
    }

    /// Upper 3x3 only; translation is ignored.
    pub fn transform_vector(&self, vector: Vec3) -> Vec3 {
        Vec3::new(
            self.m[0] * vector.x + self.m[4] * vector.y + self.m[8] * vector.z,
            self.m[1] * vector.x + self.m[5] * vector.y + self.m[9] * vector.z,
            self.m[2] * vector.x + self.m[6] * vector.y + self.m[10] * vector.z,
        )
    }

    /// Post-multiplies rotations so that the inverse maps +Z and then +Y onto themselves,
    /// which makes geometry drawn with this matrix face the viewer. An alignment whose
    /// rotation axis vanishes (parallel or antiparallel) is skipped.
    pub fn billboard(&mut self) -> bool {
        if !self.align_inverse_axis(Vec3::Z) {
            return false;
        }
        self.align_inverse_axis(Vec3::Y)
    }

    fn align_inverse_axis(&mut self, target: Vec3) -> bool {
        let Some(inverse) = self.inverse() else {
            return false;
        };
        let current = inverse.transform_vector(target).normalized();
        if current.is_zero() || current == target {
            return true;
        }
        let cos = current.dot(target);
        let mut axis = current.cross(target);
        let sin = axis.normalize();
        if sin <= f64::EPSILON {
            return true;
        }
        self.rotate(-sin.atan2(cos), axis);
        true
    }

    /// Snaps elements with magnitude below `epsilon` to zero.
    pub fn truncate(&mut self, epsilon: f64) {
        for value in &mut self.m {
            if value.abs() < epsilon {
                *value = 0.0;
            }
        }
    }

    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool {
        self.m
            .iter()
            .zip(other.m.iter())
            .all(|(a, b)| (a - b).abs() <= tolerance)
    }

    pub fn is_identity(&self, tolerance: f64) -> bool {
        self.approx_eq(&Self::IDENTITY, tolerance)
    }
}

/// Determinant of a row-major 3x3 block.
pub fn det3(a: [[f64; 3]; 3]) -> f64 {
    a[0][0] * (a[1][1] * a[2][2] - a[1][2] * a[2][1])
        - a[0][1] * (a[1][0] * a[2][2] - a[1][2] * a[2][0])
        + a[0][2] * (a[1][0] * a[2][1] - a[1][1] * a[2][0])
}

impl std::ops::Mul for Matrix4 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        let mut out = Self::ZERO;
        for c in 0..4 {
            for r in 0..4 {
                out.m[c * 4 + r] = (0..4).map(|k| self.get(r, k) * rhs.get(k, c)).sum();
            }
        }
        out
    }
}

impl std::ops::Mul<Vec4> for Matrix4 {
    type Output = Vec4;

    fn mul(self, v: Vec4) -> Self::Output {
        let m = &self.m;
        Vec4::new(
            m[0] * v.x + m[4] * v.y + m[8] * v.z + m[12] * v.w,
            m[1] * v.x + m[5] * v.y + m[9] * v.z + m[13] * v.w,
            m[2] * v.x + m[6] * v.y + m[10] * v.z + m[14] * v.w,
            m[3] * v.x + m[7] * v.y + m[11] * v.z + m[15] * v.w,
        )
    }
}

impl std::fmt::Display for Matrix4 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for r in 0..4 {
            let row = self.row(r);
            writeln!(
                f,
                "{:>10.4} {:>10.4} {:>10.4} {:>10.4}",
                row.x, row.y, row.z, row.w
            )?;
        }
        Ok(())
    }
}

#[cfg(feature = "cgmath")]
impl From<cgmath::Matrix4<f64>> for Matrix4 {
    fn from(m: cgmath::Matrix4<f64>) -> Self {
        Self::from_column_major([
            m.x.x, m.x.y, m.x.z, m.x.w, //
            m.y.x, m.y.y, m.y.z, m.y.w, //
            m.z.x, m.z.y, m.z.z, m.z.w, //
            m.w.x, m.w.y, m.w.z, m.w.w,
        ])
    }
}

#[cfg(feature = "cgmath")]
impl From<Matrix4> for cgmath::Matrix4<f64> {
    fn from(m: Matrix4) -> Self {
        let c = m.as_column_major();
        cgmath::Matrix4::new(
            c[0], c[1], c[2], c[3], c[4], c[5], c[6], c[7], c[8], c[9], c[10], c[11], c[12],
            c[13], c[14], c[15],
        )
    }
}
