use serde::{Deserialize, Serialize};

use crate::matrix::Matrix4;
use crate::vector::Vec3;

/// Half-line with an origin and a unit direction.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ray {
    pub origin: Vec3,
    pub direction: Vec3,
}

impl Ray {
    /// `None` for a zero-length direction.
    pub fn new(origin: Vec3, direction: Vec3) -> Option<Self> {
        let direction = direction.normalized();
        if direction.is_zero() {
            return None;
        }
        Some(Self { origin, direction })
    }

    pub fn through(from: Vec3, to: Vec3) -> Option<Self> {
        Self::new(from, to - from)
    }

    pub fn point_at(&self, t: f64) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Maps the origin and a second point through `matrix` and rebuilds the ray.
    pub fn transformed(&self, matrix: &Matrix4) -> Option<Self> {
        let from = matrix.transform_point(self.origin);
        let to = matrix.transform_point(self.point_at(1.0));
        Self::through(from, to)
    }

    /// Nearest non-negative parameter where the ray meets the sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f64) -> Option<f64> {
        let oc = self.origin - center;
        let b = oc.dot(self.direction);
        let c = oc.length_squared() - radius * radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        if near >= 0.0 {
            return Some(near);
        }
        let far = -b + root;
        (far >= 0.0).then_some(far)
    }

    /// Slab test; returns the entry parameter, or the exit when the origin is inside.
    pub fn intersect_box(&self, bounds: &BoundingBox) -> Option<f64> {
        let mut t_min = f64::NEG_INFINITY;
        let mut t_max = f64::INFINITY;
        let origin = [self.origin.x, self.origin.y, self.origin.z];
        let direction = [self.direction.x, self.direction.y, self.direction.z];
        let min = [bounds.min.x, bounds.min.y, bounds.min.z];
        let max = [bounds.max.x, bounds.max.y, bounds.max.z];
        for axis in 0..3 {
            if direction[axis].abs() <= f64::EPSILON {
                if origin[axis] < min[axis] || origin[axis] > max[axis] {
                    return None;
                }
                continue;
            }
            let inv = 1.0 / direction[axis];
            let mut t0 = (min[axis] - origin[axis]) * inv;
            let mut t1 = (max[axis] - origin[axis]) * inv;
            if t0 > t1 {
                std::mem::swap(&mut t0, &mut t1);
            }
            t_min = t_min.max(t0);
            t_max = t_max.min(t1);
            if t_min > t_max {
                return None;
            }
        }
        if t_max < 0.0 {
            return None;
        }
        Some(if t_min >= 0.0 { t_min } else { t_max })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min: Vec3,
    pub max: Vec3,
}

impl BoundingBox {
    pub fn new(a: Vec3, b: Vec3) -> Self {
        Self {
            min: a.min(b),
            max: a.max(b),
        }
    }

    pub fn from_center_size(center: Vec3, size: Vec3) -> Self {
        let half = size.absolute() * 0.5;
        Self::new(center - half, center + half)
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Radius of the enclosing sphere about `center()`.
    pub fn radius(&self) -> f64 {
        self.size().length() * 0.5
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    pub fn translated(&self, offset: Vec3) -> Self {
        Self {
            min: self.min + offset,
            max: self.max + offset,
        }
    }

    pub fn contains(&self, point: Vec3) -> bool {
        point.x >= self.min.x
            && point.y >= self.min.y
            && point.z >= self.min.z
            && point.x <= self.max.x
            && point.y <= self.max.y
            && point.z <= self.max.z
    }
}
