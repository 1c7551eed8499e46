use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec4 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

macro_rules! vector_common {
    ($name:ident { $($field:ident),+ }) => {
        impl $name {
            pub const ZERO: Self = Self { $($field: 0.0),+ };

            pub const fn new($($field: f64),+) -> Self {
                Self { $($field),+ }
            }

            pub const fn splat(value: f64) -> Self {
                Self { $($field: value),+ }
            }

            pub fn dot(self, other: Self) -> f64 {
                0.0 $(+ self.$field * other.$field)+
            }

            pub fn length_squared(self) -> f64 {
                self.dot(self)
            }

            pub fn length(self) -> f64 {
                self.length_squared().sqrt()
            }

            /// Scales to unit length in place and returns the previous length.
            /// A zero-length vector is left untouched.
            pub fn normalize(&mut self) -> f64 {
                let len = self.length();
                if len > f64::EPSILON {
                    *self = *self / len;
                }
                len
            }

            pub fn normalized(self) -> Self {
                let len = self.length();
                if len <= f64::EPSILON {
                    Self::ZERO
                } else {
                    self / len
                }
            }

            pub fn distance(self, other: Self) -> f64 {
                (self - other).length()
            }

            pub fn distance_squared(self, other: Self) -> f64 {
                (self - other).length_squared()
            }

            pub fn absolute(self) -> Self {
                Self { $($field: self.$field.abs()),+ }
            }

            pub fn clamp(self, min: f64, max: f64) -> Self {
                Self { $($field: self.$field.clamp(min, max)),+ }
            }

            /// Snaps components with magnitude below `epsilon` to zero.
            pub fn truncate(self, epsilon: f64) -> Self {
                Self { $($field: if self.$field.abs() < epsilon { 0.0 } else { self.$field }),+ }
            }

            pub fn approx_eq(self, other: Self, tolerance: f64) -> bool {
                true $(&& (self.$field - other.$field).abs() <= tolerance)+
            }

            pub fn is_zero(self) -> bool {
                true $(&& self.$field == 0.0)+
            }

            pub fn is_finite(self) -> bool {
                true $(&& self.$field.is_finite())+
            }
        }

        impl std::ops::Add for $name {
            type Output = Self;

            fn add(self, other: Self) -> Self::Output {
                Self { $($field: self.$field + other.$field),+ }
            }
        }

        impl std::ops::Sub for $name {
            type Output = Self;

            fn sub(self, other: Self) -> Self::Output {
                Self { $($field: self.$field - other.$field),+ }
            }
        }

        impl std::ops::Mul<f64> for $name {
            type Output = Self;

            fn mul(self, rhs: f64) -> Self::Output {
                Self { $($field: self.$field * rhs),+ }
            }
        }

        impl std::ops::Mul<$name> for f64 {
            type Output = $name;

            fn mul(self, rhs: $name) -> Self::Output {
                rhs * self
            }
        }

        impl std::ops::Div<f64> for $name {
            type Output = Self;

            fn div(self, rhs: f64) -> Self::Output {
                Self { $($field: self.$field / rhs),+ }
            }
        }

        impl std::ops::Neg for $name {
            type Output = Self;

            fn neg(self) -> Self::Output {
                Self { $($field: -self.$field),+ }
            }
        }

        impl std::ops::AddAssign for $name {
            fn add_assign(&mut self, other: Self) {
                $(self.$field += other.$field;)+
            }
        }

        impl std::ops::SubAssign for $name {
            fn sub_assign(&mut self, other: Self) {
                $(self.$field -= other.$field;)+
            }
        }

        impl std::ops::MulAssign<f64> for $name {
            fn mul_assign(&mut self, rhs: f64) {
                $(self.$field *= rhs;)+
            }
        }
    };
}

vector_common!(Vec2 { x, y });
vector_common!(Vec3 { x, y, z });
vector_common!(Vec4 { x, y, z, w });

impl Vec2 {
    pub fn extend(self, z: f64) -> Vec3 {
        Vec3::new(self.x, self.y, z)
    }
}

impl Vec3 {
    pub const X: Self = Self::new(1.0, 0.0, 0.0);
    pub const Y: Self = Self::new(0.0, 1.0, 0.0);
    pub const Z: Self = Self::new(0.0, 0.0, 1.0);

    pub fn cross(self, other: Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn min(self, other: Self) -> Self {
        Self::new(self.x.min(other.x), self.y.min(other.y), self.z.min(other.z))
    }

    pub fn max(self, other: Self) -> Self {
        Self::new(self.x.max(other.x), self.y.max(other.y), self.z.max(other.z))
    }

    pub fn extend(self, w: f64) -> Vec4 {
        Vec4::new(self.x, self.y, self.z, w)
    }
}

impl Vec4 {
    pub fn xyz(self) -> Vec3 {
        Vec3::new(self.x, self.y, self.z)
    }

    /// Homogeneous divide; `None` when `w` is zero.
    pub fn project(self) -> Option<Vec3> {
        if self.w == 0.0 {
            return None;
        }
        Some(self.xyz() / self.w)
    }
}

impl From<[f64; 3]> for Vec3 {
    fn from(value: [f64; 3]) -> Self {
        Self::new(value[0], value[1], value[2])
    }
}

impl From<Vec3> for [f64; 3] {
    fn from(value: Vec3) -> Self {
        [value.x, value.y, value.z]
    }
}

impl std::fmt::Display for Vec3 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6}, {:.6})", self.x, self.y, self.z)
    }
}
