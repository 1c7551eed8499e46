mod matrix;
mod quaternion;
mod ray;
mod trackball;
mod unproject;
mod vector;

pub use matrix::{Matrix4, det3};
pub use quaternion::Quaternion;
pub use ray::{BoundingBox, Ray};
pub use trackball::{DEFAULT_TRACKBALL_RADIUS, Trackball};
pub use unproject::{Viewport, orthographic_ray, perspective_ray, unproject, unprojected_ray};
pub use vector::{Vec2, Vec3, Vec4};

