use cadview_math::{BoundingBox, Matrix4, Ray, Vec3};
use serde::{Deserialize, Serialize};

mod camera;
mod node;

pub use cadview_base::{Error, Result};
pub use camera::{Camera, Projection, SceneCamera};
pub use node::{Material, Node};

/// Child indices leading from the scene root to a node.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodePath(Vec<usize>);

impl NodePath {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }
}

impl std::fmt::Display for NodePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "/")?;
        for (i, index) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "/")?;
            }
            write!(f, "{index}")?;
        }
        Ok(())
    }
}

/// Ray hit: the node, the point in eye space and the point in the node's frame.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Intersection {
    pub path: NodePath,
    pub global: Vec3,
    pub local: Vec3,
}

/// Queries the controller needs from a scene.
pub trait Scene {
    /// Closest hit along an eye-space ray, given the camera modelview.
    fn intersect(&self, ray: &Ray, modelview: &Matrix4) -> Option<Intersection>;
    fn bounding_box(&self) -> Option<BoundingBox>;
}
