use cadview_base::{Error, Result, ensure_positive};
use cadview_math::{BoundingBox, Matrix4, Ray, Vec3};
use serde::{Deserialize, Serialize};

use crate::{Intersection, NodePath, Scene};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Material {
    pub diffuse: [f64; 3],
    #[serde(default)]
    pub transparency: f64,
}

impl Default for Material {
    fn default() -> Self {
        Self {
            diffuse: [0.8, 0.8, 0.8],
            transparency: 0.0,
        }
    }
}

/// Scene graph node. A `Translation` moves every sibling that follows it
/// inside the same group; groups scope that state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Group { children: Vec<Node> },
    Translation { offset: Vec3 },
    Material { material: Material },
    Sphere { center: Vec3, radius: f64 },
    Cube { center: Vec3, size: f64 },
}

impl Node {
    pub fn group(children: Vec<Node>) -> Self {
        Self::Group { children }
    }

    pub fn translation(offset: Vec3) -> Self {
        Self::Translation { offset }
    }

    pub fn material(material: Material) -> Self {
        Self::Material { material }
    }

    pub fn sphere(center: Vec3, radius: f64) -> Result<Self> {
        ensure_positive("sphere radius", radius)?;
        Ok(Self::Sphere { center, radius })
    }

    pub fn cube(center: Vec3, size: f64) -> Result<Self> {
        ensure_positive("cube size", size)?;
        Ok(Self::Cube { center, size })
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Self::Group { .. })
    }

    /// Shapes are the only nodes a ray can hit.
    pub fn is_selectable(&self) -> bool {
        matches!(self, Self::Sphere { .. } | Self::Cube { .. })
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Self::Group { children } => children,
            _ => &[],
        }
    }

    pub fn push(&mut self, node: Node) -> Result<()> {
        match self {
            Self::Group { children } => {
                children.push(node);
                Ok(())
            }
            _ => Err(Error::InvalidParameter(
                "only groups can hold children".to_string(),
            )),
        }
    }

    pub fn find(&self, path: &NodePath) -> Option<&Node> {
        path.indices()
            .iter()
            .try_fold(self, |node, index| node.children().get(*index))
    }

    /// Re-checks shape dimensions, e.g. after deserializing.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Group { children } => children.iter().try_for_each(Node::validate),
            Self::Sphere { radius, .. } => ensure_positive("sphere radius", *radius),
            Self::Cube { size, .. } => ensure_positive("cube size", *size),
            Self::Translation { .. } | Self::Material { .. } => Ok(()),
        }
    }

    fn intersect_at(
        &self,
        ray: &Ray,
        modelview: &Matrix4,
        path: &mut Vec<usize>,
    ) -> Option<Intersection> {
        match self {
            Self::Group { children } => {
                let mut current = *modelview;
                let mut best: Option<Intersection> = None;
                for (index, child) in children.iter().enumerate() {
                    if let Self::Translation { offset } = child {
                        current.translate(*offset);
                        continue;
                    }
                    path.push(index);
                    let hit = child.intersect_at(ray, &current, path);
                    path.pop();
                    let Some(hit) = hit else {
                        continue;
                    };
                    let closer = best.as_ref().is_none_or(|b| {
                        hit.global.distance_squared(ray.origin)
                            < b.global.distance_squared(ray.origin)
                    });
                    if closer {
                        best = Some(hit);
                    }
                }
                best
            }
            Self::Sphere { center, radius } => {
                shape_hit(ray, modelview, path, |local| {
                    local.intersect_sphere(*center, *radius)
                })
            }
            Self::Cube { center, size } => {
                let bounds = BoundingBox::from_center_size(*center, Vec3::splat(*size));
                shape_hit(ray, modelview, path, |local| local.intersect_box(&bounds))
            }
            Self::Translation { .. } | Self::Material { .. } => None,
        }
    }

    fn bounds_at(&self, offset: Vec3) -> Option<BoundingBox> {
        match self {
            Self::Group { children } => {
                let mut current = offset;
                let mut bounds: Option<BoundingBox> = None;
                for child in children {
                    if let Self::Translation { offset } = child {
                        current += *offset;
                        continue;
                    }
                    if let Some(child_bounds) = child.bounds_at(current) {
                        bounds = Some(match bounds {
                            Some(b) => b.union(&child_bounds),
                            None => child_bounds,
                        });
                    }
                }
                bounds
            }
            Self::Sphere { center, radius } => Some(
                BoundingBox::from_center_size(*center, Vec3::splat(radius * 2.0))
                    .translated(offset),
            ),
            Self::Cube { center, size } => {
                Some(BoundingBox::from_center_size(*center, Vec3::splat(*size)).translated(offset))
            }
            Self::Translation { .. } | Self::Material { .. } => None,
        }
    }
}

/// Intersects in local space and maps the hit back to eye space. Hits that
/// are not in front of the ray origin are discarded.
fn shape_hit(
    ray: &Ray,
    modelview: &Matrix4,
    path: &[usize],
    intersect: impl Fn(&Ray) -> Option<f64>,
) -> Option<Intersection> {
    let inverse = modelview.inverse()?;
    let local_ray = ray.transformed(&inverse)?;
    let t = intersect(&local_ray)?;
    let local = local_ray.point_at(t);
    let global = modelview.transform_point(local);
    if global.z >= ray.origin.z {
        return None;
    }
    Some(Intersection {
        path: NodePath::new(path.to_vec()),
        global,
        local,
    })
}

impl Scene for Node {
    fn intersect(&self, ray: &Ray, modelview: &Matrix4) -> Option<Intersection> {
        let mut path = Vec::new();
        self.intersect_at(ray, modelview, &mut path)
    }

    fn bounding_box(&self) -> Option<BoundingBox> {
        self.bounds_at(Vec3::ZERO)
    }
}
