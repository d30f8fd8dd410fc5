//! Host capabilities the figure builder consumes, plus an in-memory host
//! that tessellates primitives into triangle meshes.

mod mesh_host;
mod tessellate;

pub use mesh_host::{HostObject, MeshHost, ObjectSource};
pub use tessellate::{bezier_point, make_box, make_cylinder, tessellate, tessellate_solid};

use doll_core::{
    Camera, CameraId, FigureError, GeometryId, Light, LightId, MaterialDef, MaterialId,
    PrimitiveParams, RenderSettings, Rgba, Transform,
};
use glam::{Mat4, Quat, Vec3};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum GeomError {
    #[error("geometry kernel error: {0}")]
    Kernel(String),
}

#[derive(Debug, Error)]
pub enum HostError {
    #[error("unknown geometry handle {0}")]
    UnknownGeometry(GeometryId),
    #[error("unknown material handle {0}")]
    UnknownMaterial(MaterialId),
    #[error("geometry {geometry} has no material slot {slot}")]
    SlotOutOfRange { geometry: GeometryId, slot: usize },
    #[error("nothing selected to join")]
    EmptyJoin,
    #[error("allocation budget exhausted while creating {0}")]
    Exhausted(&'static str),
    #[error(transparent)]
    Geometry(#[from] GeomError),
}

impl HostError {
    /// The kind of resource the failed call was working on.
    pub fn resource(&self) -> &'static str {
        match self {
            HostError::UnknownGeometry(_) | HostError::EmptyJoin | HostError::Geometry(_) => {
                "geometry"
            }
            HostError::UnknownMaterial(_) | HostError::SlotOutOfRange { .. } => "material",
            HostError::Exhausted(resource) => *resource,
        }
    }
}

impl From<HostError> for FigureError {
    fn from(err: HostError) -> Self {
        FigureError::HostResourceFailure {
            context: String::new(),
            resource: err.resource().to_string(),
            reason: err.to_string(),
        }
    }
}

/// Scene-construction API provided by the host environment.
///
/// Every constructor returns an explicit handle; there is no notion of an
/// "active" object.
pub trait Host {
    /// Removes every object from the scene (select-all, delete).
    fn clear(&mut self) -> Result<(), HostError>;

    fn add_primitive(&mut self, params: &PrimitiveParams) -> Result<GeometryId, HostError>;

    fn set_transform(&mut self, id: GeometryId, transform: &Transform) -> Result<(), HostError>;

    fn create_material(&mut self, def: &MaterialDef) -> Result<MaterialId, HostError>;

    fn material_slots(&self, id: GeometryId) -> Result<&[MaterialId], HostError>;

    fn set_material_slot(
        &mut self,
        id: GeometryId,
        slot: usize,
        material: MaterialId,
    ) -> Result<(), HostError>;

    fn append_material_slot(
        &mut self,
        id: GeometryId,
        material: MaterialId,
    ) -> Result<(), HostError>;

    /// Joins the given objects into a new one. The sources cease to exist.
    fn join(&mut self, ids: &[GeometryId]) -> Result<GeometryId, HostError>;

    fn world_bounds(&self, id: GeometryId) -> Result<Aabb, HostError>;

    fn add_light(&mut self, light: &Light) -> Result<LightId, HostError>;

    fn add_camera(&mut self, camera: &Camera) -> Result<CameraId, HostError>;

    fn set_background(&mut self, color: Rgba) -> Result<(), HostError>;

    fn set_render_settings(&mut self, settings: &RenderSettings) -> Result<(), HostError>;
}

#[derive(Debug, Clone, Default)]
pub struct TriMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Aabb {
    pub min: [f32; 3],
    pub max: [f32; 3],
}

impl TriMesh {
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn push_vertex(&mut self, position: Vec3, normal: Vec3) -> u32 {
        let index = self.positions.len() as u32;
        self.positions.push(position.to_array());
        self.normals.push(normal.normalize_or_zero().to_array());
        index
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.indices.extend([a, b, c]);
    }

    pub fn append(&mut self, other: TriMesh) {
        let base = self.positions.len() as u32;
        self.positions.extend(other.positions);
        self.normals.extend(other.normals);
        self.indices
            .extend(other.indices.into_iter().map(|idx| idx + base));
    }

    /// Appends `other` moved into place by `transform`. Normals go through the
    /// inverse transpose so non-uniform scale keeps them perpendicular.
    pub fn append_transformed(&mut self, other: &TriMesh, transform: Mat4) {
        let base = self.positions.len() as u32;
        let normal_matrix = transform.inverse().transpose();
        self.positions.extend(other.positions.iter().map(|p| {
            let p = Vec3::from_array(*p);
            transform.transform_point3(p).to_array()
        }));
        self.normals.extend(other.normals.iter().map(|n| {
            let n = normal_matrix.transform_vector3(Vec3::from_array(*n));
            if n.length_squared() > 1.0e-12 {
                n.normalize().to_array()
            } else {
                [0.0, 0.0, 1.0]
            }
        }));
        self.indices
            .extend(other.indices.iter().copied().map(|idx| idx + base));
    }

    pub fn transformed(&self, transform: Mat4) -> TriMesh {
        let mut out = TriMesh::default();
        out.append_transformed(self, transform);
        out
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(&self.positions)
    }
}

impl Aabb {
    pub fn from_points(points: &[[f32; 3]]) -> Self {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        for p in points {
            let v = Vec3::from_array(*p);
            min = min.min(v);
            max = max.max(v);
        }
        if !min.is_finite() || !max.is_finite() {
            return Aabb::default();
        }
        Aabb {
            min: min.to_array(),
            max: max.to_array(),
        }
    }

    pub fn union(&self, other: &Aabb) -> Aabb {
        Aabb {
            min: Vec3::from_array(self.min)
                .min(Vec3::from_array(other.min))
                .to_array(),
            max: Vec3::from_array(self.max)
                .max(Vec3::from_array(other.max))
                .to_array(),
        }
    }

    pub fn center(&self) -> [f32; 3] {
        ((Vec3::from_array(self.min) + Vec3::from_array(self.max)) * 0.5).to_array()
    }

    pub fn size(&self) -> [f32; 3] {
        (Vec3::from_array(self.max) - Vec3::from_array(self.min)).to_array()
    }

    pub fn contains(&self, other: &Aabb, eps: f32) -> bool {
        (0..3).all(|i| {
            other.min[i] >= self.min[i] - eps && other.max[i] <= self.max[i] + eps
        })
    }

    pub fn approx_eq(&self, other: &Aabb, eps: f32) -> bool {
        (0..3).all(|i| {
            (self.min[i] - other.min[i]).abs() <= eps && (self.max[i] - other.max[i]).abs() <= eps
        })
    }
}

/// World matrix for a transform: translate, then rotate, then scale
/// (`T * R * S`). Euler angles compose as X, then Y, then Z.
pub fn transform_mat(transform: &Transform) -> Mat4 {
    let [rx, ry, rz] = transform.rotation;
    let rotation = Quat::from_rotation_z(rz) * Quat::from_rotation_y(ry) * Quat::from_rotation_x(rx);
    Mat4::from_scale_rotation_translation(
        Vec3::from_array(transform.scale),
        rotation,
        Vec3::from_array(transform.position),
    )
}
