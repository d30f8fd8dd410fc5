use crate::{tessellate, transform_mat, Aabb, Host, HostError, TriMesh};
use doll_core::{
    Camera, CameraId, GeometryId, Light, LightId, MaterialDef, MaterialId, PrimitiveParams,
    RenderSettings, Rgba, ShapeKind, Transform,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectSource {
    Primitive(ShapeKind),
    Joined { primitives: usize },
}

#[derive(Debug, Clone)]
pub struct HostObject {
    pub id: GeometryId,
    pub source: ObjectSource,
    pub transform: Transform,
    pub material_slots: Vec<MaterialId>,
    local_mesh: TriMesh,
}

impl HostObject {
    pub fn primitive_count(&self) -> usize {
        match self.source {
            ObjectSource::Primitive(_) => 1,
            ObjectSource::Joined { primitives } => primitives,
        }
    }

    pub fn world_mesh(&self) -> TriMesh {
        self.local_mesh.transformed(transform_mat(&self.transform))
    }
}

/// In-memory scene that tessellates every primitive it is asked for.
///
/// [`Host::clear`] drops objects, lights and cameras but keeps materials, so
/// repeated runs on one host accumulate orphaned material definitions.
pub struct MeshHost {
    tolerance: f64,
    next_id: u64,
    allocation_budget: Option<usize>,
    objects: Vec<HostObject>,
    materials: Vec<(MaterialId, MaterialDef)>,
    lights: Vec<(LightId, Light)>,
    cameras: Vec<(CameraId, Camera)>,
    background: Option<Rgba>,
    render_settings: Option<RenderSettings>,
}

impl Default for MeshHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshHost {
    pub fn new() -> Self {
        Self {
            tolerance: 0.005,
            next_id: 1,
            allocation_budget: None,
            objects: Vec::new(),
            materials: Vec::new(),
            lights: Vec::new(),
            cameras: Vec::new(),
            background: None,
            render_settings: None,
        }
    }

    /// Fails every allocation after the first `allocations` with
    /// [`HostError::Exhausted`].
    pub fn with_allocation_budget(mut self, allocations: usize) -> Self {
        self.allocation_budget = Some(allocations);
        self
    }

    pub fn objects(&self) -> &[HostObject] {
        &self.objects
    }

    pub fn object(&self, id: GeometryId) -> Option<&HostObject> {
        self.objects.iter().find(|obj| obj.id == id)
    }

    pub fn material(&self, id: MaterialId) -> Option<&MaterialDef> {
        self.materials
            .iter()
            .find(|(mid, _)| *mid == id)
            .map(|(_, def)| def)
    }

    pub fn materials(&self) -> impl Iterator<Item = (MaterialId, &MaterialDef)> {
        self.materials.iter().map(|(id, def)| (*id, def))
    }

    pub fn lights(&self) -> &[(LightId, Light)] {
        &self.lights
    }

    pub fn cameras(&self) -> &[(CameraId, Camera)] {
        &self.cameras
    }

    pub fn background(&self) -> Option<Rgba> {
        self.background
    }

    pub fn render_settings(&self) -> Option<&RenderSettings> {
        self.render_settings.as_ref()
    }

    fn allocate(&mut self, resource: &'static str) -> Result<u64, HostError> {
        if let Some(budget) = self.allocation_budget.as_mut() {
            if *budget == 0 {
                return Err(HostError::Exhausted(resource));
            }
            *budget -= 1;
        }
        let id = self.next_id;
        self.next_id = self.next_id.saturating_add(1);
        Ok(id)
    }

    fn object_mut(&mut self, id: GeometryId) -> Result<&mut HostObject, HostError> {
        self.objects
            .iter_mut()
            .find(|obj| obj.id == id)
            .ok_or(HostError::UnknownGeometry(id))
    }

    fn ensure_material(&self, id: MaterialId) -> Result<(), HostError> {
        if self.material(id).is_some() {
            Ok(())
        } else {
            Err(HostError::UnknownMaterial(id))
        }
    }
}

impl Host for MeshHost {
    fn clear(&mut self) -> Result<(), HostError> {
        self.objects.clear();
        self.lights.clear();
        self.cameras.clear();
        Ok(())
    }

    fn add_primitive(&mut self, params: &PrimitiveParams) -> Result<GeometryId, HostError> {
        let local_mesh = tessellate(params, self.tolerance)?;
        let id = self.allocate("geometry")?;
        self.objects.push(HostObject {
            id,
            source: ObjectSource::Primitive(params.kind()),
            transform: Transform::default(),
            material_slots: Vec::new(),
            local_mesh,
        });
        Ok(id)
    }

    fn set_transform(&mut self, id: GeometryId, transform: &Transform) -> Result<(), HostError> {
        self.object_mut(id)?.transform = *transform;
        Ok(())
    }

    fn create_material(&mut self, def: &MaterialDef) -> Result<MaterialId, HostError> {
        let id = self.allocate("material")?;
        self.materials.push((id, def.clone()));
        Ok(id)
    }

    fn material_slots(&self, id: GeometryId) -> Result<&[MaterialId], HostError> {
        self.object(id)
            .map(|obj| obj.material_slots.as_slice())
            .ok_or(HostError::UnknownGeometry(id))
    }

    fn set_material_slot(
        &mut self,
        id: GeometryId,
        slot: usize,
        material: MaterialId,
    ) -> Result<(), HostError> {
        self.ensure_material(material)?;
        let obj = self.object_mut(id)?;
        let entry = obj
            .material_slots
            .get_mut(slot)
            .ok_or(HostError::SlotOutOfRange { geometry: id, slot })?;
        *entry = material;
        Ok(())
    }

    fn append_material_slot(
        &mut self,
        id: GeometryId,
        material: MaterialId,
    ) -> Result<(), HostError> {
        self.ensure_material(material)?;
        self.object_mut(id)?.material_slots.push(material);
        Ok(())
    }

    fn join(&mut self, ids: &[GeometryId]) -> Result<GeometryId, HostError> {
        if ids.is_empty() {
            return Err(HostError::EmptyJoin);
        }
        let mut members: Vec<GeometryId> = Vec::with_capacity(ids.len());
        for &id in ids {
            if self.object(id).is_none() {
                return Err(HostError::UnknownGeometry(id));
            }
            if !members.contains(&id) {
                members.push(id);
            }
        }
        let joined_id = self.allocate("geometry")?;

        let mut mesh = TriMesh::default();
        let mut slots: Vec<MaterialId> = Vec::new();
        let mut primitives = 0;
        for obj in self.objects.iter().filter(|obj| members.contains(&obj.id)) {
            mesh.append(obj.world_mesh());
            primitives += obj.primitive_count();
            for slot in &obj.material_slots {
                if !slots.contains(slot) {
                    slots.push(*slot);
                }
            }
        }
        self.objects.retain(|obj| !members.contains(&obj.id));
        self.objects.push(HostObject {
            id: joined_id,
            source: ObjectSource::Joined { primitives },
            transform: Transform::default(),
            material_slots: slots,
            local_mesh: mesh,
        });
        Ok(joined_id)
    }

    fn world_bounds(&self, id: GeometryId) -> Result<Aabb, HostError> {
        self.object(id)
            .map(|obj| obj.world_mesh().bounds())
            .ok_or(HostError::UnknownGeometry(id))
    }

    fn add_light(&mut self, light: &Light) -> Result<LightId, HostError> {
        let id = self.allocate("light")?;
        self.lights.push((id, *light));
        Ok(id)
    }

    fn add_camera(&mut self, camera: &Camera) -> Result<CameraId, HostError> {
        let id = self.allocate("camera")?;
        self.cameras.push((id, *camera));
        Ok(id)
    }

    fn set_background(&mut self, color: Rgba) -> Result<(), HostError> {
        self.background = Some(color);
        Ok(())
    }

    fn set_render_settings(&mut self, settings: &RenderSettings) -> Result<(), HostError> {
        self.render_settings = Some(*settings);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doll_core::LightKind;

    fn black() -> MaterialDef {
        MaterialDef::new("Black", Rgba::BLACK, 0.5)
    }

    #[test]
    fn transform_moves_world_bounds() {
        let mut host = MeshHost::new();
        let id = host
            .add_primitive(&PrimitiveParams::Sphere { radius: 0.22 })
            .unwrap();
        host.set_transform(id, &Transform::at([0.0, 0.0, 1.45]))
            .unwrap();
        let bounds = host.world_bounds(id).unwrap();
        assert!((bounds.min[2] - 1.23).abs() < 1.0e-4);
        assert!((bounds.max[2] - 1.67).abs() < 1.0e-4);
    }

    #[test]
    fn material_slots_replace_and_append() {
        let mut host = MeshHost::new();
        let id = host.add_primitive(&PrimitiveParams::Cube { size: 1.0 }).unwrap();
        let a = host.create_material(&black()).unwrap();
        let b = host.create_material(&black()).unwrap();

        assert!(matches!(
            host.set_material_slot(id, 0, a),
            Err(HostError::SlotOutOfRange { slot: 0, .. })
        ));
        host.append_material_slot(id, a).unwrap();
        host.set_material_slot(id, 0, b).unwrap();
        assert_eq!(host.material_slots(id).unwrap(), &[b]);
        assert!(matches!(
            host.append_material_slot(id, 999),
            Err(HostError::UnknownMaterial(999))
        ));
    }

    #[test]
    fn join_consumes_sources_and_merges_slots() {
        let mut host = MeshHost::new();
        let mat = host.create_material(&black()).unwrap();
        let a = host.add_primitive(&PrimitiveParams::Cube { size: 1.0 }).unwrap();
        let b = host.add_primitive(&PrimitiveParams::Sphere { radius: 0.5 }).unwrap();
        host.append_material_slot(a, mat).unwrap();
        host.append_material_slot(b, mat).unwrap();
        host.set_transform(b, &Transform::at([3.0, 0.0, 0.0])).unwrap();

        let joined = host.join(&[a, b, a]).unwrap();
        assert_eq!(host.objects().len(), 1);
        assert!(host.object(a).is_none());
        let obj = host.object(joined).unwrap();
        assert_eq!(obj.primitive_count(), 2);
        assert_eq!(obj.material_slots, vec![mat]);
        let bounds = host.world_bounds(joined).unwrap();
        assert!((bounds.min[0] + 0.5).abs() < 1.0e-4);
        assert!((bounds.max[0] - 3.5).abs() < 1.0e-4);

        assert!(matches!(host.join(&[]), Err(HostError::EmptyJoin)));
        assert!(matches!(host.join(&[a]), Err(HostError::UnknownGeometry(_))));
    }

    #[test]
    fn budget_exhaustion_names_the_resource() {
        let mut host = MeshHost::new().with_allocation_budget(1);
        host.add_primitive(&PrimitiveParams::Sphere { radius: 1.0 }).unwrap();
        let err = host
            .add_light(&Light {
                kind: LightKind::Sun,
                position: [0.0; 3],
                intensity: 1.0,
            })
            .unwrap_err();
        assert!(matches!(err, HostError::Exhausted("light")));
    }

    #[test]
    fn clear_removes_objects_but_keeps_materials() {
        let mut host = MeshHost::new();
        host.create_material(&black()).unwrap();
        host.add_primitive(&PrimitiveParams::Cube { size: 1.0 }).unwrap();
        host.add_camera(&Camera {
            position: [0.0; 3],
            rotation: [0.0; 3],
        })
        .unwrap();
        host.clear().unwrap();
        assert!(host.objects().is_empty());
        assert!(host.cameras().is_empty());
        assert_eq!(host.materials().count(), 1);
    }
}
