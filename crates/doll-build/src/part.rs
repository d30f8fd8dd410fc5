use crate::{MaterialRef, PrimitiveFactory};
use doll_core::{BezierControls, FigureError, GeometryId, MaterialId, PrimitiveSpec, ShapeKind};
use doll_geom::Host;
use tracing::debug;

/// One named component of the figure: a placed primitive and its material.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    spec: PrimitiveSpec,
    material: MaterialRef,
    geometry: GeometryId,
}

impl Part {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn spec(&self) -> &PrimitiveSpec {
        &self.spec
    }

    pub fn kind(&self) -> ShapeKind {
        self.spec.kind()
    }

    pub fn material(&self) -> &MaterialRef {
        &self.material
    }

    pub fn geometry(&self) -> GeometryId {
        self.geometry
    }

    /// Control points, for curve parts.
    pub fn curve(&self) -> Option<&BezierControls> {
        self.spec.params.curve()
    }
}

#[derive(Debug, Default)]
pub struct PartBuilder {
    factory: PrimitiveFactory,
}

impl PartBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> &PrimitiveFactory {
        &self.factory
    }

    pub fn build<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
        spec: PrimitiveSpec,
        material: &MaterialRef,
    ) -> Result<Part, FigureError> {
        let geometry = self
            .factory
            .create(&mut *host, &spec)
            .map_err(|err| err.in_context(name))?;
        assign_material(&mut *host, geometry, material.id).map_err(|err| err.in_context(name))?;
        debug!(
            part = name,
            kind = %spec.kind(),
            material = %material.name,
            geometry,
            "built part"
        );
        Ok(Part {
            name: name.to_string(),
            spec,
            material: material.clone(),
            geometry,
        })
    }
}

/// Puts `material` in the first slot, replacing whatever is there, or adds
/// the slot when the geometry has none. Repeating it changes nothing.
pub fn assign_material<H: Host + ?Sized>(
    host: &mut H,
    geometry: GeometryId,
    material: MaterialId,
) -> Result<(), FigureError> {
    if host.material_slots(geometry)?.is_empty() {
        host.append_material_slot(geometry, material)?;
    } else {
        host.set_material_slot(geometry, 0, material)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MaterialRegistry;
    use doll_core::{PrimitiveParams, Rgba, Transform};
    use doll_geom::MeshHost;

    #[test]
    fn build_binds_material_to_new_geometry() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let yellow = registry
            .get_or_create(&mut host, "Yellow", Rgba::new(1.0, 0.8, 0.0, 1.0), 0.2)
            .unwrap();
        let mut builder = PartBuilder::new();
        let part = builder
            .build(
                &mut host,
                "head",
                PrimitiveSpec::new(
                    PrimitiveParams::Sphere { radius: 0.22 },
                    Transform::at([0.0, 0.0, 1.45]),
                ),
                &yellow,
            )
            .unwrap();
        assert_eq!(part.name(), "head");
        assert_eq!(part.kind(), ShapeKind::Sphere);
        assert!(part.curve().is_none());
        assert_eq!(host.material_slots(part.geometry()).unwrap(), &[yellow.id]);
        assert_eq!(builder.factory().created(), 1);
    }

    #[test]
    fn reassigning_material_is_idempotent() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let yellow = registry
            .get_or_create(&mut host, "Yellow", Rgba::new(1.0, 0.8, 0.0, 1.0), 0.2)
            .unwrap();
        let black = registry
            .get_or_create(&mut host, "Black", Rgba::BLACK, 0.5)
            .unwrap();
        let id = host.add_primitive(&PrimitiveParams::Cube { size: 1.0 }).unwrap();

        assign_material(&mut host, id, yellow.id).unwrap();
        assign_material(&mut host, id, yellow.id).unwrap();
        assert_eq!(host.material_slots(id).unwrap(), &[yellow.id]);

        assign_material(&mut host, id, black.id).unwrap();
        assert_eq!(host.material_slots(id).unwrap(), &[black.id]);
    }

    #[test]
    fn errors_name_the_part() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let black = registry
            .get_or_create(&mut host, "Black", Rgba::BLACK, 0.5)
            .unwrap();
        let err = PartBuilder::new()
            .build(
                &mut host,
                "leftEye",
                PrimitiveSpec::new(
                    PrimitiveParams::Sphere { radius: -1.0 },
                    Transform::default(),
                ),
                &black,
            )
            .unwrap_err();
        assert_eq!(err.context(), "leftEye/sphere");
    }
}
