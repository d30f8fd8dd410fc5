use doll_core::{unit_interval, FigureError, Material, MaterialDef, MaterialKeying, Rgba};
use doll_geom::Host;
use std::rc::Rc;
use tracing::{debug, warn};

/// Shared handle to a registered material. Two handles to the same material
/// are `Rc::ptr_eq`.
pub type MaterialRef = Rc<Material>;

/// Creates materials on first request and hands out shared references after.
#[derive(Debug, Default)]
pub struct MaterialRegistry {
    keying: MaterialKeying,
    materials: Vec<MaterialRef>,
}

impl MaterialRegistry {
    pub fn new(keying: MaterialKeying) -> Self {
        Self {
            keying,
            materials: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.materials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.materials.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<MaterialRef> {
        self.materials.iter().find(|m| m.name == name).cloned()
    }

    /// Like [`get`](Self::get), but a missing material is a dependency error
    /// attributed to `context`.
    pub fn require(&self, name: &str, context: &str) -> Result<MaterialRef, FigureError> {
        self.get(name)
            .ok_or_else(|| FigureError::missing(context, name))
    }

    /// Returns the material registered under `name`, creating it on the host
    /// first if needed.
    ///
    /// With [`MaterialKeying::Name`] a later request with different color or
    /// roughness still gets the first material. With
    /// [`MaterialKeying::NameAndParameters`] it gets a new material under a
    /// suffixed name (`Name.001`).
    pub fn get_or_create<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        name: &str,
        base_color: Rgba,
        roughness: f32,
    ) -> Result<MaterialRef, FigureError> {
        validate(name, base_color, roughness)?;
        match self.keying {
            MaterialKeying::Name => {
                if let Some(existing) = self.get(name) {
                    if !existing.matches(base_color, roughness) {
                        warn!(
                            material = name,
                            "material already registered with different parameters; keeping the original"
                        );
                    }
                    return Ok(existing);
                }
                self.insert(host, name.to_string(), base_color, roughness)
            }
            MaterialKeying::NameAndParameters => {
                if let Some(existing) = self
                    .materials
                    .iter()
                    .find(|m| {
                        (m.name == name || self.base_name(&m.name) == name)
                            && m.matches(base_color, roughness)
                    })
                {
                    return Ok(existing.clone());
                }
                let unique = self.unique_name(name);
                self.insert(host, unique, base_color, roughness)
            }
        }
    }

    pub fn get_or_create_def<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        def: &MaterialDef,
    ) -> Result<MaterialRef, FigureError> {
        self.get_or_create(host, &def.name, def.base_color, def.roughness)
    }

    /// Always creates a fresh material. Taken names get the next free
    /// `.NNN` suffix.
    pub fn create_unique<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        def: &MaterialDef,
    ) -> Result<MaterialRef, FigureError> {
        validate(&def.name, def.base_color, def.roughness)?;
        let unique = self.unique_name(&def.name);
        self.insert(host, unique, def.base_color, def.roughness)
    }

    fn insert<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        name: String,
        base_color: Rgba,
        roughness: f32,
    ) -> Result<MaterialRef, FigureError> {
        let def = MaterialDef::new(name, base_color, roughness);
        let id = host
            .create_material(&def)
            .map_err(|err| FigureError::from(err).in_context(&format!("material {}", def.name)))?;
        debug!(material = %def.name, id, "created material");
        let material = Rc::new(Material {
            id,
            name: def.name,
            base_color,
            roughness,
        });
        self.materials.push(material.clone());
        Ok(material)
    }

    fn unique_name(&self, name: &str) -> String {
        if self.get(name).is_none() {
            return name.to_string();
        }
        (1u32..)
            .map(|n| format!("{name}.{n:03}"))
            .find(|candidate| self.get(candidate).is_none())
            .unwrap_or_else(|| name.to_string())
    }

    fn base_name<'a>(&self, name: &'a str) -> &'a str {
        match name.rsplit_once('.') {
            Some((base, suffix))
                if suffix.len() == 3 && suffix.bytes().all(|b| b.is_ascii_digit()) =>
            {
                base
            }
            _ => name,
        }
    }
}

fn validate(name: &str, base_color: Rgba, roughness: f32) -> Result<(), FigureError> {
    let context = format!("material {name}");
    if name.is_empty() {
        return Err(FigureError::invalid(context, "name is empty"));
    }
    if !base_color.is_normalized() {
        return Err(FigureError::invalid(
            context,
            format!("base color {:?} outside [0, 1]", base_color.components()),
        ));
    }
    if !unit_interval(roughness) {
        return Err(FigureError::invalid(
            context,
            format!("roughness {roughness} outside [0, 1]"),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use doll_geom::MeshHost;

    const YELLOW: Rgba = Rgba::new(1.0, 0.8, 0.0, 1.0);

    #[test]
    fn same_name_returns_same_material() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let first = registry.get_or_create(&mut host, "Yellow", YELLOW, 0.2).unwrap();
        let second = registry.get_or_create(&mut host, "Yellow", YELLOW, 0.2).unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(registry.len(), 1);
        assert_eq!(host.materials().count(), 1);
    }

    #[test]
    fn name_keying_returns_stale_material() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::new(MaterialKeying::Name);
        let yellow = registry.get_or_create(&mut host, "Yellow", YELLOW, 0.2).unwrap();
        let again = registry
            .get_or_create(&mut host, "Yellow", Rgba::BLACK, 0.9)
            .unwrap();
        assert!(Rc::ptr_eq(&yellow, &again));
        assert_eq!(again.base_color, YELLOW);
        assert_eq!(again.roughness, 0.2);
    }

    #[test]
    fn parameter_keying_creates_suffixed_material() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::new(MaterialKeying::NameAndParameters);
        let yellow = registry.get_or_create(&mut host, "Yellow", YELLOW, 0.2).unwrap();
        let black = registry
            .get_or_create(&mut host, "Yellow", Rgba::BLACK, 0.9)
            .unwrap();
        assert!(!Rc::ptr_eq(&yellow, &black));
        assert_eq!(black.name, "Yellow.001");
        assert_eq!(black.base_color, Rgba::BLACK);

        let black_again = registry
            .get_or_create(&mut host, "Yellow", Rgba::BLACK, 0.9)
            .unwrap();
        assert!(Rc::ptr_eq(&black, &black_again));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn parameter_keying_reuses_suffixed_request() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::new(MaterialKeying::NameAndParameters);
        let first = registry
            .get_or_create(&mut host, "Skin.001", Rgba::BLACK, 0.5)
            .unwrap();
        let second = registry
            .get_or_create(&mut host, "Skin.001", Rgba::BLACK, 0.5)
            .unwrap();
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(second.name, "Skin.001");
        assert_eq!(registry.len(), 1);
        assert_eq!(host.materials().count(), 1);
    }

    #[test]
    fn create_unique_always_allocates() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let def = MaterialDef::new("Black", Rgba::BLACK, 0.5);
        let a = registry.create_unique(&mut host, &def).unwrap();
        let b = registry.create_unique(&mut host, &def).unwrap();
        let c = registry.create_unique(&mut host, &def).unwrap();
        assert_eq!(a.name, "Black");
        assert_eq!(b.name, "Black.001");
        assert_eq!(c.name, "Black.002");
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn out_of_range_parameters_are_rejected() {
        let mut host = MeshHost::new();
        let mut registry = MaterialRegistry::default();
        let err = registry
            .get_or_create(&mut host, "Hot", Rgba::new(1.5, 0.0, 0.0, 1.0), 0.2)
            .unwrap_err();
        assert!(matches!(err, FigureError::InvalidParameter { .. }));
        let err = registry
            .get_or_create(&mut host, "Rough", YELLOW, -0.1)
            .unwrap_err();
        assert!(matches!(err, FigureError::InvalidParameter { .. }));
        assert!(registry.is_empty());
    }

    #[test]
    fn require_reports_missing_dependency() {
        let registry = MaterialRegistry::default();
        let err = registry.require("Black", "smile").unwrap_err();
        assert_eq!(err, FigureError::missing("smile", "Black"));
    }

    #[test]
    fn host_failure_is_reported_with_material_name() {
        let mut host = MeshHost::new().with_allocation_budget(0);
        let mut registry = MaterialRegistry::default();
        let err = registry.get_or_create(&mut host, "Yellow", YELLOW, 0.2).unwrap_err();
        match err {
            FigureError::HostResourceFailure { context, resource, .. } => {
                assert_eq!(context, "material Yellow");
                assert_eq!(resource, "material");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
