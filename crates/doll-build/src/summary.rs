use crate::Scene;
use doll_core::{Camera, Light, RenderSettings, Rgba};
use serde::Serialize;

/// Serializable overview of a composed scene.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneSummary {
    pub model: ModelSummary,
    pub base: PartSummary,
    pub light: Light,
    pub camera: Camera,
    pub background: Rgba,
    pub render: RenderSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSummary {
    pub geometry: u64,
    pub primitive_count: usize,
    pub parts: Vec<String>,
    pub bounds: [[f32; 3]; 2],
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PartSummary {
    pub name: String,
    pub material: String,
}

impl Scene {
    pub fn summary(&self) -> SceneSummary {
        SceneSummary {
            model: ModelSummary {
                geometry: self.model.geometry,
                primitive_count: self.model.primitive_count(),
                parts: self.model.part_names.clone(),
                bounds: [self.model.bounds.min, self.model.bounds.max],
            },
            base: PartSummary {
                name: self.base.name().to_string(),
                material: self.base.material().name.clone(),
            },
            light: self.light.1,
            camera: self.camera.1,
            background: self.background,
            render: self.render,
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::generate;
    use doll_core::DollConfig;
    use doll_geom::MeshHost;

    #[test]
    fn summary_serializes_scene() {
        let mut host = MeshHost::new();
        let scene = generate(&mut host, &DollConfig::default()).unwrap();
        let summary = scene.summary();
        assert_eq!(summary.model.primitive_count, 20);
        assert_eq!(summary.model.parts[0], "dress");
        assert_eq!(summary.base.material, "White");

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["render"]["engine"], "cycles");
        assert_eq!(json["render"]["samples"], 128);
        assert_eq!(json["render"]["resolution"][0], 1920);
        assert_eq!(json["light"]["kind"], "sun");
        assert_eq!(json["model"]["parts"].as_array().unwrap().len(), 20);
    }
}
