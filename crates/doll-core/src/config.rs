//! Layout and scene configuration. Defaults reproduce the reference figure.

use crate::{
    unit_interval, BezierControls, Camera, Light, LightKind, MaterialDef, RenderEngine,
    RenderSettings, Rgba,
};
use serde::{Deserialize, Deserializer, Serialize};
use std::f32::consts::FRAC_PI_2;
use thiserror::Error;

/// Hair fringe strand x-offsets, left to right.
pub const HAIR_OFFSETS: [f32; 10] = [
    -0.18, -0.14, -0.10, -0.06, -0.02, 0.02, 0.06, 0.10, 0.14, 0.18,
];

/// Roughness the host assigns when a material does not set one.
pub const DEFAULT_ROUGHNESS: f32 = 0.5;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid configuration value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// How the material registry decides two requests refer to the same material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MaterialKeying {
    /// A name always resolves to the first material created under it.
    #[default]
    Name,
    /// Name, color and roughness together identify a material.
    NameAndParameters,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DollConfig {
    pub materials: MaterialPalette,
    pub layout: FigureLayout,
    pub scene: SceneSettings,
    pub material_keying: MaterialKeying,
}

impl DollConfig {
    /// Parses a (possibly partial) JSON document; missing fields keep defaults.
    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let config: DollConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for def in [
            &self.materials.skin,
            &self.materials.features,
            &self.materials.base,
        ] {
            if def.name.is_empty() {
                return Err(ConfigError::Invalid {
                    field: "materials",
                    reason: "material name is empty".to_string(),
                });
            }
            if !def.base_color.is_normalized() || !unit_interval(def.roughness) {
                return Err(ConfigError::Invalid {
                    field: "materials",
                    reason: format!("`{}` has color or roughness outside [0, 1]", def.name),
                });
            }
        }
        if !self.scene.background.is_normalized() {
            return Err(ConfigError::Invalid {
                field: "scene.background",
                reason: "color outside [0, 1]".to_string(),
            });
        }
        let intensity = self.scene.light.intensity;
        if !intensity.is_finite() || intensity < 0.0 {
            return Err(ConfigError::Invalid {
                field: "scene.light.intensity",
                reason: format!("{intensity} must be finite and non-negative"),
            });
        }
        let render = &self.scene.render;
        if render.samples == 0 {
            return Err(ConfigError::Invalid {
                field: "scene.render.samples",
                reason: "must be positive".to_string(),
            });
        }
        if render.resolution.contains(&0) {
            return Err(ConfigError::Invalid {
                field: "scene.render.resolution",
                reason: format!("{}x{} has a zero side", render.resolution[0], render.resolution[1]),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialPalette {
    /// Body, limbs and hair.
    pub skin: MaterialDef,
    /// Eyes, smile and seam.
    pub features: MaterialDef,
    pub base: MaterialDef,
}

impl Default for MaterialPalette {
    fn default() -> Self {
        Self {
            skin: MaterialDef::new("Yellow", Rgba::new(1.0, 0.8, 0.0, 1.0), 0.2),
            features: MaterialDef::new("Black", Rgba::BLACK, DEFAULT_ROUGHNESS),
            base: MaterialDef::new("White", Rgba::WHITE, DEFAULT_ROUGHNESS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureLayout {
    pub torso: TorsoLayout,
    pub head: HeadLayout,
    #[serde(deserialize_with = "arms_over_defaults")]
    pub arms: LimbLayout,
    #[serde(deserialize_with = "legs_over_defaults")]
    pub legs: LimbLayout,
    pub eyes: EyeLayout,
    pub smile: SmileLayout,
    pub hair: HairLayout,
    pub seam: SeamLayout,
}

impl Default for FigureLayout {
    fn default() -> Self {
        Self {
            torso: TorsoLayout::default(),
            head: HeadLayout::default(),
            arms: LimbLayout::arms(),
            legs: LimbLayout::legs(),
            eyes: EyeLayout::default(),
            smile: SmileLayout::default(),
            hair: HairLayout::default(),
            seam: SeamLayout::default(),
        }
    }
}

/// Flattened cone forming the dress.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TorsoLayout {
    pub radius1: f32,
    pub radius2: f32,
    pub depth: f32,
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for TorsoLayout {
    fn default() -> Self {
        Self {
            radius1: 0.8,
            radius2: 0.2,
            depth: 1.4,
            position: [0.0, 0.0, 0.7],
            scale: [1.0, 0.7, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeadLayout {
    pub radius: f32,
    pub position: [f32; 3],
}

impl Default for HeadLayout {
    fn default() -> Self {
        Self {
            radius: 0.22,
            position: [0.0, 0.0, 1.45],
        }
    }
}

/// Cylinder pair mirrored at `x = ±x_offset`.
///
/// Arms and legs share this shape but not their defaults; a partial section
/// is filled from the defaults of the limb it describes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LimbLayout {
    pub radius: f32,
    pub depth: f32,
    pub x_offset: f32,
    pub height: f32,
    pub rotation: [f32; 3],
}

impl LimbLayout {
    /// Horizontal arms, rotated onto the X axis.
    pub fn arms() -> Self {
        Self {
            radius: 0.05,
            depth: 0.9,
            x_offset: 0.6,
            height: 1.2,
            rotation: [0.0, FRAC_PI_2, 0.0],
        }
    }

    pub fn legs() -> Self {
        Self {
            radius: 0.05,
            depth: 0.4,
            x_offset: 0.12,
            height: 0.2,
            rotation: [0.0; 3],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct LimbOverrides {
    radius: Option<f32>,
    depth: Option<f32>,
    x_offset: Option<f32>,
    height: Option<f32>,
    rotation: Option<[f32; 3]>,
}

impl LimbOverrides {
    fn apply(self, base: LimbLayout) -> LimbLayout {
        LimbLayout {
            radius: self.radius.unwrap_or(base.radius),
            depth: self.depth.unwrap_or(base.depth),
            x_offset: self.x_offset.unwrap_or(base.x_offset),
            height: self.height.unwrap_or(base.height),
            rotation: self.rotation.unwrap_or(base.rotation),
        }
    }
}

fn arms_over_defaults<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LimbLayout, D::Error> {
    Ok(LimbOverrides::deserialize(deserializer)?.apply(LimbLayout::arms()))
}

fn legs_over_defaults<'de, D: Deserializer<'de>>(deserializer: D) -> Result<LimbLayout, D::Error> {
    Ok(LimbOverrides::deserialize(deserializer)?.apply(LimbLayout::legs()))
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EyeLayout {
    pub radius: f32,
    pub x_offset: f32,
    pub y: f32,
    pub height: f32,
    pub rotation: [f32; 3],
}

impl Default for EyeLayout {
    fn default() -> Self {
        Self {
            radius: 0.03,
            x_offset: 0.08,
            y: 0.22,
            height: 1.45,
            rotation: [FRAC_PI_2, 0.0, 0.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmileLayout {
    pub controls: BezierControls,
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub resolution: u32,
    pub bevel_depth: f32,
}

impl Default for SmileLayout {
    fn default() -> Self {
        Self {
            controls: BezierControls {
                start: [-0.1, 0.0, 0.0],
                start_handle: [-0.05, 0.0, -0.03],
                end_handle: [0.05, 0.0, -0.03],
                end: [0.1, 0.0, 0.0],
            },
            position: [0.0, 0.22, 1.40],
            rotation: [0.0; 3],
            resolution: 64,
            bevel_depth: 0.015,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HairLayout {
    pub size: f32,
    pub offsets: Vec<f32>,
    pub y: f32,
    pub height: f32,
    pub scale: [f32; 3],
}

impl Default for HairLayout {
    fn default() -> Self {
        Self {
            size: 0.04,
            offsets: HAIR_OFFSETS.to_vec(),
            y: 0.15,
            height: 1.62,
            scale: [1.0, 0.5, 1.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeamLayout {
    pub size: f32,
    pub position: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for SeamLayout {
    fn default() -> Self {
        Self {
            size: 0.04,
            position: [0.0, 0.35, 0.8],
            scale: [0.5, 0.1, 10.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    pub base: BaseLayout,
    pub light: Light,
    pub camera: Camera,
    pub background: Rgba,
    pub render: RenderSettings,
}

impl Default for SceneSettings {
    fn default() -> Self {
        Self {
            base: BaseLayout::default(),
            light: Light {
                kind: LightKind::Sun,
                position: [5.0, 5.0, 7.0],
                intensity: 5.0,
            },
            camera: Camera {
                position: [3.0, -3.0, 3.0],
                rotation: [60f32.to_radians(), 0.0, 45f32.to_radians()],
            },
            background: Rgba::new(0.8, 0.9, 1.0, 1.0),
            render: RenderSettings {
                engine: RenderEngine::Cycles,
                samples: 128,
                resolution: [1920, 1080],
            },
        }
    }
}

/// Platform cylinder the figure stands on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BaseLayout {
    pub radius: f32,
    pub depth: f32,
    pub position: [f32; 3],
}

impl Default for BaseLayout {
    fn default() -> Self {
        Self {
            radius: 0.4,
            depth: 0.05,
            position: [0.0; 3],
        }
    }
}
