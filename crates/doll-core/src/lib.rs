//! Core model types shared by the geometry host and the figure builder.

mod config;
mod error;

pub use config::*;
pub use error::*;

use serde::{Deserialize, Serialize};
use std::fmt;

pub type GeometryId = u64;
pub type MaterialId = u64;
pub type LightId = u64;
pub type CameraId = u64;

/// Linear RGBA color, every channel in `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba(pub [f32; 4]);

impl Rgba {
    pub const BLACK: Rgba = Rgba([0.0, 0.0, 0.0, 1.0]);
    pub const WHITE: Rgba = Rgba([1.0, 1.0, 1.0, 1.0]);

    pub const fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self([r, g, b, a])
    }

    pub fn components(&self) -> [f32; 4] {
        self.0
    }

    pub fn is_normalized(&self) -> bool {
        self.0.iter().all(|c| unit_interval(*c))
    }
}

/// True when `value` is finite and inside `[0, 1]`.
pub fn unit_interval(value: f32) -> bool {
    value.is_finite() && (0.0..=1.0).contains(&value)
}

/// Placement of a primitive in world space. Rotation is XYZ Euler in radians.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
    pub scale: [f32; 3],
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: [0.0; 3],
            scale: [1.0; 3],
        }
    }
}

impl Transform {
    pub fn at(position: [f32; 3]) -> Self {
        Self {
            position,
            ..Self::default()
        }
    }

    pub fn with_rotation(mut self, rotation: [f32; 3]) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn with_scale(mut self, scale: [f32; 3]) -> Self {
        self.scale = scale;
        self
    }

    /// Same transform reflected across the YZ plane (x position negated).
    pub fn mirrored_x(mut self) -> Self {
        self.position[0] = -self.position[0];
        self
    }

    pub fn is_finite(&self) -> bool {
        self.position
            .iter()
            .chain(&self.rotation)
            .chain(&self.scale)
            .all(|v| v.is_finite())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ShapeKind {
    Cone,
    Sphere,
    Cylinder,
    Circle,
    Cube,
    BezierCurve,
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShapeKind::Cone => "cone",
            ShapeKind::Sphere => "sphere",
            ShapeKind::Cylinder => "cylinder",
            ShapeKind::Circle => "circle",
            ShapeKind::Cube => "cube",
            ShapeKind::BezierCurve => "bezier curve",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleFill {
    /// Outline only.
    Nothing,
    #[default]
    TriangleFan,
}

/// Cubic bezier segment: two endpoints and the handles pulling on them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BezierControls {
    pub start: [f32; 3],
    pub start_handle: [f32; 3],
    pub end_handle: [f32; 3],
    pub end: [f32; 3],
}

/// Shape-specific size parameters. The variant determines the shape kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PrimitiveParams {
    Cone {
        radius1: f32,
        radius2: f32,
        depth: f32,
    },
    Sphere {
        radius: f32,
    },
    Cylinder {
        radius: f32,
        depth: f32,
    },
    Circle {
        radius: f32,
        #[serde(default)]
        fill: CircleFill,
    },
    Cube {
        size: f32,
    },
    BezierCurve {
        controls: BezierControls,
        resolution: u32,
        bevel_depth: f32,
    },
}

impl PrimitiveParams {
    pub fn kind(&self) -> ShapeKind {
        match self {
            PrimitiveParams::Cone { .. } => ShapeKind::Cone,
            PrimitiveParams::Sphere { .. } => ShapeKind::Sphere,
            PrimitiveParams::Cylinder { .. } => ShapeKind::Cylinder,
            PrimitiveParams::Circle { .. } => ShapeKind::Circle,
            PrimitiveParams::Cube { .. } => ShapeKind::Cube,
            PrimitiveParams::BezierCurve { .. } => ShapeKind::BezierCurve,
        }
    }

    pub fn curve(&self) -> Option<&BezierControls> {
        match self {
            PrimitiveParams::BezierCurve { controls, .. } => Some(controls),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrimitiveSpec {
    pub params: PrimitiveParams,
    pub transform: Transform,
}

impl PrimitiveSpec {
    pub fn new(params: PrimitiveParams, transform: Transform) -> Self {
        Self { params, transform }
    }

    pub fn kind(&self) -> ShapeKind {
        self.params.kind()
    }
}

/// Request for a shading definition, before the host has allocated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialDef {
    pub name: String,
    pub base_color: Rgba,
    pub roughness: f32,
}

impl MaterialDef {
    pub fn new(name: impl Into<String>, base_color: Rgba, roughness: f32) -> Self {
        Self {
            name: name.into(),
            base_color,
            roughness,
        }
    }
}

/// A material the host has allocated. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Material {
    pub id: MaterialId,
    pub name: String,
    pub base_color: Rgba,
    pub roughness: f32,
}

impl Material {
    pub fn matches(&self, base_color: Rgba, roughness: f32) -> bool {
        self.base_color == base_color && self.roughness == roughness
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LightKind {
    #[default]
    Sun,
    Point,
    Spot,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Light {
    pub kind: LightKind,
    pub position: [f32; 3],
    pub intensity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Camera {
    pub position: [f32; 3],
    pub rotation: [f32; 3],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderEngine {
    #[default]
    Cycles,
    Eevee,
    Workbench,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSettings {
    pub engine: RenderEngine,
    pub samples: u32,
    pub resolution: [u32; 2],
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirrored_transform_only_flips_x() {
        let t = Transform::at([0.6, 0.1, 1.2])
            .with_rotation([0.0, 1.0, 0.0])
            .with_scale([1.0, 0.5, 1.0]);
        let m = t.mirrored_x();
        assert_eq!(m.position, [-0.6, 0.1, 1.2]);
        assert_eq!(m.rotation, t.rotation);
        assert_eq!(m.scale, t.scale);
    }

    #[test]
    fn params_report_kind_and_curve() {
        let sphere = PrimitiveParams::Sphere { radius: 0.22 };
        assert_eq!(sphere.kind(), ShapeKind::Sphere);
        assert!(sphere.curve().is_none());

        let controls = BezierControls {
            start: [-0.1, 0.0, 0.0],
            start_handle: [-0.05, 0.0, -0.03],
            end_handle: [0.05, 0.0, -0.03],
            end: [0.1, 0.0, 0.0],
        };
        let curve = PrimitiveParams::BezierCurve {
            controls,
            resolution: 64,
            bevel_depth: 0.015,
        };
        assert_eq!(curve.kind(), ShapeKind::BezierCurve);
        assert_eq!(curve.curve(), Some(&controls));
    }

    #[test]
    fn primitive_params_json_is_tagged() {
        let params = PrimitiveParams::Cone {
            radius1: 0.8,
            radius2: 0.2,
            depth: 1.4,
        };
        let json = serde_json::to_string(&params).unwrap();
        assert!(json.contains("\"kind\":\"cone\""));
        let back: PrimitiveParams = serde_json::from_str(&json).unwrap();
        assert_eq!(params, back);
    }

    #[test]
    fn rgba_range_check() {
        assert!(Rgba::new(1.0, 0.8, 0.0, 1.0).is_normalized());
        assert!(!Rgba::new(1.2, 0.0, 0.0, 1.0).is_normalized());
        assert!(!Rgba::new(f32::NAN, 0.0, 0.0, 1.0).is_normalized());
    }
}
