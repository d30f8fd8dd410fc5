//! Fixed-layout construction of the figure and the merge into one model.

use crate::{MaterialRef, MaterialRegistry, Part, PartBuilder};
use doll_core::{
    CircleFill, FigureError, FigureLayout, GeometryId, LimbLayout, MaterialPalette,
    PrimitiveParams, PrimitiveSpec, Transform,
};
use doll_geom::{Aabb, Host};
use std::fmt;
use tracing::{debug, info};

/// One stage of the figure layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FigureStep {
    Torso,
    Head,
    Arms,
    Legs,
    Eyes,
    Smile,
    Hair,
    Seam,
}

impl FigureStep {
    pub const STANDARD_ORDER: [FigureStep; 8] = [
        FigureStep::Torso,
        FigureStep::Head,
        FigureStep::Arms,
        FigureStep::Legs,
        FigureStep::Eyes,
        FigureStep::Smile,
        FigureStep::Hair,
        FigureStep::Seam,
    ];
}

impl fmt::Display for FigureStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FigureStep::Torso => "torso",
            FigureStep::Head => "head",
            FigureStep::Arms => "arms",
            FigureStep::Legs => "legs",
            FigureStep::Eyes => "eyes",
            FigureStep::Smile => "smile",
            FigureStep::Hair => "hair",
            FigureStep::Seam => "seam",
        };
        f.write_str(name)
    }
}

/// The merged figure. Individual parts are no longer addressable; only
/// their names and world bounds at merge time are kept.
#[derive(Debug, Clone)]
pub struct Model {
    pub geometry: GeometryId,
    pub part_names: Vec<String>,
    pub part_bounds: Vec<Aabb>,
    pub bounds: Aabb,
}

impl Model {
    pub fn primitive_count(&self) -> usize {
        self.part_names.len()
    }
}

/// Builds figure parts on a host and merges them.
///
/// Eyes own the dependency of the smile and the seam: both reuse the
/// material instance the last built eye was given.
pub struct FigureAssembler<'a, H: Host + ?Sized> {
    host: &'a mut H,
    registry: &'a mut MaterialRegistry,
    layout: &'a FigureLayout,
    palette: &'a MaterialPalette,
    builder: PartBuilder,
    parts: Vec<Part>,
    eye_material: Option<String>,
    completed: Vec<FigureStep>,
}

impl<'a, H: Host + ?Sized> FigureAssembler<'a, H> {
    pub fn new(
        host: &'a mut H,
        registry: &'a mut MaterialRegistry,
        layout: &'a FigureLayout,
        palette: &'a MaterialPalette,
    ) -> Self {
        Self {
            host,
            registry,
            layout,
            palette,
            builder: PartBuilder::new(),
            parts: Vec::new(),
            eye_material: None,
            completed: Vec::new(),
        }
    }

    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    pub fn completed(&self) -> &[FigureStep] {
        &self.completed
    }

    /// Builds the figure in the standard order and merges it.
    pub fn assemble(self) -> Result<Model, FigureError> {
        self.assemble_in(&FigureStep::STANDARD_ORDER)
    }

    /// Builds every step in `order`, which must name each step exactly once,
    /// then merges.
    pub fn assemble_in(mut self, order: &[FigureStep]) -> Result<Model, FigureError> {
        for (i, step) in order.iter().enumerate() {
            if order[..i].contains(step) {
                return Err(FigureError::invalid(
                    "figure",
                    format!("step `{step}` listed more than once"),
                ));
            }
        }
        for step in order {
            self.run(*step)?;
        }
        self.merge()
    }

    pub fn run(&mut self, step: FigureStep) -> Result<(), FigureError> {
        if self.completed.contains(&step) {
            return Err(FigureError::invalid(
                step.to_string(),
                "step has already been built",
            ));
        }
        let before = self.parts.len();
        let built = match step {
            FigureStep::Torso => self.build_torso(),
            FigureStep::Head => self.build_head(),
            FigureStep::Arms => self.build_arms(),
            FigureStep::Legs => self.build_legs(),
            FigureStep::Eyes => self.build_eyes(),
            FigureStep::Smile => self.build_smile(),
            FigureStep::Hair => self.build_hair(),
            FigureStep::Seam => self.build_seam(),
        };
        built.map_err(|err| err.in_context(&step.to_string()))?;
        debug!(%step, parts = self.parts.len() - before, "step complete");
        self.completed.push(step);
        Ok(())
    }

    fn skin(&mut self) -> Result<MaterialRef, FigureError> {
        self.registry
            .get_or_create_def(&mut *self.host, &self.palette.skin)
    }

    fn eye_material(&self, part: &str) -> Result<MaterialRef, FigureError> {
        match &self.eye_material {
            Some(name) => self.registry.require(name, part),
            None => Err(FigureError::missing(part, self.palette.features.name.as_str())),
        }
    }

    fn add(
        &mut self,
        name: &str,
        params: PrimitiveParams,
        transform: Transform,
        material: &MaterialRef,
    ) -> Result<(), FigureError> {
        let part = self.builder.build(
            &mut *self.host,
            name,
            PrimitiveSpec::new(params, transform),
            material,
        )?;
        self.parts.push(part);
        Ok(())
    }

    pub fn build_torso(&mut self) -> Result<(), FigureError> {
        let skin = self.skin()?;
        let torso = &self.layout.torso;
        let params = PrimitiveParams::Cone {
            radius1: torso.radius1,
            radius2: torso.radius2,
            depth: torso.depth,
        };
        let transform = Transform::at(torso.position).with_scale(torso.scale);
        self.add("dress", params, transform, &skin)
    }

    pub fn build_head(&mut self) -> Result<(), FigureError> {
        let skin = self.skin()?;
        let head = &self.layout.head;
        let params = PrimitiveParams::Sphere {
            radius: head.radius,
        };
        let transform = Transform::at(head.position);
        self.add("head", params, transform, &skin)
    }

    pub fn build_arms(&mut self) -> Result<(), FigureError> {
        let arms = self.layout.arms.clone();
        self.build_limb_pair(&arms, "leftArm", "rightArm")
    }

    pub fn build_legs(&mut self) -> Result<(), FigureError> {
        let legs = self.layout.legs.clone();
        self.build_limb_pair(&legs, "leftLeg", "rightLeg")
    }

    fn build_limb_pair(
        &mut self,
        limb: &LimbLayout,
        left: &str,
        right: &str,
    ) -> Result<(), FigureError> {
        let skin = self.skin()?;
        let params = PrimitiveParams::Cylinder {
            radius: limb.radius,
            depth: limb.depth,
        };
        let right_transform =
            Transform::at([limb.x_offset, 0.0, limb.height]).with_rotation(limb.rotation);
        self.add(left, params.clone(), right_transform.mirrored_x(), &skin)?;
        self.add(right, params, right_transform, &skin)
    }

    /// Each eye gets its own material instance.
    pub fn build_eyes(&mut self) -> Result<(), FigureError> {
        let eyes = self.layout.eyes.clone();
        let params = PrimitiveParams::Circle {
            radius: eyes.radius,
            fill: CircleFill::TriangleFan,
        };
        let right = Transform::at([eyes.x_offset, eyes.y, eyes.height]).with_rotation(eyes.rotation);
        for (name, transform) in [("leftEye", right.mirrored_x()), ("rightEye", right)] {
            let material = self
                .registry
                .create_unique(&mut *self.host, &self.palette.features)
                .map_err(|err| err.in_context(name))?;
            self.add(name, params.clone(), transform, &material)?;
            self.eye_material = Some(material.name.clone());
        }
        Ok(())
    }

    /// Requires the eyes: the smile shares their material.
    pub fn build_smile(&mut self) -> Result<(), FigureError> {
        let material = self.eye_material("smile")?;
        let smile = &self.layout.smile;
        let params = PrimitiveParams::BezierCurve {
            controls: smile.controls,
            resolution: smile.resolution,
            bevel_depth: smile.bevel_depth,
        };
        let transform = Transform::at(smile.position).with_rotation(smile.rotation);
        self.add("smile", params, transform, &material)
    }

    pub fn build_hair(&mut self) -> Result<(), FigureError> {
        let skin = self.skin()?;
        let hair = self.layout.hair.clone();
        let params = PrimitiveParams::Cube { size: hair.size };
        for (i, x) in hair.offsets.iter().enumerate() {
            let transform = Transform::at([*x, hair.y, hair.height]).with_scale(hair.scale);
            self.add(&format!("hairStrand{i}"), params.clone(), transform, &skin)?;
        }
        Ok(())
    }

    /// Requires the eyes: the seam shares their material.
    pub fn build_seam(&mut self) -> Result<(), FigureError> {
        let material = self.eye_material("seam")?;
        let seam = &self.layout.seam;
        let params = PrimitiveParams::Cube { size: seam.size };
        let transform = Transform::at(seam.position).with_scale(seam.scale);
        self.add("seam", params, transform, &material)
    }

    /// Joins every built part into one model. All layout steps must have run.
    pub fn merge(self) -> Result<Model, FigureError> {
        if let Some(step) = FigureStep::STANDARD_ORDER
            .iter()
            .find(|step| !self.completed.contains(*step))
        {
            return Err(FigureError::missing("merge", step.to_string()));
        }

        let mut part_names = Vec::with_capacity(self.parts.len());
        let mut part_bounds = Vec::with_capacity(self.parts.len());
        let mut ids = Vec::with_capacity(self.parts.len());
        for part in self.parts {
            let bounds = self
                .host
                .world_bounds(part.geometry())
                .map_err(|err| FigureError::from(err).in_context(part.name()))?;
            part_bounds.push(bounds);
            ids.push(part.geometry());
            part_names.push(part.name().to_string());
        }

        let geometry = self
            .host
            .join(&ids)
            .map_err(|err| FigureError::from(err).in_context("merge"))?;
        let bounds = self
            .host
            .world_bounds(geometry)
            .map_err(|err| FigureError::from(err).in_context("merge"))?;
        info!(
            primitives = part_names.len(),
            geometry,
            "merged figure into one model"
        );
        Ok(Model {
            geometry,
            part_names,
            part_bounds,
            bounds,
        })
    }
}
