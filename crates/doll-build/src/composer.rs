use crate::{MaterialRegistry, Model, Part, PartBuilder};
use doll_core::{
    Camera, CameraId, FigureError, Light, LightId, MaterialDef, PrimitiveParams, PrimitiveSpec,
    RenderSettings, Rgba, SceneSettings, Transform,
};
use doll_geom::Host;
use tracing::info;

/// The figure with its environment, ready for the host to render.
#[derive(Debug, Clone)]
pub struct Scene {
    pub model: Model,
    pub base: Part,
    pub light: (LightId, Light),
    pub camera: (CameraId, Camera),
    pub background: Rgba,
    pub render: RenderSettings,
}

pub struct SceneComposer<'a> {
    settings: &'a SceneSettings,
    base_material: &'a MaterialDef,
}

impl<'a> SceneComposer<'a> {
    pub fn new(settings: &'a SceneSettings, base_material: &'a MaterialDef) -> Self {
        Self {
            settings,
            base_material,
        }
    }

    pub fn compose<H: Host + ?Sized>(
        &self,
        host: &mut H,
        registry: &mut MaterialRegistry,
        model: Model,
    ) -> Result<Scene, FigureError> {
        let settings = self.settings;
        validate_settings(settings)?;

        let white = registry
            .get_or_create_def(&mut *host, self.base_material)
            .map_err(|err| err.in_context("scene"))?;
        let base_spec = PrimitiveSpec::new(
            PrimitiveParams::Cylinder {
                radius: settings.base.radius,
                depth: settings.base.depth,
            },
            Transform::at(settings.base.position),
        );
        let base = PartBuilder::new()
            .build(&mut *host, "base", base_spec, &white)
            .map_err(|err| err.in_context("scene"))?;

        let light_id = host
            .add_light(&settings.light)
            .map_err(|err| FigureError::from(err).in_context("scene/light"))?;
        let camera_id = host
            .add_camera(&settings.camera)
            .map_err(|err| FigureError::from(err).in_context("scene/camera"))?;
        host.set_background(settings.background)
            .map_err(|err| FigureError::from(err).in_context("scene/background"))?;
        host.set_render_settings(&settings.render)
            .map_err(|err| FigureError::from(err).in_context("scene/render"))?;

        info!(
            engine = ?settings.render.engine,
            samples = settings.render.samples,
            width = settings.render.resolution[0],
            height = settings.render.resolution[1],
            "scene composed"
        );
        Ok(Scene {
            model,
            base,
            light: (light_id, settings.light),
            camera: (camera_id, settings.camera),
            background: settings.background,
            render: settings.render,
        })
    }
}

/// Rejects environment values the host would accept but cannot render.
fn validate_settings(settings: &SceneSettings) -> Result<(), FigureError> {
    if !settings.background.is_normalized() {
        return Err(FigureError::invalid(
            "scene/background",
            format!("color {:?} outside [0, 1]", settings.background.components()),
        ));
    }
    let intensity = settings.light.intensity;
    if !intensity.is_finite() || intensity < 0.0 {
        return Err(FigureError::invalid(
            "scene/light",
            format!("intensity {intensity} must be finite and non-negative"),
        ));
    }
    let render = &settings.render;
    if render.samples == 0 {
        return Err(FigureError::invalid("scene/render", "sample count must be positive"));
    }
    if render.resolution.contains(&0) {
        return Err(FigureError::invalid(
            "scene/render",
            format!(
                "resolution {}x{} has a zero side",
                render.resolution[0], render.resolution[1]
            ),
        ));
    }
    Ok(())
}
