//! Procedural assembly of the doll figure and its scene.
//!
//! Materials come from a [`MaterialRegistry`], primitives from a
//! [`PrimitiveFactory`], named parts from a [`PartBuilder`]. The
//! [`FigureAssembler`] lays the parts out and merges them into one [`Model`],
//! and the [`SceneComposer`] adds the base, light, camera and render setup.

mod assembler;
mod composer;
mod factory;
mod part;
mod registry;
mod summary;

pub use assembler::{FigureAssembler, FigureStep, Model};
pub use composer::{Scene, SceneComposer};
pub use factory::{validate_params, PrimitiveFactory};
pub use part::{assign_material, Part, PartBuilder};
pub use registry::{MaterialRef, MaterialRegistry};
pub use summary::SceneSummary;

use doll_core::{DollConfig, FigureError};
use doll_geom::Host;
use tracing::info_span;

/// Runs the whole pipeline on `host`: clear the scene, build and merge the
/// figure, then compose the scene around it. The first failure aborts.
pub fn generate<H: Host + ?Sized>(host: &mut H, config: &DollConfig) -> Result<Scene, FigureError> {
    let _span = info_span!("generate").entered();
    host.clear()
        .map_err(|err| FigureError::from(err).in_context("clear"))?;

    let mut registry = MaterialRegistry::new(config.material_keying);
    let model = FigureAssembler::new(
        &mut *host,
        &mut registry,
        &config.layout,
        &config.materials,
    )
    .assemble()?;
    SceneComposer::new(&config.scene, &config.materials.base).compose(host, &mut registry, model)
}
