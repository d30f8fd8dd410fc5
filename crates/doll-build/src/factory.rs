use doll_core::{FigureError, GeometryId, PrimitiveParams, PrimitiveSpec, Transform};
use doll_geom::Host;

/// Uniform front end over the host's primitive constructors.
#[derive(Debug, Default)]
pub struct PrimitiveFactory {
    created: usize,
}

impl PrimitiveFactory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of primitives this factory has allocated.
    pub fn created(&self) -> usize {
        self.created
    }

    /// Allocates the primitive on the host and places it with `spec.transform`.
    pub fn create<H: Host + ?Sized>(
        &mut self,
        host: &mut H,
        spec: &PrimitiveSpec,
    ) -> Result<GeometryId, FigureError> {
        validate_params(&spec.params)?;
        validate_transform(&spec.transform)?;
        let id = host.add_primitive(&spec.params)?;
        host.set_transform(id, &spec.transform)?;
        self.created += 1;
        Ok(id)
    }
}

pub fn validate_params(params: &PrimitiveParams) -> Result<(), FigureError> {
    let context = params.kind().to_string();
    match *params {
        PrimitiveParams::Cone {
            radius1,
            radius2,
            depth,
        } => {
            positive(&context, "radius1", radius1)?;
            non_negative(&context, "radius2", radius2)?;
            positive(&context, "depth", depth)
        }
        PrimitiveParams::Sphere { radius } => positive(&context, "radius", radius),
        PrimitiveParams::Cylinder { radius, depth } => {
            positive(&context, "radius", radius)?;
            positive(&context, "depth", depth)
        }
        PrimitiveParams::Circle { radius, .. } => positive(&context, "radius", radius),
        PrimitiveParams::Cube { size } => positive(&context, "size", size),
        PrimitiveParams::BezierCurve {
            controls,
            resolution,
            bevel_depth,
        } => {
            if resolution == 0 {
                return Err(FigureError::invalid(context, "resolution must be positive"));
            }
            let points = [
                controls.start,
                controls.start_handle,
                controls.end_handle,
                controls.end,
            ];
            if points.iter().flatten().any(|v| !v.is_finite()) {
                return Err(FigureError::invalid(context, "control points must be finite"));
            }
            non_negative(&context, "bevel_depth", bevel_depth)
        }
    }
}

fn validate_transform(transform: &Transform) -> Result<(), FigureError> {
    if !transform.is_finite() {
        return Err(FigureError::invalid("transform", "components must be finite"));
    }
    if transform.scale.contains(&0.0) {
        return Err(FigureError::invalid(
            "transform",
            format!("scale {:?} collapses an axis", transform.scale),
        ));
    }
    Ok(())
}

fn positive(context: &str, field: &str, value: f32) -> Result<(), FigureError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(FigureError::invalid(
            context,
            format!("{field} must be positive, got {value}"),
        ))
    }
}

fn non_negative(context: &str, field: &str, value: f32) -> Result<(), FigureError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(FigureError::invalid(
            context,
            format!("{field} must not be negative, got {value}"),
        ))
    }
}
