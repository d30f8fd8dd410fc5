//! Primitive tessellation. Cubes and cylinders are built as B-rep solids and
//! triangulated; cones, spheres, discs and curves are generated directly.

use crate::{GeomError, TriMesh};
use doll_core::{BezierControls, CircleFill, PrimitiveParams};
use glam::Vec3;
use std::f32::consts::{PI, TAU};
use truck_meshalgo::{filters::*, tessellation::*};
use truck_modeling::{builder, InnerSpace, Point3, Rad, Solid, Vector3};
use truck_polymesh::{PolygonMesh, StandardAttributes, StandardVertex, TOLERANCE};

/// Host defaults for round primitives.
const SEGMENTS: u32 = 32;
const RINGS: u32 = 16;
const BEVEL_SEGMENTS: u32 = 12;

/// Local-space mesh for a primitive, centered on the origin, Z up.
pub fn tessellate(params: &PrimitiveParams, tolerance: f64) -> Result<TriMesh, GeomError> {
    let mesh = match *params {
        PrimitiveParams::Cone {
            radius1,
            radius2,
            depth,
        } => cone(radius1, radius2, depth, SEGMENTS),
        PrimitiveParams::Sphere { radius } => uv_sphere(radius, SEGMENTS, RINGS),
        PrimitiveParams::Cylinder { radius, depth } => {
            tessellate_solid(&make_cylinder(radius as f64, depth as f64)?, tolerance)
        }
        PrimitiveParams::Circle { radius, fill } => circle(radius, fill, SEGMENTS),
        PrimitiveParams::Cube { size } => {
            let s = size as f64;
            tessellate_solid(&make_box(s, s, s), tolerance)
        }
        PrimitiveParams::BezierCurve {
            controls,
            resolution,
            bevel_depth,
        } => bezier_tube(&controls, resolution, bevel_depth),
    };
    Ok(mesh)
}

pub fn make_box(w: f64, h: f64, d: f64) -> Solid {
    let v = builder::vertex(Point3::new(-w / 2.0, -h / 2.0, -d / 2.0));
    let e = builder::tsweep(&v, Vector3::unit_x() * w);
    let f = builder::tsweep(&e, Vector3::unit_y() * h);
    builder::tsweep(&f, Vector3::unit_z() * d)
}

/// Cylinder along Z, centered on the origin.
pub fn make_cylinder(r: f64, h: f64) -> Result<Solid, GeomError> {
    let vertex = builder::vertex(Point3::new(r, 0.0, -h / 2.0));
    let circle = builder::rsweep(
        &vertex,
        Point3::new(0.0, 0.0, 0.0),
        Vector3::unit_z(),
        Rad(std::f64::consts::TAU),
    );
    let disk = builder::try_attach_plane(&[circle])
        .map_err(|err| GeomError::Kernel(format!("cylinder cap: {err}")))?;
    Ok(builder::tsweep(&disk, Vector3::new(0.0, 0.0, h)))
}

pub fn tessellate_solid(solid: &Solid, tolerance: f64) -> TriMesh {
    let mut poly = solid.triangulation(tolerance).to_polygon();
    poly.put_together_same_attrs(TOLERANCE * 10.0)
        .remove_degenerate_faces()
        .remove_unused_attrs();
    polygon_to_trimesh(&poly)
}

pub fn bezier_point(controls: &BezierControls, t: f32) -> Vec3 {
    let [p0, p1, p2, p3] = control_points(controls);
    let u = 1.0 - t;
    p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
}

fn bezier_tangent(controls: &BezierControls, t: f32) -> Vec3 {
    let [p0, p1, p2, p3] = control_points(controls);
    let u = 1.0 - t;
    (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t)
}

fn control_points(controls: &BezierControls) -> [Vec3; 4] {
    [
        Vec3::from_array(controls.start),
        Vec3::from_array(controls.start_handle),
        Vec3::from_array(controls.end_handle),
        Vec3::from_array(controls.end),
    ]
}

fn uv_sphere(radius: f32, segments: u32, rings: u32) -> TriMesh {
    let mut mesh = TriMesh::default();
    for ring in 0..=rings {
        let (sin_t, cos_t) = (PI * ring as f32 / rings as f32).sin_cos();
        for seg in 0..=segments {
            let (sin_p, cos_p) = (TAU * seg as f32 / segments as f32).sin_cos();
            let n = Vec3::new(sin_t * cos_p, sin_t * sin_p, cos_t);
            mesh.push_vertex(n * radius, n);
        }
    }
    let stride = segments + 1;
    for ring in 0..rings {
        for seg in 0..segments {
            let a = ring * stride + seg;
            let b = a + stride;
            mesh.push_triangle(a, b, a + 1);
            mesh.push_triangle(a + 1, b, b + 1);
        }
    }
    mesh
}

/// Truncated cone, `radius1` at the bottom, `radius2` at the top. A zero top
/// radius closes to a point and gets no top cap.
fn cone(radius1: f32, radius2: f32, depth: f32, segments: u32) -> TriMesh {
    let half = depth * 0.5;
    let slope = (radius1 - radius2) / depth;
    let mut mesh = TriMesh::default();
    for seg in 0..=segments {
        let (s, c) = (TAU * seg as f32 / segments as f32).sin_cos();
        let normal = Vec3::new(c, s, slope);
        mesh.push_vertex(Vec3::new(c * radius1, s * radius1, -half), normal);
        mesh.push_vertex(Vec3::new(c * radius2, s * radius2, half), normal);
    }
    for seg in 0..segments {
        let i = seg * 2;
        mesh.push_triangle(i, i + 2, i + 1);
        mesh.push_triangle(i + 1, i + 2, i + 3);
    }
    disk(&mut mesh, radius1, -half, -Vec3::Z, segments);
    if radius2 > 0.0 {
        disk(&mut mesh, radius2, half, Vec3::Z, segments);
    }
    mesh
}

fn circle(radius: f32, fill: CircleFill, segments: u32) -> TriMesh {
    let mut mesh = TriMesh::default();
    match fill {
        CircleFill::TriangleFan => disk(&mut mesh, radius, 0.0, Vec3::Z, segments),
        CircleFill::Nothing => {
            for seg in 0..segments {
                let (s, c) = (TAU * seg as f32 / segments as f32).sin_cos();
                mesh.push_vertex(Vec3::new(c * radius, s * radius, 0.0), Vec3::Z);
            }
        }
    }
    mesh
}

/// Triangle fan around a center vertex, wound to face `normal`.
fn disk(mesh: &mut TriMesh, radius: f32, z: f32, normal: Vec3, segments: u32) {
    let center = mesh.push_vertex(Vec3::new(0.0, 0.0, z), normal);
    let first = center + 1;
    for seg in 0..segments {
        let (s, c) = (TAU * seg as f32 / segments as f32).sin_cos();
        mesh.push_vertex(Vec3::new(c * radius, s * radius, z), normal);
    }
    for seg in 0..segments {
        let a = first + seg;
        let b = first + (seg + 1) % segments;
        if normal.z >= 0.0 {
            mesh.push_triangle(center, a, b);
        } else {
            mesh.push_triangle(center, b, a);
        }
    }
}

/// Sweeps a circle of radius `bevel_depth` along the curve. Without a bevel
/// the curve is just its sampled centerline.
fn bezier_tube(controls: &BezierControls, resolution: u32, bevel_depth: f32) -> TriMesh {
    let samples = resolution.max(1);
    let mut mesh = TriMesh::default();
    if bevel_depth <= 0.0 {
        for i in 0..=samples {
            let t = i as f32 / samples as f32;
            mesh.push_vertex(bezier_point(controls, t), Vec3::Z);
        }
        return mesh;
    }

    for i in 0..=samples {
        let t = i as f32 / samples as f32;
        let center = bezier_point(controls, t);
        let tangent = bezier_tangent(controls, t).normalize_or_zero();
        let tangent = if tangent == Vec3::ZERO { Vec3::X } else { tangent };
        let reference = if tangent.z.abs() < 0.9 { Vec3::Z } else { Vec3::X };
        let side = tangent.cross(reference).normalize();
        let up = side.cross(tangent);
        for k in 0..BEVEL_SEGMENTS {
            let (s, c) = (TAU * k as f32 / BEVEL_SEGMENTS as f32).sin_cos();
            let n = side * c + up * s;
            mesh.push_vertex(center + n * bevel_depth, n);
        }
    }
    for i in 0..samples {
        let ring = i * BEVEL_SEGMENTS;
        for k in 0..BEVEL_SEGMENTS {
            let a = ring + k;
            let b = ring + (k + 1) % BEVEL_SEGMENTS;
            let c = a + BEVEL_SEGMENTS;
            let d = b + BEVEL_SEGMENTS;
            mesh.push_triangle(a, c, b);
            mesh.push_triangle(b, c, d);
        }
    }
    mesh
}

fn polygon_to_trimesh(poly: &PolygonMesh<StandardVertex, StandardAttributes>) -> TriMesh {
    let attrs = poly.attributes();
    let mut mesh = TriMesh::default();

    for tri in poly.faces().triangle_iter() {
        let p0 = attrs.positions[tri[0].pos];
        let p1 = attrs.positions[tri[1].pos];
        let p2 = attrs.positions[tri[2].pos];
        let fallback = face_normal(p0, p1, p2);

        let mut corners = [0u32; 3];
        for (corner, v) in corners.iter_mut().zip(tri) {
            let n = v
                .nor
                .and_then(|idx| attrs.normals.get(idx))
                .map(|n| Vec3::new(n.x as f32, n.y as f32, n.z as f32))
                .unwrap_or(fallback);
            *corner = mesh.push_vertex(point_to_vec(attrs.positions[v.pos]), n);
        }
        mesh.push_triangle(corners[0], corners[1], corners[2]);
    }

    mesh
}

fn point_to_vec(p: Point3) -> Vec3 {
    Vec3::new(p.x as f32, p.y as f32, p.z as f32)
}

fn face_normal(p0: Point3, p1: Point3, p2: Point3) -> Vec3 {
    let n = (p1 - p0).cross(p2 - p0);
    if n.magnitude2() > 1.0e-12 {
        let n = n.normalize();
        Vec3::new(n.x as f32, n.y as f32, n.z as f32)
    } else {
        Vec3::Z
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(a: f32, b: f32) {
        assert!((a - b).abs() < 1.0e-4, "{a} != {b}");
    }

    #[test]
    fn sphere_bounds_match_radius() {
        let mesh = tessellate(&PrimitiveParams::Sphere { radius: 0.22 }, 0.005).unwrap();
        let bounds = mesh.bounds();
        for axis in 0..3 {
            assert_close(bounds.min[axis], -0.22);
            assert_close(bounds.max[axis], 0.22);
        }
        assert_eq!(mesh.triangle_count(), (SEGMENTS * RINGS * 2) as usize);
    }

    #[test]
    fn cone_spans_depth_and_base_radius() {
        let mesh = tessellate(
            &PrimitiveParams::Cone {
                radius1: 0.8,
                radius2: 0.2,
                depth: 1.4,
            },
            0.005,
        )
        .unwrap();
        let bounds = mesh.bounds();
        assert_close(bounds.min[2], -0.7);
        assert_close(bounds.max[2], 0.7);
        assert_close(bounds.max[0], 0.8);
        assert_close(bounds.min[0], -0.8);
    }

    #[test]
    fn pointed_cone_has_no_top_cap() {
        let open = cone(1.0, 0.0, 1.0, 8);
        let capped = cone(1.0, 0.5, 1.0, 8);
        assert_eq!(capped.triangle_count() - open.triangle_count(), 8);
    }

    #[test]
    fn filled_circle_is_a_fan() {
        let mesh = tessellate(
            &PrimitiveParams::Circle {
                radius: 0.03,
                fill: CircleFill::TriangleFan,
            },
            0.005,
        )
        .unwrap();
        assert_eq!(mesh.triangle_count(), SEGMENTS as usize);
        assert_eq!(mesh.positions.len(), SEGMENTS as usize + 1);
        let bounds = mesh.bounds();
        assert_close(bounds.max[0], 0.03);
        assert_close(bounds.max[2], 0.0);

        let outline = circle(0.03, CircleFill::Nothing, SEGMENTS);
        assert_eq!(outline.triangle_count(), 0);
    }

    #[test]
    fn cube_is_centered_with_given_edge() {
        let mesh = tessellate(&PrimitiveParams::Cube { size: 0.04 }, 0.005).unwrap();
        assert!(mesh.triangle_count() >= 12);
        let bounds = mesh.bounds();
        for axis in 0..3 {
            assert_close(bounds.min[axis], -0.02);
            assert_close(bounds.max[axis], 0.02);
        }
    }

    #[test]
    fn cylinder_runs_along_z() {
        let mesh = tessellate(
            &PrimitiveParams::Cylinder {
                radius: 0.05,
                depth: 0.9,
            },
            0.005,
        )
        .unwrap();
        let bounds = mesh.bounds();
        assert_close(bounds.min[2], -0.45);
        assert_close(bounds.max[2], 0.45);
        assert!(bounds.max[0] <= 0.05 + 1.0e-4);
        assert!(bounds.max[0] > 0.04);
    }

    #[test]
    fn bezier_endpoints_and_sag() {
        let controls = BezierControls {
            start: [-0.1, 0.0, 0.0],
            start_handle: [-0.05, 0.0, -0.03],
            end_handle: [0.05, 0.0, -0.03],
            end: [0.1, 0.0, 0.0],
        };
        assert!((bezier_point(&controls, 0.0) - Vec3::new(-0.1, 0.0, 0.0)).length() < 1.0e-6);
        assert!((bezier_point(&controls, 1.0) - Vec3::new(0.1, 0.0, 0.0)).length() < 1.0e-6);
        // midpoint sags to 3/4 of the handle depth
        assert_close(bezier_point(&controls, 0.5).z, -0.0225);

        let tube = bezier_tube(&controls, 64, 0.015);
        assert_eq!(tube.positions.len(), (65 * BEVEL_SEGMENTS) as usize);
        assert_eq!(tube.triangle_count(), (64 * BEVEL_SEGMENTS * 2) as usize);
        let bounds = tube.bounds();
        assert!(bounds.min[2] < -0.0225 - 0.01);

        let line = bezier_tube(&controls, 8, 0.0);
        assert_eq!(line.positions.len(), 9);
        assert_eq!(line.triangle_count(), 0);
    }
}
