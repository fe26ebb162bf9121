//! Five-pointed star drawn as a solid tube swept along a closed spline.

use cgmath::{InnerSpace, Point3, Quaternion, Rad, Rotation, Rotation3, Vector3};
use std::f32::consts::{FRAC_PI_2, PI, TAU};

use crate::animation::{IdleMotion, Wave};
use crate::config::VisualConfig;
use crate::point_cloud::{Color, PURPLE};
use crate::scene::{CameraRig, MeshContent, MeshSpec, SceneSpec};

pub const STAR_POINTS: usize = 5;
pub const OUTER_RADIUS: f32 = 2.0;
pub const INNER_RADIUS: f32 = 0.85;
pub const TUBULAR_SEGMENTS: usize = 200;
pub const RADIAL_SEGMENTS: usize = 16;
pub const TUBE_RADIUS: f32 = 0.16;

const HIGHLIGHT: Color = [0.93, 0.88, 0.98];

/// Indexed triangle mesh with per-vertex normals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TubeMesh {
    pub positions: Vec<[f32; 3]>,
    pub normals: Vec<[f32; 3]>,
    pub indices: Vec<u32>,
}

impl TubeMesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

/// Star silhouette in the XY plane, alternating outer and inner vertices,
/// starting at the top and going counter-clockwise.
pub fn star_outline() -> Vec<Vector3<f32>> {
    (0..STAR_POINTS * 2)
        .map(|k| {
            let radius = if k % 2 == 0 { OUTER_RADIUS } else { INNER_RADIUS };
            let angle = FRAC_PI_2 + k as f32 * PI / STAR_POINTS as f32;
            Vector3::new(angle.cos() * radius, angle.sin() * radius, 0.0)
        })
        .collect()
}

/// Closed uniform Catmull-Rom spline through `points`.
#[derive(Debug, Clone)]
pub struct CatmullRomLoop {
    points: Vec<Vector3<f32>>,
}

impl CatmullRomLoop {
    pub fn new(points: Vec<Vector3<f32>>) -> Self {
        Self { points }
    }

    /// Control points for global parameter `t` in `[0, 1)` and the local one.
    fn segment(&self, t: f32) -> ([Vector3<f32>; 4], f32) {
        let n = self.points.len();
        let scaled = t.rem_euclid(1.0) * n as f32;
        let i = (scaled.floor() as usize).min(n - 1);
        let w = scaled - i as f32;
        let p = |k: usize| self.points[k % n];
        ([p(i + n - 1), p(i), p(i + 1), p(i + 2)], w)
    }

    pub fn point(&self, t: f32) -> Vector3<f32> {
        let ([p0, p1, p2, p3], w) = self.segment(t);
        let (w2, w3) = (w * w, w * w * w);
        (p1 * 2.0
            + (p2 - p0) * w
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * w2
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * w3)
            * 0.5
    }

    /// Unit tangent at `t`.
    pub fn tangent(&self, t: f32) -> Vector3<f32> {
        let ([p0, p1, p2, p3], w) = self.segment(t);
        let d = ((p2 - p0)
            + (p0 * 2.0 - p1 * 5.0 + p2 * 4.0 - p3) * (2.0 * w)
            + (p1 * 3.0 - p0 - p2 * 3.0 + p3) * (3.0 * w * w))
            * 0.5;
        d.normalize()
    }
}

/// Rotates `normal` by the turn that takes tangent `from` onto `to`.
fn transport(normal: Vector3<f32>, from: Vector3<f32>, to: Vector3<f32>) -> Vector3<f32> {
    let axis = from.cross(to);
    if axis.magnitude() <= f32::EPSILON {
        return normal;
    }
    let angle = from.dot(to).clamp(-1.0, 1.0).acos();
    Quaternion::from_axis_angle(axis.normalize(), Rad(angle)).rotate_vector(normal)
}

/// Normal and binormal along a closed curve, transported without
/// twisting and then corrected so the last frame meets the first.
pub fn parallel_transport_frames(tangents: &[Vector3<f32>]) -> Vec<(Vector3<f32>, Vector3<f32>)> {
    let Some(&t0) = tangents.first() else {
        return Vec::new();
    };

    // Seed the first normal off the axis the tangent leans on least.
    let (ax, ay, az) = (t0.x.abs(), t0.y.abs(), t0.z.abs());
    let seed = if ax <= ay && ax <= az {
        Vector3::unit_x()
    } else if ay <= az {
        Vector3::unit_y()
    } else {
        Vector3::unit_z()
    };
    let side = t0.cross(seed).normalize();
    let mut normals = vec![t0.cross(side).normalize()];

    for pair in tangents.windows(2) {
        let normal = *normals.last().unwrap_or(&side);
        normals.push(transport(normal, pair[0], pair[1]));
    }

    // Carry the last normal across the seam and spread the mismatch evenly.
    let last = tangents.len() - 1;
    let closing = transport(normals[last], tangents[last], t0);
    let mut twist = normals[0].dot(closing).clamp(-1.0, 1.0).acos() / tangents.len() as f32;
    if t0.dot(normals[0].cross(closing)) > 0.0 {
        twist = -twist;
    }
    tangents
        .iter()
        .zip(normals)
        .enumerate()
        .map(|(i, (&tangent, normal))| {
            let normal = Quaternion::from_axis_angle(tangent, Rad(twist * i as f32))
                .rotate_vector(normal)
                .normalize();
            (normal, tangent.cross(normal).normalize())
        })
        .collect()
}

/// Sweeps a circle of `radius` along a closed curve. Rings wrap around, so the
/// mesh has `tubular * radial` vertices and no seam duplicates.
pub fn sweep_tube(curve: &CatmullRomLoop, tubular: usize, radial: usize, radius: f32) -> TubeMesh {
    let params: Vec<f32> = (0..tubular).map(|i| i as f32 / tubular as f32).collect();
    let tangents: Vec<_> = params.iter().map(|&t| curve.tangent(t)).collect();
    let frames = parallel_transport_frames(&tangents);

    let mut mesh = TubeMesh {
        positions: Vec::with_capacity(tubular * radial),
        normals: Vec::with_capacity(tubular * radial),
        indices: Vec::with_capacity(tubular * radial * 6),
    };

    for (&t, &(normal, binormal)) in params.iter().zip(&frames) {
        let center = curve.point(t);
        for j in 0..radial {
            let v = j as f32 / radial as f32 * TAU;
            let n = (normal * v.cos() + binormal * v.sin()).normalize();
            let p = center + n * radius;
            mesh.positions.push([p.x, p.y, p.z]);
            mesh.normals.push([n.x, n.y, n.z]);
        }
    }

    for i in 0..tubular {
        let next = (i + 1) % tubular;
        for j in 0..radial {
            let j2 = (j + 1) % radial;
            let a = (i * radial + j) as u32;
            let b = (next * radial + j) as u32;
            let c = (next * radial + j2) as u32;
            let d = (i * radial + j2) as u32;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }

    mesh
}

pub fn generate_star() -> TubeMesh {
    let curve = CatmullRomLoop::new(star_outline());
    sweep_tube(&curve, TUBULAR_SEGMENTS, RADIAL_SEGMENTS, TUBE_RADIUS)
}

pub fn scene(config: &VisualConfig) -> SceneSpec {
    let motion = IdleMotion {
        spin: Vector3::new(0.0, 0.4, 0.0),
        bob: Wave::new(0.08, 0.8, 0.0),
        ..IdleMotion::default()
    };
    SceneSpec {
        rig: CameraRig::new(Point3::new(0.0, 0.0, 7.0), Point3::new(0.0, 0.0, 0.0), config),
        background: None,
        meshes: vec![MeshSpec {
            label: "star".to_string(),
            content: MeshContent::Solid {
                mesh: generate_star(),
                base: PURPLE,
                highlight: HIGHLIGHT,
            },
            motion,
        }],
    }
}
