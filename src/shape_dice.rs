//! Pair of purple dice with black pips, each face numbered from a shuffled 1..=6.

use cgmath::{Point3, Vector3};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::animation::{IdleMotion, Wave};
use crate::config::VisualConfig;
use crate::point_cloud::{PointCloud, BLACK, PURPLE};
use crate::sampling::{self, AxisBox, BOX_FACES};
use crate::scene::{CameraRig, MeshSpec, PointStyle, SceneSpec};

/// Half edge length of a die.
pub const DIE_HALF_SIZE: f32 = 1.2;
pub const FACE_POINTS: usize = 700;
pub const EDGE_POINTS: usize = 120;
pub const PIP_POINTS: usize = 220;
pub const PIP_RADIUS: f32 = DIE_HALF_SIZE * 0.14;
/// Outward lift of the pips so they never share depth with the face.
pub const PIP_LIFT: f32 = 0.015;

const BODY_COLOR: [f32; 3] = PURPLE;
const PIP_COLOR: [f32; 3] = BLACK;

const PIP_OFFSET: f32 = 0.45;

/// Face value for each face of one die, indexed like [`BOX_FACES`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct DieFaces([u8; 6]);

impl DieFaces {
    /// Fair assignment: a random permutation of 1..=6, so no value repeats.
    pub fn shuffled<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let mut values = [1, 2, 3, 4, 5, 6];
        values.shuffle(rng);
        Self(values)
    }

    pub fn values(&self) -> [u8; 6] {
        self.0
    }

    pub fn value(&self, face: usize) -> u8 {
        self.0[face]
    }
}

/// Pip centers for a face value, in face-local units of the half size.
pub fn pip_layout(value: u8) -> &'static [[f32; 2]] {
    const P: f32 = PIP_OFFSET;
    match value {
        1 => &[[0.0, 0.0]],
        2 => &[[-P, -P], [P, P]],
        3 => &[[-P, -P], [0.0, 0.0], [P, P]],
        4 => &[[-P, -P], [P, -P], [-P, P], [P, P]],
        5 => &[[-P, -P], [P, -P], [0.0, 0.0], [-P, P], [P, P]],
        6 => &[[-P, -P], [P, -P], [-P, 0.0], [P, 0.0], [-P, P], [P, P]],
        _ => &[],
    }
}

/// One die centred on the origin, with the face numbering that was used.
pub fn generate_die<R: Rng + ?Sized>(rng: &mut R) -> (PointCloud, DieFaces) {
    let s = DIE_HALF_SIZE;
    let faces = DieFaces::shuffled(rng);
    let body = AxisBox::new([0.0; 3], [s; 3]);
    let pip_total: usize = faces.values().iter().map(|v| pip_layout(*v).len()).sum();

    let mut cloud = PointCloud::with_capacity(
        FACE_POINTS * 6 + EDGE_POINTS * 12 + PIP_POINTS * pip_total,
    );

    for (axis, sign) in BOX_FACES {
        for _ in 0..FACE_POINTS {
            cloud.push(body.face_point(rng, axis, sign), BODY_COLOR);
        }
    }

    for (start, end) in body.edges() {
        for (_, p) in sampling::segment(start, end, EDGE_POINTS - 1) {
            cloud.push(p, BODY_COLOR);
        }
    }

    for (face, (axis, sign)) in BOX_FACES.iter().enumerate() {
        let lifted = sign * (s + PIP_LIFT);
        for [px, py] in pip_layout(faces.value(face)) {
            for _ in 0..PIP_POINTS {
                let (du, dv) = sampling::disk(rng, PIP_RADIUS);
                cloud.push(axis.compose(lifted, px * s + du, py * s + dv), PIP_COLOR);
            }
        }
    }

    (cloud, faces)
}

fn die_style(config: &VisualConfig) -> PointStyle {
    PointStyle {
        size: 0.055,
        opacity: 0.9,
        size_attenuation: true,
    }
    .with_overrides(config)
}

pub fn scene<R: Rng + ?Sized>(config: &VisualConfig, rng: &mut R) -> SceneSpec {
    let (first, first_faces) = generate_die(rng);
    let (second, second_faces) = generate_die(rng);
    log::debug!(
        "Dice faces: {:?} and {:?}",
        first_faces.values(),
        second_faces.values()
    );

    // Faster spin with gentle wobble.
    let first_motion = IdleMotion {
        base_position: Vector3::new(-2.2, 0.4, 0.2),
        base_rotation: Vector3::new(0.5, 0.3, 0.2),
        spin: Vector3::new(0.0, 0.32, 0.0),
        wobble: [Wave::new(0.12, 0.35, 0.0), Wave::ZERO, Wave::new(0.06, 0.22, 0.0)],
        bob: Wave::new(0.12, 0.6, 0.0),
    };
    // Slower spin, shifted phases.
    let second_motion = IdleMotion {
        base_position: Vector3::new(2.2, -0.3, -0.3),
        base_rotation: Vector3::new(-0.4, -0.8, -0.3),
        spin: Vector3::new(0.0, 0.22, 0.0),
        wobble: [Wave::new(0.12, 0.28, 1.5), Wave::ZERO, Wave::new(0.07, 0.18, 0.9)],
        bob: Wave::new(0.12, 0.5, 2.0),
    };

    SceneSpec {
        rig: CameraRig::new(Point3::new(0.0, 1.5, 9.0), Point3::new(0.0, 0.0, 0.0), config),
        background: Some(config.theme.background()),
        meshes: vec![
            MeshSpec::points("die-1", first, die_style(config), first_motion),
            MeshSpec::points("die-2", second, die_style(config), second_motion),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn every_value_appears_on_exactly_one_face() {
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..200 {
            let mut values = DieFaces::shuffled(&mut rng).values();
            values.sort_unstable();
            assert_eq!(values, [1, 2, 3, 4, 5, 6]);
        }
    }

    #[test]
    fn pip_layouts_match_face_values() {
        for value in 1..=6u8 {
            assert_eq!(pip_layout(value).len(), value as usize);
        }
        assert!(pip_layout(0).is_empty());
        assert!(pip_layout(7).is_empty());
    }

    #[test]
    fn die_point_count_covers_all_21_pips() {
        let mut rng = StdRng::seed_from_u64(5);
        let (cloud, _) = generate_die(&mut rng);
        assert_eq!(
            cloud.len(),
            FACE_POINTS * 6 + EDGE_POINTS * 12 + PIP_POINTS * 21
        );
    }

    #[test]
    fn pips_float_just_outside_the_body() {
        let mut rng = StdRng::seed_from_u64(5);
        let (cloud, _) = generate_die(&mut rng);
        let pip_start = FACE_POINTS * 6 + EDGE_POINTS * 12;
        for i in pip_start..cloud.len() {
            let p = cloud.position(i);
            let max = p.iter().fold(0.0f32, |m, c| m.max(c.abs()));
            assert!((max - (DIE_HALF_SIZE + PIP_LIFT)).abs() < 1e-5);
            assert_eq!(cloud.color(i), PIP_COLOR);
        }
    }

    #[test]
    fn body_points_stay_on_the_cube_surface() {
        let mut rng = StdRng::seed_from_u64(8);
        let (cloud, _) = generate_die(&mut rng);
        for i in 0..FACE_POINTS * 6 + EDGE_POINTS * 12 {
            let p = cloud.position(i);
            let max = p.iter().fold(0.0f32, |m, c| m.max(c.abs()));
            assert!((max - DIE_HALF_SIZE).abs() < 1e-5);
        }
    }
}
