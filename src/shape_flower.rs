//! Snowdrop: bent stem, three drooping petals around an inner bell, two leaves.

use cgmath::Point3;
use rand::Rng;
use std::f32::consts::{PI, TAU};

use crate::animation::{IdleMotion, Wave};
use crate::config::VisualConfig;
use crate::point_cloud::{lerp_color, PointCloud, BLACK, PURPLE};
use crate::sampling::{self, Axis};
use crate::scene::{CameraRig, MeshSpec, PointStyle, SceneSpec};

pub const STEM_POINTS: usize = 600;
const STEM_THICKNESS: f32 = 0.04;
/// Fraction of the stem that stays straight before the bend.
const STEM_STRAIGHT: f32 = 0.8;
const STEM_BASE_Y: f32 = -3.0;
const STEM_STRAIGHT_LENGTH: f32 = 5.5;
const STEM_BEND_SWEEP: f32 = PI / 3.0;
const STEM_BEND_RADIUS: f32 = 1.5;

pub const PETAL_COUNT: usize = 3;
pub const PETAL_POINTS: usize = 2500;
const PETAL_MAX_WIDTH: f32 = 0.55;

pub const BELL_RINGS: usize = 15;
pub const BELL_RING_POINTS: usize = 30;
pub const BELL_CAP_POINTS: usize = 80;
const BELL_LENGTH: f32 = 0.8;
const BELL_RADIUS_TOP: f32 = 0.15;
const BELL_RADIUS_BOTTOM: f32 = 0.3;

pub const LEAF_COUNT: usize = 2;
pub const LEAF_POINTS: usize = 650;
const LEAF_LENGTH: f32 = 3.5;
const LEAF_MAX_WIDTH: f32 = 0.18;

/// Stem centre line for `t` in `[0, 1]`: straight up, then curving over.
pub fn stem_position(t: f32) -> [f32; 3] {
    if t < STEM_STRAIGHT {
        let s = t / STEM_STRAIGHT;
        return [0.0, STEM_BASE_Y + s * STEM_STRAIGHT_LENGTH, 0.0];
    }
    let s = (t - STEM_STRAIGHT) / (1.0 - STEM_STRAIGHT);
    let angle = s * STEM_BEND_SWEEP;
    [
        angle.sin() * STEM_BEND_RADIUS,
        STEM_BASE_Y + STEM_STRAIGHT_LENGTH - (1.0 - angle.cos()),
        0.0,
    ]
}

/// Petal half-width at `t`: zero at base and tip, widest in between.
pub fn petal_width(t: f32) -> f32 {
    (t * PI).sin() * PETAL_MAX_WIDTH
}

/// Leaf half-width at `t`, skewed towards the base.
pub fn leaf_width(t: f32) -> f32 {
    (t * PI).sin() * LEAF_MAX_WIDTH * (1.0 - t * 0.4)
}

pub fn generate_flower<R: Rng + ?Sized>(rng: &mut R) -> PointCloud {
    let mut cloud = PointCloud::with_capacity(
        STEM_POINTS
            + PETAL_COUNT * PETAL_POINTS
            + (BELL_RINGS + 1) * BELL_RING_POINTS
            + BELL_CAP_POINTS
            + LEAF_COUNT * LEAF_POINTS,
    );

    for t in sampling::sweep(STEM_POINTS) {
        let [x, y, z] = stem_position(t);
        cloud.push(
            [
                x + sampling::jitter(rng, STEM_THICKNESS),
                y,
                z + sampling::jitter(rng, STEM_THICKNESS),
            ],
            BLACK,
        );
    }

    let [flower_x, flower_y, _] = stem_position(1.0);

    for p in 0..PETAL_COUNT {
        let petal_angle = p as f32 / PETAL_COUNT as f32 * TAU + PI / 6.0;
        let perp_angle = petal_angle + PI / 2.0;
        for _ in 0..PETAL_POINTS {
            let t: f32 = rng.gen();
            let width = sampling::symmetric(rng, 1.0) * petal_width(t);
            // Spine droops, spreads outward, and curls away near the tip.
            let reach = t * 0.6 + t * t * 0.4;
            cloud.push(
                [
                    flower_x + petal_angle.cos() * reach + perp_angle.cos() * width,
                    flower_y - t * 1.7,
                    petal_angle.sin() * reach + perp_angle.sin() * width,
                ],
                lerp_color(PURPLE, BLACK, t * 0.25),
            );
        }
    }

    for ring in 0..=BELL_RINGS {
        let t = ring as f32 / BELL_RINGS as f32;
        let y = flower_y - t * BELL_LENGTH;
        let radius = BELL_RADIUS_TOP + (BELL_RADIUS_BOTTOM - BELL_RADIUS_TOP) * t;
        for (u, v) in sampling::ring(radius, BELL_RING_POINTS) {
            cloud.push(
                Axis::Y.compose(y, flower_x + u, v),
                lerp_color(PURPLE, BLACK, t * 0.5),
            );
        }
    }

    for _ in 0..BELL_CAP_POINTS {
        let (u, v) = sampling::disk(rng, BELL_RADIUS_BOTTOM);
        cloud.push(
            Axis::Y.compose(flower_y - BELL_LENGTH, flower_x + u, v),
            lerp_color(PURPLE, BLACK, 0.5),
        );
    }

    for (leaf_angle, bend) in [(-0.4f32, -1.0f32), (0.4, 1.0)] {
        for _ in 0..LEAF_POINTS {
            let t: f32 = rng.gen();
            let width = sampling::symmetric(rng, 1.0) * leaf_width(t);
            let curve = t * t * bend * 0.5;
            cloud.push(
                [
                    curve + leaf_angle.cos() * width,
                    STEM_BASE_Y + t * LEAF_LENGTH,
                    leaf_angle.sin() * width,
                ],
                lerp_color(BLACK, PURPLE, t * 0.15),
            );
        }
    }

    cloud
}

pub fn scene<R: Rng + ?Sized>(config: &VisualConfig, rng: &mut R) -> SceneSpec {
    SceneSpec {
        rig: CameraRig::new(
            Point3::new(0.0, 0.0, 8.0),
            Point3::new(config.look_at_x, 0.0, 0.0),
            config,
        ),
        background: Some(config.theme.background()),
        meshes: vec![MeshSpec::points(
            "flower",
            generate_flower(rng),
            PointStyle::default().with_overrides(config),
            IdleMotion::turntable(0.3, Wave::new(0.1, 0.5, 0.0)),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn stem_is_continuous_at_the_bend() {
        let before = stem_position(STEM_STRAIGHT - 1e-4);
        let at = stem_position(STEM_STRAIGHT);
        assert_relative_eq!(before[1], at[1], epsilon = 1e-2);
        assert_relative_eq!(at[0], 0.0);
        assert_relative_eq!(at[1], 2.5);
    }

    #[test]
    fn stem_tip_bends_through_sixty_degrees() {
        let tip = stem_position(1.0);
        assert_relative_eq!(tip[0], (PI / 3.0).sin() * 1.5, epsilon = 1e-5);
        assert_relative_eq!(tip[1], 2.0, epsilon = 1e-5);
    }

    #[test]
    fn petal_width_vanishes_at_both_ends() {
        assert_relative_eq!(petal_width(0.0), 0.0);
        assert!(petal_width(1.0).abs() < 1e-6);
        assert!(petal_width(0.4) > petal_width(0.1));
        assert!(petal_width(0.4) > petal_width(0.9));
    }

    #[test]
    fn leaf_is_widest_before_its_middle() {
        let widest = (0..=100)
            .map(|i| i as f32 / 100.0)
            .max_by(|a, b| leaf_width(*a).total_cmp(&leaf_width(*b)))
            .unwrap();
        assert!(widest < 0.5);
    }

    #[test]
    fn flower_point_count_is_fixed() {
        let mut rng = StdRng::seed_from_u64(1);
        let cloud = generate_flower(&mut rng);
        assert_eq!(
            cloud.len(),
            STEM_POINTS
                + PETAL_COUNT * PETAL_POINTS
                + (BELL_RINGS + 1) * BELL_RING_POINTS
                + BELL_CAP_POINTS
                + LEAF_COUNT * LEAF_POINTS
        );
    }

    #[test]
    fn petals_hang_below_the_attachment_point() {
        let mut rng = StdRng::seed_from_u64(2);
        let cloud = generate_flower(&mut rng);
        let [_, flower_y, _] = stem_position(1.0);
        for i in STEM_POINTS..STEM_POINTS + PETAL_COUNT * PETAL_POINTS {
            assert!(cloud.position(i)[1] <= flower_y + 1e-5);
        }
    }
}
