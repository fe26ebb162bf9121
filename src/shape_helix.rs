//! Double helix: two strands half a turn apart joined by base-pair rungs.

use cgmath::Point3;
use std::f32::consts::PI;

use crate::animation::{IdleMotion, Wave};
use crate::config::VisualConfig;
use crate::point_cloud::{lerp_color, PointCloud, BLACK, PURPLE};
use crate::scene::{CameraRig, MeshSpec, PointStyle, SceneSpec};

pub const HELIX_RADIUS: f32 = 2.0;
pub const RISE_PER_RADIAN: f32 = 0.12;
pub const TOTAL_ANGLE: f32 = 10.0 * PI;
pub const STRAND_POINTS: usize = 800;
pub const RUNG_INTERVAL: usize = 8;
pub const POINTS_PER_RUNG: usize = 10;

const STRAND_1_COLOR: [f32; 3] = BLACK;
const STRAND_2_COLOR: [f32; 3] = PURPLE;

/// Point on a strand at sweep `angle`, rotated around the axis by `phase`.
/// Height depends on `angle` only, so both strands rise together.
pub fn strand_point(angle: f32, phase: f32) -> [f32; 3] {
    let y_offset = RISE_PER_RADIAN * TOTAL_ANGLE / 2.0;
    [
        HELIX_RADIUS * (angle + phase).cos(),
        RISE_PER_RADIAN * angle - y_offset,
        HELIX_RADIUS * (angle + phase).sin(),
    ]
}

/// Sweep angle with the matching point of each strand, for every sample.
pub fn strand_pairs() -> impl Iterator<Item = (f32, [f32; 3], [f32; 3])> {
    (0..STRAND_POINTS).map(|i| {
        let angle = i as f32 / (STRAND_POINTS - 1) as f32 * TOTAL_ANGLE;
        (angle, strand_point(angle, 0.0), strand_point(angle, PI))
    })
}

pub fn generate_helix() -> PointCloud {
    let rungs = STRAND_POINTS.div_ceil(RUNG_INTERVAL);
    let mut cloud = PointCloud::with_capacity(STRAND_POINTS * 2 + rungs * POINTS_PER_RUNG);

    for (i, (_, p1, p2)) in strand_pairs().enumerate() {
        cloud.push(p1, STRAND_1_COLOR);
        cloud.push(p2, STRAND_2_COLOR);

        if i % RUNG_INTERVAL == 0 {
            for j in 1..=POINTS_PER_RUNG {
                let frac = j as f32 / (POINTS_PER_RUNG + 1) as f32;
                cloud.push(
                    [
                        p1[0] + (p2[0] - p1[0]) * frac,
                        p1[1],
                        p1[2] + (p2[2] - p1[2]) * frac,
                    ],
                    lerp_color(STRAND_1_COLOR, STRAND_2_COLOR, frac),
                );
            }
        }
    }

    cloud
}

pub fn scene(config: &VisualConfig) -> SceneSpec {
    SceneSpec {
        rig: CameraRig::new(Point3::new(0.0, 0.0, 8.0), Point3::new(0.0, 0.0, 0.0), config),
        background: None,
        meshes: vec![MeshSpec::points(
            "helix",
            generate_helix(),
            PointStyle::default().with_overrides(config),
            IdleMotion::turntable(0.3, Wave::new(0.1, 0.5, 0.0)),
        )],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn second_strand_is_first_strand_half_a_turn_later() {
        for (angle, _, p2) in strand_pairs() {
            let shifted = strand_point(angle + PI, 0.0);
            assert_relative_eq!(p2[0], shifted[0], epsilon = 1e-4);
            assert_relative_eq!(p2[2], shifted[2], epsilon = 1e-4);
        }
    }

    #[test]
    fn strands_are_mirrored_through_the_axis_at_equal_height() {
        for (_, p1, p2) in strand_pairs() {
            assert_relative_eq!(p1[0], -p2[0], epsilon = 1e-4);
            assert_relative_eq!(p1[2], -p2[2], epsilon = 1e-4);
            assert_eq!(p1[1], p2[1]);
        }
    }

    #[test]
    fn helix_is_vertically_centred() {
        let first = strand_point(0.0, 0.0);
        let last = strand_point(TOTAL_ANGLE, 0.0);
        assert_relative_eq!(first[1], -last[1], epsilon = 1e-5);
    }

    #[test]
    fn point_count_includes_rungs() {
        let cloud = generate_helix();
        let rungs = STRAND_POINTS.div_ceil(RUNG_INTERVAL);
        assert_eq!(cloud.len(), STRAND_POINTS * 2 + rungs * POINTS_PER_RUNG);
    }

    #[test]
    fn rung_colors_blend_between_strands() {
        let cloud = generate_helix();
        // Sample 0 emits strand 1, strand 2, then its rung.
        let first_rung = cloud.color(2);
        let last_rung = cloud.color(2 + POINTS_PER_RUNG - 1);
        assert!(first_rung[2] < last_rung[2]);
        assert!(first_rung[2] > STRAND_1_COLOR[2]);
        assert!(last_rung[2] < STRAND_2_COLOR[2]);
    }
}
