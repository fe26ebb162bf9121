//! Photo camera: black body, purple lens barrel, viewfinder hump and shutter button.

use cgmath::Point3;
use rand::Rng;

use crate::animation::{IdleMotion, Wave};
use crate::config::VisualConfig;
use crate::point_cloud::{lerp_color, lerp_color_clamped, PointCloud, BLACK, PURPLE};
use crate::sampling::{self, Axis, AxisBox, BOX_FACES};
use crate::scene::{CameraRig, MeshSpec, PointStyle, SceneSpec};

/// Body width, height and depth.
pub const BODY_SIZE: [f32; 3] = [3.0, 2.0, 1.8];
pub const BODY_FACE_POINTS: usize = 750;
pub const BODY_EDGE_STEPS: usize = 80;

pub const LENS_RADIUS: f32 = 0.7;
pub const LENS_LENGTH: f32 = 1.0;
pub const LENS_RINGS: usize = 30;
pub const LENS_RING_POINTS: usize = 85;
pub const LENS_CAP_POINTS: usize = 600;
pub const LENS_INNER_RADIUS: f32 = 0.4;
pub const LENS_INNER_POINTS: usize = 80;

pub const VIEWFINDER_SIZE: [f32; 3] = [0.8, 0.5, 0.6];
const VIEWFINDER_Z: f32 = -0.1;
pub const VIEWFINDER_FACE_POINTS: usize = 150;
pub const VIEWFINDER_EDGE_STEPS: usize = 30;

pub const BUTTON_RADIUS: f32 = 0.15;
const BUTTON_X: f32 = 0.8;
const BUTTON_Z: f32 = 0.2;
pub const BUTTON_RING_POINTS: usize = 60;
pub const BUTTON_FILL_POINTS: usize = 30;

/// Raised detail offset so rings and fills sit just in front of their surface.
const DETAIL_LIFT: f32 = 0.02;

pub fn point_count() -> usize {
    BODY_FACE_POINTS * 6
        + (BODY_EDGE_STEPS + 1) * 12
        + (LENS_RINGS + 1) * LENS_RING_POINTS
        + LENS_CAP_POINTS
        + LENS_INNER_POINTS
        + VIEWFINDER_FACE_POINTS * 5
        + (VIEWFINDER_EDGE_STEPS + 1) * 12
        + BUTTON_RING_POINTS
        + BUTTON_FILL_POINTS
}

pub fn generate_camera<R: Rng + ?Sized>(rng: &mut R) -> PointCloud {
    let [bw, bh, bd] = BODY_SIZE;
    let (hh, hd) = (bh / 2.0, bd / 2.0);
    let mut cloud = PointCloud::with_capacity(point_count());

    let body = AxisBox::new([0.0; 3], [bw / 2.0, hh, hd]);
    for (axis, sign) in BOX_FACES {
        for _ in 0..BODY_FACE_POINTS {
            cloud.push(body.face_point(rng, axis, sign), BLACK);
        }
    }
    for (start, end) in body.edges() {
        for (_, p) in sampling::segment(start, end, BODY_EDGE_STEPS) {
            cloud.push(p, BLACK);
        }
    }

    // Lens barrel sticks out of the front face along +Z.
    let lens_front = hd + LENS_LENGTH;
    for ring in 0..=LENS_RINGS {
        let z = hd + LENS_LENGTH * ring as f32 / LENS_RINGS as f32;
        for (x, y) in sampling::ring(LENS_RADIUS, LENS_RING_POINTS) {
            cloud.push(Axis::Z.compose(z, x, y), PURPLE);
        }
    }
    for _ in 0..LENS_CAP_POINTS {
        let (x, y) = sampling::disk(rng, LENS_RADIUS);
        cloud.push(Axis::Z.compose(lens_front, x, y), PURPLE);
    }
    for (x, y) in sampling::ring(LENS_INNER_RADIUS, LENS_INNER_POINTS) {
        cloud.push(Axis::Z.compose(lens_front + DETAIL_LIFT, x, y), PURPLE);
    }

    // Viewfinder sits on the body top and fades from black to purple upwards.
    let [vw, vh, vd] = VIEWFINDER_SIZE;
    let viewfinder = AxisBox::new([0.0, hh + vh / 2.0, VIEWFINDER_Z], [vw / 2.0, vh / 2.0, vd / 2.0]);
    let height_fraction = |y: f32| (y - hh) / vh;
    for (axis, sign) in BOX_FACES {
        match (axis, sign > 0.0) {
            // Its bottom is hidden inside the body.
            (Axis::Y, false) => continue,
            (Axis::Y, true) => {
                for _ in 0..VIEWFINDER_FACE_POINTS {
                    cloud.push(viewfinder.face_point(rng, axis, sign), PURPLE);
                }
            }
            _ => {
                for _ in 0..VIEWFINDER_FACE_POINTS {
                    let p = viewfinder.face_point(rng, axis, sign);
                    cloud.push(p, lerp_color(BLACK, PURPLE, height_fraction(p[1])));
                }
            }
        }
    }
    for (start, end) in viewfinder.edges() {
        for (_, p) in sampling::segment(start, end, VIEWFINDER_EDGE_STEPS) {
            cloud.push(p, lerp_color_clamped(BLACK, PURPLE, height_fraction(p[1])));
        }
    }

    let button_y = hh + 0.05;
    for (dx, dz) in sampling::ring(BUTTON_RADIUS, BUTTON_RING_POINTS) {
        cloud.push(Axis::Y.compose(button_y, BUTTON_X + dx, BUTTON_Z + dz), PURPLE);
    }
    for _ in 0..BUTTON_FILL_POINTS {
        let (dx, dz) = sampling::disk(rng, BUTTON_RADIUS);
        cloud.push(
            Axis::Y.compose(button_y + DETAIL_LIFT, BUTTON_X + dx, BUTTON_Z + dz),
            PURPLE,
        );
    }

    cloud
}

pub fn scene<R: Rng + ?Sized>(config: &VisualConfig, rng: &mut R) -> SceneSpec {
    SceneSpec {
        rig: CameraRig::new(Point3::new(0.0, 1.0, 7.0), Point3::new(0.0, 0.0, 0.0), config),
        background: None,
        meshes: vec![MeshSpec::points(
            "camera",
            generate_camera(rng),
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

    fn cloud() -> PointCloud {
        generate_camera(&mut StdRng::seed_from_u64(21))
    }

    #[test]
    fn point_count_matches_layout() {
        assert_eq!(cloud().len(), point_count());
    }

    #[test]
    fn lens_cap_stays_inside_the_barrel() {
        let cloud = cloud();
        let start = BODY_FACE_POINTS * 6
            + (BODY_EDGE_STEPS + 1) * 12
            + (LENS_RINGS + 1) * LENS_RING_POINTS;
        for i in start..start + LENS_CAP_POINTS {
            let [x, y, z] = cloud.position(i);
            assert!((x * x + y * y).sqrt() <= LENS_RADIUS + 1e-5);
            assert_relative_eq!(z, BODY_SIZE[2] / 2.0 + LENS_LENGTH);
            assert_eq!(cloud.color(i), PURPLE);
        }
    }

    #[test]
    fn viewfinder_darkens_towards_the_body() {
        let cloud = cloud();
        let start = BODY_FACE_POINTS * 6
            + (BODY_EDGE_STEPS + 1) * 12
            + (LENS_RINGS + 1) * LENS_RING_POINTS
            + LENS_CAP_POINTS
            + LENS_INNER_POINTS;
        let top = BODY_SIZE[1] / 2.0;
        for i in start..start + VIEWFINDER_FACE_POINTS * 5 {
            let [_, y, _] = cloud.position(i);
            assert!(y >= top - 1e-5 && y <= top + VIEWFINDER_SIZE[1] + 1e-5);
            let expected = lerp_color(BLACK, PURPLE, (y - top) / VIEWFINDER_SIZE[1]);
            let color = cloud.color(i);
            for c in 0..3 {
                assert_relative_eq!(color[c], expected[c], epsilon = 1e-5);
            }
        }
    }

    #[test]
    fn body_is_black_and_on_its_surface() {
        let cloud = cloud();
        let half = [1.5f32, 1.0, 0.9];
        for i in 0..BODY_FACE_POINTS * 6 {
            let p = cloud.position(i);
            let on_face = (0..3).any(|a| (p[a].abs() - half[a]).abs() < 1e-5);
            assert!(on_face, "{p:?} is not on the body");
            assert_eq!(cloud.color(i), BLACK);
        }
    }
}
