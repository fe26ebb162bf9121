use approx::assert_relative_eq;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pointcloud_visuals::sampling::disk;
use pointcloud_visuals::scene::MeshContent;
use pointcloud_visuals::shape_dice::{generate_die, DieFaces};
use pointcloud_visuals::shape_helix::{generate_helix, strand_pairs};
use pointcloud_visuals::shape_star::generate_star;
use pointcloud_visuals::{shape_camera, ShapeKind, VisualConfig};

#[test]
fn point_buffers_are_three_floats_per_point_with_unit_colors() {
    let config = VisualConfig {
        seed: Some(3),
        ..VisualConfig::default()
    };
    for shape in ShapeKind::ALL {
        let scene = shape.scene(&config, &mut config.rng());
        for mesh in &scene.meshes {
            let MeshContent::Points { cloud, .. } = &mesh.content else {
                continue;
            };
            assert!(!cloud.is_empty(), "{} is empty", mesh.label);
            assert_eq!(cloud.positions().len(), cloud.len() * 3);
            assert_eq!(cloud.colors().len(), cloud.positions().len());
            assert!(cloud.colors().iter().all(|c| (0.0..=1.0).contains(c)));
            assert!(cloud.positions().iter().all(|p| p.is_finite()));
        }
    }
}

#[test]
fn camera_point_count_matches_its_parts() {
    let cloud = shape_camera::generate_camera(&mut StdRng::seed_from_u64(5));
    assert_eq!(cloud.len(), shape_camera::point_count());
}

#[test]
fn disk_samples_are_area_uniform() {
    let mut rng = StdRng::seed_from_u64(17);
    let samples = 20_000;
    let inner = (0..samples)
        .map(|_| disk(&mut rng, 1.0))
        .filter(|(u, v)| (u * u + v * v).sqrt() < 0.5)
        .count();
    // A quarter of the area lies inside half the radius.
    assert_relative_eq!(inner as f32 / samples as f32, 0.25, epsilon = 0.02);
}

#[test]
fn die_faces_are_a_permutation() {
    let mut rng = StdRng::seed_from_u64(2);
    for _ in 0..20 {
        let (_, faces): (_, DieFaces) = generate_die(&mut rng);
        let mut values = faces.values();
        values.sort_unstable();
        assert_eq!(values, [1, 2, 3, 4, 5, 6]);
    }
}

#[test]
fn helix_strands_face_each_other_at_equal_height() {
    for (_, a, b) in strand_pairs().step_by(37) {
        assert_relative_eq!(a[0], -b[0], epsilon = 1e-4);
        assert_relative_eq!(a[1], b[1]);
        assert_relative_eq!(a[2], -b[2], epsilon = 1e-4);
    }
    let cloud = generate_helix();
    let ys: Vec<f32> = (0..cloud.len()).map(|i| cloud.position(i)[1]).collect();
    let (low, high) = ys
        .iter()
        .fold((f32::MAX, f32::MIN), |(lo, hi), y| (lo.min(*y), hi.max(*y)));
    // Centered on the origin.
    assert_relative_eq!(low, -high, epsilon = 1e-3);
}

#[test]
fn star_tube_is_closed_and_indexed_in_range() {
    let mesh = generate_star();
    let count = mesh.vertex_count() as u32;
    assert_eq!(mesh.indices.len() % 3, 0);
    assert!(mesh.indices.iter().all(|i| *i < count));
    assert_eq!(mesh.normals.len(), mesh.positions.len());
}
