use rand::Rng;
use std::fmt;
use std::str::FromStr;

use crate::config::VisualConfig;
use crate::error::VisualError;
use crate::scene::SceneSpec;
use crate::{shape_camera, shape_dice, shape_flower, shape_helix, shape_star};

/// The visuals this crate knows how to build.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ShapeKind {
    Star,
    Helix,
    Flower,
    Dice,
    Camera,
}

impl ShapeKind {
    pub const ALL: [ShapeKind; 5] = [
        ShapeKind::Star,
        ShapeKind::Helix,
        ShapeKind::Flower,
        ShapeKind::Dice,
        ShapeKind::Camera,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ShapeKind::Star => "star",
            ShapeKind::Helix => "helix",
            ShapeKind::Flower => "flower",
            ShapeKind::Dice => "dice",
            ShapeKind::Camera => "camera",
        }
    }

    /// Generates the geometry and describes how it is framed and animated.
    pub fn scene<R: Rng + ?Sized>(self, config: &VisualConfig, rng: &mut R) -> SceneSpec {
        let scene = match self {
            ShapeKind::Star => shape_star::scene(config),
            ShapeKind::Helix => shape_helix::scene(config),
            ShapeKind::Flower => shape_flower::scene(config, rng),
            ShapeKind::Dice => shape_dice::scene(config, rng),
            ShapeKind::Camera => shape_camera::scene(config, rng),
        };
        log::debug!(
            "Generated {} scene: {} meshes, {} points",
            self,
            scene.meshes.len(),
            scene.point_count()
        );
        scene
    }
}

impl fmt::Display for ShapeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ShapeKind {
    type Err = VisualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ShapeKind::ALL
            .into_iter()
            .find(|kind| kind.name() == wanted)
            .ok_or_else(|| VisualError::UnknownShape(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::MeshContent;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn names_round_trip_through_from_str() {
        for kind in ShapeKind::ALL {
            assert_eq!(kind.to_string().parse::<ShapeKind>().unwrap(), kind);
        }
        assert_eq!(" Flower ".parse::<ShapeKind>().unwrap(), ShapeKind::Flower);
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "teapot".parse::<ShapeKind>().unwrap_err();
        assert!(matches!(err, VisualError::UnknownShape(name) if name == "teapot"));
    }

    #[test]
    fn every_shape_has_aligned_buffers_and_valid_colors() {
        let config = VisualConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        for kind in ShapeKind::ALL {
            let scene = kind.scene(&config, &mut rng);
            assert!(!scene.meshes.is_empty(), "{kind} has no meshes");
            for mesh in &scene.meshes {
                match &mesh.content {
                    MeshContent::Points { cloud, .. } => {
                        assert!(!cloud.is_empty());
                        assert_eq!(cloud.positions().len(), cloud.colors().len());
                        assert_eq!(cloud.positions().len() % 3, 0);
                        assert!(
                            cloud.colors().iter().all(|c| (0.0..=1.0).contains(c)),
                            "{kind} has a color out of range"
                        );
                        assert!(cloud.positions().iter().all(|p| p.is_finite()));
                    }
                    MeshContent::Solid { mesh, .. } => {
                        assert_eq!(mesh.positions.len(), mesh.normals.len());
                        assert_eq!(mesh.indices.len() % 3, 0);
                    }
                }
            }
        }
    }

    #[test]
    fn only_the_star_is_solid() {
        let config = VisualConfig::default();
        let mut rng = StdRng::seed_from_u64(4);
        for kind in ShapeKind::ALL {
            let scene = kind.scene(&config, &mut rng);
            assert_eq!(scene.has_solid_meshes(), kind == ShapeKind::Star);
        }
    }

    #[test]
    fn same_seed_gives_same_cloud() {
        let config = VisualConfig::default();
        let a = ShapeKind::Dice.scene(&config, &mut StdRng::seed_from_u64(77));
        let b = ShapeKind::Dice.scene(&config, &mut StdRng::seed_from_u64(77));
        assert_eq!(a, b);
    }

    #[test]
    fn backgrounds_follow_the_theme_only_for_opaque_scenes() {
        let config = VisualConfig {
            theme: crate::config::Theme::Dark,
            ..VisualConfig::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let dark = crate::config::Theme::Dark.background();
        assert_eq!(ShapeKind::Flower.scene(&config, &mut rng).background, Some(dark));
        assert_eq!(ShapeKind::Dice.scene(&config, &mut rng).background, Some(dark));
        assert_eq!(ShapeKind::Helix.scene(&config, &mut rng).background, None);
        assert_eq!(ShapeKind::Camera.scene(&config, &mut rng).background, None);
    }
}
