use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

use crate::animation::FRAME_INCREMENT;
use crate::error::VisualError;
use crate::point_cloud::Color;

/// Light/dark page theme. Only affects the background of opaque scenes.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn background(self) -> Color {
        match self {
            // #F5F7FA
            Theme::Light => [245.0 / 255.0, 247.0 / 255.0, 250.0 / 255.0],
            // #0E0E12
            Theme::Dark => [14.0 / 255.0, 14.0 / 255.0, 18.0 / 255.0],
        }
    }
}

impl FromStr for Theme {
    type Err = VisualError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            _ => Err(VisualError::UnknownTheme(s.to_string())),
        }
    }
}

/// User drag/zoom behaviour of the orbit controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OrbitSettings {
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    pub enable_pan: bool,
    pub enable_zoom: bool,
}

impl Default for OrbitSettings {
    fn default() -> Self {
        Self {
            damping_factor: 0.05,
            rotate_speed: 0.5,
            zoom_speed: 1.0,
            min_distance: 4.0,
            max_distance: 20.0,
            enable_pan: false,
            enable_zoom: true,
        }
    }
}

/// Inputs fixed at construction time. Nothing here is watched for changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualConfig {
    pub theme: Theme,
    pub frame_increment: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub max_pixel_ratio: f64,
    /// Overrides the per-shape point size when set.
    pub point_size: Option<f32>,
    /// Overrides the per-shape point opacity when set.
    pub point_opacity: Option<f32>,
    /// Horizontal look-at offset, used by the flower.
    pub look_at_x: f32,
    /// Fixed seed for reproducible clouds. Entropy seeded when absent.
    pub seed: Option<u64>,
    pub orbit: OrbitSettings,
}

impl Default for VisualConfig {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            frame_increment: FRAME_INCREMENT,
            fov_y_degrees: 50.0,
            near: 0.1,
            far: 100.0,
            max_pixel_ratio: 2.0,
            point_size: None,
            point_opacity: None,
            look_at_x: 0.0,
            seed: None,
            orbit: OrbitSettings::default(),
        }
    }
}

impl VisualConfig {
    pub fn from_json_str(json: &str) -> Result<Self, VisualError> {
        let config: VisualConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, VisualError> {
        let path = path.as_ref();
        log::info!("Loading visual config from {}", path.display());
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), VisualError> {
        if !(self.frame_increment > 0.0) {
            return Err(VisualError::Config("frame_increment must be positive".into()));
        }
        if !(self.near > 0.0 && self.far > self.near) {
            return Err(VisualError::Config("clip planes must satisfy 0 < near < far".into()));
        }
        if !(self.fov_y_degrees > 0.0 && self.fov_y_degrees < 180.0) {
            return Err(VisualError::Config("fov_y_degrees must be in (0, 180)".into()));
        }
        if self.orbit.min_distance > self.orbit.max_distance {
            return Err(VisualError::Config(
                "orbit.min_distance must not exceed orbit.max_distance".into(),
            ));
        }
        if !(self.orbit.damping_factor > 0.0 && self.orbit.damping_factor <= 1.0) {
            return Err(VisualError::Config("orbit.damping_factor must be in (0, 1]".into()));
        }
        if let Some(opacity) = self.point_opacity {
            if !(0.0..=1.0).contains(&opacity) {
                return Err(VisualError::Config("point_opacity must be in [0, 1]".into()));
            }
        }
        if let Some(size) = self.point_size {
            if !(size > 0.0) {
                return Err(VisualError::Config("point_size must be positive".into()));
            }
        }
        Ok(())
    }

    /// Random source for shape generation.
    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn empty_json_gives_defaults() {
        let config = VisualConfig::from_json_str("{}").unwrap();
        assert_eq!(config, VisualConfig::default());
        assert_eq!(config.orbit.min_distance, 4.0);
        assert_eq!(config.orbit.max_distance, 20.0);
        assert!(!config.orbit.enable_pan);
    }

    #[test]
    fn partial_json_overrides_fields() {
        let config = VisualConfig::from_json_str(
            r#"{ "theme": "dark", "seed": 42, "orbit": { "max_distance": 12.0 } }"#,
        )
        .unwrap();
        assert_eq!(config.theme, Theme::Dark);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.orbit.max_distance, 12.0);
        assert_eq!(config.orbit.min_distance, 4.0);
    }

    #[test]
    fn inverted_zoom_range_is_rejected() {
        let err = VisualConfig::from_json_str(
            r#"{ "orbit": { "min_distance": 30.0, "max_distance": 20.0 } }"#,
        )
        .unwrap_err();
        assert!(matches!(err, VisualError::Config(_)));
    }

    #[test]
    fn damping_outside_unit_range_is_rejected() {
        for damping in ["0.0", "1.5", "2.5"] {
            let json = format!(r#"{{ "orbit": {{ "damping_factor": {} }} }}"#, damping);
            let err = VisualConfig::from_json_str(&json).unwrap_err();
            assert!(matches!(err, VisualError::Config(_)), "{damping} accepted");
        }
        let config = VisualConfig::from_json_str(r#"{ "orbit": { "damping_factor": 1.0 } }"#);
        assert!(config.is_ok());
    }

    #[test]
    fn out_of_range_opacity_is_rejected() {
        let err = VisualConfig::from_json_str(r#"{ "point_opacity": 1.5 }"#).unwrap_err();
        assert!(matches!(err, VisualError::Config(_)));
    }

    #[test]
    fn seeded_rng_is_reproducible() {
        let config = VisualConfig {
            seed: Some(9),
            ..VisualConfig::default()
        };
        let a: f32 = config.rng().gen();
        let b: f32 = config.rng().gen();
        assert_eq!(a, b);
    }

    #[test]
    fn theme_parses_case_insensitively() {
        assert_eq!("Dark".parse::<Theme>().unwrap(), Theme::Dark);
        assert!("sepia".parse::<Theme>().is_err());
    }

    #[test]
    fn light_background_is_page_grey() {
        let [r, g, b] = Theme::Light.background();
        assert!((r - 0.9608).abs() < 1e-3);
        assert!((g - 0.9686).abs() < 1e-3);
        assert!((b - 0.9804).abs() < 1e-3);
    }
}
