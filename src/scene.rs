//! Declarative description of what a visual shows: camera rig, background and
//! the meshes with their idle motion. Built by the shape generators, consumed
//! once by [`crate::visual::Visual::start`].

use cgmath::{Deg, Point3};

use crate::animation::IdleMotion;
use crate::config::VisualConfig;
use crate::point_cloud::{Color, PointCloud};
use crate::shape_star::TubeMesh;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraRig {
    pub position: Point3<f32>,
    pub look_at: Point3<f32>,
    pub fov_y: Deg<f32>,
    pub near: f32,
    pub far: f32,
}

impl CameraRig {
    pub fn new(position: Point3<f32>, look_at: Point3<f32>, config: &VisualConfig) -> Self {
        Self {
            position,
            look_at,
            fov_y: Deg(config.fov_y_degrees),
            near: config.near,
            far: config.far,
        }
    }
}

/// Soft sprite point appearance.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct PointStyle {
    /// World-space diameter of a point.
    pub size: f32,
    pub opacity: f32,
    pub size_attenuation: bool,
}

impl Default for PointStyle {
    fn default() -> Self {
        Self {
            size: 0.07,
            opacity: 0.85,
            size_attenuation: true,
        }
    }
}

impl PointStyle {
    /// Applies the size/opacity overrides from the configuration.
    pub fn with_overrides(mut self, config: &VisualConfig) -> Self {
        if let Some(size) = config.point_size {
            self.size = size;
        }
        if let Some(opacity) = config.point_opacity {
            self.opacity = opacity;
        }
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MeshContent {
    Points { cloud: PointCloud, style: PointStyle },
    /// Solid, matcap shaded surface.
    Solid { mesh: TubeMesh, base: Color, highlight: Color },
}

#[derive(Debug, Clone, PartialEq)]
pub struct MeshSpec {
    pub label: String,
    pub content: MeshContent,
    pub motion: IdleMotion,
}

impl MeshSpec {
    pub fn points(label: &str, cloud: PointCloud, style: PointStyle, motion: IdleMotion) -> Self {
        Self {
            label: label.to_string(),
            content: MeshContent::Points { cloud, style },
            motion,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SceneSpec {
    pub rig: CameraRig,
    /// Opaque clear color; `None` leaves the surface transparent.
    pub background: Option<Color>,
    pub meshes: Vec<MeshSpec>,
}

impl SceneSpec {
    pub fn point_count(&self) -> usize {
        self.meshes
            .iter()
            .map(|mesh| match &mesh.content {
                MeshContent::Points { cloud, .. } => cloud.len(),
                MeshContent::Solid { .. } => 0,
            })
            .sum()
    }

    pub fn has_solid_meshes(&self) -> bool {
        self.meshes
            .iter()
            .any(|mesh| matches!(mesh.content, MeshContent::Solid { .. }))
    }
}
