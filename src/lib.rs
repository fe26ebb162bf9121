//! Procedural point cloud visuals: a star tube, a double helix, a flower,
//! a die and a camera, each generated on the CPU and drawn with wgpu.
//!
//! Generation ([`geometry_generator`] and the `shape_*` modules) is pure and
//! seedable. [`visual::Visual`] owns the mount/animate/teardown lifecycle and
//! talks to the outside world only through the traits in [`host`], so the same
//! code drives a winit window ([`lib_app`]) and the window-less doubles in
//! [`headless`].

pub mod animation;
pub mod camera;
pub mod config;
pub mod error;
pub mod geometry_generator;
pub mod headless;
pub mod host;
pub mod point_cloud;
pub mod sampling;
pub mod scene;
pub mod shape_camera;
pub mod shape_dice;
pub mod shape_flower;
pub mod shape_helix;
pub mod shape_star;
pub mod texture;
pub mod visual;

pub mod lib_app;
pub mod lib_input;
pub mod lib_pipeline;
pub mod lib_render;
pub mod lib_state;
pub mod model_mesh;
pub mod model_point;

pub use config::{Theme, VisualConfig};
pub use error::VisualError;
pub use geometry_generator::ShapeKind;
pub use lib_app::{run, AppOptions};
pub use visual::{LifecycleState, Visual, VisualStats};
