use crate::visual::LifecycleState;

/// Everything that can go wrong while bringing a visual up or keeping it on screen.
///
/// Generation itself never fails; all variants come from the graphics subsystem,
/// the host, or user supplied configuration.
#[derive(Debug, thiserror::Error)]
pub enum VisualError {
    #[error("rendering context unavailable: {0}")]
    ContextUnavailable(String),

    #[error("surface error: {0}")]
    Surface(String),

    #[error("device error: {0}")]
    Device(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("failed to read configuration: {0}")]
    Io(#[from] std::io::Error),

    #[error("unknown shape `{0}` (expected star, helix, flower, dice or camera)")]
    UnknownShape(String),

    #[error("unknown theme `{0}` (expected light or dark)")]
    UnknownTheme(String),

    #[error("visual cannot start while {0}")]
    InvalidState(LifecycleState),
}

impl From<wgpu::SurfaceError> for VisualError {
    fn from(e: wgpu::SurfaceError) -> Self {
        VisualError::Surface(e.to_string())
    }
}

impl From<wgpu::CreateSurfaceError> for VisualError {
    fn from(e: wgpu::CreateSurfaceError) -> Self {
        VisualError::ContextUnavailable(e.to_string())
    }
}

impl From<wgpu::RequestDeviceError> for VisualError {
    fn from(e: wgpu::RequestDeviceError) -> Self {
        VisualError::Device(e.to_string())
    }
}

impl From<serde_json::Error> for VisualError {
    fn from(e: serde_json::Error) -> Self {
        VisualError::Config(e.to_string())
    }
}
