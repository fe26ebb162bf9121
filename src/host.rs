//! Seams between a [`crate::visual::Visual`] and the world around it: the page
//! or window that hosts it ([`HostSurface`] + [`FrameScheduler`]) and the
//! graphics subsystem that draws it ([`RenderContext`]).
//!
//! Every handle handed out across these seams (`FrameRequest`, `Listener`,
//! `Resource`) is move-only. Giving one back consumes it, so a handle cannot be
//! cancelled, unsubscribed or released twice.

use cgmath::{Matrix4, Point3};
use image::RgbaImage;

use crate::error::VisualError;
use crate::point_cloud::{Color, PointCloud};
use crate::scene::PointStyle;
use crate::shape_star::TubeMesh;

/// Physical pixel size of the host container.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

impl SurfaceSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A collapsed container, e.g. a hidden element or a minimized window.
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect(&self) -> Option<f32> {
        if self.is_empty() {
            None
        } else {
            Some(self.width as f32 / self.height as f32)
        }
    }
}

/// A pending "call me on the next display refresh" request.
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a frame request must be kept so it can be cancelled"]
pub struct FrameRequest(u64);

impl FrameRequest {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(&self) -> u64 {
        self.0
    }
}

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum HostEvent {
    Resize,
    Pointer,
}

/// Registration of interest in one [`HostEvent`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "a listener must be kept so it can be unsubscribed"]
pub struct Listener {
    id: u64,
    event: HostEvent,
}

impl Listener {
    pub fn new(id: u64, event: HostEvent) -> Self {
        Self { id, event }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn event(&self) -> HostEvent {
        self.event
    }
}

pub trait HostSurface {
    fn container_size(&self) -> SurfaceSize;
    /// Inserts the drawing surface into the container.
    fn attach_canvas(&mut self, size: SurfaceSize) -> Result<(), VisualError>;
    fn detach_canvas(&mut self);
    fn subscribe(&mut self, event: HostEvent) -> Listener;
    fn unsubscribe(&mut self, listener: Listener);
}

/// Everything a visual needs from its host.
pub trait Host: HostSurface + FrameScheduler {}

impl<T: HostSurface + FrameScheduler> Host for T {}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Texture,
    Geometry,
    Material,
}

/// Copyable name of a [`Resource`], for referring to it without owning it.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub id: u64,
}

/// Owning handle to a GPU side object. Released by passing it back to
/// [`RenderContext::release`].
#[derive(Debug, PartialEq, Eq)]
#[must_use = "dropping a resource handle leaks the object it names"]
pub struct Resource(ResourceKey);

impl Resource {
    pub fn new(kind: ResourceKind, id: u64) -> Self {
        Self(ResourceKey { kind, id })
    }

    pub fn key(&self) -> ResourceKey {
        self.0
    }

    pub fn kind(&self) -> ResourceKind {
        self.0.kind
    }
}

/// The pair of resources backing one drawable mesh.
#[derive(Debug)]
pub struct MeshResources {
    pub geometry: Resource,
    pub material: Resource,
}

/// One mesh to draw this frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct DrawCall {
    pub geometry: ResourceKey,
    pub material: ResourceKey,
    pub model: Matrix4<f32>,
}

/// Everything the render context needs to draw one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub view: Matrix4<f32>,
    pub projection: Matrix4<f32>,
    pub eye: Point3<f32>,
    pub aspect: f32,
    /// `None` clears to transparent.
    pub background: Option<Color>,
    pub draws: Vec<DrawCall>,
}

/// The graphics subsystem a visual renders through.
pub trait RenderContext {
    fn create_texture(&mut self, label: &str, image: &RgbaImage) -> Result<Resource, VisualError>;

    /// Uploads a point cloud drawn with sprite `sprite`.
    fn create_points(
        &mut self,
        label: &str,
        cloud: &PointCloud,
        style: &PointStyle,
        sprite: ResourceKey,
    ) -> Result<MeshResources, VisualError>;

    /// Uploads a solid mesh shaded from `matcap` and tinted by `environment`.
    fn create_solid(
        &mut self,
        label: &str,
        mesh: &TubeMesh,
        matcap: ResourceKey,
        environment: ResourceKey,
    ) -> Result<MeshResources, VisualError>;

    fn resize(&mut self, size: SurfaceSize);
    fn render(&mut self, frame: &Frame) -> Result<(), VisualError>;
    fn release(&mut self, resource: Resource);
    /// Gives up the context itself. Nothing may be created or rendered after.
    fn dispose(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_surfaces_have_no_aspect() {
        assert!(SurfaceSize::new(0, 600).is_empty());
        assert!(SurfaceSize::new(800, 0).is_empty());
        assert_eq!(SurfaceSize::new(0, 0).aspect(), None);
        assert_eq!(SurfaceSize::new(800, 400).aspect(), Some(2.0));
    }

    #[test]
    fn resource_keys_name_their_handle() {
        let resource = Resource::new(ResourceKind::Geometry, 7);
        let key = resource.key();
        assert_eq!(key.kind, ResourceKind::Geometry);
        assert_eq!(key.id, 7);
        assert_eq!(resource.kind(), ResourceKind::Geometry);
    }
}
