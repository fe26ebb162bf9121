//! Window-less host and render context.
//!
//! Both keep their bookkeeping behind an `Rc<RefCell<..>>` ledger so it can be
//! inspected after the owning [`Visual`] has been dropped. The CLI uses them
//! for `--headless` runs; the lifecycle tests use them to count handles.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;

use crate::error::VisualError;
use crate::host::{
    Frame, FrameRequest, FrameScheduler, HostEvent, HostSurface, Listener, MeshResources,
    RenderContext, Resource, ResourceKey, ResourceKind, SurfaceSize,
};
use crate::point_cloud::PointCloud;
use crate::scene::PointStyle;
use crate::shape_star::TubeMesh;
use crate::visual::Visual;

#[derive(Debug, Clone, PartialEq)]
pub enum ContextEvent {
    Created(ResourceKey),
    Resized(SurfaceSize),
    Rendered { aspect: f32, draws: usize },
    Released(ResourceKey),
    Disposed,
}

/// Everything a [`HeadlessContext`] was asked to do, in order.
#[derive(Debug, Default)]
pub struct ContextLedger {
    events: Vec<ContextEvent>,
    releases: HashMap<ResourceKey, usize>,
}

impl ContextLedger {
    pub fn events(&self) -> &[ContextEvent] {
        &self.events
    }

    pub fn created(&self) -> Vec<ResourceKey> {
        self.events
            .iter()
            .filter_map(|event| match event {
                ContextEvent::Created(key) => Some(*key),
                _ => None,
            })
            .collect()
    }

    pub fn release_count(&self, key: ResourceKey) -> usize {
        self.releases.get(&key).copied().unwrap_or(0)
    }

    /// Created but not yet released.
    pub fn live(&self) -> Vec<ResourceKey> {
        self.created()
            .into_iter()
            .filter(|key| self.release_count(*key) == 0)
            .collect()
    }

    fn is_live(&self, key: ResourceKey) -> bool {
        self.created().contains(&key) && self.release_count(key) == 0
    }

    /// Every created resource was released exactly once and nothing else was.
    pub fn all_released(&self) -> bool {
        let created = self.created();
        created.iter().all(|key| self.release_count(*key) == 1)
            && self.releases.keys().all(|key| created.contains(key))
    }

    pub fn dispose_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ContextEvent::Disposed))
            .count()
    }

    pub fn render_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, ContextEvent::Rendered { .. }))
            .count()
    }
}

/// [`RenderContext`] that records calls instead of drawing.
#[derive(Debug, Default)]
pub struct HeadlessContext {
    ledger: Rc<RefCell<ContextLedger>>,
    next_id: u64,
    creations: usize,
    fail_after: Option<usize>,
    disposed: bool,
}

impl HeadlessContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// A context whose resource creation fails once `successes` resources exist.
    pub fn failing_after(successes: usize) -> Self {
        Self {
            fail_after: Some(successes),
            ..Self::default()
        }
    }

    pub fn ledger(&self) -> Rc<RefCell<ContextLedger>> {
        Rc::clone(&self.ledger)
    }

    fn allocate(&mut self, kind: ResourceKind) -> Result<Resource, VisualError> {
        if self.disposed {
            return Err(VisualError::ContextUnavailable("context disposed".into()));
        }
        if self.fail_after.is_some_and(|limit| self.creations >= limit) {
            return Err(VisualError::ContextUnavailable(
                "resource allocation failed".into(),
            ));
        }
        self.creations += 1;
        self.next_id += 1;
        let resource = Resource::new(kind, self.next_id);
        self.ledger
            .borrow_mut()
            .events
            .push(ContextEvent::Created(resource.key()));
        Ok(resource)
    }

    fn require_live(&self, key: ResourceKey) -> Result<(), VisualError> {
        if self.ledger.borrow().is_live(key) {
            Ok(())
        } else {
            Err(VisualError::ContextUnavailable(format!(
                "{:?} {} is not live",
                key.kind, key.id
            )))
        }
    }

    fn mesh(&mut self) -> Result<MeshResources, VisualError> {
        let geometry = self.allocate(ResourceKind::Geometry)?;
        match self.allocate(ResourceKind::Material) {
            Ok(material) => Ok(MeshResources { geometry, material }),
            Err(err) => {
                self.release(geometry);
                Err(err)
            }
        }
    }
}

impl RenderContext for HeadlessContext {
    fn create_texture(&mut self, label: &str, image: &RgbaImage) -> Result<Resource, VisualError> {
        log::debug!("headless texture '{}' {:?}", label, image.dimensions());
        self.allocate(ResourceKind::Texture)
    }

    fn create_points(
        &mut self,
        label: &str,
        cloud: &PointCloud,
        _style: &PointStyle,
        sprite: ResourceKey,
    ) -> Result<MeshResources, VisualError> {
        self.require_live(sprite)?;
        log::debug!("headless points '{}' with {} points", label, cloud.len());
        self.mesh()
    }

    fn create_solid(
        &mut self,
        label: &str,
        mesh: &TubeMesh,
        matcap: ResourceKey,
        environment: ResourceKey,
    ) -> Result<MeshResources, VisualError> {
        self.require_live(matcap)?;
        self.require_live(environment)?;
        log::debug!("headless solid '{}' with {} triangles", label, mesh.triangle_count());
        self.mesh()
    }

    fn resize(&mut self, size: SurfaceSize) {
        self.ledger
            .borrow_mut()
            .events
            .push(ContextEvent::Resized(size));
    }

    fn render(&mut self, frame: &Frame) -> Result<(), VisualError> {
        if self.disposed {
            return Err(VisualError::ContextUnavailable("context disposed".into()));
        }
        for draw in &frame.draws {
            self.require_live(draw.geometry)?;
            self.require_live(draw.material)?;
        }
        self.ledger.borrow_mut().events.push(ContextEvent::Rendered {
            aspect: frame.aspect,
            draws: frame.draws.len(),
        });
        Ok(())
    }

    fn release(&mut self, resource: Resource) {
        let key = resource.key();
        let mut ledger = self.ledger.borrow_mut();
        *ledger.releases.entry(key).or_insert(0) += 1;
        ledger.events.push(ContextEvent::Released(key));
    }

    fn dispose(&mut self) {
        self.disposed = true;
        self.ledger.borrow_mut().events.push(ContextEvent::Disposed);
    }
}

/// Host state shared between a [`ManualHost`] and whoever drives it.
#[derive(Debug, Default)]
pub struct HostLedger {
    pub size: SurfaceSize,
    pub canvas_attached: bool,
    pub attach_count: usize,
    pub detach_count: usize,
    pub frames_requested: usize,
    pub frames_cancelled: usize,
    pub subscribed: usize,
    pub unsubscribed: usize,
    pub reject_canvas: bool,
    pending: Vec<u64>,
    listeners: Vec<(u64, HostEvent)>,
    next_id: u64,
}

impl HostLedger {
    pub fn pending_frames(&self) -> usize {
        self.pending.len()
    }

    pub fn active_listeners(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_listening(&self, event: HostEvent) -> bool {
        self.listeners.iter().any(|(_, e)| *e == event)
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }
}

/// Host whose frame callbacks fire only when [`ManualHost::fire_frame`] is called.
#[derive(Debug, Default)]
pub struct ManualHost {
    ledger: Rc<RefCell<HostLedger>>,
}

impl ManualHost {
    pub fn new(size: SurfaceSize) -> Self {
        let host = Self::default();
        host.ledger.borrow_mut().size = size;
        host
    }

    pub fn ledger(&self) -> Rc<RefCell<HostLedger>> {
        Rc::clone(&self.ledger)
    }

    pub fn set_size(&mut self, size: SurfaceSize) {
        self.ledger.borrow_mut().size = size;
    }

    pub fn canvas_attached(&self) -> bool {
        self.ledger.borrow().canvas_attached
    }

    /// Consumes the oldest pending request. Returns false when none is pending.
    pub fn fire_frame(&mut self) -> bool {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.pending.is_empty() {
            return false;
        }
        ledger.pending.remove(0);
        true
    }
}

impl FrameScheduler for ManualHost {
    fn request_frame(&mut self) -> FrameRequest {
        let mut ledger = self.ledger.borrow_mut();
        let id = ledger.next_id();
        ledger.pending.push(id);
        ledger.frames_requested += 1;
        FrameRequest::new(id)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.pending.retain(|id| *id != request.id());
        ledger.frames_cancelled += 1;
    }
}

impl HostSurface for ManualHost {
    fn container_size(&self) -> SurfaceSize {
        self.ledger.borrow().size
    }

    fn attach_canvas(&mut self, size: SurfaceSize) -> Result<(), VisualError> {
        let mut ledger = self.ledger.borrow_mut();
        if ledger.reject_canvas {
            return Err(VisualError::ContextUnavailable(
                "container rejected the canvas".into(),
            ));
        }
        log::debug!("headless canvas attached at {}x{}", size.width, size.height);
        ledger.canvas_attached = true;
        ledger.attach_count += 1;
        Ok(())
    }

    fn detach_canvas(&mut self) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.canvas_attached = false;
        ledger.detach_count += 1;
    }

    fn subscribe(&mut self, event: HostEvent) -> Listener {
        let mut ledger = self.ledger.borrow_mut();
        let id = ledger.next_id();
        ledger.listeners.push((id, event));
        ledger.subscribed += 1;
        Listener::new(id, event)
    }

    fn unsubscribe(&mut self, listener: Listener) {
        let mut ledger = self.ledger.borrow_mut();
        ledger.listeners.retain(|(id, _)| *id != listener.id());
        ledger.unsubscribed += 1;
    }
}

/// Fires up to `frames` pending frame callbacks. Returns how many ran.
pub fn drive<C: RenderContext>(
    visual: &mut Visual<C, ManualHost>,
    frames: usize,
) -> Result<usize, VisualError> {
    let mut ran = 0;
    while ran < frames && visual.host_mut().fire_frame() {
        visual.on_frame()?;
        ran += 1;
    }
    Ok(ran)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failing_context_refuses_after_the_limit() {
        let mut context = HeadlessContext::failing_after(1);
        let image = RgbaImage::new(1, 1);
        let first = context.create_texture("a", &image).unwrap();
        assert!(context.create_texture("b", &image).is_err());
        context.release(first);
        assert!(context.ledger().borrow().all_released());
    }

    #[test]
    fn double_release_is_visible_in_the_ledger() {
        let mut context = HeadlessContext::new();
        let image = RgbaImage::new(1, 1);
        let resource = context.create_texture("a", &image).unwrap();
        let key = resource.key();
        context.release(resource);
        // A forged second handle for the same key.
        context.release(Resource::new(key.kind, key.id));
        assert_eq!(context.ledger().borrow().release_count(key), 2);
        assert!(!context.ledger().borrow().all_released());
    }

    #[test]
    fn cancelled_frames_never_fire() {
        let mut host = ManualHost::new(SurfaceSize::new(10, 10));
        let request = host.request_frame();
        host.cancel_frame(request);
        assert!(!host.fire_frame());
        assert_eq!(host.ledger().borrow().frames_cancelled, 1);
    }
}
