use std::sync::Arc;

use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    window::{Window, WindowBuilder},
};
#[cfg(not(target_arch = "wasm32"))]
use winit::keyboard::{KeyCode, PhysicalKey};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

use crate::config::VisualConfig;
use crate::error::VisualError;
use crate::geometry_generator::ShapeKind;
use crate::host::{FrameRequest, FrameScheduler, HostEvent, HostSurface, Listener, SurfaceSize};
use crate::lib_input::PointerTracker;
use crate::lib_state::GpuContext;
use crate::visual::Visual;

const DEFAULT_WINDOW_SIZE: PhysicalSize<u32> = PhysicalSize::new(1280, 720);
const FPS_REPORT_INTERVAL: std::time::Duration = std::time::Duration::from_secs(5);

/// What to show and how.
#[derive(Debug, Clone)]
pub struct AppOptions {
    pub shape: ShapeKind,
    pub config: VisualConfig,
    /// Id of the page element to mount into. Web only; the body is used when absent.
    pub container_id: Option<String>,
}

impl AppOptions {
    pub fn new(shape: ShapeKind, config: VisualConfig) -> Self {
        Self {
            shape,
            config,
            container_id: None,
        }
    }
}

/// Caps a physical size to what `max_pixel_ratio` allows for the window's
/// scale factor.
pub fn clamp_pixel_ratio(
    physical: PhysicalSize<u32>,
    scale_factor: f64,
    max_pixel_ratio: f64,
) -> SurfaceSize {
    if scale_factor <= max_pixel_ratio || scale_factor <= 0.0 {
        return SurfaceSize::new(physical.width, physical.height);
    }
    let ratio = max_pixel_ratio / scale_factor;
    SurfaceSize::new(
        (physical.width as f64 * ratio).round() as u32,
        (physical.height as f64 * ratio).round() as u32,
    )
}

/// [`crate::host::Host`] backed by a winit window. Frame requests become
/// redraw requests; subscriptions gate which window events reach the visual.
pub struct WinitHost {
    window: Arc<Window>,
    max_pixel_ratio: f64,
    #[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
    container_id: Option<String>,
    next_id: u64,
    pending_frame: Option<u64>,
    listeners: Vec<(u64, HostEvent)>,
}

impl WinitHost {
    pub fn new(window: Arc<Window>, max_pixel_ratio: f64, container_id: Option<String>) -> Self {
        Self {
            window,
            max_pixel_ratio,
            container_id,
            next_id: 0,
            pending_frame: None,
            listeners: Vec::new(),
        }
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    fn next_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    pub fn is_listening(&self, event: HostEvent) -> bool {
        self.listeners.iter().any(|(_, e)| *e == event)
    }

    /// Consumes the pending frame request, if any. Redraws the platform
    /// issues on its own are not frame callbacks.
    pub fn take_frame(&mut self) -> bool {
        self.pending_frame.take().is_some()
    }
}

impl FrameScheduler for WinitHost {
    fn request_frame(&mut self) -> FrameRequest {
        let id = self.next_id();
        self.pending_frame = Some(id);
        self.window.request_redraw();
        FrameRequest::new(id)
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        if self.pending_frame == Some(request.id()) {
            self.pending_frame = None;
        }
    }
}

impl HostSurface for WinitHost {
    fn container_size(&self) -> SurfaceSize {
        let physical = self.window.inner_size();
        cfg_if::cfg_if! {
            if #[cfg(target_arch = "wasm32")] {
                clamp_pixel_ratio(physical, self.window.scale_factor(), self.max_pixel_ratio)
            } else {
                SurfaceSize::new(physical.width, physical.height)
            }
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn attach_canvas(&mut self, size: SurfaceSize) -> Result<(), VisualError> {
        log::debug!("Showing window at {}x{}", size.width, size.height);
        self.window.set_visible(true);
        self.window.focus_window();
        Ok(())
    }

    #[cfg(target_arch = "wasm32")]
    fn attach_canvas(&mut self, size: SurfaceSize) -> Result<(), VisualError> {
        use winit::platform::web::WindowExtWebSys;

        let document = web_sys::window()
            .and_then(|win| win.document())
            .ok_or_else(|| VisualError::ContextUnavailable("no document".into()))?;
        let canvas = self
            .window
            .canvas()
            .ok_or_else(|| VisualError::ContextUnavailable("window has no canvas".into()))?;
        let container: web_sys::Element = match &self.container_id {
            Some(id) => document.get_element_by_id(id).ok_or_else(|| {
                VisualError::ContextUnavailable(format!("no element with id `{}`", id))
            })?,
            None => document
                .body()
                .ok_or_else(|| VisualError::ContextUnavailable("document has no body".into()))?
                .into(),
        };
        let canvas = web_sys::Element::from(canvas);
        canvas
            .set_attribute("style", "display:block;width:100%;height:100%")
            .map_err(|_| VisualError::ContextUnavailable("canvas rejected its style".into()))?;
        container
            .append_child(&canvas)
            .map_err(|_| VisualError::ContextUnavailable("container rejected the canvas".into()))?;
        log::debug!("Canvas attached at {}x{}", size.width, size.height);
        Ok(())
    }

    #[cfg(not(target_arch = "wasm32"))]
    fn detach_canvas(&mut self) {
        self.window.set_visible(false);
    }

    #[cfg(target_arch = "wasm32")]
    fn detach_canvas(&mut self) {
        use winit::platform::web::WindowExtWebSys;

        if let Some(canvas) = self.window.canvas() {
            web_sys::Element::from(canvas).remove();
        }
    }

    fn subscribe(&mut self, event: HostEvent) -> Listener {
        let id = self.next_id();
        self.listeners.push((id, event));
        Listener::new(id, event)
    }

    fn unsubscribe(&mut self, listener: Listener) {
        self.listeners.retain(|(id, _)| *id != listener.id());
    }
}

/// Opens a window showing `options.shape` and runs until it is closed.
pub async fn run(options: AppOptions) -> Result<(), VisualError> {
    let event_loop =
        EventLoop::new().map_err(|e| VisualError::ContextUnavailable(e.to_string()))?;
    let title = format!("{} - {}", env!("CARGO_PKG_NAME"), options.shape);

    let window = WindowBuilder::new()
        .with_title(title)
        .with_inner_size(DEFAULT_WINDOW_SIZE)
        .with_visible(false)
        .build(&event_loop)
        .map_err(|e| VisualError::ContextUnavailable(e.to_string()))?;
    let window = Arc::new(window);

    let context = GpuContext::new(Arc::clone(&window)).await?;
    let host = WinitHost::new(
        Arc::clone(&window),
        options.config.max_pixel_ratio,
        options.container_id.clone(),
    );

    let mut rng = options.config.rng();
    let scene = options.shape.scene(&options.config, &mut rng);
    log::info!("Showing {} with {} points", options.shape, scene.point_count());

    let mut visual = Visual::new(context, host, options.config);
    visual.start(scene)?;

    let mut pointer = PointerTracker::new();
    let mut last_report = instant::Instant::now();
    let mut frames_at_report = 0;
    event_loop
        .run(move |event, elwt| {
            let Event::WindowEvent {
                ref event,
                window_id,
            } = event
            else {
                return;
            };
            if window_id != window.id() {
                return;
            }

            if visual.host().is_listening(HostEvent::Pointer) {
                if let Some(input) = pointer.translate(event) {
                    visual.on_pointer(input);
                }
            }

            match event {
                #[cfg(not(target_arch = "wasm32"))]
                WindowEvent::CloseRequested
                | WindowEvent::KeyboardInput {
                    event:
                        KeyEvent {
                            state: ElementState::Pressed,
                            physical_key: PhysicalKey::Code(KeyCode::Escape),
                            ..
                        },
                    ..
                } => {
                    visual.stop();
                    elwt.exit();
                }
                WindowEvent::Resized(_) | WindowEvent::ScaleFactorChanged { .. } => {
                    if visual.host().is_listening(HostEvent::Resize) {
                        visual.on_resize();
                    }
                }
                WindowEvent::RedrawRequested => {
                    if visual.host_mut().take_frame() {
                        if let Err(err) = visual.on_frame() {
                            log::error!("Rendering failed: {}", err);
                            visual.stop();
                            elwt.exit();
                            return;
                        }
                        let elapsed = last_report.elapsed();
                        if elapsed >= FPS_REPORT_INTERVAL {
                            let frames = visual.stats().frames_rendered;
                            log::debug!(
                                "{:.1} fps",
                                (frames - frames_at_report) as f64 / elapsed.as_secs_f64()
                            );
                            frames_at_report = frames;
                            last_report = instant::Instant::now();
                        }
                    }
                }
                _ => {}
            }
        })
        .map_err(|e| VisualError::ContextUnavailable(e.to_string()))
}

/// Web entry point: mounts `shape` into the element with id `container_id`.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen]
pub async fn start_visual(shape: String, container_id: Option<String>) -> Result<(), JsValue> {
    std::panic::set_hook(Box::new(console_error_panic_hook::hook));
    // A second call finds the logger already installed.
    let _ = console_log::init_with_level(log::Level::Info);

    let shape: ShapeKind = shape.parse().map_err(|e: VisualError| JsValue::from_str(&e.to_string()))?;
    let options = AppOptions {
        container_id,
        ..AppOptions::new(shape, VisualConfig::default())
    };
    run(options)
        .await
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pixel_ratio_is_capped() {
        let size = clamp_pixel_ratio(PhysicalSize::new(3000, 1500), 3.0, 2.0);
        assert_eq!(size, SurfaceSize::new(2000, 1000));
    }

    #[test]
    fn low_density_displays_are_untouched() {
        let size = clamp_pixel_ratio(PhysicalSize::new(800, 600), 1.0, 2.0);
        assert_eq!(size, SurfaceSize::new(800, 600));
    }
}
