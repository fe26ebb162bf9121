//! Mount, animate and tear down one visual.
//!
//! A [`Visual`] owns its render context and host handles outright. The host
//! drives it: every frame callback ends up in [`Visual::on_frame`], which
//! schedules the next one. [`Visual::stop`] (also run on drop) gives every
//! handle back exactly once.

use std::fmt;

use crate::animation::{FrameClock, IdleMotion, Transform};
use crate::camera::{Camera, OrbitControls, PointerInput, Projection};
use crate::config::VisualConfig;
use crate::error::VisualError;
use crate::host::{
    DrawCall, Frame, FrameRequest, Host, HostEvent, Listener, MeshResources, RenderContext,
    Resource, SurfaceSize,
};
use crate::point_cloud::Color;
use crate::scene::{MeshContent, SceneSpec};
use crate::texture;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LifecycleState {
    Unmounted,
    Initializing,
    Running,
    Disposing,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Unmounted => "unmounted",
            LifecycleState::Initializing => "initializing",
            LifecycleState::Running => "running",
            LifecycleState::Disposing => "disposing",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct VisualStats {
    pub frames_rendered: u64,
    /// Accumulated animation time.
    pub time: f32,
}

struct MountedMesh {
    label: String,
    motion: IdleMotion,
    transform: Transform,
    resources: MeshResources,
}

pub struct Visual<C: RenderContext, H: Host> {
    context: C,
    host: H,
    config: VisualConfig,
    state: LifecycleState,
    context_disposed: bool,
    canvas_attached: bool,
    camera: Camera,
    projection: Projection,
    controls: OrbitControls,
    clock: FrameClock,
    background: Option<Color>,
    textures: Vec<Resource>,
    meshes: Vec<MountedMesh>,
    listeners: Vec<Listener>,
    pending_frame: Option<FrameRequest>,
    frames_rendered: u64,
}

impl<C: RenderContext, H: Host> Visual<C, H> {
    pub fn new(context: C, host: H, config: VisualConfig) -> Self {
        let fov = cgmath::Deg(config.fov_y_degrees);
        Self {
            camera: Camera::new(cgmath::Point3::new(0.0, 0.0, 1.0), cgmath::Point3::new(0.0, 0.0, 0.0)),
            projection: Projection::new(1, 1, fov, config.near, config.far),
            controls: OrbitControls::new(config.orbit.clone()),
            clock: FrameClock::new(config.frame_increment),
            context,
            host,
            config,
            state: LifecycleState::Unmounted,
            context_disposed: false,
            canvas_attached: false,
            background: None,
            textures: Vec::new(),
            meshes: Vec::new(),
            listeners: Vec::new(),
            pending_frame: None,
            frames_rendered: 0,
        }
    }

    /// Sets the scene up and schedules the first frame.
    ///
    /// On failure everything acquired so far is given back and the visual
    /// stays unmounted.
    pub fn start(&mut self, scene: SceneSpec) -> Result<(), VisualError> {
        if self.state != LifecycleState::Unmounted {
            return Err(VisualError::InvalidState(self.state));
        }
        if self.context_disposed {
            return Err(VisualError::ContextUnavailable(
                "rendering context was already disposed".into(),
            ));
        }
        self.config.validate()?;

        self.state = LifecycleState::Initializing;
        log::info!("Mounting visual with {} meshes", scene.meshes.len());

        if let Err(err) = self.mount(scene) {
            log::error!("Visual setup failed: {}", err);
            self.teardown();
            self.state = LifecycleState::Unmounted;
            return Err(err);
        }

        self.state = LifecycleState::Running;
        self.pending_frame = Some(self.host.request_frame());
        Ok(())
    }

    fn mount(&mut self, scene: SceneSpec) -> Result<(), VisualError> {
        let size = self.host.container_size();
        self.host.attach_canvas(size)?;
        self.canvas_attached = true;
        if !size.is_empty() {
            self.context.resize(size);
        }

        let rig = scene.rig;
        self.camera = Camera::new(rig.position, rig.look_at);
        self.projection = Projection::new(size.width, size.height, rig.fov_y, rig.near, rig.far);
        self.controls = OrbitControls::new(self.config.orbit.clone());
        self.controls.set_viewport_height(size.height);
        self.clock = FrameClock::new(self.config.frame_increment);
        self.frames_rendered = 0;
        self.background = scene.background;

        let needs_sprite = scene
            .meshes
            .iter()
            .any(|mesh| matches!(mesh.content, MeshContent::Points { .. }));
        let sprite = if needs_sprite {
            let image = texture::circle_sprite(texture::SPRITE_SIZE);
            let resource = self.context.create_texture("point-sprite", &image)?;
            let key = resource.key();
            self.textures.push(resource);
            Some(key)
        } else {
            None
        };

        for spec in scene.meshes {
            let resources = match &spec.content {
                MeshContent::Points { cloud, style } => {
                    let sprite = sprite.ok_or_else(|| {
                        VisualError::ContextUnavailable("point sprite missing".into())
                    })?;
                    self.context.create_points(&spec.label, cloud, style, sprite)?
                }
                MeshContent::Solid {
                    mesh,
                    base,
                    highlight,
                } => {
                    let matcap = self.context.create_texture(
                        &format!("{}-matcap", spec.label),
                        &texture::matcap(texture::MATCAP_SIZE, *base, *highlight),
                    )?;
                    let matcap_key = matcap.key();
                    self.textures.push(matcap);

                    let environment = self.context.create_texture(
                        &format!("{}-environment", spec.label),
                        &texture::environment_gradient(
                            texture::ENVIRONMENT_HEIGHT,
                            *highlight,
                            *base,
                        ),
                    )?;
                    let environment_key = environment.key();
                    self.textures.push(environment);

                    self.context
                        .create_solid(&spec.label, mesh, matcap_key, environment_key)?
                }
            };
            log::debug!("Uploaded mesh '{}'", spec.label);
            self.meshes.push(MountedMesh {
                transform: spec.motion.transform(0.0),
                label: spec.label,
                motion: spec.motion,
                resources,
            });
        }

        self.listeners.push(self.host.subscribe(HostEvent::Resize));
        self.listeners.push(self.host.subscribe(HostEvent::Pointer));
        Ok(())
    }

    /// One animation step. A no-op unless running, so a callback that was
    /// already queued when the visual stopped does nothing.
    pub fn on_frame(&mut self) -> Result<(), VisualError> {
        if self.state != LifecycleState::Running {
            return Ok(());
        }
        // The host just fired this request.
        self.pending_frame = None;

        let time = self.clock.tick();
        for mesh in &mut self.meshes {
            mesh.transform = mesh.motion.transform(time);
        }
        self.controls.update(&mut self.camera);

        let frame = Frame {
            view: self.camera.calc_matrix(),
            projection: self.projection.calc_matrix(),
            eye: self.camera.position,
            aspect: self.projection.aspect(),
            background: self.background,
            draws: self
                .meshes
                .iter()
                .map(|mesh| DrawCall {
                    geometry: mesh.resources.geometry.key(),
                    material: mesh.resources.material.key(),
                    model: mesh.transform.matrix(),
                })
                .collect(),
        };
        self.context.render(&frame)?;
        self.frames_rendered += 1;

        self.pending_frame = Some(self.host.request_frame());
        Ok(())
    }

    /// Re-reads the container size. Collapsed containers are ignored.
    pub fn on_resize(&mut self) {
        if self.state != LifecycleState::Running {
            return;
        }
        let size = self.host.container_size();
        if size.is_empty() {
            log::debug!("Ignoring resize to an empty container");
            return;
        }
        self.projection.resize(size.width, size.height);
        self.controls.set_viewport_height(size.height);
        self.context.resize(size);
    }

    /// Returns whether the orbit controls consumed the input.
    pub fn on_pointer(&mut self, input: PointerInput) -> bool {
        if self.state != LifecycleState::Running {
            return false;
        }
        self.controls.handle_pointer(input)
    }

    /// Tears everything down and disposes the render context. Safe to call
    /// any number of times.
    pub fn stop(&mut self) {
        if self.context_disposed {
            return;
        }
        self.state = LifecycleState::Disposing;
        self.teardown();
        self.context.dispose();
        self.context_disposed = true;
        self.state = LifecycleState::Unmounted;
        log::info!("Visual stopped after {} frames", self.frames_rendered);
    }

    fn teardown(&mut self) {
        if let Some(request) = self.pending_frame.take() {
            self.host.cancel_frame(request);
        }
        for listener in self.listeners.drain(..) {
            self.host.unsubscribe(listener);
        }
        if self.canvas_attached {
            self.host.detach_canvas();
            self.canvas_attached = false;
        }
        let mut released = 0;
        for mesh in self.meshes.drain(..) {
            self.context.release(mesh.resources.geometry);
            self.context.release(mesh.resources.material);
            released += 2;
        }
        for texture in self.textures.drain(..) {
            self.context.release(texture);
            released += 1;
        }
        log::debug!("Released {} resources", released);
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn stats(&self) -> VisualStats {
        VisualStats {
            frames_rendered: self.frames_rendered,
            time: self.clock.time(),
        }
    }

    /// Current transform of every mesh, by label.
    pub fn transforms(&self) -> impl Iterator<Item = (&str, Transform)> + '_ {
        self.meshes
            .iter()
            .map(|mesh| (mesh.label.as_str(), mesh.transform))
    }

    pub fn mesh_transform(&self, label: &str) -> Option<Transform> {
        self.meshes
            .iter()
            .find(|mesh| mesh.label == label)
            .map(|mesh| mesh.transform)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn has_pending_frame(&self) -> bool {
        self.pending_frame.is_some()
    }

    pub fn container_size(&self) -> SurfaceSize {
        self.host.container_size()
    }

    pub fn context(&self) -> &C {
        &self.context
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }
}

impl<C: RenderContext, H: Host> Drop for Visual<C, H> {
    fn drop(&mut self) {
        self.stop();
    }
}
