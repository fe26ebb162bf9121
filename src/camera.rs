use cgmath::*;
use std::f32::consts::{PI, TAU};

use crate::config::OrbitSettings;

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

/// Smallest change that still counts as camera movement.
const EPS: f32 = 1e-6;
/// Per wheel notch zoom factor, raised to the zoom speed.
const WHEEL_ZOOM_BASE: f32 = 0.95;

// Y-up perspective eye
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3<f32>,
    // Center/target point that the camera looks at
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>>(position: V, target: Point3<f32>) -> Self {
        Self {
            position: position.into(),
            target,
            up: Vector3::unit_y(),
        }
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.target).magnitude()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(self.position, self.target, self.up)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        let aspect = if width == 0 || height == 0 {
            1.0
        } else {
            width as f32 / height as f32
        };
        Self {
            aspect,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    /// Updates the aspect ratio. A zero sized surface keeps the previous one.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.aspect = width as f32 / height as f32;
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Middle,
    Secondary,
}

/// Host independent pointer input, in surface pixels.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum PointerInput {
    Down(PointerButton),
    Up(PointerButton),
    Move { dx: f32, dy: f32 },
    Wheel { delta_y: f32 },
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum DragMode {
    Idle,
    Rotate,
    Dolly,
    Pan,
}

/// Offset from the target in spherical coordinates around +Y.
#[derive(Debug, Copy, Clone, PartialEq)]
struct Spherical {
    radius: f32,
    /// Azimuth from +Z towards +X.
    theta: f32,
    /// Polar angle from +Y.
    phi: f32,
}

impl Spherical {
    fn from_offset(offset: Vector3<f32>) -> Self {
        let radius = offset.magnitude();
        if radius < EPS {
            return Self {
                radius: 0.0,
                theta: 0.0,
                phi: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vector3<f32> {
        let sin_phi = self.phi.sin();
        Vector3::new(
            self.radius * sin_phi * self.theta.sin(),
            self.radius * self.phi.cos(),
            self.radius * sin_phi * self.theta.cos(),
        )
    }
}

/// Damped orbit around the camera target: drag to rotate, wheel to zoom.
///
/// Input only accumulates deltas; [`OrbitControls::update`] applies a
/// `damping_factor` share of them per frame and decays the rest, so the camera
/// keeps gliding for a while after the pointer stops.
#[derive(Debug, Clone)]
pub struct OrbitControls {
    settings: OrbitSettings,
    mode: DragMode,
    delta_theta: f32,
    delta_phi: f32,
    scale: f32,
    viewport_height: f32,
}

impl OrbitControls {
    pub fn new(settings: OrbitSettings) -> Self {
        Self {
            settings,
            mode: DragMode::Idle,
            delta_theta: 0.0,
            delta_phi: 0.0,
            scale: 1.0,
            viewport_height: 1.0,
        }
    }

    pub fn settings(&self) -> &OrbitSettings {
        &self.settings
    }

    /// Drag distances are measured relative to the surface height.
    pub fn set_viewport_height(&mut self, height: u32) {
        if height > 0 {
            self.viewport_height = height as f32;
        }
    }

    fn zoom_scale(&self) -> f32 {
        WHEEL_ZOOM_BASE.powf(self.settings.zoom_speed)
    }

    fn dolly_in(&mut self) {
        self.scale *= self.zoom_scale();
    }

    fn dolly_out(&mut self) {
        self.scale /= self.zoom_scale();
    }

    /// Returns whether the input was consumed.
    pub fn handle_pointer(&mut self, input: PointerInput) -> bool {
        match input {
            PointerInput::Down(button) => {
                self.mode = match button {
                    PointerButton::Primary => DragMode::Rotate,
                    PointerButton::Middle if self.settings.enable_zoom => DragMode::Dolly,
                    PointerButton::Secondary if self.settings.enable_pan => DragMode::Pan,
                    _ => DragMode::Idle,
                };
                self.mode != DragMode::Idle
            }
            PointerInput::Up(_) => {
                let was_dragging = self.mode != DragMode::Idle;
                self.mode = DragMode::Idle;
                was_dragging
            }
            PointerInput::Move { dx, dy } => match self.mode {
                DragMode::Rotate => {
                    let speed = self.settings.rotate_speed;
                    self.delta_theta -= TAU * dx * speed / self.viewport_height;
                    self.delta_phi -= TAU * dy * speed / self.viewport_height;
                    true
                }
                DragMode::Dolly => {
                    if dy > 0.0 {
                        self.dolly_out();
                    } else if dy < 0.0 {
                        self.dolly_in();
                    }
                    true
                }
                // Target stays fixed.
                DragMode::Pan | DragMode::Idle => false,
            },
            PointerInput::Wheel { delta_y } => {
                if !self.settings.enable_zoom || delta_y == 0.0 {
                    return false;
                }
                if delta_y < 0.0 {
                    self.dolly_in();
                } else {
                    self.dolly_out();
                }
                true
            }
        }
    }

    /// Applies pending rotation and zoom to `camera`. Returns whether it moved.
    pub fn update(&mut self, camera: &mut Camera) -> bool {
        let damping = self.settings.damping_factor;
        let mut spherical = Spherical::from_offset(camera.position - camera.target);

        spherical.theta += self.delta_theta * damping;
        spherical.phi = (spherical.phi + self.delta_phi * damping).clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale)
            .clamp(self.settings.min_distance, self.settings.max_distance);

        let previous = camera.position;
        camera.position = camera.target + spherical.to_offset();

        self.delta_theta *= 1.0 - damping;
        self.delta_phi *= 1.0 - damping;
        self.scale = 1.0;

        (camera.position - previous).magnitude2() > EPS
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn camera() -> Camera {
        Camera::new(Point3::new(0.0, 0.0, 8.0), Point3::new(0.0, 0.0, 0.0))
    }

    fn controls() -> OrbitControls {
        let mut controls = OrbitControls::new(OrbitSettings::default());
        controls.set_viewport_height(600);
        controls
    }

    #[test]
    fn idle_controls_leave_the_camera_alone() {
        let mut camera = camera();
        let mut controls = controls();
        assert!(!controls.update(&mut camera));
        assert_relative_eq!(camera.position.z, 8.0, epsilon = 1e-5);
    }

    #[test]
    fn drag_rotation_is_damped_over_frames() {
        let mut camera = camera();
        let mut controls = controls();
        controls.handle_pointer(PointerInput::Down(PointerButton::Primary));
        controls.handle_pointer(PointerInput::Move { dx: 60.0, dy: 0.0 });
        controls.handle_pointer(PointerInput::Up(PointerButton::Primary));

        assert!(controls.update(&mut camera));
        let after_one = camera.position;
        for _ in 0..200 {
            controls.update(&mut camera);
        }
        // First frame applies only a small share of the drag.
        let total = camera.position.x.atan2(camera.position.z);
        let first = after_one.x.atan2(after_one.z);
        assert!(first.abs() < total.abs() * 0.1);
        let expected = -TAU * 60.0 * 0.5 / 600.0;
        assert_relative_eq!(total, expected, epsilon = 1e-3);
        assert_relative_eq!(camera.distance(), 8.0, epsilon = 1e-4);
    }

    #[test]
    fn zoom_is_clamped_to_the_distance_range() {
        let mut camera = camera();
        let mut controls = controls();
        for _ in 0..200 {
            controls.handle_pointer(PointerInput::Wheel { delta_y: -1.0 });
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.distance(), 4.0, epsilon = 1e-4);
        for _ in 0..200 {
            controls.handle_pointer(PointerInput::Wheel { delta_y: 1.0 });
            controls.update(&mut camera);
        }
        assert_relative_eq!(camera.distance(), 20.0, epsilon = 1e-4);
    }

    #[test]
    fn pan_drag_is_ignored() {
        let mut camera = camera();
        let mut controls = controls();
        assert!(!controls.handle_pointer(PointerInput::Down(PointerButton::Secondary)));
        assert!(!controls.handle_pointer(PointerInput::Move { dx: 50.0, dy: 50.0 }));
        controls.update(&mut camera);
        assert_eq!(camera.target, Point3::new(0.0, 0.0, 0.0));
    }

    #[test]
    fn polar_angle_never_flips_over_the_pole() {
        let mut camera = camera();
        let mut controls = controls();
        controls.handle_pointer(PointerInput::Down(PointerButton::Primary));
        controls.handle_pointer(PointerInput::Move { dx: 0.0, dy: 5000.0 });
        for _ in 0..500 {
            controls.update(&mut camera);
        }
        assert!(camera.position.y > 0.0);
        assert!(camera.position.z.abs() < 1e-3);
    }

    #[test]
    fn disabled_zoom_ignores_the_wheel() {
        let settings = OrbitSettings {
            enable_zoom: false,
            ..OrbitSettings::default()
        };
        let mut controls = OrbitControls::new(settings);
        assert!(!controls.handle_pointer(PointerInput::Wheel { delta_y: -3.0 }));
    }

    #[test]
    fn projection_keeps_aspect_for_empty_surfaces() {
        let mut projection = Projection::new(800, 600, Deg(50.0), 0.1, 100.0);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
        projection.resize(0, 0);
        assert_relative_eq!(projection.aspect(), 800.0 / 600.0);
        projection.resize(1024, 512);
        assert_relative_eq!(projection.aspect(), 2.0);
    }
}
