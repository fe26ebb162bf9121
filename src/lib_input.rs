use winit::event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent};

use crate::camera::{PointerButton, PointerInput};

/// Pixels per scrolled line, matching what browsers report in `deltaY`.
const PIXELS_PER_LINE: f32 = 100.0;

pub fn pointer_button(button: MouseButton) -> Option<PointerButton> {
    match button {
        MouseButton::Left => Some(PointerButton::Primary),
        MouseButton::Middle => Some(PointerButton::Middle),
        MouseButton::Right => Some(PointerButton::Secondary),
        _ => None,
    }
}

/// Positive when scrolling towards the user (zoom out), like a DOM wheel event.
pub fn wheel_delta(delta: MouseScrollDelta) -> f32 {
    match delta {
        MouseScrollDelta::LineDelta(_, y) => -y * PIXELS_PER_LINE,
        MouseScrollDelta::PixelDelta(position) => -position.y as f32,
    }
}

/// Turns window events into [`PointerInput`], remembering the last cursor
/// position so moves can be reported as deltas.
#[derive(Debug, Default)]
pub struct PointerTracker {
    last_position: Option<(f64, f64)>,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn moved(&mut self, x: f64, y: f64) -> Option<PointerInput> {
        let delta = self.last_position.map(|(last_x, last_y)| PointerInput::Move {
            dx: (x - last_x) as f32,
            dy: (y - last_y) as f32,
        });
        self.last_position = Some((x, y));
        delta
    }

    pub fn left(&mut self) {
        self.last_position = None;
    }

    /// Handle input events that concern the orbit controls.
    pub fn translate(&mut self, event: &WindowEvent) -> Option<PointerInput> {
        match event {
            WindowEvent::MouseInput { button, state, .. } => {
                let button = pointer_button(*button)?;
                Some(match state {
                    ElementState::Pressed => PointerInput::Down(button),
                    ElementState::Released => PointerInput::Up(button),
                })
            }
            WindowEvent::CursorMoved { position, .. } => self.moved(position.x, position.y),
            WindowEvent::CursorLeft { .. } => {
                self.left();
                None
            }
            WindowEvent::MouseWheel { delta, .. } => Some(PointerInput::Wheel {
                delta_y: wheel_delta(*delta),
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use winit::dpi::PhysicalPosition;

    #[test]
    fn first_move_only_records_the_position() {
        let mut tracker = PointerTracker::new();
        assert_eq!(tracker.moved(10.0, 10.0), None);
        assert_eq!(
            tracker.moved(13.0, 8.0),
            Some(PointerInput::Move { dx: 3.0, dy: -2.0 })
        );
        tracker.left();
        assert_eq!(tracker.moved(0.0, 0.0), None);
    }

    #[test]
    fn scrolling_up_zooms_in() {
        assert!(wheel_delta(MouseScrollDelta::LineDelta(0.0, 1.0)) < 0.0);
        assert_eq!(
            wheel_delta(MouseScrollDelta::PixelDelta(PhysicalPosition::new(0.0, -40.0))),
            40.0
        );
    }

    #[test]
    fn buttons_map_to_pointer_buttons() {
        assert_eq!(pointer_button(MouseButton::Left), Some(PointerButton::Primary));
        assert_eq!(pointer_button(MouseButton::Right), Some(PointerButton::Secondary));
        assert_eq!(pointer_button(MouseButton::Back), None);
    }
}
