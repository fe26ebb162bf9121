//! Idle motion applied to every mesh once per host frame.
//!
//! Time is not wall-clock: each frame callback advances the clock by a fixed
//! increment, so the on-screen speed follows the display refresh rate.

use cgmath::{Matrix4, Rad, Vector3};

/// Time advanced per frame callback.
pub const FRAME_INCREMENT: f32 = 0.005;

/// `amplitude * sin(frequency * t + phase)`.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct Wave {
    pub amplitude: f32,
    pub frequency: f32,
    pub phase: f32,
}

impl Wave {
    pub const fn new(amplitude: f32, frequency: f32, phase: f32) -> Self {
        Self {
            amplitude,
            frequency,
            phase,
        }
    }

    pub const ZERO: Wave = Wave::new(0.0, 0.0, 0.0);

    pub fn sample(&self, time: f32) -> f32 {
        self.amplitude * (self.frequency * time + self.phase).sin()
    }
}

/// Position plus XYZ-order Euler rotation in radians.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Transform {
    pub position: Vector3<f32>,
    pub rotation: Vector3<f32>,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: Vector3::new(0.0, 0.0, 0.0),
        }
    }
}

impl Transform {
    /// Model matrix: translation, then rotation about X, Y and Z in that order.
    pub fn matrix(&self) -> Matrix4<f32> {
        Matrix4::from_translation(self.position)
            * Matrix4::from_angle_x(Rad(self.rotation.x))
            * Matrix4::from_angle_y(Rad(self.rotation.y))
            * Matrix4::from_angle_z(Rad(self.rotation.z))
    }
}

/// Constant spin plus sinusoidal wobble and vertical bob around a rest pose.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IdleMotion {
    pub base_position: Vector3<f32>,
    pub base_rotation: Vector3<f32>,
    /// Radians per unit of accumulated time, per axis.
    pub spin: Vector3<f32>,
    pub wobble: [Wave; 3],
    pub bob: Wave,
}

impl Default for IdleMotion {
    fn default() -> Self {
        Self {
            base_position: Vector3::new(0.0, 0.0, 0.0),
            base_rotation: Vector3::new(0.0, 0.0, 0.0),
            spin: Vector3::new(0.0, 0.0, 0.0),
            wobble: [Wave::ZERO; 3],
            bob: Wave::ZERO,
        }
    }
}

impl IdleMotion {
    /// Slow turn about Y with a gentle nod about X.
    pub fn turntable(spin_y: f32, nod: Wave) -> Self {
        Self {
            spin: Vector3::new(0.0, spin_y, 0.0),
            wobble: [nod, Wave::ZERO, Wave::ZERO],
            ..Self::default()
        }
    }

    pub fn transform(&self, time: f32) -> Transform {
        let rotation = Vector3::new(
            self.base_rotation.x + self.spin.x * time + self.wobble[0].sample(time),
            self.base_rotation.y + self.spin.y * time + self.wobble[1].sample(time),
            self.base_rotation.z + self.spin.z * time + self.wobble[2].sample(time),
        );
        let mut position = self.base_position;
        position.y += self.bob.sample(time);
        Transform { position, rotation }
    }
}

/// Accumulates time by a fixed step per frame.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrameClock {
    time: f32,
    increment: f32,
    frames: u64,
}

impl FrameClock {
    pub fn new(increment: f32) -> Self {
        Self {
            time: 0.0,
            increment,
            frames: 0,
        }
    }

    pub fn tick(&mut self) -> f32 {
        self.time += self.increment;
        self.frames += 1;
        self.time
    }

    pub fn time(&self) -> f32 {
        self.time
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn increment(&self) -> f32 {
        self.increment
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(FRAME_INCREMENT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn turntable_spins_linearly_and_nods() {
        let motion = IdleMotion::turntable(0.3, Wave::new(0.1, 0.5, 0.0));
        let t = motion.transform(2.0);
        assert_relative_eq!(t.rotation.y, 0.6);
        assert_relative_eq!(t.rotation.x, 0.1 * (1.0f32).sin());
        assert_relative_eq!(t.rotation.z, 0.0);
    }

    #[test]
    fn bob_only_moves_vertically() {
        let motion = IdleMotion {
            base_position: Vector3::new(-2.2, 0.4, 0.2),
            bob: Wave::new(0.12, 0.6, 0.0),
            ..IdleMotion::default()
        };
        let t = motion.transform(1.0);
        assert_relative_eq!(t.position.x, -2.2);
        assert_relative_eq!(t.position.z, 0.2);
        assert_relative_eq!(t.position.y, 0.4 + 0.12 * (0.6f32).sin());
    }

    #[test]
    fn clock_accumulates_fixed_increments() {
        let mut clock = FrameClock::default();
        for _ in 0..100 {
            clock.tick();
        }
        assert_eq!(clock.frames(), 100);
        assert_relative_eq!(clock.time(), 0.5, epsilon = 1e-5);
    }

    #[test]
    fn identity_transform_is_identity_matrix() {
        use cgmath::SquareMatrix;
        assert_eq!(Transform::default().matrix(), Matrix4::identity());
    }
}
