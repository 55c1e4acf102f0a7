//! Orbital and spin kinematics.
//!
//! Transforms are pure functions of simulated time, so evaluating the same
//! instant twice yields bit-identical matrices.

use std::f64::consts::TAU;
use glam::{Mat4, Quat, Vec3};

/// Circular orbit around the parent body (or the origin)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Orbit {
    /// Distance from the parent center
    pub radius: f32,
    /// Seconds of simulated time per revolution
    pub period_s: f64,
    /// Angle at t = 0, radians
    pub phase: f64,
    /// Tilt of the orbital plane about X, radians
    pub inclination: f32,
}

impl Orbit {
    pub fn new(radius: f32, period_s: f64) -> Self {
        Self { radius, period_s, phase: 0.0, inclination: 0.0 }
    }

    pub fn with_phase(mut self, phase: f64) -> Self {
        self.phase = phase;
        self
    }

    pub fn with_inclination(mut self, inclination: f32) -> Self {
        self.inclination = inclination;
        self
    }

    /// Angular rate in radians per simulated second (0 for a degenerate period)
    pub fn angular_rate(&self) -> f64 {
        if self.period_s == 0.0 { 0.0 } else { TAU / self.period_s }
    }

    /// Orbital angle at time `t`
    pub fn angle_at(&self, t: f64) -> f64 {
        self.phase + self.angular_rate() * t
    }

    /// Offset from the parent center at time `t`.
    ///
    /// Counter-clockwise seen from +Y: (r cos a, 0, -r sin a), then the
    /// plane is tilted about X.
    pub fn offset_at(&self, t: f64) -> Vec3 {
        let angle = self.angle_at(t).rem_euclid(TAU);
        let flat = Vec3::new(
            self.radius * angle.cos() as f32,
            0.0,
            -self.radius * angle.sin() as f32,
        );
        self.plane_rotation() * flat
    }

    /// Rotation taking the XZ plane onto the orbital plane
    pub fn plane_rotation(&self) -> Quat {
        Quat::from_rotation_x(self.inclination)
    }
}

/// Rotation of a body about its own axis
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Spin {
    /// Seconds per rotation; 0 disables spinning
    pub period_s: f64,
    /// Tilt of the spin axis about Z, radians
    pub axial_tilt: f32,
}

impl Spin {
    pub fn new(period_s: f64, axial_tilt: f32) -> Self {
        Self { period_s, axial_tilt }
    }

    pub fn angle_at(&self, t: f64) -> f32 {
        if self.period_s == 0.0 {
            0.0
        } else {
            (TAU * t / self.period_s).rem_euclid(TAU) as f32
        }
    }

    pub fn rotation_at(&self, t: f64) -> Quat {
        Quat::from_rotation_z(self.axial_tilt) * Quat::from_rotation_y(self.angle_at(t))
    }
}

/// Model matrix of a body of `radius` at `position`, spun to time `t`
pub fn body_transform(position: Vec3, radius: f32, spin: &Spin, t: f64) -> Mat4 {
    Mat4::from_scale_rotation_translation(Vec3::splat(radius), spin.rotation_at(t), position)
}

#[cfg(test)]
#[path = "kinematics_tests.rs"]
mod tests;
