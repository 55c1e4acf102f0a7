/// Orbit camera: yaw/pitch/distance around a target point.
///
/// Produces Vulkan-convention matrices: right-handed view, Y pointing down
/// in clip space and depth mapped to 0..1.

use glam::{Mat4, Vec3};

const MIN_PITCH: f32 = -1.5;
const MAX_PITCH: f32 = 1.5;

/// View and projection for one frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CameraMatrices {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    pub eye: Vec3,
}

#[derive(Debug, Clone)]
pub struct OrbitCamera {
    target: Vec3,
    yaw: f32,
    pitch: f32,
    distance: f32,
    min_distance: f32,
    max_distance: f32,
    /// Vertical field of view in radians
    fov_y: f32,
    near: f32,
    far: f32,
}

impl OrbitCamera {
    /// Camera `distance` units from `target`, looking along -Z
    pub fn new(target: Vec3, distance: f32) -> Self {
        Self {
            target,
            yaw: 0.0,
            pitch: 0.0,
            distance,
            min_distance: 0.5,
            max_distance: 500.0,
            fov_y: 45f32.to_radians(),
            near: 0.1,
            far: 2000.0,
        }
    }

    pub fn with_angles(mut self, yaw: f32, pitch: f32) -> Self {
        self.yaw = yaw;
        self.pitch = pitch.clamp(MIN_PITCH, MAX_PITCH);
        self
    }

    pub fn with_clip_planes(mut self, near: f32, far: f32) -> Self {
        self.near = near;
        self.far = far;
        self
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn distance(&self) -> f32 {
        self.distance
    }

    pub fn far(&self) -> f32 {
        self.far
    }

    /// Rotate around the target
    pub fn orbit(&mut self, delta_yaw: f32, delta_pitch: f32) {
        self.yaw += delta_yaw;
        self.pitch = (self.pitch + delta_pitch).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Scale the distance to the target (factor < 1 moves closer)
    pub fn zoom(&mut self, factor: f32) {
        self.distance = (self.distance * factor).clamp(self.min_distance, self.max_distance);
    }

    /// Re-center on a new target, keeping angles and distance
    pub fn focus(&mut self, target: Vec3) {
        self.target = target;
    }

    pub fn eye(&self) -> Vec3 {
        let direction = Vec3::new(
            self.pitch.cos() * self.yaw.sin(),
            self.pitch.sin(),
            self.pitch.cos() * self.yaw.cos(),
        );
        self.target + direction * self.distance
    }

    pub fn matrices(&self, aspect_ratio: f32) -> CameraMatrices {
        let eye = self.eye();
        let view = Mat4::look_at_rh(eye, self.target, Vec3::Y);
        let mut projection = Mat4::perspective_rh(self.fov_y, aspect_ratio.max(1e-4), self.near, self.far);
        // Vulkan clip space has +Y pointing down
        projection.y_axis.y *= -1.0;
        CameraMatrices {
            view,
            projection,
            view_projection: projection * view,
            eye,
        }
    }
}

impl Default for OrbitCamera {
    fn default() -> Self {
        Self::new(Vec3::ZERO, 40.0).with_angles(0.0, 0.35)
    }
}

#[cfg(test)]
#[path = "camera_tests.rs"]
mod tests;
