/// Scene - the registry plus camera, clock, selection and lighting.
///
/// `update(t)` is a pure function of `t`, the selection and the camera
/// orbit, so calling it twice with the same time yields bit-identical
/// model matrices and view.

use glam::Vec3;
use crate::scene::{Entity, EntityKey, OrbitCamera, SceneRegistry, Selection, SimulationClock};
use crate::uniforms::{light_from, FrameUniforms};

pub struct Scene {
    pub selection: Selection,
    pub clock: SimulationClock,
    pub camera: OrbitCamera,
    pub registry: SceneRegistry,
    /// Ambient light term written to the frame uniforms
    pub ambient: f32,
    time: f64,
}

impl Scene {
    pub fn new(registry: SceneRegistry) -> Self {
        Self {
            selection: Selection::default(),
            clock: SimulationClock::new(),
            camera: OrbitCamera::default(),
            registry,
            ambient: 0.05,
            time: 0.0,
        }
    }

    /// Recompute all entity transforms for simulated time `t`.
    ///
    /// Bodies move first, the camera then centers on the selection at `t`,
    /// and the skybox follows the camera last.
    pub fn update(&mut self, t: f64) {
        self.time = t;
        self.selection.validate(&self.registry);
        self.registry.update_transforms(t, self.camera.eye());
        self.follow_selection();
        self.registry.update_camera_followers(self.camera.eye());
    }

    /// Time of the last `update`
    pub fn time(&self) -> f64 {
        self.time
    }

    /// World position of the first sun, or the origin
    pub fn light_position(&self) -> Vec3 {
        self.registry
            .iter()
            .find_map(|(_, entity)| match entity {
                Entity::Sun(body) => Some(body.position()),
                _ => None,
            })
            .unwrap_or(Vec3::ZERO)
    }

    /// Uniform block for the current camera and transforms
    pub fn frame_uniforms(&self, aspect_ratio: f32) -> FrameUniforms {
        let camera = self.camera.matrices(aspect_ratio);
        FrameUniforms {
            view: camera.view,
            projection: camera.projection,
            view_projection: camera.view_projection,
            camera_position: camera.eye.extend(self.time as f32),
            light_position: light_from(self.light_position(), self.ambient),
        }
    }

    /// Select the entity behind a picked object ID and center the camera on it.
    /// Background and unknown IDs change nothing.
    pub fn select_picked(&mut self, object_id: u32) -> Option<EntityKey> {
        let key = self.selection.apply_pick(object_id, &self.registry)?;
        if let Some(entity) = self.registry.get(key) {
            crate::engine_info!("solar3d::scene", "Selected {} (object ID {})",
                entity.body().map_or(entity.kind_name(), |b| b.name.as_str()), object_id);
            self.camera.focus(entity.world_position());
        }
        Some(key)
    }

    /// Keep the camera on the selected entity as it moves
    pub fn follow_selection(&mut self) {
        let target = self
            .selection
            .selected()
            .and_then(|key| self.registry.get(key))
            .map(Entity::world_position);
        if let Some(target) = target {
            self.camera.focus(target);
        }
    }
}

#[cfg(test)]
#[path = "scene_tests.rs"]
mod tests;
