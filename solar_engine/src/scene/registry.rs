//! SceneRegistry: the explicit scene context.
//!
//! Owns the entity arena (generational keys), the object-ID allocator and
//! the ID lookup table used by picking, and the fallback white texture
//! used by entities registered without one. Nothing here is global: the
//! registry is created by the orchestrator and passed where it is needed.
//!
//! Removed entities are not dropped immediately. Command lists of frames
//! still in flight may reference their meshes and binding groups, so they
//! wait in a retire queue until every such frame has completed.

use std::sync::Arc;
use glam::{Vec3, Vec4};
use rustc_hash::{FxHashMap, FxHashSet};
use slotmap::{new_key_type, SlotMap};
use crate::error::Result;
use crate::frame::RetireQueue;
use crate::graphics_device::{
    BindingGroup, BindingResource, GraphicsDevice, Pipeline, SamplerType, Texture,
};
use crate::resource::{upload_texture, GpuMesh, ImageData};
use crate::scene::entity::{Anchor, Body, Entity, GlowShell, OrbitRing, Skybox, UpdateContext};
use crate::scene::kinematics::{Orbit, Spin};
use crate::utils::ObjectIdAllocator;

new_key_type! {
    /// Stable handle to a registered entity (index + generation)
    pub struct EntityKey;
}

/// Set index of material bindings in every textured scene pipeline
pub const MATERIAL_SET: u32 = 1;

// ============================================================================
// Entity descriptors
// ============================================================================

/// Sun, planet or moon to register
#[derive(Clone)]
pub struct BodyDesc {
    pub name: String,
    pub mesh: Arc<GpuMesh>,
    /// Surface texture; the fallback white texture when None
    pub texture: Option<Arc<dyn Texture>>,
    pub radius: f32,
    pub orbit: Option<Orbit>,
    pub spin: Spin,
    pub parent: Option<EntityKey>,
    pub tint: Vec4,
    pub emissive: f32,
}

impl BodyDesc {
    pub fn new(name: impl Into<String>, mesh: Arc<GpuMesh>, radius: f32) -> Self {
        Self {
            name: name.into(),
            mesh,
            texture: None,
            radius,
            orbit: None,
            spin: Spin::default(),
            parent: None,
            tint: Vec4::ONE,
            emissive: 0.0,
        }
    }

    pub fn with_texture(mut self, texture: Arc<dyn Texture>) -> Self {
        self.texture = Some(texture);
        self
    }

    pub fn with_orbit(mut self, orbit: Orbit) -> Self {
        self.orbit = Some(orbit);
        self
    }

    pub fn with_spin(mut self, spin: Spin) -> Self {
        self.spin = spin;
        self
    }

    pub fn with_parent(mut self, parent: EntityKey) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_tint(mut self, tint: Vec4) -> Self {
        self.tint = tint;
        self
    }

    pub fn with_emissive(mut self, emissive: f32) -> Self {
        self.emissive = emissive;
        self
    }
}

// ============================================================================
// SceneRegistry
// ============================================================================

pub struct SceneRegistry {
    retired: RetireQueue<Entity>,
    by_id: FxHashMap<u32, EntityKey>,
    /// Registration order, which is also update and draw order
    order: Vec<EntityKey>,
    entities: SlotMap<EntityKey, Entity>,
    ids: ObjectIdAllocator,
    current_frame: u64,
    frames_in_flight: u64,
    fallback_material: Arc<dyn BindingGroup>,
    fallback_texture: Arc<dyn Texture>,
    /// Any pipeline whose set 1 is the material layout
    material_pipeline: Arc<dyn Pipeline>,
    device: Arc<dyn GraphicsDevice>,
}

impl SceneRegistry {
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        material_pipeline: Arc<dyn Pipeline>,
        frames_in_flight: usize,
    ) -> Result<Self> {
        let fallback_texture = upload_texture(
            device.as_ref(),
            "fallback_white",
            &ImageData::solid(1, 1, [255, 255, 255, 255]),
            true,
        )?;
        let fallback_material = device.create_binding_group(
            &material_pipeline,
            MATERIAL_SET,
            &[BindingResource::SampledTexture(fallback_texture.clone(), SamplerType::LinearRepeat)],
        )?;
        Ok(Self {
            retired: RetireQueue::new(),
            by_id: FxHashMap::default(),
            order: Vec::new(),
            entities: SlotMap::with_key(),
            ids: ObjectIdAllocator::new(),
            current_frame: 0,
            frames_in_flight: frames_in_flight.max(1) as u64,
            fallback_material,
            fallback_texture,
            material_pipeline,
            device,
        })
    }

    // ===== REGISTRATION =====

    pub fn add_sun(&mut self, desc: BodyDesc) -> Result<EntityKey> {
        self.add_body(desc, Entity::Sun)
    }

    pub fn add_planet(&mut self, desc: BodyDesc) -> Result<EntityKey> {
        self.check_parent(desc.parent, "planet")?;
        self.add_body(desc, Entity::Planet)
    }

    /// Register a moon orbiting `parent`
    pub fn add_moon(&mut self, parent: EntityKey, desc: BodyDesc) -> Result<EntityKey> {
        if !self.entities.contains_key(parent) {
            crate::engine_bail!(InvalidResource, "solar3d::scene",
                "moon '{}' has no live parent", desc.name);
        }
        self.add_body(desc.with_parent(parent), Entity::Moon)
    }

    /// Register an orbit path, centered on `parent` (or the origin)
    pub fn add_orbit_ring(
        &mut self,
        parent: Option<EntityKey>,
        orbit: Orbit,
        color: Vec4,
        mesh: Arc<GpuMesh>,
    ) -> Result<EntityKey> {
        self.check_parent(parent, "orbit ring")?;
        Ok(self.insert(Entity::OrbitRing(OrbitRing::new(parent, orbit, color, mesh))))
    }

    /// Register an additive halo `scale` times the radius of `body`
    pub fn add_glow_shell(
        &mut self,
        body: EntityKey,
        scale: f32,
        tint: Vec4,
        mesh: Arc<GpuMesh>,
    ) -> Result<EntityKey> {
        if self.entities.get(body).and_then(Entity::body).is_none() {
            crate::engine_bail!(InvalidResource, "solar3d::scene", "glow shell needs a live body");
        }
        Ok(self.insert(Entity::GlowShell(GlowShell::new(body, scale, tint, mesh))))
    }

    pub fn add_skybox(
        &mut self,
        radius: f32,
        mesh: Arc<GpuMesh>,
        texture: Option<Arc<dyn Texture>>,
    ) -> Result<EntityKey> {
        let material = self.material_for(texture.as_ref())?;
        Ok(self.insert(Entity::Skybox(Skybox::new(radius, mesh, material))))
    }

    fn add_body(&mut self, desc: BodyDesc, variant: fn(Body) -> Entity) -> Result<EntityKey> {
        let material = self.material_for(desc.texture.as_ref())?;
        let object_id = self.ids.alloc()?;
        let name = desc.name.clone();
        let key = self.insert(variant(Body::new(desc, object_id, material)));
        self.by_id.insert(object_id, key);
        crate::engine_debug!("solar3d::scene", "Registered '{}' with object ID {}", name, object_id);
        Ok(key)
    }

    fn insert(&mut self, entity: Entity) -> EntityKey {
        let key = self.entities.insert(entity);
        self.order.push(key);
        key
    }

    fn check_parent(&self, parent: Option<EntityKey>, what: &str) -> Result<()> {
        match parent {
            Some(key) if !self.entities.contains_key(key) => {
                crate::engine_bail!(InvalidResource, "solar3d::scene", "{} references a removed parent", what);
            }
            _ => Ok(()),
        }
    }

    fn material_for(&self, texture: Option<&Arc<dyn Texture>>) -> Result<Arc<dyn BindingGroup>> {
        match texture {
            None => Ok(self.fallback_material.clone()),
            Some(texture) => self.device.create_binding_group(
                &self.material_pipeline,
                MATERIAL_SET,
                &[BindingResource::SampledTexture(texture.clone(), SamplerType::LinearRepeat)],
            ),
        }
    }

    // ===== REMOVAL =====

    /// Unregister an entity. Its GPU resources are released once no frame in
    /// flight can reference them. Children lose their parent and fall back
    /// to the origin.
    pub fn remove(&mut self, key: EntityKey) -> Result<()> {
        let Some(entity) = self.entities.remove(key) else {
            crate::engine_bail!(InvalidResource, "solar3d::scene", "remove of an unknown entity");
        };
        self.order.retain(|k| *k != key);
        if let Some(id) = entity.object_id() {
            self.by_id.remove(&id);
            self.ids.free(id);
        }
        self.retired.push(self.current_frame, entity);
        Ok(())
    }

    /// Called once the slot of `frame_number` is free: drops retired
    /// entities no frame in flight can still reference.
    pub fn advance_frame(&mut self, frame_number: u64) {
        self.current_frame = frame_number;
        let released = self.retired.release(frame_number, self.frames_in_flight);
        if released > 0 {
            crate::engine_trace!("solar3d::scene", "Released {} retired entities", released);
        }
    }

    /// Drop every retired entity (device idle)
    pub fn release_all_retired(&mut self) {
        self.retired.clear();
    }

    pub fn retired_len(&self) -> usize {
        self.retired.len()
    }

    // ===== QUERIES =====

    pub fn get(&self, key: EntityKey) -> Option<&Entity> {
        self.entities.get(key)
    }

    pub fn get_mut(&mut self, key: EntityKey) -> Option<&mut Entity> {
        self.entities.get_mut(key)
    }

    pub fn contains(&self, key: EntityKey) -> bool {
        self.entities.contains_key(key)
    }

    /// Entity registered under a picking object ID
    pub fn lookup_id(&self, object_id: u32) -> Option<EntityKey> {
        self.by_id.get(&object_id).copied()
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Entities in registration order
    pub fn iter(&self) -> impl Iterator<Item = (EntityKey, &Entity)> + '_ {
        self.order.iter().filter_map(|key| self.entities.get(*key).map(|e| (*key, e)))
    }

    pub fn fallback_texture(&self) -> &Arc<dyn Texture> {
        &self.fallback_texture
    }

    pub fn fallback_material(&self) -> &Arc<dyn BindingGroup> {
        &self.fallback_material
    }

    // ===== TRANSFORMS =====

    /// Recompute every model matrix for simulated time `t`.
    ///
    /// Parents resolve before children. Registration order handles the
    /// common case in one pass; entities whose parent was registered later
    /// are deferred to further passes. A stale parent (removed, or part of
    /// a cycle) counts as the origin.
    pub fn update_transforms(&mut self, t: f64, camera_position: Vec3) {
        let mut anchors: FxHashMap<EntityKey, Anchor> = FxHashMap::default();
        let mut pending: Vec<EntityKey> = self.order.clone();

        while !pending.is_empty() {
            let before = pending.len();
            let waiting: FxHashSet<EntityKey> = pending.iter().copied().collect();
            let mut deferred = Vec::new();

            for key in pending {
                let Some(entity) = self.entities.get(key) else { continue };
                let parent = match entity.parent_key() {
                    Some(parent) if self.entities.contains_key(parent) && parent != key => {
                        match anchors.get(&parent) {
                            Some(anchor) => Some(*anchor),
                            None if waiting.contains(&parent) => {
                                deferred.push(key);
                                continue;
                            }
                            None => None,
                        }
                    }
                    _ => None,
                };
                self.update_one(key, t, parent, camera_position, &mut anchors);
            }

            if deferred.len() == before {
                crate::engine_warn!("solar3d::scene",
                    "{} entities form a parent cycle, placing them at the origin", deferred.len());
                for key in deferred {
                    self.update_one(key, t, None, camera_position, &mut anchors);
                }
                break;
            }
            pending = deferred;
        }
    }

    /// Re-center the entities that track the camera (skyboxes)
    pub fn update_camera_followers(&mut self, camera_position: Vec3) {
        for entity in self.entities.values_mut() {
            if let Entity::Skybox(sky) = entity {
                sky.follow(camera_position);
            }
        }
    }

    fn update_one(
        &mut self,
        key: EntityKey,
        time: f64,
        parent: Option<Anchor>,
        camera_position: Vec3,
        anchors: &mut FxHashMap<EntityKey, Anchor>,
    ) {
        if let Some(entity) = self.entities.get_mut(key) {
            entity.update_transform(&UpdateContext { time, parent, camera_position });
            anchors.insert(key, entity.anchor());
        }
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
