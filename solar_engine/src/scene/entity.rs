//! Scene entities as a closed set of variants.
//!
//! Every variant owns a shared mesh and its own model matrix. Bodies (sun,
//! planets, moons) are pickable and carry an object ID; rings, glow shells
//! and the skybox are decoration. Parents are referenced by [`EntityKey`]
//! and resolved through the registry each update, never by pointer.

use std::sync::Arc;
use glam::{Mat4, Vec3, Vec4};
use crate::error::Result;
use crate::graphics_device::{BindingGroup, CommandList, Pipeline, ShaderStage};
use crate::render_graph::BloomPipelines;
use crate::resource::GpuMesh;
use crate::scene::kinematics::{body_transform, Orbit, Spin};
use crate::scene::{BodyDesc, EntityKey};
use crate::uniforms::{DrawPush, PickPush};

/// Stages reading [`DrawPush`] and [`PickPush`]
pub(crate) const PUSH_STAGES: &[ShaderStage] = &[ShaderStage::Vertex, ShaderStage::Fragment];

/// Glow-pass color of bodies that only occlude the sun's glow
const OCCLUDER: Vec4 = Vec4::new(0.0, 0.0, 0.0, 1.0);

/// World-space placement a child entity hangs off
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    pub position: Vec3,
    pub radius: f32,
}

impl Anchor {
    pub const ORIGIN: Anchor = Anchor { position: Vec3::ZERO, radius: 1.0 };
}

/// Inputs of one transform update
#[derive(Debug, Clone, Copy)]
pub struct UpdateContext {
    /// Simulated time in seconds
    pub time: f64,
    /// Resolved parent, None for root entities and stale parents
    pub parent: Option<Anchor>,
    pub camera_position: Vec3,
}

/// Per-pass state shared by every draw
pub struct DrawContext<'a> {
    pub pipelines: &'a BloomPipelines,
    /// Set 0 of the current frame slot
    pub frame_bindings: &'a Arc<dyn BindingGroup>,
}

// ============================================================================
// Variants
// ============================================================================

/// Sun, planet or moon
pub struct Body {
    pub name: String,
    pub object_id: u32,
    pub radius: f32,
    pub orbit: Option<Orbit>,
    pub spin: Spin,
    pub parent: Option<EntityKey>,
    /// Surface tint; for the sun, the glow color
    pub tint: Vec4,
    pub emissive: f32,
    pub(crate) mesh: Arc<GpuMesh>,
    pub(crate) material: Arc<dyn BindingGroup>,
    model: Mat4,
    position: Vec3,
}

impl Body {
    pub(crate) fn new(desc: BodyDesc, object_id: u32, material: Arc<dyn BindingGroup>) -> Self {
        Self {
            name: desc.name,
            object_id,
            radius: desc.radius,
            orbit: desc.orbit,
            spin: desc.spin,
            parent: desc.parent,
            tint: desc.tint,
            emissive: desc.emissive,
            mesh: desc.mesh,
            material,
            model: Mat4::IDENTITY,
            position: Vec3::ZERO,
        }
    }

    pub fn position(&self) -> Vec3 {
        self.position
    }

    fn update(&mut self, ctx: &UpdateContext) {
        let center = ctx.parent.map_or(Vec3::ZERO, |p| p.position);
        let offset = self.orbit.map_or(Vec3::ZERO, |orbit| orbit.offset_at(ctx.time));
        self.position = center + offset;
        self.model = body_transform(self.position, self.radius, &self.spin, ctx.time);
    }
}

/// Orbit path drawn as a line loop, centered on its parent
pub struct OrbitRing {
    pub parent: Option<EntityKey>,
    /// Radius and inclination of the drawn path
    pub orbit: Orbit,
    pub color: Vec4,
    pub(crate) mesh: Arc<GpuMesh>,
    model: Mat4,
}

impl OrbitRing {
    pub(crate) fn new(parent: Option<EntityKey>, orbit: Orbit, color: Vec4, mesh: Arc<GpuMesh>) -> Self {
        Self { parent, orbit, color, mesh, model: Mat4::IDENTITY }
    }

    fn update(&mut self, ctx: &UpdateContext) {
        let center = ctx.parent.map_or(Vec3::ZERO, |p| p.position);
        self.model = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.orbit.radius),
            self.orbit.plane_rotation(),
            center,
        );
    }
}

/// Additive halo around a body
pub struct GlowShell {
    pub body: EntityKey,
    /// Shell radius relative to the body radius
    pub scale: f32,
    pub tint: Vec4,
    pub(crate) mesh: Arc<GpuMesh>,
    model: Mat4,
}

impl GlowShell {
    pub(crate) fn new(body: EntityKey, scale: f32, tint: Vec4, mesh: Arc<GpuMesh>) -> Self {
        Self { body, scale, tint, mesh, model: Mat4::IDENTITY }
    }

    fn update(&mut self, ctx: &UpdateContext) {
        let anchor = ctx.parent.unwrap_or(Anchor::ORIGIN);
        self.model = Mat4::from_scale_rotation_translation(
            Vec3::splat(anchor.radius * self.scale),
            glam::Quat::IDENTITY,
            anchor.position,
        );
    }
}

/// Inward-facing sky sphere that follows the camera
pub struct Skybox {
    pub radius: f32,
    pub(crate) mesh: Arc<GpuMesh>,
    pub(crate) material: Arc<dyn BindingGroup>,
    model: Mat4,
}

impl Skybox {
    pub(crate) fn new(radius: f32, mesh: Arc<GpuMesh>, material: Arc<dyn BindingGroup>) -> Self {
        Self { radius, mesh, material, model: Mat4::IDENTITY }
    }

    fn update(&mut self, ctx: &UpdateContext) {
        self.follow(ctx.camera_position);
    }

    pub(crate) fn follow(&mut self, camera_position: Vec3) {
        self.model = Mat4::from_scale_rotation_translation(
            Vec3::splat(self.radius),
            glam::Quat::IDENTITY,
            camera_position,
        );
    }
}

// ============================================================================
// Entity
// ============================================================================

pub enum Entity {
    Sun(Body),
    Planet(Body),
    /// A planet that must have a parent
    Moon(Body),
    OrbitRing(OrbitRing),
    GlowShell(GlowShell),
    Skybox(Skybox),
}

/// Order of draws inside the scene pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum DrawLayer {
    Sky,
    Bodies,
    Rings,
    Overlays,
}

impl DrawLayer {
    pub const ALL: [DrawLayer; 4] = [DrawLayer::Sky, DrawLayer::Bodies, DrawLayer::Rings, DrawLayer::Overlays];
}

impl Entity {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Entity::Sun(_) => "sun",
            Entity::Planet(_) => "planet",
            Entity::Moon(_) => "moon",
            Entity::OrbitRing(_) => "orbit ring",
            Entity::GlowShell(_) => "glow shell",
            Entity::Skybox(_) => "skybox",
        }
    }

    pub fn body(&self) -> Option<&Body> {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => Some(body),
            _ => None,
        }
    }

    pub fn body_mut(&mut self) -> Option<&mut Body> {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => Some(body),
            _ => None,
        }
    }

    /// Object ID of pickable entities
    pub fn object_id(&self) -> Option<u32> {
        self.body().map(|body| body.object_id)
    }

    /// Entity whose position this one follows
    pub fn parent_key(&self) -> Option<EntityKey> {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => body.parent,
            Entity::OrbitRing(ring) => ring.parent,
            Entity::GlowShell(shell) => Some(shell.body),
            Entity::Skybox(_) => None,
        }
    }

    pub fn model(&self) -> Mat4 {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => body.model,
            Entity::OrbitRing(ring) => ring.model,
            Entity::GlowShell(shell) => shell.model,
            Entity::Skybox(sky) => sky.model,
        }
    }

    /// World-space center
    pub fn world_position(&self) -> Vec3 {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => body.position,
            other => other.model().w_axis.truncate(),
        }
    }

    /// Placement handed to children
    pub fn anchor(&self) -> Anchor {
        Anchor {
            position: self.world_position(),
            radius: self.body().map_or(1.0, |body| body.radius),
        }
    }

    pub fn draw_layer(&self) -> DrawLayer {
        match self {
            Entity::Skybox(_) => DrawLayer::Sky,
            Entity::Sun(_) | Entity::Planet(_) | Entity::Moon(_) => DrawLayer::Bodies,
            Entity::OrbitRing(_) => DrawLayer::Rings,
            Entity::GlowShell(_) => DrawLayer::Overlays,
        }
    }

    /// Recompute the model matrix from simulated time and the resolved parent
    pub fn update_transform(&mut self, ctx: &UpdateContext) {
        match self {
            Entity::Sun(body) | Entity::Planet(body) | Entity::Moon(body) => body.update(ctx),
            Entity::OrbitRing(ring) => ring.update(ctx),
            Entity::GlowShell(shell) => shell.update(ctx),
            Entity::Skybox(sky) => sky.update(ctx),
        }
    }

    /// Scene pass draw with full shading
    pub fn record_draw(&self, cmd: &mut dyn CommandList, ctx: &DrawContext) -> Result<()> {
        let p = ctx.pipelines;
        match self {
            Entity::Sun(body) => draw_mesh(
                cmd, &p.sun, ctx, Some(&body.material),
                &DrawPush::new(body.model, body.tint, body.emissive), &body.mesh,
            ),
            Entity::Planet(body) | Entity::Moon(body) => draw_mesh(
                cmd, &p.body, ctx, Some(&body.material),
                &DrawPush::new(body.model, body.tint, body.emissive), &body.mesh,
            ),
            Entity::OrbitRing(ring) => draw_mesh(
                cmd, &p.ring, ctx, None,
                &DrawPush::new(ring.model, ring.color, 0.0), &ring.mesh,
            ),
            Entity::GlowShell(shell) => draw_mesh(
                cmd, &p.shell, ctx, None,
                &DrawPush::new(shell.model, shell.tint, 0.0), &shell.mesh,
            ),
            Entity::Skybox(sky) => draw_mesh(
                cmd, &p.skybox, ctx, Some(&sky.material),
                &DrawPush::new(sky.model, Vec4::ONE, 0.0), &sky.mesh,
            ),
        }
    }

    /// Glow pass draw: the sun in its glow color, other bodies as black occluders
    pub fn record_glow_draw(&self, cmd: &mut dyn CommandList, ctx: &DrawContext) -> Result<()> {
        match self {
            Entity::Sun(body) => draw_mesh(
                cmd, &ctx.pipelines.glow, ctx, None,
                &DrawPush::new(body.model, body.tint, body.emissive), &body.mesh,
            ),
            Entity::Planet(body) | Entity::Moon(body) => draw_mesh(
                cmd, &ctx.pipelines.glow, ctx, None,
                &DrawPush::new(body.model, OCCLUDER, 0.0), &body.mesh,
            ),
            _ => Ok(()),
        }
    }

    /// Object-ID draw; the picking pipeline is already bound
    pub fn record_picking_draw(&self, cmd: &mut dyn CommandList, view_projection: Mat4) -> Result<()> {
        let Some(body) = self.body() else {
            return Ok(());
        };
        let push = PickPush::new(view_projection * body.model, body.object_id);
        cmd.push_constants(PUSH_STAGES, 0, bytemuck::bytes_of(&push))?;
        body.mesh.record_draw(cmd)
    }
}

fn draw_mesh(
    cmd: &mut dyn CommandList,
    pipeline: &Arc<dyn Pipeline>,
    ctx: &DrawContext,
    material: Option<&Arc<dyn BindingGroup>>,
    push: &DrawPush,
    mesh: &GpuMesh,
) -> Result<()> {
    cmd.bind_pipeline(pipeline)?;
    cmd.bind_binding_group(pipeline, 0, ctx.frame_bindings)?;
    if let Some(material) = material {
        cmd.bind_binding_group(pipeline, 1, material)?;
    }
    cmd.push_constants(PUSH_STAGES, 0, bytemuck::bytes_of(push))?;
    mesh.record_draw(cmd)
}
