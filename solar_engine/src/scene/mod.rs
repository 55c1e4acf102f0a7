//! Scene module
//!
//! Entities of the solar system (closed enum of variants), the registry
//! that owns them, their kinematics, and the camera, clock and selection
//! that drive each frame.

pub mod kinematics;
mod camera;
mod clock;
mod entity;
mod registry;
mod selection;
mod scene;

pub use kinematics::{Orbit, Spin};
pub use camera::{CameraMatrices, OrbitCamera};
pub use clock::SimulationClock;
pub use entity::{
    Anchor, Body, DrawContext, DrawLayer, Entity, GlowShell, OrbitRing, Skybox, UpdateContext,
};
pub(crate) use entity::PUSH_STAGES;
pub use registry::{BodyDesc, EntityKey, SceneRegistry, MATERIAL_SET};
pub use selection::Selection;
pub use scene::Scene;
