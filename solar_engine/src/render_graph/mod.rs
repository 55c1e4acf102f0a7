//! Bloom render graph
//!
//! The fixed five-pass frame (glow, blur V, blur H, scene, composite): its
//! render pass objects, extent-dependent targets, pipelines and the
//! recorder that encodes them in order with the barriers between them.

mod passes;
mod targets;
mod pipelines;
mod stamps;
mod bloom_graph;

pub use passes::{
    composite_pass_desc, fullscreen_pass_desc, geometry_pass_desc, BloomPasses, DEPTH_FORMAT,
    OFFSCREEN_FORMAT,
};
pub use targets::{BloomTargets, OffscreenTarget};
pub use pipelines::{
    blur_layout, composite_layout, frame_layout, material_layout, BloomPipelines, ShaderCache,
    BLUR_AXIS_CONSTANT, BLUR_AXIS_HORIZONTAL, BLUR_AXIS_VERTICAL, SHADER_ENTRY_POINT,
};
pub use stamps::PassStamps;
pub use bloom_graph::{BloomGraph, FrameContext};

#[cfg(test)]
#[path = "bloom_graph_tests.rs"]
mod tests;
