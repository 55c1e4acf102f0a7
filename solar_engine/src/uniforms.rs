//! GPU data blocks shared with the shaders.
//!
//! Layouts follow std140 (uniform blocks) and std430-compatible push
//! constants; every field is 16-byte aligned or padded explicitly.

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3, Vec4};
use crate::config::MAX_BLUR_RADIUS;

/// Set 0, binding 0 of every scene pipeline (one buffer per frame slot)
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct FrameUniforms {
    pub view: Mat4,
    pub projection: Mat4,
    pub view_projection: Mat4,
    /// xyz = camera world position, w = simulation time in seconds
    pub camera_position: Vec4,
    /// xyz = sun world position, w = ambient term
    pub light_position: Vec4,
}

impl FrameUniforms {
    pub const SIZE: u64 = std::mem::size_of::<FrameUniforms>() as u64;
}

/// Per-draw push constants of the scene and glow pipelines
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct DrawPush {
    pub model: Mat4,
    /// Base or glow color
    pub tint: Vec4,
    /// x = emissive strength, y = spin angle, z/w unused
    pub params: Vec4,
}

impl DrawPush {
    pub fn new(model: Mat4, tint: Vec4, emissive: f32) -> Self {
        Self { model, tint, params: Vec4::new(emissive, 0.0, 0.0, 0.0) }
    }
}

/// Push constants of the picking pipeline
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct PickPush {
    /// projection * view * model
    pub clip_from_object: Mat4,
    pub object_id: u32,
    pub _pad: [u32; 3],
}

impl PickPush {
    pub fn new(clip_from_object: Mat4, object_id: u32) -> Self {
        Self { clip_from_object, object_id, _pad: [0; 3] }
    }
}

/// Blur parameters, one uniform block shared by both blur passes
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct BlurUniform {
    /// weights[i].x = weight of the taps at distance i
    pub weights: [Vec4; (MAX_BLUR_RADIUS + 1) as usize],
    /// x = radius, yz = texel size, w unused
    pub params: Vec4,
}

impl BlurUniform {
    pub fn new(radius: u32, sigma: f32, width: u32, height: u32) -> Self {
        let mut weights = [Vec4::ZERO; (MAX_BLUR_RADIUS + 1) as usize];
        for (slot, w) in weights.iter_mut().zip(gaussian_weights(radius, sigma)) {
            slot.x = w;
        }
        Self {
            weights,
            params: Vec4::new(
                radius as f32,
                1.0 / width.max(1) as f32,
                1.0 / height.max(1) as f32,
                0.0,
            ),
        }
    }
}

/// Push constants of the composite pass
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct CompositePush {
    /// x = bloom intensity, y = exposure
    pub params: Vec4,
}

/// One-sided Gaussian kernel: `w[0]` is the center tap, `w[i]` applies at ±i.
///
/// Normalized so that `w[0] + 2·Σw[1..]` is 1, which keeps blurred glow at
/// the same overall brightness.
pub fn gaussian_weights(radius: u32, sigma: f32) -> Vec<f32> {
    let radius = radius.min(MAX_BLUR_RADIUS);
    let raw: Vec<f32> = (0..=radius)
        .map(|i| (-((i * i) as f32) / (2.0 * sigma * sigma)).exp())
        .collect();
    let total = raw[0] + 2.0 * raw[1..].iter().sum::<f32>();
    raw.into_iter().map(|w| w / total).collect()
}

/// Sun position as seen by the shaders' lighting
pub fn light_from(position: Vec3, ambient: f32) -> Vec4 {
    position.extend(ambient)
}

#[cfg(test)]
#[path = "uniforms_tests.rs"]
mod tests;
