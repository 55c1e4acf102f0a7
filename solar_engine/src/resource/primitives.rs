//! Procedural meshes used by the solar-system entities.
//!
//! Triangles wind counter-clockwise seen from the side their normals face.

use std::f32::consts::{PI, TAU};
use crate::graphics_device::PrimitiveTopology;
use crate::resource::{MeshData, Vertex};

const WHITE: [f32; 4] = [1.0, 1.0, 1.0, 1.0];

fn sphere(slices: u32, stacks: u32, inward: bool) -> MeshData {
    let slices = slices.max(3);
    let stacks = stacks.max(2);
    let mut vertices = Vec::with_capacity(((slices + 1) * (stacks + 1)) as usize);
    for i in 0..=stacks {
        let phi = PI * i as f32 / stacks as f32;
        for j in 0..=slices {
            let theta = TAU * j as f32 / slices as f32;
            let position = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            let normal = if inward { position.map(|c| -c) } else { position };
            vertices.push(Vertex {
                position,
                normal,
                uv: [j as f32 / slices as f32, i as f32 / stacks as f32],
                tangent: [-theta.sin(), 0.0, theta.cos(), 1.0],
                color: WHITE,
            });
        }
    }

    let row = slices + 1;
    let mut indices = Vec::with_capacity((slices * stacks * 6) as usize);
    for i in 0..stacks {
        for j in 0..slices {
            let a = i * row + j;
            let b = a + 1;
            let c = a + row;
            let d = c + 1;
            if inward {
                indices.extend_from_slice(&[a, d, b, a, c, d]);
            } else {
                indices.extend_from_slice(&[a, b, d, a, d, c]);
            }
        }
    }

    MeshData { vertices, indices, topology: PrimitiveTopology::TriangleList }
}

/// Unit-radius sphere centered at the origin, poles on ±Y
pub fn uv_sphere(slices: u32, stacks: u32) -> MeshData {
    sphere(slices, stacks, false)
}

/// Unit sphere seen from inside (sky dome)
pub fn sky_sphere(slices: u32, stacks: u32) -> MeshData {
    sphere(slices, stacks, true)
}

/// Unit circle in the XZ plane as a closed line list.
///
/// Vertex k sits at angle 2πk/n on the path `(cos a, 0, -sin a)` that orbits follow.
pub fn orbit_ring(segments: u32) -> MeshData {
    let segments = segments.max(3);
    let vertices = (0..segments)
        .map(|k| {
            let angle = TAU * k as f32 / segments as f32;
            Vertex {
                position: [angle.cos(), 0.0, -angle.sin()],
                normal: [0.0, 1.0, 0.0],
                uv: [k as f32 / segments as f32, 0.0],
                tangent: [-angle.sin(), 0.0, -angle.cos(), 1.0],
                color: WHITE,
            }
        })
        .collect();
    let indices = (0..segments).flat_map(|k| [k, (k + 1) % segments]).collect();
    MeshData { vertices, indices, topology: PrimitiveTopology::LineList }
}

#[cfg(test)]
#[path = "primitives_tests.rs"]
mod tests;
