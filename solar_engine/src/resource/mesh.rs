//! Mesh types: CPU-side vertex/index data and its GPU upload.
//!
//! Every entity mesh (spheres, rings, sky dome) uses the same [`Vertex`]
//! layout and 32-bit indices, so one vertex layout serves every scene
//! pipeline. The position is the first field: the picking pass reads only it.

use std::sync::Arc;
use bytemuck::{Pod, Zeroable};
use crate::error::Result;
use crate::graphics_device::{
    Buffer, BufferDesc, BufferFormat, BufferUsage, CommandList, GraphicsDevice, IndexType,
    PrimitiveTopology, VertexAttribute, VertexBinding, VertexLayout,
};

/// Interleaved vertex shared by every scene mesh
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub uv: [f32; 2],
    /// xyz = tangent, w = bitangent sign
    pub tangent: [f32; 4],
    pub color: [f32; 4],
}

impl Vertex {
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;

    /// Vertex layout matching `layout(location = 0..4)` in the scene shaders
    pub fn layout() -> VertexLayout {
        let attribute = |location: u32, format: BufferFormat, offset: usize| VertexAttribute {
            location,
            binding: 0,
            format,
            offset: offset as u32,
        };
        VertexLayout {
            bindings: vec![VertexBinding { binding: 0, stride: Self::STRIDE }],
            attributes: vec![
                attribute(0, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, position)),
                attribute(1, BufferFormat::R32G32B32_SFLOAT, std::mem::offset_of!(Vertex, normal)),
                attribute(2, BufferFormat::R32G32_SFLOAT, std::mem::offset_of!(Vertex, uv)),
                attribute(3, BufferFormat::R32G32B32A32_SFLOAT, std::mem::offset_of!(Vertex, tangent)),
                attribute(4, BufferFormat::R32G32B32A32_SFLOAT, std::mem::offset_of!(Vertex, color)),
            ],
        }
    }

    /// Picking reads positions only, at the full vertex stride
    pub fn position_layout() -> VertexLayout {
        VertexLayout {
            bindings: vec![VertexBinding { binding: 0, stride: Self::STRIDE }],
            attributes: vec![VertexAttribute {
                location: 0,
                binding: 0,
                format: BufferFormat::R32G32B32_SFLOAT,
                offset: 0,
            }],
        }
    }
}

/// CPU-side mesh
#[derive(Debug, Clone)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub topology: PrimitiveTopology,
}

impl MeshData {
    /// Indices must reference existing vertices and fill whole primitives.
    pub fn validate(&self) -> Result<()> {
        let per_primitive = match self.topology {
            PrimitiveTopology::TriangleList => 3,
            PrimitiveTopology::LineList => 2,
        };
        if self.vertices.is_empty() || self.indices.is_empty() {
            crate::engine_bail!(InvalidResource, "solar3d::resource", "mesh is empty");
        }
        if self.indices.len() % per_primitive != 0 {
            crate::engine_bail!(InvalidResource, "solar3d::resource",
                "{} indices do not form whole {:?} primitives", self.indices.len(), self.topology);
        }
        if let Some(bad) = self.indices.iter().find(|&&i| i as usize >= self.vertices.len()) {
            crate::engine_bail!(InvalidResource, "solar3d::resource",
                "index {} out of range ({} vertices)", bad, self.vertices.len());
        }
        Ok(())
    }
}

/// Mesh uploaded into device buffers
pub struct GpuMesh {
    pub vertex_buffer: Arc<dyn Buffer>,
    pub index_buffer: Arc<dyn Buffer>,
    pub index_count: u32,
    pub topology: PrimitiveTopology,
}

impl GpuMesh {
    pub fn upload(device: &dyn GraphicsDevice, mesh: &MeshData) -> Result<Self> {
        mesh.validate()?;
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);

        let vertex_buffer = device.create_buffer(BufferDesc {
            size: vertex_bytes.len() as u64,
            usage: BufferUsage::Vertex,
        })?;
        vertex_buffer.update(0, vertex_bytes)?;

        let index_buffer = device.create_buffer(BufferDesc {
            size: index_bytes.len() as u64,
            usage: BufferUsage::Index,
        })?;
        index_buffer.update(0, index_bytes)?;

        Ok(Self {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
            topology: mesh.topology,
        })
    }

    /// Bind both buffers and issue one indexed draw
    pub fn record_draw(&self, cmd: &mut dyn CommandList) -> Result<()> {
        cmd.bind_vertex_buffer(&self.vertex_buffer, 0)?;
        cmd.bind_index_buffer(&self.index_buffer, 0, IndexType::U32)?;
        cmd.draw_indexed(self.index_count, 0, 0)
    }
}
