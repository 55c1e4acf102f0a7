/// Buffer trait and buffer descriptor

use std::any::Any;
use crate::error::Result;

/// Buffer usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferUsage {
    /// Vertex buffer
    Vertex,
    /// Index buffer
    Index,
    /// Uniform/constant buffer
    Uniform,
    /// Host-visible transfer destination, read back by the CPU (picking)
    Readback,
}

/// Descriptor for creating a buffer
#[derive(Debug, Clone)]
pub struct BufferDesc {
    /// Size in bytes
    pub size: u64,
    /// Buffer usage
    pub usage: BufferUsage,
}

/// Buffer data format for vertex attributes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(non_camel_case_types)]
pub enum BufferFormat {
    R32_SFLOAT,          // float (4 bytes)
    R32G32_SFLOAT,       // vec2 (8 bytes)
    R32G32B32_SFLOAT,    // vec3 (12 bytes)
    R32G32B32A32_SFLOAT, // vec4 (16 bytes)
    R32_UINT,
}

impl BufferFormat {
    /// Returns size in bytes for this format
    pub fn size_bytes(&self) -> u32 {
        match self {
            BufferFormat::R32_SFLOAT | BufferFormat::R32_UINT => 4,
            BufferFormat::R32G32_SFLOAT => 8,
            BufferFormat::R32G32B32_SFLOAT => 12,
            BufferFormat::R32G32B32A32_SFLOAT => 16,
        }
    }
}

/// Buffer resource trait
///
/// Implemented by backend-specific buffer types (e.g., VulkanBuffer).
/// All buffers are persistently mapped; the buffer is destroyed when dropped.
pub trait Buffer: Send + Sync {
    /// Write `data` at `offset` bytes into the buffer
    fn update(&self, offset: u64, data: &[u8]) -> Result<()>;

    /// Copy `len` bytes starting at `offset` out of the buffer
    ///
    /// Only meaningful once the GPU has finished writing (fence signaled).
    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>>;

    /// Size in bytes
    fn size(&self) -> u64;

    fn as_any(&self) -> &dyn Any;
}

/// Reject writes or reads that fall outside a buffer of `size` bytes.
pub(crate) fn check_range(size: u64, offset: u64, len: u64) -> Result<()> {
    match offset.checked_add(len) {
        Some(end) if end <= size => Ok(()),
        _ => Err(crate::error::Error::InvalidResource(format!(
            "Buffer range {}..{} out of bounds (size {})",
            offset,
            offset.saturating_add(len),
            size
        ))),
    }
}

#[cfg(test)]
#[path = "buffer_tests.rs"]
mod tests;
