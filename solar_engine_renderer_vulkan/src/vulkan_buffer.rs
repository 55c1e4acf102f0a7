/// Buffer - Vulkan implementation of the Buffer trait
///
/// Every buffer is persistently mapped: vertex, index and uniform buffers live
/// in CpuToGpu memory, readback buffers in GpuToCpu memory.

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use solar_engine::solar3d::{Error, Result};
use solar_engine::solar3d::render::Buffer as RendererBuffer;
use solar_engine::engine_bail;

use crate::vulkan_context::GpuContext;

pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn new(ctx: Arc<GpuContext>, buffer: vk::Buffer, allocation: Allocation, size: u64) -> Self {
        Self {
            ctx,
            buffer,
            allocation: Some(allocation),
            size,
        }
    }

    fn check_range(&self, offset: u64, len: u64) -> Result<()> {
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Ok(()),
            _ => Err(Error::InvalidResource(format!(
                "Buffer range {}..{} out of bounds (size {})",
                offset,
                offset.saturating_add(len),
                self.size
            ))),
        }
    }

    fn mapped_ptr(&self) -> Result<*mut u8> {
        match self.allocation.as_ref().and_then(|a| a.mapped_ptr()) {
            Some(ptr) => Ok(ptr.as_ptr() as *mut u8),
            None => engine_bail!("solar3d::vulkan", "Buffer is not CPU-accessible"),
        }
    }
}

impl RendererBuffer for Buffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        self.check_range(offset, data.len() as u64)?;
        let mapped = self.mapped_ptr()?;
        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn read(&self, offset: u64, len: usize) -> Result<Vec<u8>> {
        self.check_range(offset, len as u64)?;
        let mapped = self.mapped_ptr()?;
        let mut out = vec![0u8; len];
        unsafe {
            std::ptr::copy_nonoverlapping(mapped.add(offset as usize), out.as_mut_ptr(), len);
        }
        Ok(out)
    }

    fn size(&self) -> u64 {
        self.size
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        if let Some(allocation) = self.allocation.take() {
            self.ctx.lock_allocator().free(allocation).ok();
        }
        unsafe {
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}
