/// Fence and Semaphore - Vulkan implementations of the sync traits

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::Result;
use solar_engine::solar3d::render::{Fence as RendererFence, FenceStatus, Semaphore as RendererSemaphore};

use crate::vulkan_context::{vk_error, GpuContext};

pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe {
            ctx.device.create_fence(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create fence"))?
        };
        Ok(Self { ctx, fence })
    }
}

impl RendererFence for Fence {
    fn wait(&self, timeout_ns: u64) -> Result<FenceStatus> {
        match unsafe { self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) } {
            Ok(()) => Ok(FenceStatus::Signaled),
            Err(vk::Result::TIMEOUT) => Ok(FenceStatus::TimedOut),
            Err(e) => Err(vk_error(e, "Fence wait failed")),
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe {
            self.ctx.device.reset_fences(&[self.fence])
                .map_err(|e| vk_error(e, "Failed to reset fence"))
        }
    }

    fn is_signaled(&self) -> Result<bool> {
        unsafe {
            self.ctx.device.get_fence_status(self.fence)
                .map_err(|e| vk_error(e, "Failed to query fence status"))
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let semaphore = unsafe {
            ctx.device.create_semaphore(&vk::SemaphoreCreateInfo::default(), None)
                .map_err(|e| vk_error(e, "Failed to create semaphore"))?
        };
        Ok(Self { ctx, semaphore })
    }
}

impl RendererSemaphore for Semaphore {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}
