/// Texture - Vulkan implementation of the Texture trait

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use gpu_allocator::vulkan::Allocation;
use solar_engine::solar3d::render::{Texture as RendererTexture, TextureInfo};

use crate::vulkan_context::GpuContext;

pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    pub(crate) aspect: vk::ImageAspectFlags,
    allocation: Option<Allocation>,
    info: TextureInfo,
}

impl Texture {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        image: vk::Image,
        view: vk::ImageView,
        aspect: vk::ImageAspectFlags,
        allocation: Allocation,
        info: TextureInfo,
    ) -> Self {
        Self {
            ctx,
            image,
            view,
            aspect,
            allocation: Some(allocation),
            info,
        }
    }
}

impl RendererTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);
        }
        if let Some(allocation) = self.allocation.take() {
            self.ctx.lock_allocator().free(allocation).ok();
        }
        unsafe {
            self.ctx.device.destroy_image(self.image, None);
        }
    }
}
