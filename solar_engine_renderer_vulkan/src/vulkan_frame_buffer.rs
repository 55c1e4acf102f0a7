/// Framebuffer - Vulkan implementation of the Framebuffer trait
///
/// Groups the color, depth and resolve attachments of one render pass.
/// Holds its attachments so their image views outlive the VkFramebuffer.

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::render::{Framebuffer as RendererFramebuffer, RenderTarget};

use crate::vulkan_context::GpuContext;

pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    label: String,
    width: u32,
    height: u32,
    _attachments: Vec<Arc<dyn RenderTarget>>,
}

impl Framebuffer {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        framebuffer: vk::Framebuffer,
        label: String,
        width: u32,
        height: u32,
        attachments: Vec<Arc<dyn RenderTarget>>,
    ) -> Self {
        Self {
            ctx,
            framebuffer,
            label,
            width,
            height,
            _attachments: attachments,
        }
    }
}

impl RendererFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn label(&self) -> &str {
        &self.label
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}
