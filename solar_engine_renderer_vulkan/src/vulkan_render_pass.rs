/// RenderPass - Vulkan implementation of the RenderPass trait

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::render::{RenderPass as RendererRenderPass, SampleCount};

use crate::vulkan_context::GpuContext;

pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    color_attachment_count: u32,
    samples: SampleCount,
}

impl RenderPass {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        render_pass: vk::RenderPass,
        color_attachment_count: u32,
        samples: SampleCount,
    ) -> Self {
        Self { ctx, render_pass, color_attachment_count, samples }
    }
}

impl RendererRenderPass for RenderPass {
    fn color_attachment_count(&self) -> u32 {
        self.color_attachment_count
    }

    fn samples(&self) -> SampleCount {
        self.samples
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}
