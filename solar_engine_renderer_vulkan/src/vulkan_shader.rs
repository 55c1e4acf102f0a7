/// Shader - Vulkan implementation of the Shader trait

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::render::{Shader as RendererShader, ShaderStage};

use crate::vulkan_context::GpuContext;

pub struct Shader {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    stage: ShaderStage,
    entry_point: String,
}

impl Shader {
    pub(crate) fn new(ctx: Arc<GpuContext>, module: vk::ShaderModule, stage: ShaderStage, entry_point: String) -> Self {
        Self { ctx, module, stage, entry_point }
    }
}

impl RendererShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }

    fn entry_point(&self) -> &str {
        &self.entry_point
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
