/// Pipeline - Vulkan implementation of the Pipeline trait

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::render::{
    BindingGroupLayoutDesc, Pipeline as RendererPipeline, RenderPass,
};

use crate::vulkan_context::GpuContext;

pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    /// One VkDescriptorSetLayout per binding group, indexed by set
    pub(crate) descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
    layouts: Vec<BindingGroupLayoutDesc>,
    label: String,
    _render_pass: Arc<dyn RenderPass>,
}

impl Pipeline {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        pipeline: vk::Pipeline,
        pipeline_layout: vk::PipelineLayout,
        descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
        layouts: Vec<BindingGroupLayoutDesc>,
        label: String,
        render_pass: Arc<dyn RenderPass>,
    ) -> Self {
        Self {
            ctx,
            pipeline,
            pipeline_layout,
            descriptor_set_layouts,
            layouts,
            label,
            _render_pass: render_pass,
        }
    }
}

impl RendererPipeline for Pipeline {
    fn label(&self) -> &str {
        &self.label
    }

    fn binding_group_layout_count(&self) -> u32 {
        self.layouts.len() as u32
    }

    fn binding_group_layout(&self, set_index: u32) -> Option<&BindingGroupLayoutDesc> {
        self.layouts.get(set_index as usize)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            for layout in self.descriptor_set_layouts.drain(..) {
                self.ctx.device.destroy_descriptor_set_layout(layout, None);
            }
        }
    }
}
