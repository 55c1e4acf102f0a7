/// CommandList - Vulkan implementation of the CommandList trait
///
/// Each command list owns its own pool (RESET_COMMAND_BUFFER) and a single
/// primary command buffer that is reset at every `begin()`.

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::{Error, Result};
use solar_engine::solar3d::render::{
    BindingGroup as RendererBindingGroup, Buffer as RendererBuffer, ClearValue,
    CommandList as RendererCommandList, Framebuffer as RendererFramebuffer, ImageBarrier,
    IndexType, Pipeline as RendererPipeline, Rect2D, RenderPass as RendererRenderPass,
    ShaderStage, Texture as RendererTexture, Viewport,
};

use crate::vulkan_binding_group::BindingGroup;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_context::{downcast, vk_error, GpuContext};
use crate::vulkan_format::{
    access_flags_to_vk, clear_value_to_vk, image_layout_to_vk, index_type_to_vk,
    pipeline_stages_to_vk, shader_stages_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_texture::Texture;

pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
    /// Layout of the bound pipeline, needed by push constants
    bound_pipeline_layout: Option<vk::PipelineLayout>,
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        unsafe {
            let command_pool_create_info = vk::CommandPoolCreateInfo::default()
                .queue_family_index(ctx.graphics_queue_family)
                .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);

            let command_pool = ctx.device.create_command_pool(&command_pool_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create command pool"))?;

            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(command_pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = match ctx.device.allocate_command_buffers(&allocate_info) {
                Ok(buffers) => buffers[0],
                Err(e) => {
                    ctx.device.destroy_command_pool(command_pool, None);
                    return Err(vk_error(e, "Failed to allocate command buffer"));
                }
            };

            Ok(Self {
                ctx,
                command_pool,
                command_buffer,
                is_recording: false,
                in_render_pass: false,
                bound_pipeline_layout: None,
            })
        }
    }

    fn ensure_recording(&self) -> Result<()> {
        if !self.is_recording {
            return Err(Error::BackendError("Command list not recording".to_string()));
        }
        Ok(())
    }

    fn ensure_in_render_pass(&self) -> Result<()> {
        self.ensure_recording()?;
        if !self.in_render_pass {
            return Err(Error::BackendError("Not inside a render pass".to_string()));
        }
        Ok(())
    }
}

impl RendererCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        // A list abandoned mid-recording (dropped frame) is simply reset
        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| vk_error(e, "Failed to reset command buffer"))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);

            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| vk_error(e, "Failed to begin command buffer"))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_pipeline_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Render pass not ended before ending command list".to_string()));
        }

        unsafe {
            self.ctx.device
                .end_command_buffer(self.command_buffer)
                .map_err(|e| vk_error(e, "Failed to end command buffer"))?;
        }

        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RendererRenderPass>,
        framebuffer: &Arc<dyn RendererFramebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Already inside a render pass".to_string()));
        }

        let vk_render_pass = downcast::<RenderPass>(render_pass.as_any(), "Render pass")?;
        let vk_framebuffer = downcast::<Framebuffer>(framebuffer.as_any(), "Framebuffer")?;

        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();

        let render_pass_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .framebuffer(vk_framebuffer.framebuffer)
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D {
                    width: framebuffer.width(),
                    height: framebuffer.height(),
                },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(
                self.command_buffer,
                &render_pass_info,
                vk::SubpassContents::INLINE,
            );
        }

        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.ctx.device.cmd_end_render_pass(self.command_buffer);
        }
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.ensure_recording()?;

        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);

        unsafe {
            self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]);
        }
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.ensure_recording()?;

        let vk_scissor = vk::Rect2D::default()
            .offset(vk::Offset2D { x: scissor.x, y: scissor.y })
            .extent(vk::Extent2D { width: scissor.width, height: scissor.height });

        unsafe {
            self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]);
        }
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn RendererPipeline>) -> Result<()> {
        self.ensure_recording()?;
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "Pipeline")?;

        unsafe {
            self.ctx.device.cmd_bind_pipeline(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline,
            );
        }

        self.bound_pipeline_layout = Some(vk_pipeline.pipeline_layout);
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn RendererPipeline>,
        set_index: u32,
        binding_group: &Arc<dyn RendererBindingGroup>,
    ) -> Result<()> {
        self.ensure_recording()?;

        if binding_group.set_index() != set_index {
            return Err(Error::InvalidResource(format!(
                "Binding group created for set {} bound at set {}",
                binding_group.set_index(),
                set_index
            )));
        }

        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "Pipeline")?;
        let vk_group = downcast::<BindingGroup>(binding_group.as_any(), "Binding group")?;

        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                vk_pipeline.pipeline_layout,
                set_index,
                &[vk_group.descriptor_set],
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.ensure_recording()?;

        let layout = self.bound_pipeline_layout.ok_or_else(|| {
            Error::BackendError("No pipeline bound for push constants".to_string())
        })?;

        unsafe {
            self.ctx.device.cmd_push_constants(
                self.command_buffer,
                layout,
                shader_stages_to_vk(stages),
                offset,
                data,
            );
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn RendererBuffer>, offset: u64) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "Vertex buffer")?;

        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer.buffer], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn RendererBuffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.ensure_recording()?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "Index buffer")?;

        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer.buffer,
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.ctx.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0);
        }
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.ensure_in_render_pass()?;

        unsafe {
            self.ctx.device.cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }

    fn image_barrier(&mut self, barrier: &ImageBarrier) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Image barrier inside a render pass".to_string()));
        }

        let texture = downcast::<Texture>(barrier.texture.as_any(), "Barrier texture")?;

        let image_barrier = vk::ImageMemoryBarrier::default()
            .old_layout(image_layout_to_vk(barrier.old_layout))
            .new_layout(image_layout_to_vk(barrier.new_layout))
            .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
            .image(texture.image)
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask: texture.aspect,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            })
            .src_access_mask(access_flags_to_vk(barrier.src_access))
            .dst_access_mask(access_flags_to_vk(barrier.dst_access));

        unsafe {
            self.ctx.device.cmd_pipeline_barrier(
                self.command_buffer,
                pipeline_stages_to_vk(barrier.src_stages),
                pipeline_stages_to_vk(barrier.dst_stages),
                vk::DependencyFlags::empty(),
                &[],
                &[],
                &[image_barrier],
            );
        }
        Ok(())
    }

    fn copy_texture_to_buffer(
        &mut self,
        texture: &Arc<dyn RendererTexture>,
        region: Rect2D,
        buffer: &Arc<dyn RendererBuffer>,
        buffer_offset: u64,
    ) -> Result<()> {
        self.ensure_recording()?;
        if self.in_render_pass {
            return Err(Error::BackendError("Texture copy inside a render pass".to_string()));
        }

        let info = texture.info();
        let inside = region.x >= 0
            && region.y >= 0
            && region.x as u64 + region.width as u64 <= info.width as u64
            && region.y as u64 + region.height as u64 <= info.height as u64;
        if !inside {
            return Err(Error::InvalidResource(format!(
                "Copy region {:?} outside texture '{}' ({}x{})",
                region, info.label, info.width, info.height
            )));
        }

        let copy_size = region.width as u64 * region.height as u64 * info.format.bytes_per_pixel() as u64;
        if buffer_offset + copy_size > buffer.size() {
            return Err(Error::InvalidResource(format!(
                "Copy of {} bytes at offset {} overflows buffer of {} bytes",
                copy_size,
                buffer_offset,
                buffer.size()
            )));
        }

        let vk_texture = downcast::<Texture>(texture.as_any(), "Copy source texture")?;
        let vk_buffer = downcast::<Buffer>(buffer.as_any(), "Copy destination buffer")?;

        let copy = vk::BufferImageCopy::default()
            .buffer_offset(buffer_offset)
            .buffer_row_length(0)
            .buffer_image_height(0)
            .image_subresource(vk::ImageSubresourceLayers {
                aspect_mask: vk_texture.aspect,
                mip_level: 0,
                base_array_layer: 0,
                layer_count: 1,
            })
            .image_offset(vk::Offset3D { x: region.x, y: region.y, z: 0 })
            .image_extent(vk::Extent3D { width: region.width, height: region.height, depth: 1 });

        unsafe {
            self.ctx.device.cmd_copy_image_to_buffer(
                self.command_buffer,
                vk_texture.image,
                vk::ImageLayout::TRANSFER_SRC_OPTIMAL,
                vk_buffer.buffer,
                &[copy],
            );
        }
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        unsafe {
            // Frees the command buffer with it
            self.ctx.device.destroy_command_pool(self.command_pool, None);
        }
    }
}
