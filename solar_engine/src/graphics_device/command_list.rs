/// CommandList trait - for recording rendering commands

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    AccessFlags, BindingGroup, Buffer, Framebuffer, ImageLayout, IndexType, Pipeline,
    PipelineStages, RenderPass, ShaderStage, Texture,
};

/// Command list for recording rendering commands
///
/// Commands are recorded between `begin` and `end`, then handed to
/// `GraphicsDevice::submit`. A list must not be re-recorded while a
/// submission using it is still executing.
pub trait CommandList: Send + Sync {
    /// Reset and begin recording commands
    fn begin(&mut self) -> Result<()>;

    /// End recording commands
    fn end(&mut self) -> Result<()>;

    /// Begin a render pass
    ///
    /// # Arguments
    ///
    /// * `render_pass` - The render pass to begin
    /// * `framebuffer` - The framebuffer containing the attachments
    /// * `clear_values` - Clear values, one per attachment in framebuffer order
    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn RenderPass>,
        framebuffer: &Arc<dyn Framebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()>;

    /// End the current render pass
    fn end_render_pass(&mut self) -> Result<()>;

    /// Set the viewport
    fn set_viewport(&mut self, viewport: Viewport) -> Result<()>;

    /// Set the scissor rectangle
    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()>;

    /// Bind a graphics pipeline
    fn bind_pipeline(&mut self, pipeline: &Arc<dyn Pipeline>) -> Result<()>;

    /// Bind a binding group at `set_index` of the pipeline layout
    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        binding_group: &Arc<dyn BindingGroup>,
    ) -> Result<()>;

    /// Push constants to the bound pipeline
    fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()>;

    /// Bind a vertex buffer at binding 0
    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64) -> Result<()>;

    /// Bind an index buffer
    fn bind_index_buffer(&mut self, buffer: &Arc<dyn Buffer>, offset: u64, index_type: IndexType) -> Result<()>;

    /// Draw non-indexed vertices
    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()>;

    /// Draw indexed vertices
    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()>;

    /// Record a pipeline barrier with a layout transition on one image.
    /// Must be called outside a render pass.
    fn image_barrier(&mut self, barrier: &ImageBarrier) -> Result<()>;

    /// Copy a region of a single-sampled color texture (in TransferSrc layout)
    /// into a buffer, tightly packed. Must be called outside a render pass.
    fn copy_texture_to_buffer(
        &mut self,
        texture: &Arc<dyn Texture>,
        region: Rect2D,
        buffer: &Arc<dyn Buffer>,
        buffer_offset: u64,
    ) -> Result<()>;

    fn as_any(&self) -> &dyn Any;
}

/// Execution + memory dependency with an image layout transition
#[derive(Clone)]
pub struct ImageBarrier {
    pub texture: Arc<dyn Texture>,
    pub old_layout: ImageLayout,
    pub new_layout: ImageLayout,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

impl ImageBarrier {
    /// Color attachment writes → fragment shader sampling
    pub fn attachment_to_sampled(texture: Arc<dyn Texture>) -> Self {
        Self {
            texture,
            old_layout: ImageLayout::ColorAttachment,
            new_layout: ImageLayout::ShaderReadOnly,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::FRAGMENT_SHADER,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: AccessFlags::SHADER_READ,
        }
    }
}

/// Viewport dimensions and depth range
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub min_depth: f32,
    pub max_depth: f32,
}

impl Viewport {
    /// Whole target, depth 0..1
    pub fn full(width: u32, height: u32) -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            width: width as f32,
            height: height as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        }
    }
}

/// 2D rectangle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect2D {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect2D {
    pub fn full(width: u32, height: u32) -> Self {
        Self { x: 0, y: 0, width, height }
    }

    /// True when the pixel at (x, y) lies inside the rectangle
    pub fn contains(&self, x: i64, y: i64) -> bool {
        x >= self.x as i64
            && y >= self.y as i64
            && x < self.x as i64 + self.width as i64
            && y < self.y as i64 + self.height as i64
    }
}

/// Clear value for an attachment
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ClearValue {
    /// Float color clear value (RGBA)
    Color([f32; 4]),
    /// Unsigned integer color clear value (picking target)
    ColorUint([u32; 4]),
    /// Depth/stencil clear value
    DepthStencil { depth: f32, stencil: u32 },
}
