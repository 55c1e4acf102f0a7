/// GraphicsDevice trait - factory for GPU objects and queue access
///
/// All methods take `&self`: the device is shared as `Arc<dyn GraphicsDevice>`
/// between the orchestrator, the render graph, the picker and the scene.
/// Backends keep their mutable bookkeeping behind interior locks.

use std::sync::Arc;
use winit::window::Window;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, CommandList, Fence, Framebuffer,
    FramebufferDesc, Pipeline, PipelineDesc, PipelineStages, RenderPass, RenderPassDesc,
    RenderTarget, SampleCount, Semaphore, Shader, ShaderDesc, Swapchain, Texture, TextureDesc,
};

/// Capabilities the renderer adapts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceLimits {
    /// Highest sample count usable for both color and depth attachments
    pub max_msaa_samples: SampleCount,
    /// Largest push constant block in bytes
    pub max_push_constants_size: u32,
}

/// One queue submission
pub struct SubmitInfo<'a> {
    pub command_lists: &'a [&'a dyn CommandList],
    /// Semaphores to wait on, each at the given stage
    pub wait_semaphores: &'a [(&'a dyn Semaphore, PipelineStages)],
    pub signal_semaphores: &'a [&'a dyn Semaphore],
    /// Signaled when every command list has finished executing
    pub fence: Option<&'a dyn Fence>,
}

pub trait GraphicsDevice: Send + Sync {
    /// Create a persistently mapped buffer
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a texture, uploading `desc.data` when present
    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create an owned render target viewing `texture`
    fn create_render_target(&self, texture: &Arc<dyn Texture>) -> Result<Arc<dyn RenderTarget>>;

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn Shader>>;

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn Pipeline>>;

    /// Allocate a binding group for set `set_index` of `pipeline`'s layout
    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>>;

    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Create a swapchain for `window`
    fn create_swapchain(&self, window: &Window) -> Result<Box<dyn Swapchain>>;

    /// Submit recorded command lists to the graphics queue
    fn submit(&self, info: &SubmitInfo) -> Result<()>;

    /// Block until the device has finished all submitted work
    fn wait_idle(&self) -> Result<()>;

    fn limits(&self) -> DeviceLimits;

    /// Serialized pipeline cache, saved by the application at shutdown
    fn pipeline_cache_data(&self) -> Result<Vec<u8>>;
}
