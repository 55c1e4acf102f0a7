/*!
# Solar Engine - Vulkan Backend

Vulkan implementation of the Solar3D [`GraphicsDevice`] trait.

Built on `ash` for the Vulkan bindings, `ash-window` for surface creation and
`gpu-allocator` for memory. Every GPU object keeps the shared device context
alive, so objects may be dropped in any order relative to the device.

```no_run
use solar_engine::solar3d::RendererConfig;
use solar_engine_renderer_vulkan::VulkanGraphicsDevice;
# fn demo(window: &winit::window::Window) -> solar_engine::solar3d::Result<()> {
let device = VulkanGraphicsDevice::new(window, &RendererConfig::default())?;
# Ok(())
# }
```

[`GraphicsDevice`]: solar_engine::solar3d::render::GraphicsDevice
*/

mod vulkan;
mod vulkan_context;
mod vulkan_format;
mod vulkan_buffer;
mod vulkan_texture;
mod vulkan_render_target;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_shader;
mod vulkan_pipeline;
mod vulkan_binding_group;
mod vulkan_sampler;
mod vulkan_sync;
mod vulkan_command_list;
mod vulkan_swapchain;
mod debug;

pub use vulkan::VulkanGraphicsDevice;

// Validation message statistics
pub use debug::{get_validation_stats, print_validation_stats_report, ValidationStats};
