/// Graphics device module - backend-agnostic GPU object traits

// Module declarations
pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;
pub mod pipeline;
pub mod command_list;
pub mod render_target;
pub mod render_pass;
pub mod swapchain;
pub mod binding_group;
pub mod frame_buffer;
pub mod sync;

// Re-export everything from graphics_device.rs
pub use graphics_device::*;

// Re-export from other modules
pub use texture::*;
pub use buffer::{Buffer, BufferDesc, BufferFormat, BufferUsage};
pub use shader::*;
pub use pipeline::*;
pub use command_list::*;
pub use render_target::*;
pub use render_pass::*;
pub use swapchain::*;
pub use binding_group::*;
pub use frame_buffer::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
