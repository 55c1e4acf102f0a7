/*!
# Solar Engine

Core traits and types for the Solar3D multi-pass renderer.

This crate drives a small solar-system scene through a fixed bloom render
graph on top of a backend-agnostic graphics device. Backends (Vulkan) live in
their own crates and implement the [`graphics_device`] traits.

## Architecture

- **GraphicsDevice**: Factory trait for GPU objects, queue submission, idle waits
- **FrameOrchestrator**: Frames-in-flight loop (fences, semaphores, swapchain)
- **BloomGraph**: Glow → blur V → blur H → scene → composite
- **ObjectPicker**: One-shot integer-ID render for mouse selection
- **SceneRegistry**: Entity arena, object IDs, fallback material
*/

// Internal modules
mod error;
mod engine;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod resource;
pub mod scene;
pub mod render_graph;
pub mod frame;
pub mod picking;
pub mod uniforms;
pub mod utils;

#[cfg(test)]
mod test_support;

// Main solar3d namespace module
pub mod solar3d {
    // Error types
    pub use crate::error::{Error, Result};

    // Logger hub
    pub use crate::engine::Engine;

    // Renderer configuration
    pub use crate::config::RendererConfig;

    // Logging sub-module (types only, macros live at the crate root)
    pub mod log {
        pub use crate::log::{Logger, LogEntry, LogSeverity, DefaultLogger};
    }

    // Device abstraction
    pub mod render {
        pub use crate::graphics_device::*;
        pub use crate::uniforms::*;
    }

    pub mod resource {
        pub use crate::resource::*;
    }

    pub mod scene {
        pub use crate::scene::*;
    }

    pub mod graph {
        pub use crate::render_graph::*;
    }

    pub mod frame {
        pub use crate::frame::*;
    }

    pub mod picking {
        pub use crate::picking::*;
    }
}

// Re-export math library at crate root
pub use glam;
