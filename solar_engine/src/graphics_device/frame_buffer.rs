/// Framebuffer trait - groups render target attachments for a render pass
///
/// Created once and reused each frame. Recreated only when its attachments
/// change (window resize).

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{RenderPass, RenderTarget};

pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Debug name given at creation
    fn label(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// Debug name
    pub label: &'a str,
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// Attachments in render pass order: colors, depth, resolves
    pub attachments: Vec<Arc<dyn RenderTarget>>,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}
