/// RenderTarget trait - an attachment view used by a framebuffer
///
/// Offscreen targets own the texture they view. Swapchain targets view an
/// image owned by the presentation engine and are never destroyed through
/// the render target.

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{SampleCount, Texture, TextureFormat};

pub trait RenderTarget: Send + Sync {
    /// Get the width of the render target in pixels
    fn width(&self) -> u32;

    /// Get the height of the render target in pixels
    fn height(&self) -> u32;

    /// Get the pixel format of the render target
    fn format(&self) -> TextureFormat;

    fn samples(&self) -> SampleCount;

    /// Texture backing this target, None for swapchain images
    fn texture(&self) -> Option<&Arc<dyn Texture>>;

    /// True when the target owns its image (offscreen), false when external
    fn is_owned(&self) -> bool {
        self.texture().is_some()
    }

    fn as_any(&self) -> &dyn Any;
}
