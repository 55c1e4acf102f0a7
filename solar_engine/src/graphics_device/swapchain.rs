/// Swapchain trait - for window presentation

use std::any::Any;
use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{RenderTarget, Semaphore, TextureFormat};

/// Surface size in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// A minimized window reports a zero-area surface
    pub fn is_zero_area(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn aspect_ratio(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }
}

/// Result of acquiring a presentable image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquireResult {
    /// Image index ready to render into
    Image(u32),
    /// Usable image, but the swapchain should be rebuilt after presenting it
    Suboptimal(u32),
    /// No image; the swapchain must be rebuilt before rendering
    OutOfDate,
}

/// Result of presenting an image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentResult {
    Optimal,
    Suboptimal,
    OutOfDate,
}

/// Swapchain for presenting rendered images to a window
pub trait Swapchain: Send + Sync {
    /// Acquire the next image; `signal` is signaled when it is ready for rendering
    fn acquire_next_image(&mut self, signal: &dyn Semaphore) -> Result<AcquireResult>;

    /// Queue `image_index` for presentation once `wait` is signaled
    fn present(&mut self, image_index: u32, wait: &dyn Semaphore) -> Result<PresentResult>;

    /// Rebuild the swapchain at the given size (clamped to surface limits).
    /// All render targets previously returned must be dropped first.
    fn recreate(&mut self, width: u32, height: u32) -> Result<()>;

    /// Get the number of images in the swapchain
    fn image_count(&self) -> usize;

    /// Current image extent
    fn extent(&self) -> Extent2D;

    /// Get the pixel format of the swapchain images
    fn format(&self) -> TextureFormat;

    /// External (not owned) render target viewing image `index`
    fn render_target(&self, index: usize) -> Result<Arc<dyn RenderTarget>>;

    fn as_any(&self) -> &dyn Any;
}
