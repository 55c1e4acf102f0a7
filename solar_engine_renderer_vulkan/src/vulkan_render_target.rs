/// RenderTarget - Vulkan implementation of the RenderTarget trait
///
/// Either an owned offscreen texture or a swapchain image view. Swapchain
/// views belong to the swapchain; the target only borrows the handle and
/// must be dropped before the swapchain is recreated.

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::render::{
    RenderTarget as RendererRenderTarget, SampleCount, Texture as RendererTexture, TextureFormat,
};

pub struct RenderTarget {
    width: u32,
    height: u32,
    format: TextureFormat,
    samples: SampleCount,
    pub(crate) image_view: vk::ImageView,
    /// Keeps the backing image alive (None for swapchain images)
    texture: Option<Arc<dyn RendererTexture>>,
}

impl RenderTarget {
    pub(crate) fn new_swapchain_target(
        width: u32,
        height: u32,
        format: TextureFormat,
        image_view: vk::ImageView,
    ) -> Self {
        Self {
            width,
            height,
            format,
            samples: SampleCount::S1,
            image_view,
            texture: None,
        }
    }

    pub(crate) fn new_texture_target(texture: Arc<dyn RendererTexture>, image_view: vk::ImageView) -> Self {
        let info = texture.info();
        Self {
            width: info.width,
            height: info.height,
            format: info.format,
            samples: info.samples,
            image_view,
            texture: Some(texture),
        }
    }
}

impl RendererRenderTarget for RenderTarget {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn samples(&self) -> SampleCount {
        self.samples
    }

    fn texture(&self) -> Option<&Arc<dyn RendererTexture>> {
        self.texture.as_ref()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
