//! Decoded RGBA8 images and their upload as sampled textures.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{GraphicsDevice, SampleCount, Texture, TextureDesc, TextureFormat, TextureUsage};

/// Tightly packed RGBA8 pixels, row-major, top row first
#[derive(Debug, Clone, PartialEq)]
pub struct ImageData {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

impl ImageData {
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Result<Self> {
        let expected = width as usize * height as usize * 4;
        if width == 0 || height == 0 || pixels.len() != expected {
            crate::engine_bail!(InvalidResource, "solar3d::resource",
                "image {}x{} needs {} bytes, got {}", width, height, expected, pixels.len());
        }
        Ok(Self { width, height, pixels })
    }

    /// Single-color image
    pub fn solid(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let pixels = rgba.iter().copied().cycle().take(width as usize * height as usize * 4).collect();
        Self { width, height, pixels }
    }
}

/// Upload `image` as a sampled texture. Color maps are sRGB, data maps are linear.
pub fn upload_texture(
    device: &dyn GraphicsDevice,
    label: &str,
    image: &ImageData,
    srgb: bool,
) -> Result<Arc<dyn Texture>> {
    device.create_texture(TextureDesc {
        label: label.to_string(),
        width: image.width,
        height: image.height,
        format: if srgb { TextureFormat::R8G8B8A8_SRGB } else { TextureFormat::R8G8B8A8_UNORM },
        usage: TextureUsage::Sampled,
        samples: SampleCount::S1,
        data: Some(image.pixels.clone()),
    })
}
