/// Texture trait, texture descriptor, and texture info

use std::any::Any;

/// Texture and attachment pixel format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(non_camel_case_types)]
pub enum TextureFormat {
    R8G8B8A8_SRGB,
    R8G8B8A8_UNORM,
    B8G8R8A8_SRGB,
    B8G8R8A8_UNORM,
    /// HDR offscreen color (glow, blur, scene)
    R16G16B16A16_SFLOAT,
    /// Object-ID picking target
    R32_UINT,
    D32_FLOAT,
}

impl TextureFormat {
    /// True for depth formats
    pub fn is_depth(&self) -> bool {
        matches!(self, TextureFormat::D32_FLOAT)
    }

    /// Bytes per pixel
    pub fn bytes_per_pixel(&self) -> u32 {
        match self {
            TextureFormat::R16G16B16A16_SFLOAT => 8,
            _ => 4,
        }
    }
}

/// Texture usage flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextureUsage {
    /// Texture can be sampled in shaders (uploaded once)
    Sampled,
    /// Color attachment only (MSAA targets)
    RenderTarget,
    /// Color attachment later sampled by another pass
    SampledAndRenderTarget,
    /// Depth attachment
    DepthStencil,
    /// Color attachment copied back to the host
    Readback,
}

/// MSAA sample count
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SampleCount {
    /// 1 sample (no multisampling)
    S1,
    /// 2 samples
    S2,
    /// 4 samples
    S4,
    /// 8 samples
    S8,
}

impl SampleCount {
    /// Convert a raw count; anything but 1, 2, 4, 8 is rejected.
    pub fn from_count(count: u32) -> Option<Self> {
        match count {
            1 => Some(SampleCount::S1),
            2 => Some(SampleCount::S2),
            4 => Some(SampleCount::S4),
            8 => Some(SampleCount::S8),
            _ => None,
        }
    }

    pub fn count(&self) -> u32 {
        match self {
            SampleCount::S1 => 1,
            SampleCount::S2 => 2,
            SampleCount::S4 => 4,
            SampleCount::S8 => 8,
        }
    }

    /// Whether a separate resolve attachment is needed
    pub fn is_multisampled(&self) -> bool {
        *self != SampleCount::S1
    }
}

/// Sampler preset used when binding a texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerType {
    /// Bilinear, clamp to edge (post-processing reads)
    LinearClamp,
    /// Bilinear, repeat (planet surfaces)
    LinearRepeat,
    /// Point sampling, clamp to edge
    NearestClamp,
}

/// Descriptor for creating a texture
#[derive(Debug, Clone)]
pub struct TextureDesc {
    /// Debug name
    pub label: String,
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
    /// Pixel format
    pub format: TextureFormat,
    /// Usage flags
    pub usage: TextureUsage,
    /// Samples per pixel (attachments only)
    pub samples: SampleCount,
    /// Optional initial pixel data (tightly packed rows)
    pub data: Option<Vec<u8>>,
}

impl TextureDesc {
    /// Single-sampled attachment with no initial data
    pub fn attachment(
        label: impl Into<String>,
        width: u32,
        height: u32,
        format: TextureFormat,
        usage: TextureUsage,
    ) -> Self {
        Self {
            label: label.into(),
            width,
            height,
            format,
            usage,
            samples: SampleCount::S1,
            data: None,
        }
    }

    pub fn with_samples(mut self, samples: SampleCount) -> Self {
        self.samples = samples;
        self
    }
}

/// Read-only properties of a created texture.
#[derive(Debug, Clone)]
pub struct TextureInfo {
    pub label: String,
    pub width: u32,
    pub height: u32,
    pub format: TextureFormat,
    pub usage: TextureUsage,
    pub samples: SampleCount,
}

impl From<&TextureDesc> for TextureInfo {
    fn from(desc: &TextureDesc) -> Self {
        Self {
            label: desc.label.clone(),
            width: desc.width,
            height: desc.height,
            format: desc.format,
            usage: desc.usage,
            samples: desc.samples,
        }
    }
}

/// Texture resource trait
///
/// Implemented by backend-specific texture types (e.g., VulkanTexture).
/// The texture is automatically destroyed when dropped.
pub trait Texture: Send + Sync {
    /// Get the read-only properties of this texture
    fn info(&self) -> &TextureInfo;

    fn as_any(&self) -> &dyn Any;
}

#[cfg(test)]
#[path = "texture_tests.rs"]
mod tests;
