/// SamplerCache - internal VkSampler management for the Vulkan backend
///
/// Samplers are created on first use and live as long as the device.
/// The renderer only needs a handful of them.

use std::sync::Arc;
use ash::vk;
use rustc_hash::FxHashMap;
use solar_engine::solar3d::Result;
use solar_engine::solar3d::render::SamplerType;

use crate::vulkan_context::{vk_error, GpuContext};

pub(crate) struct SamplerCache {
    ctx: Arc<GpuContext>,
    /// Device anisotropy limit, None when the feature is not enabled
    max_anisotropy: Option<f32>,
    cache: FxHashMap<SamplerType, vk::Sampler>,
}

impl SamplerCache {
    pub(crate) fn new(ctx: Arc<GpuContext>, max_anisotropy: Option<f32>) -> Self {
        Self {
            ctx,
            max_anisotropy,
            cache: FxHashMap::default(),
        }
    }

    /// Get or create a VkSampler for the given type
    pub(crate) fn get(&mut self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        if let Some(&sampler) = self.cache.get(&sampler_type) {
            return Ok(sampler);
        }

        let sampler = self.create_vk_sampler(sampler_type)?;
        self.cache.insert(sampler_type, sampler);
        Ok(sampler)
    }

    fn create_vk_sampler(&self, sampler_type: SamplerType) -> Result<vk::Sampler> {
        let (filter, mipmap, address, anisotropy) = match sampler_type {
            SamplerType::LinearRepeat => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::REPEAT,
                self.max_anisotropy,
            ),
            SamplerType::LinearClamp => (
                vk::Filter::LINEAR,
                vk::SamplerMipmapMode::LINEAR,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                None,
            ),
            SamplerType::NearestClamp => (
                vk::Filter::NEAREST,
                vk::SamplerMipmapMode::NEAREST,
                vk::SamplerAddressMode::CLAMP_TO_EDGE,
                None,
            ),
        };

        let create_info = vk::SamplerCreateInfo::default()
            .mag_filter(filter)
            .min_filter(filter)
            .mipmap_mode(mipmap)
            .address_mode_u(address)
            .address_mode_v(address)
            .address_mode_w(address)
            .mip_lod_bias(0.0)
            .min_lod(0.0)
            .max_lod(vk::LOD_CLAMP_NONE)
            .border_color(vk::BorderColor::FLOAT_OPAQUE_BLACK)
            .unnormalized_coordinates(false)
            .compare_enable(false)
            .compare_op(vk::CompareOp::ALWAYS)
            .anisotropy_enable(anisotropy.is_some())
            .max_anisotropy(anisotropy.unwrap_or(1.0));

        unsafe {
            self.ctx.device.create_sampler(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create sampler"))
        }
    }
}

impl Drop for SamplerCache {
    fn drop(&mut self) {
        for (_, sampler) in self.cache.drain() {
            unsafe { self.ctx.device.destroy_sampler(sampler, None); }
        }
    }
}
