/// BindingGroup - Vulkan implementation of the BindingGroup trait
///
/// A binding group is one descriptor set allocated from the device-wide
/// pool. It keeps the buffers and textures it references alive and returns
/// its set to the pool when dropped. Immutable after creation.

use std::any::Any;
use std::sync::{Arc, Mutex, MutexGuard};
use ash::vk;
use solar_engine::solar3d::{Error, Result, RendererConfig};
use solar_engine::solar3d::render::{BindingGroup as RendererBindingGroup, BindingResource};
use solar_engine::engine_error;

use crate::vulkan_context::{vk_error, GpuContext};

/// Device-wide descriptor pool, sized once from the renderer configuration
pub(crate) struct DescriptorPool {
    ctx: Arc<GpuContext>,
    pool: Mutex<vk::DescriptorPool>,
}

impl DescriptorPool {
    pub(crate) fn new(ctx: Arc<GpuContext>, config: &RendererConfig) -> Result<Self> {
        let pool_sizes = [
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::UNIFORM_BUFFER,
                descriptor_count: config.max_uniform_buffers,
            },
            vk::DescriptorPoolSize {
                ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                descriptor_count: config.max_combined_image_samplers,
            },
        ];

        let create_info = vk::DescriptorPoolCreateInfo::default()
            .flags(vk::DescriptorPoolCreateFlags::FREE_DESCRIPTOR_SET)
            .max_sets(config.max_binding_groups)
            .pool_sizes(&pool_sizes);

        let pool = unsafe {
            ctx.device.create_descriptor_pool(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create descriptor pool"))?
        };

        Ok(Self { ctx, pool: Mutex::new(pool) })
    }

    fn lock(&self) -> MutexGuard<'_, vk::DescriptorPool> {
        self.pool.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Allocate one descriptor set. Running out of pool space is reported as
    /// ResourceExhausted; the pool never grows.
    pub(crate) fn allocate(&self, layout: vk::DescriptorSetLayout) -> Result<vk::DescriptorSet> {
        let pool = self.lock();
        let layouts = [layout];
        let alloc_info = vk::DescriptorSetAllocateInfo::default()
            .descriptor_pool(*pool)
            .set_layouts(&layouts);

        match unsafe { self.ctx.device.allocate_descriptor_sets(&alloc_info) } {
            Ok(sets) => sets.into_iter().next().ok_or_else(|| {
                Error::BackendError("Descriptor set allocation returned no set".to_string())
            }),
            Err(vk::Result::ERROR_OUT_OF_POOL_MEMORY) | Err(vk::Result::ERROR_FRAGMENTED_POOL) => {
                engine_error!("solar3d::vulkan", "Descriptor pool exhausted");
                Err(Error::ResourceExhausted("Descriptor pool exhausted".to_string()))
            }
            Err(e) => Err(vk_error(e, "Failed to allocate descriptor set")),
        }
    }

    fn free(&self, set: vk::DescriptorSet) {
        let pool = self.lock();
        unsafe {
            self.ctx.device.free_descriptor_sets(*pool, &[set]).ok();
        }
    }
}

impl Drop for DescriptorPool {
    fn drop(&mut self) {
        let pool = *self.lock();
        unsafe {
            self.ctx.device.destroy_descriptor_pool(pool, None);
        }
    }
}

pub struct BindingGroup {
    pool: Arc<DescriptorPool>,
    pub(crate) descriptor_set: vk::DescriptorSet,
    set_index: u32,
    _resources: Vec<BindingResource>,
}

impl BindingGroup {
    pub(crate) fn new(
        pool: Arc<DescriptorPool>,
        descriptor_set: vk::DescriptorSet,
        set_index: u32,
        resources: Vec<BindingResource>,
    ) -> Self {
        Self {
            pool,
            descriptor_set,
            set_index,
            _resources: resources,
        }
    }
}

impl RendererBindingGroup for BindingGroup {
    fn set_index(&self) -> u32 {
        self.set_index
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for BindingGroup {
    fn drop(&mut self) {
        self.pool.free(self.descriptor_set);
    }
}
