/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Central object for creating GPU resources and submitting work. Presentation
/// lives in the swapchain; frame pacing lives in the engine's orchestrator.

use std::ffi::CString;
use std::io::Cursor;
use std::sync::{Arc, Mutex, MutexGuard};
use ash::vk;
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme, Allocator, AllocatorCreateDesc};
use gpu_allocator::MemoryLocation;
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::window::Window;
use solar_engine::solar3d::{Error, Result, RendererConfig};
use solar_engine::solar3d::render::{
    validate_binding_resources, BindingGroup as RendererBindingGroup, BindingResource,
    Buffer as RendererBuffer, BufferDesc, BufferUsage, CommandList as RendererCommandList,
    DependencyDirection, DeviceLimits, Fence as RendererFence, Framebuffer as RendererFramebuffer,
    FramebufferDesc, GraphicsDevice, Pipeline as RendererPipeline, PipelineDesc,
    RenderPass as RendererRenderPass, RenderPassDesc, RenderTarget as RendererRenderTarget,
    SampleCount, Semaphore as RendererSemaphore, Shader as RendererShader, ShaderDesc, ShaderStage,
    SubmitInfo, Swapchain as RendererSwapchain, Texture as RendererTexture, TextureDesc,
    TextureInfo, TextureUsage,
};
use solar_engine::solar3d::resource::PipelineCacheStore;
use solar_engine::{engine_bail, engine_debug, engine_err, engine_error, engine_info, engine_warn};

use crate::vulkan_binding_group::{BindingGroup, DescriptorPool};
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::{downcast, vk_error, GpuContext, QueueSelection};
use crate::vulkan_format::{
    access_flags_to_vk, aspect_for_format, binding_type_to_vk, blend_factor_to_vk,
    buffer_format_to_vk, compare_op_to_vk, cull_mode_to_vk, front_face_to_vk, image_layout_to_vk,
    load_op_to_vk, max_sample_count, pipeline_stages_to_vk, sample_count_to_vk,
    shader_stage_to_vk, shader_stages_to_vk, stage_flags_to_vk, store_op_to_vk,
    texture_format_to_vk, topology_to_vk,
};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::Pipeline;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sampler::SamplerCache;
use crate::vulkan_shader::Shader;
use crate::vulkan_swapchain::Swapchain;
use crate::vulkan_sync::{Fence, Semaphore};
use crate::vulkan_texture::Texture;

const VALIDATION_LAYER: &std::ffi::CStr = c"VK_LAYER_KHRONOS_validation";

/// Vulkan graphics device
///
/// Fields drop in declaration order after `Drop::drop` has destroyed the
/// pipeline cache; every object keeps the shared context alive on its own.
pub struct VulkanGraphicsDevice {
    sampler_cache: Mutex<SamplerCache>,
    descriptor_pool: Arc<DescriptorPool>,
    pipeline_cache: vk::PipelineCache,
    limits: DeviceLimits,
    ctx: Arc<GpuContext>,
}

/// Instance-level objects created before a physical device is chosen
struct InstanceParts {
    entry: ash::Entry,
    instance: ash::Instance,
    debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

impl InstanceParts {
    /// Tear down after a failed initialization, before a GpuContext owns them
    unsafe fn destroy(self) {
        crate::debug::cleanup_debug_config();
        if let (Some(loader), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
            loader.destroy_debug_utils_messenger(messenger, None);
        }
        self.instance.destroy_instance(None);
    }
}

/// Physical device chosen for rendering and presentation
struct DeviceChoice {
    physical_device: vk::PhysicalDevice,
    graphics_family: u32,
    present_family: u32,
    anisotropy: Option<f32>,
    limits: DeviceLimits,
}

impl VulkanGraphicsDevice {
    /// Create the Vulkan device for the given window
    ///
    /// Validation layers are enabled when `config.enable_validation` is set or
    /// the crate is built with the `vulkan-validation` feature, and only if
    /// the layer is installed.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &RendererConfig) -> Result<Self> {
        config.validate()?;

        let parts = Self::create_instance(window, config)?;

        let (choice, device) = match unsafe { Self::create_device(&parts, window) } {
            Ok(created) => created,
            Err(e) => {
                unsafe { parts.destroy() };
                return Err(e);
            }
        };

        let queues = unsafe {
            QueueSelection {
                graphics_queue: device.get_device_queue(choice.graphics_family, 0),
                graphics_queue_family: choice.graphics_family,
                present_queue: device.get_device_queue(choice.present_family, 0),
                present_queue_family: choice.present_family,
            }
        };

        let allocator = Allocator::new(&AllocatorCreateDesc {
            instance: parts.instance.clone(),
            device: device.clone(),
            physical_device: choice.physical_device,
            debug_settings: Default::default(),
            buffer_device_address: false,
            allocation_sizes: Default::default(),
        });
        let allocator = match allocator {
            Ok(allocator) => allocator,
            Err(e) => {
                engine_error!("solar3d::vulkan", "Failed to create GPU allocator: {:?}", e);
                unsafe {
                    device.destroy_device(None);
                    parts.destroy();
                }
                return Err(Error::InitializationFailed(format!("Failed to create allocator: {:?}", e)));
            }
        };

        let upload_pool_create_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(choice.graphics_family)
            .flags(vk::CommandPoolCreateFlags::TRANSIENT | vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        // A null pool is skipped by GpuContext::drop, so a failure here still tears down cleanly
        let upload_pool = unsafe { device.create_command_pool(&upload_pool_create_info, None) };
        let (upload_command_pool, upload_error) = match upload_pool {
            Ok(pool) => (pool, None),
            Err(e) => (vk::CommandPool::null(), Some(e)),
        };

        let InstanceParts { entry, instance, debug_utils_loader, debug_messenger } = parts;
        let ctx = Arc::new(GpuContext::new(
            entry,
            instance,
            choice.physical_device,
            device,
            allocator,
            queues,
            upload_command_pool,
            debug_utils_loader,
            debug_messenger,
        ));

        if let Some(e) = upload_error {
            engine_error!("solar3d::vulkan", "Failed to create upload command pool: {:?}", e);
            return Err(Error::InitializationFailed(format!("Failed to create upload command pool: {:?}", e)));
        }

        let pipeline_cache = Self::create_pipeline_cache(&ctx, config)?;
        let descriptor_pool = match DescriptorPool::new(Arc::clone(&ctx), config) {
            Ok(pool) => Arc::new(pool),
            Err(e) => {
                unsafe { ctx.device.destroy_pipeline_cache(pipeline_cache, None) };
                return Err(e);
            }
        };

        engine_info!("solar3d::vulkan", "Vulkan device ready (max MSAA {}x, {} bytes push constants)",
            choice.limits.max_msaa_samples.count(), choice.limits.max_push_constants_size);

        Ok(Self {
            sampler_cache: Mutex::new(SamplerCache::new(Arc::clone(&ctx), choice.anisotropy)),
            descriptor_pool,
            pipeline_cache,
            limits: choice.limits,
            ctx,
        })
    }

    fn create_instance<W: HasDisplayHandle>(window: &W, config: &RendererConfig) -> Result<InstanceParts> {
        let entry = unsafe { ash::Entry::load() }.map_err(|e| {
            engine_error!("solar3d::vulkan", "Failed to load Vulkan library: {:?}", e);
            Error::InitializationFailed(format!("Failed to load Vulkan library: {:?}", e))
        })?;

        let requested = config.enable_validation || cfg!(feature = "vulkan-validation");
        let validation = requested && Self::validation_layer_available(&entry);
        if requested && !validation {
            engine_warn!("solar3d::vulkan", "Validation requested but {:?} is not installed, continuing without it",
                VALIDATION_LAYER);
        }

        let app_name = CString::new(config.app_name.as_str()).map_err(|_| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Application name contains a NUL byte")
        })?;
        let (major, minor, patch) = config.app_version;
        let app_info = vk::ApplicationInfo::default()
            .application_name(&app_name)
            .application_version(vk::make_api_version(0, major, minor, patch))
            .engine_name(c"Solar3D")
            .engine_version(vk::make_api_version(0, 0, 1, 0))
            .api_version(vk::API_VERSION_1_2);

        let display_handle = window.display_handle().map_err(|e| {
            engine_error!("solar3d::vulkan", "Failed to get display handle: {}", e);
            Error::InitializationFailed(format!("Failed to get display handle: {}", e))
        })?;
        let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
            .map_err(|e| {
                engine_error!("solar3d::vulkan", "Failed to get required extensions: {}", e);
                Error::InitializationFailed(format!("Failed to get required extensions: {}", e))
            })?
            .to_vec();

        let layer_names = if validation {
            extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            vec![VALIDATION_LAYER.as_ptr()]
        } else {
            vec![]
        };

        let create_info = vk::InstanceCreateInfo::default()
            .application_info(&app_info)
            .enabled_layer_names(&layer_names)
            .enabled_extension_names(&extension_names);

        let instance = unsafe { entry.create_instance(&create_info, None) }.map_err(|e| {
            engine_error!("solar3d::vulkan", "Failed to create Vulkan instance: {:?}", e);
            Error::InitializationFailed(format!("Failed to create instance: {:?}", e))
        })?;

        if !validation {
            return Ok(InstanceParts { entry, instance, debug_utils_loader: None, debug_messenger: None });
        }

        let debug_config = crate::debug::Config::default();
        crate::debug::init_debug_config(debug_config);

        let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
        let debug_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
            .message_severity(crate::debug::severity_mask(&debug_config))
            .message_type(
                vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                    | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                    | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
            )
            .pfn_user_callback(Some(crate::debug::vulkan_debug_callback));

        // A missing messenger only costs diagnostics
        let messenger = match unsafe { debug_utils.create_debug_utils_messenger(&debug_info, None) } {
            Ok(messenger) => Some(messenger),
            Err(e) => {
                engine_warn!("solar3d::vulkan", "Failed to create debug messenger: {:?}", e);
                None
            }
        };

        engine_info!("solar3d::vulkan", "Validation layers enabled");
        Ok(InstanceParts { entry, instance, debug_utils_loader: Some(debug_utils), debug_messenger: messenger })
    }

    fn validation_layer_available(entry: &ash::Entry) -> bool {
        let layers = match unsafe { entry.enumerate_instance_layer_properties() } {
            Ok(layers) => layers,
            Err(_) => return false,
        };
        layers.iter().any(|layer| {
            layer.layer_name_as_c_str().map(|name| name == VALIDATION_LAYER).unwrap_or(false)
        })
    }

    /// Pick a physical device and create the logical device
    unsafe fn create_device<W: HasDisplayHandle + HasWindowHandle>(
        parts: &InstanceParts,
        window: &W,
    ) -> Result<(DeviceChoice, ash::Device)> {
        let display_handle = window.display_handle().map_err(|e| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to get display handle: {}", e)
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to get window handle: {}", e)
        })?;

        // Temporary surface, only used to check present support
        let surface = ash_window::create_surface(
            &parts.entry,
            &parts.instance,
            display_handle.as_raw(),
            window_handle.as_raw(),
            None,
        )
        .map_err(|e| engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to create surface: {:?}", e))?;
        let surface_loader = ash::khr::surface::Instance::new(&parts.entry, &parts.instance);

        let choice = Self::pick_physical_device(&parts.instance, &surface_loader, surface);
        surface_loader.destroy_surface(surface, None);
        let choice = choice?;

        let queue_priorities = [1.0];
        let mut queue_create_infos = vec![vk::DeviceQueueCreateInfo::default()
            .queue_family_index(choice.graphics_family)
            .queue_priorities(&queue_priorities)];
        if choice.present_family != choice.graphics_family {
            queue_create_infos.push(vk::DeviceQueueCreateInfo::default()
                .queue_family_index(choice.present_family)
                .queue_priorities(&queue_priorities));
        }

        let device_extension_names = [ash::khr::swapchain::NAME.as_ptr()];
        let device_features = vk::PhysicalDeviceFeatures::default()
            .sampler_anisotropy(choice.anisotropy.is_some());

        let device_create_info = vk::DeviceCreateInfo::default()
            .queue_create_infos(&queue_create_infos)
            .enabled_extension_names(&device_extension_names)
            .enabled_features(&device_features);

        let device = parts.instance
            .create_device(choice.physical_device, &device_create_info, None)
            .map_err(|e| {
                engine_error!("solar3d::vulkan", "Failed to create logical device: {:?}", e);
                Error::InitializationFailed(format!("Failed to create device: {:?}", e))
            })?;

        Ok((choice, device))
    }

    /// Prefer a discrete GPU; any device needs a graphics queue, present
    /// support and the swapchain extension
    unsafe fn pick_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<DeviceChoice> {
        let physical_devices = instance.enumerate_physical_devices().map_err(|e| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to enumerate physical devices: {:?}", e)
        })?;

        let mut best: Option<(u32, DeviceChoice)> = None;

        for physical_device in physical_devices {
            let properties = instance.get_physical_device_properties(physical_device);
            let name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();

            let has_swapchain = instance
                .enumerate_device_extension_properties(physical_device)
                .map(|extensions| {
                    extensions.iter().any(|ext| {
                        ext.extension_name_as_c_str().map(|n| n == ash::khr::swapchain::NAME).unwrap_or(false)
                    })
                })
                .unwrap_or(false);
            if !has_swapchain {
                engine_debug!("solar3d::vulkan", "Skipping '{}': no swapchain support", name);
                continue;
            }

            let queue_families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics_family = queue_families
                .iter()
                .position(|qf| qf.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|i| i as u32);
            let supports_present = |i: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, i, surface)
                    .unwrap_or(false)
            };
            // Same family as graphics when possible
            let present_family = match graphics_family {
                Some(g) if supports_present(g) => Some(g),
                _ => (0..queue_families.len() as u32).find(|&i| supports_present(i)),
            };

            let (graphics_family, present_family) = match (graphics_family, present_family) {
                (Some(g), Some(p)) => (g, p),
                _ => {
                    engine_debug!("solar3d::vulkan", "Skipping '{}': missing graphics or present queue", name);
                    continue;
                }
            };

            let features = instance.get_physical_device_features(physical_device);
            let anisotropy = (features.sampler_anisotropy == vk::TRUE)
                .then(|| properties.limits.max_sampler_anisotropy.min(16.0));

            let limits = DeviceLimits {
                max_msaa_samples: max_sample_count(
                    properties.limits.framebuffer_color_sample_counts
                        & properties.limits.framebuffer_depth_sample_counts,
                ),
                max_push_constants_size: properties.limits.max_push_constants_size,
            };

            let score = match properties.device_type {
                vk::PhysicalDeviceType::DISCRETE_GPU => 3,
                vk::PhysicalDeviceType::INTEGRATED_GPU => 2,
                vk::PhysicalDeviceType::VIRTUAL_GPU => 1,
                _ => 0,
            };

            engine_debug!("solar3d::vulkan", "Candidate GPU '{}' ({:?})", name, properties.device_type);

            if best.as_ref().map_or(true, |(best_score, _)| score > *best_score) {
                best = Some((score, DeviceChoice {
                    physical_device,
                    graphics_family,
                    present_family,
                    anisotropy,
                    limits,
                }));
                engine_info!("solar3d::vulkan", "Selected GPU: {}", name);
            }
        }

        best.map(|(_, choice)| choice).ok_or_else(|| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "No Vulkan GPU with graphics and present support found")
        })
    }

    /// Create the pipeline cache, seeded from the on-disk blob when it is usable
    fn create_pipeline_cache(ctx: &GpuContext, config: &RendererConfig) -> Result<vk::PipelineCache> {
        let initial_data = PipelineCacheStore::new(config.pipeline_cache_path.clone()).load();

        if !initial_data.is_empty() {
            let create_info = vk::PipelineCacheCreateInfo::default().initial_data(&initial_data);
            match unsafe { ctx.device.create_pipeline_cache(&create_info, None) } {
                Ok(cache) => {
                    engine_debug!("solar3d::vulkan", "Pipeline cache seeded with {} bytes", initial_data.len());
                    return Ok(cache);
                }
                Err(e) => {
                    engine_warn!("solar3d::vulkan", "Pipeline cache data rejected ({:?}), starting empty", e);
                }
            }
        }

        unsafe {
            ctx.device.create_pipeline_cache(&vk::PipelineCacheCreateInfo::default(), None)
                .map_err(|e| vk_error(e, "Failed to create pipeline cache"))
        }
    }

    fn lock_samplers(&self) -> MutexGuard<'_, SamplerCache> {
        self.sampler_cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Create a buffer with a persistently mapped allocation
    fn allocate_buffer(
        &self,
        size: u64,
        usage: vk::BufferUsageFlags,
        location: MemoryLocation,
        name: &str,
    ) -> Result<Buffer> {
        let buffer_info = vk::BufferCreateInfo::default()
            .size(size)
            .usage(usage)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        let buffer = unsafe {
            self.ctx.device.create_buffer(&buffer_info, None)
                .map_err(|e| vk_error(e, "Failed to create buffer"))?
        };

        let requirements = unsafe { self.ctx.device.get_buffer_memory_requirements(buffer) };
        let allocation = self.allocate_memory(name, requirements, location, true).map_err(|e| {
            unsafe { self.ctx.device.destroy_buffer(buffer, None) };
            e
        })?;

        let bound = unsafe {
            self.ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset())
        };
        // From here the Buffer owns both handles and releases them on drop
        let buffer = Buffer::new(Arc::clone(&self.ctx), buffer, allocation, size);
        bound.map_err(|e| vk_error(e, "Failed to bind buffer memory"))?;
        Ok(buffer)
    }

    fn allocate_memory(
        &self,
        name: &str,
        requirements: vk::MemoryRequirements,
        location: MemoryLocation,
        linear: bool,
    ) -> Result<Allocation> {
        self.ctx.lock_allocator()
            .allocate(&AllocationCreateDesc {
                name,
                requirements,
                location,
                linear,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            })
            .map_err(|e| {
                let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                engine_error!("solar3d::vulkan", "Out of GPU memory for '{}' ({:.2} MB): {:?}", name, size_mb, e);
                Error::OutOfMemory
            })
    }

    /// Copy pixel data into a freshly created texture and leave it shader-readable
    fn upload_texture(&self, texture: &Texture, data: &[u8]) -> Result<()> {
        let staging = self.allocate_buffer(
            data.len() as u64,
            vk::BufferUsageFlags::TRANSFER_SRC,
            MemoryLocation::CpuToGpu,
            "texture staging",
        )?;
        staging.update(0, data)?;

        let info = texture.info();
        let range = vk::ImageSubresourceRange {
            aspect_mask: texture.aspect,
            base_mip_level: 0,
            level_count: 1,
            base_array_layer: 0,
            layer_count: 1,
        };
        let device = &self.ctx.device;

        self.ctx.one_shot(|cb| unsafe {
            let to_transfer = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::UNDEFINED)
                .new_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(texture.image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::empty())
                .dst_access_mask(vk::AccessFlags::TRANSFER_WRITE);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TOP_OF_PIPE,
                vk::PipelineStageFlags::TRANSFER,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_transfer],
            );

            let region = vk::BufferImageCopy::default()
                .buffer_offset(0)
                .image_subresource(vk::ImageSubresourceLayers {
                    aspect_mask: texture.aspect,
                    mip_level: 0,
                    base_array_layer: 0,
                    layer_count: 1,
                })
                .image_extent(vk::Extent3D { width: info.width, height: info.height, depth: 1 });
            device.cmd_copy_buffer_to_image(
                cb,
                staging.buffer,
                texture.image,
                vk::ImageLayout::TRANSFER_DST_OPTIMAL,
                &[region],
            );

            let to_shader = vk::ImageMemoryBarrier::default()
                .old_layout(vk::ImageLayout::TRANSFER_DST_OPTIMAL)
                .new_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                .src_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .dst_queue_family_index(vk::QUEUE_FAMILY_IGNORED)
                .image(texture.image)
                .subresource_range(range)
                .src_access_mask(vk::AccessFlags::TRANSFER_WRITE)
                .dst_access_mask(vk::AccessFlags::SHADER_READ);
            device.cmd_pipeline_barrier(
                cb,
                vk::PipelineStageFlags::TRANSFER,
                vk::PipelineStageFlags::FRAGMENT_SHADER,
                vk::DependencyFlags::empty(),
                &[], &[], &[to_shader],
            );
        })
    }
}

fn buffer_usage_to_vk(usage: BufferUsage) -> (vk::BufferUsageFlags, MemoryLocation) {
    match usage {
        BufferUsage::Vertex => (vk::BufferUsageFlags::VERTEX_BUFFER, MemoryLocation::CpuToGpu),
        BufferUsage::Index => (vk::BufferUsageFlags::INDEX_BUFFER, MemoryLocation::CpuToGpu),
        BufferUsage::Uniform => (vk::BufferUsageFlags::UNIFORM_BUFFER, MemoryLocation::CpuToGpu),
        BufferUsage::Readback => (vk::BufferUsageFlags::TRANSFER_DST, MemoryLocation::GpuToCpu),
    }
}

fn texture_usage_to_vk(usage: TextureUsage) -> vk::ImageUsageFlags {
    match usage {
        TextureUsage::Sampled => vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::TRANSFER_DST,
        TextureUsage::RenderTarget => vk::ImageUsageFlags::COLOR_ATTACHMENT,
        TextureUsage::SampledAndRenderTarget => {
            vk::ImageUsageFlags::SAMPLED | vk::ImageUsageFlags::COLOR_ATTACHMENT
        }
        TextureUsage::DepthStencil => vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
        TextureUsage::Readback => vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::TRANSFER_SRC,
    }
}

fn attachment_to_vk(attachment: &solar_engine::solar3d::render::AttachmentDesc) -> vk::AttachmentDescription {
    vk::AttachmentDescription::default()
        .format(texture_format_to_vk(attachment.format))
        .samples(sample_count_to_vk(attachment.samples))
        .load_op(load_op_to_vk(attachment.load_op))
        .store_op(store_op_to_vk(attachment.store_op))
        .stencil_load_op(vk::AttachmentLoadOp::DONT_CARE)
        .stencil_store_op(vk::AttachmentStoreOp::DONT_CARE)
        .initial_layout(image_layout_to_vk(attachment.initial_layout))
        .final_layout(image_layout_to_vk(attachment.final_layout))
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn create_buffer(&self, desc: BufferDesc) -> Result<Arc<dyn RendererBuffer>> {
        if desc.size == 0 {
            engine_bail!(InvalidResource, "solar3d::vulkan", "Buffer size must be non-zero");
        }
        let (usage, location) = buffer_usage_to_vk(desc.usage);
        let name = format!("{:?} buffer", desc.usage);
        let buffer = self.allocate_buffer(desc.size, usage, location, &name)?;
        Ok(Arc::new(buffer))
    }

    fn create_texture(&self, desc: TextureDesc) -> Result<Arc<dyn RendererTexture>> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Texture '{}' has zero size ({}x{})", desc.label, desc.width, desc.height);
        }
        if desc.samples.is_multisampled() && desc.samples > self.limits.max_msaa_samples {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Texture '{}' requests {}x MSAA, device supports {}x",
                desc.label, desc.samples.count(), self.limits.max_msaa_samples.count());
        }
        if let Some(data) = &desc.data {
            let expected = desc.width as usize * desc.height as usize * desc.format.bytes_per_pixel() as usize;
            if data.len() != expected {
                engine_bail!(InvalidResource, "solar3d::vulkan",
                    "Texture '{}' data is {} bytes, expected {}", desc.label, data.len(), expected);
            }
            if desc.usage != TextureUsage::Sampled {
                engine_bail!(InvalidResource, "solar3d::vulkan",
                    "Texture '{}' carries pixel data but is not a sampled texture", desc.label);
            }
        }

        let format = texture_format_to_vk(desc.format);
        let aspect = aspect_for_format(desc.format);

        let image_create_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(sample_count_to_vk(desc.samples))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(texture_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        let image = unsafe {
            self.ctx.device.create_image(&image_create_info, None)
                .map_err(|e| vk_error(e, "Failed to create texture image"))?
        };

        let requirements = unsafe { self.ctx.device.get_image_memory_requirements(image) };
        let allocation = match self.allocate_memory(&desc.label, requirements, MemoryLocation::GpuOnly, false) {
            Ok(allocation) => allocation,
            Err(e) => {
                unsafe { self.ctx.device.destroy_image(image, None) };
                return Err(e);
            }
        };

        let bound = unsafe {
            self.ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset())
        };
        let view = bound.and_then(|_| unsafe {
            let view_create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: aspect,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });
            self.ctx.device.create_image_view(&view_create_info, None)
        });
        let view = match view {
            Ok(view) => view,
            Err(e) => {
                self.ctx.lock_allocator().free(allocation).ok();
                unsafe { self.ctx.device.destroy_image(image, None) };
                return Err(vk_error(e, "Failed to create texture view"));
            }
        };

        let texture = Texture::new(
            Arc::clone(&self.ctx),
            image,
            view,
            aspect,
            allocation,
            TextureInfo::from(&desc),
        );

        if let Some(data) = &desc.data {
            self.upload_texture(&texture, data)?;
        }

        engine_debug!("solar3d::vulkan", "Created texture '{}' {}x{} {:?} x{}",
            desc.label, desc.width, desc.height, desc.format, desc.samples.count());

        Ok(Arc::new(texture))
    }

    fn create_render_target(&self, texture: &Arc<dyn RendererTexture>) -> Result<Arc<dyn RendererRenderTarget>> {
        let info = texture.info();
        if info.usage == TextureUsage::Sampled {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Texture '{}' was not created as an attachment", info.label);
        }
        let vk_texture = downcast::<Texture>(texture.as_any(), "Render target texture")?;
        let view = vk_texture.view;
        Ok(Arc::new(RenderTarget::new_texture_target(Arc::clone(texture), view)))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RendererRenderPass>> {
        if desc.color_attachments.is_empty() && desc.depth_attachment.is_none() {
            engine_bail!(InvalidResource, "solar3d::vulkan", "Render pass '{}' has no attachments", desc.label);
        }
        if !desc.resolve_attachments.is_empty() && desc.resolve_attachments.len() != desc.color_attachments.len() {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Render pass '{}': {} resolve attachments for {} color attachments",
                desc.label, desc.resolve_attachments.len(), desc.color_attachments.len());
        }

        // Attachment order: colors, depth, resolves
        let mut attachments: Vec<vk::AttachmentDescription> = Vec::new();
        let mut color_refs = Vec::new();
        let mut resolve_refs = Vec::new();

        for color in &desc.color_attachments {
            color_refs.push(vk::AttachmentReference::default()
                .attachment(attachments.len() as u32)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
            attachments.push(attachment_to_vk(color));
        }

        let depth_ref = desc.depth_attachment.as_ref().map(|depth| {
            let reference = vk::AttachmentReference::default()
                .attachment(attachments.len() as u32)
                .layout(vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL);
            attachments.push(attachment_to_vk(depth));
            reference
        });

        for resolve in &desc.resolve_attachments {
            resolve_refs.push(vk::AttachmentReference::default()
                .attachment(attachments.len() as u32)
                .layout(vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL));
            attachments.push(attachment_to_vk(resolve));
        }

        let mut subpass = vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_refs);
        if !resolve_refs.is_empty() {
            subpass = subpass.resolve_attachments(&resolve_refs);
        }
        if let Some(depth_ref) = depth_ref.as_ref() {
            subpass = subpass.depth_stencil_attachment(depth_ref);
        }

        let dependencies: Vec<vk::SubpassDependency> = desc.dependencies
            .iter()
            .map(|dep| {
                let (src_subpass, dst_subpass) = match dep.direction {
                    DependencyDirection::Incoming => (vk::SUBPASS_EXTERNAL, 0),
                    DependencyDirection::Outgoing => (0, vk::SUBPASS_EXTERNAL),
                };
                vk::SubpassDependency::default()
                    .src_subpass(src_subpass)
                    .dst_subpass(dst_subpass)
                    .src_stage_mask(pipeline_stages_to_vk(dep.src_stages))
                    .dst_stage_mask(pipeline_stages_to_vk(dep.dst_stages))
                    .src_access_mask(access_flags_to_vk(dep.src_access))
                    .dst_access_mask(access_flags_to_vk(dep.dst_access))
            })
            .collect();

        let render_pass_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(std::slice::from_ref(&subpass))
            .dependencies(&dependencies);

        let render_pass = unsafe {
            self.ctx.device.create_render_pass(&render_pass_info, None)
                .map_err(|e| vk_error(e, "Failed to create render pass"))?
        };

        let samples = desc.color_attachments
            .first()
            .or(desc.depth_attachment.as_ref())
            .map(|a| a.samples)
            .unwrap_or(SampleCount::S1);

        engine_debug!("solar3d::vulkan", "Created render pass '{}' ({} color, x{})",
            desc.label, desc.color_attachments.len(), samples.count());

        Ok(Arc::new(RenderPass::new(
            Arc::clone(&self.ctx),
            render_pass,
            desc.color_attachments.len() as u32,
            samples,
        )))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn RendererFramebuffer>> {
        if desc.width == 0 || desc.height == 0 {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Framebuffer '{}' has zero size ({}x{})", desc.label, desc.width, desc.height);
        }

        let vk_render_pass = downcast::<RenderPass>(desc.render_pass.as_any(), "Framebuffer render pass")?;

        let mut views = Vec::with_capacity(desc.attachments.len());
        for attachment in &desc.attachments {
            if attachment.width() != desc.width || attachment.height() != desc.height {
                engine_bail!(InvalidResource, "solar3d::vulkan",
                    "Framebuffer '{}' attachment is {}x{}, expected {}x{}",
                    desc.label, attachment.width(), attachment.height(), desc.width, desc.height);
            }
            let target = downcast::<RenderTarget>(attachment.as_any(), "Framebuffer attachment")?;
            views.push(target.image_view);
        }

        let framebuffer_info = vk::FramebufferCreateInfo::default()
            .render_pass(vk_render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe {
            self.ctx.device.create_framebuffer(&framebuffer_info, None)
                .map_err(|e| vk_error(e, "Failed to create framebuffer"))?
        };

        Ok(Arc::new(Framebuffer::new(
            Arc::clone(&self.ctx),
            framebuffer,
            desc.label.to_string(),
            desc.width,
            desc.height,
            desc.attachments.clone(),
        )))
    }

    fn create_shader(&self, desc: ShaderDesc) -> Result<Arc<dyn RendererShader>> {
        let code = ash::util::read_spv(&mut Cursor::new(desc.code)).map_err(|e| {
            engine_err!(InvalidResource, "solar3d::vulkan", "Shader '{}' is not valid SPIR-V: {}", desc.label, e)
        })?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe {
            self.ctx.device.create_shader_module(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create shader module"))?
        };

        Ok(Arc::new(Shader::new(
            Arc::clone(&self.ctx),
            module,
            desc.stage,
            desc.entry_point.to_string(),
        )))
    }

    fn create_pipeline(&self, desc: PipelineDesc) -> Result<Arc<dyn RendererPipeline>> {
        let vertex_shader = downcast::<Shader>(desc.vertex_shader.as_any(), "Vertex shader")?;
        let fragment_shader = downcast::<Shader>(desc.fragment_shader.as_any(), "Fragment shader")?;
        let render_pass = downcast::<RenderPass>(desc.render_pass.as_any(), "Pipeline render pass")?;

        if vertex_shader.stage() != ShaderStage::Vertex || fragment_shader.stage() != ShaderStage::Fragment {
            engine_bail!(InvalidResource, "solar3d::vulkan", "Pipeline '{}' has mismatched shader stages", desc.label);
        }
        if desc.samples != desc.render_pass.samples() {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "Pipeline '{}' uses {}x MSAA but its render pass uses {}x",
                desc.label, desc.samples.count(), desc.render_pass.samples().count());
        }
        for range in &desc.push_constant_ranges {
            if range.offset + range.size > self.limits.max_push_constants_size {
                engine_bail!(InvalidResource, "solar3d::vulkan",
                    "Pipeline '{}' push constants end at {} bytes (limit {})",
                    desc.label, range.offset + range.size, self.limits.max_push_constants_size);
            }
        }

        let entry_vert = CString::new(vertex_shader.entry_point()).map_err(|_| {
            engine_err!(InvalidResource, "solar3d::vulkan", "Vertex entry point contains a NUL byte")
        })?;
        let entry_frag = CString::new(fragment_shader.entry_point()).map_err(|_| {
            engine_err!(InvalidResource, "solar3d::vulkan", "Fragment entry point contains a NUL byte")
        })?;

        // Specialization constants (fragment stage), packed as consecutive u32
        let spec_entries: Vec<vk::SpecializationMapEntry> = desc.specialization
            .iter()
            .enumerate()
            .map(|(i, constant)| vk::SpecializationMapEntry {
                constant_id: constant.constant_id,
                offset: (i * 4) as u32,
                size: 4,
            })
            .collect();
        let spec_data: Vec<u8> = desc.specialization
            .iter()
            .flat_map(|constant| constant.value.to_ne_bytes())
            .collect();
        let spec_info = vk::SpecializationInfo::default()
            .map_entries(&spec_entries)
            .data(&spec_data);

        let mut fragment_stage = vk::PipelineShaderStageCreateInfo::default()
            .stage(shader_stage_to_vk(ShaderStage::Fragment))
            .module(fragment_shader.module)
            .name(&entry_frag);
        if !spec_entries.is_empty() {
            fragment_stage = fragment_stage.specialization_info(&spec_info);
        }

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(ShaderStage::Vertex))
                .module(vertex_shader.module)
                .name(&entry_vert),
            fragment_stage,
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc.vertex_layout.bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: vk::VertexInputRate::VERTEX,
            })
            .collect();

        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc.vertex_layout.attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();

        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        // Viewport and scissor are dynamic
        let viewports = [vk::Viewport::default()];
        let scissors = [vk::Rect2D::default()];
        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewports(&viewports)
            .scissors(&scissors);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
            .front_face(front_face_to_vk(desc.rasterization.front_face))
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth.test_enable)
            .depth_write_enable(desc.depth.write_enable)
            .depth_compare_op(compare_op_to_vk(desc.depth.compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(desc.samples));

        let blend = desc.color_blend;
        let color_blend_attachment = vk::PipelineColorBlendAttachmentState::default()
            .color_write_mask(vk::ColorComponentFlags::RGBA)
            .blend_enable(blend.blend_enable)
            .src_color_blend_factor(blend_factor_to_vk(blend.src_factor))
            .dst_color_blend_factor(blend_factor_to_vk(blend.dst_factor))
            .color_blend_op(vk::BlendOp::ADD)
            .src_alpha_blend_factor(vk::BlendFactor::ONE)
            .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
            .alpha_blend_op(vk::BlendOp::ADD);
        let color_blend_attachments = vec![color_blend_attachment; render_pass.color_attachment_count() as usize];

        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&color_blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default()
            .dynamic_states(&dynamic_states);

        let push_constant_ranges: Vec<vk::PushConstantRange> = desc.push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(&range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        let mut descriptor_set_layouts: Vec<vk::DescriptorSetLayout> = Vec::new();
        let destroy_layouts = |layouts: &[vk::DescriptorSetLayout]| unsafe {
            for &layout in layouts {
                self.ctx.device.destroy_descriptor_set_layout(layout, None);
            }
        };

        for group_layout in &desc.binding_group_layouts {
            let bindings: Vec<vk::DescriptorSetLayoutBinding> = group_layout.entries
                .iter()
                .map(|entry| {
                    vk::DescriptorSetLayoutBinding::default()
                        .binding(entry.binding)
                        .descriptor_type(binding_type_to_vk(entry.binding_type))
                        .descriptor_count(1)
                        .stage_flags(stage_flags_to_vk(entry.stage_flags))
                })
                .collect();

            let layout_create = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
            match unsafe { self.ctx.device.create_descriptor_set_layout(&layout_create, None) } {
                Ok(layout) => descriptor_set_layouts.push(layout),
                Err(e) => {
                    destroy_layouts(&descriptor_set_layouts);
                    return Err(vk_error(e, "Failed to create descriptor set layout"));
                }
            }
        }

        let layout_create_info = vk::PipelineLayoutCreateInfo::default()
            .set_layouts(&descriptor_set_layouts)
            .push_constant_ranges(&push_constant_ranges);

        let layout = match unsafe { self.ctx.device.create_pipeline_layout(&layout_create_info, None) } {
            Ok(layout) => layout,
            Err(e) => {
                destroy_layouts(&descriptor_set_layouts);
                return Err(vk_error(e, "Failed to create pipeline layout"));
            }
        };

        let pipeline_create_info = vk::GraphicsPipelineCreateInfo::default()
            .stages(&shader_stages)
            .vertex_input_state(&vertex_input_state)
            .input_assembly_state(&input_assembly_state)
            .viewport_state(&viewport_state)
            .rasterization_state(&rasterization_state)
            .depth_stencil_state(&depth_stencil_state)
            .multisample_state(&multisample_state)
            .color_blend_state(&color_blend_state)
            .dynamic_state(&dynamic_state)
            .layout(layout)
            .render_pass(render_pass.render_pass)
            .subpass(0);

        let created = unsafe {
            self.ctx.device.create_graphics_pipelines(self.pipeline_cache, &[pipeline_create_info], None)
        };
        let pipeline = match created {
            Ok(pipelines) => pipelines[0],
            Err((_, e)) => {
                unsafe { self.ctx.device.destroy_pipeline_layout(layout, None) };
                destroy_layouts(&descriptor_set_layouts);
                return Err(engine_err!(InitializationFailed, "solar3d::vulkan",
                    "Failed to create pipeline '{}': {:?}", desc.label, e));
            }
        };

        engine_debug!("solar3d::vulkan", "Created pipeline '{}'", desc.label);

        Ok(Arc::new(Pipeline::new(
            Arc::clone(&self.ctx),
            pipeline,
            layout,
            descriptor_set_layouts,
            desc.binding_group_layouts,
            desc.label,
            desc.render_pass,
        )))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn RendererPipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn RendererBindingGroup>> {
        let vk_pipeline = downcast::<Pipeline>(pipeline.as_any(), "Binding group pipeline")?;

        let layout_desc = match pipeline.binding_group_layout(set_index) {
            Some(layout) => layout,
            None => engine_bail!(InvalidResource, "solar3d::vulkan",
                "Pipeline '{}' has no binding group at set {} ({} sets)",
                pipeline.label(), set_index, pipeline.binding_group_layout_count()),
        };
        validate_binding_resources(layout_desc, resources)?;

        let ds_layout = vk_pipeline.descriptor_set_layouts[set_index as usize];
        let descriptor_set = self.descriptor_pool.allocate(ds_layout)?;
        // From here the set goes back to the pool when the group drops
        let group = BindingGroup::new(
            Arc::clone(&self.descriptor_pool),
            descriptor_set,
            set_index,
            resources.to_vec(),
        );

        // Infos must outlive the writes that point into them
        let mut buffer_infos: Vec<vk::DescriptorBufferInfo> = Vec::new();
        let mut image_infos: Vec<vk::DescriptorImageInfo> = Vec::new();

        for resource in resources {
            match resource {
                BindingResource::UniformBuffer(buffer) => {
                    let vk_buffer = downcast::<Buffer>(buffer.as_any(), "Uniform buffer")?;
                    buffer_infos.push(vk::DescriptorBufferInfo::default()
                        .buffer(vk_buffer.buffer)
                        .offset(0)
                        .range(vk::WHOLE_SIZE));
                }
                BindingResource::SampledTexture(texture, sampler_type) => {
                    let vk_texture = downcast::<Texture>(texture.as_any(), "Sampled texture")?;
                    let sampler = self.lock_samplers().get(*sampler_type)?;
                    image_infos.push(vk::DescriptorImageInfo::default()
                        .image_layout(vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL)
                        .image_view(vk_texture.view)
                        .sampler(sampler));
                }
            }
        }

        let mut writes: Vec<vk::WriteDescriptorSet> = Vec::with_capacity(resources.len());
        let (mut buffer_idx, mut image_idx) = (0usize, 0usize);

        for (slot, resource) in layout_desc.entries.iter().zip(resources) {
            let write = vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(slot.binding)
                .dst_array_element(0)
                .descriptor_type(binding_type_to_vk(slot.binding_type));
            let write = match resource {
                BindingResource::UniformBuffer(_) => {
                    buffer_idx += 1;
                    write.buffer_info(std::slice::from_ref(&buffer_infos[buffer_idx - 1]))
                }
                BindingResource::SampledTexture(..) => {
                    image_idx += 1;
                    write.image_info(std::slice::from_ref(&image_infos[image_idx - 1]))
                }
            };
            writes.push(write);
        }

        unsafe {
            self.ctx.device.update_descriptor_sets(&writes, &[]);
        }

        Ok(Arc::new(group))
    }

    fn create_command_list(&self) -> Result<Box<dyn RendererCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx))?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn RendererFence>> {
        Ok(Box::new(Fence::new(Arc::clone(&self.ctx), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn RendererSemaphore>> {
        Ok(Box::new(Semaphore::new(Arc::clone(&self.ctx))?))
    }

    fn create_swapchain(&self, window: &Window) -> Result<Box<dyn RendererSwapchain>> {
        let display_handle = window.display_handle().map_err(|e| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to get display handle: {}", e)
        })?;
        let window_handle = window.window_handle().map_err(|e| {
            engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to get window handle: {}", e)
        })?;

        let surface = unsafe {
            ash_window::create_surface(
                &self.ctx.entry,
                &self.ctx.instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            )
            .map_err(|e| engine_err!(InitializationFailed, "solar3d::vulkan", "Failed to create surface: {:?}", e))?
        };
        let surface_loader = ash::khr::surface::Instance::new(&self.ctx.entry, &self.ctx.instance);

        let supported = unsafe {
            surface_loader
                .get_physical_device_surface_support(self.ctx.physical_device, self.ctx.present_queue_family, surface)
                .unwrap_or(false)
        };
        if !supported {
            unsafe { surface_loader.destroy_surface(surface, None) };
            engine_bail!(InitializationFailed, "solar3d::vulkan", "Window surface cannot be presented by the device");
        }

        let size = window.inner_size();
        let swapchain = Swapchain::new(Arc::clone(&self.ctx), surface, surface_loader, size.width, size.height)?;
        Ok(Box::new(swapchain))
    }

    fn submit(&self, info: &SubmitInfo) -> Result<()> {
        let mut command_buffers = Vec::with_capacity(info.command_lists.len());
        for list in info.command_lists {
            command_buffers.push(downcast::<CommandList>(list.as_any(), "Command list")?.command_buffer);
        }

        let mut wait_semaphores = Vec::with_capacity(info.wait_semaphores.len());
        let mut wait_stages = Vec::with_capacity(info.wait_semaphores.len());
        for (semaphore, stages) in info.wait_semaphores {
            wait_semaphores.push(downcast::<Semaphore>(semaphore.as_any(), "Wait semaphore")?.semaphore);
            wait_stages.push(pipeline_stages_to_vk(*stages));
        }

        let mut signal_semaphores = Vec::with_capacity(info.signal_semaphores.len());
        for semaphore in info.signal_semaphores {
            signal_semaphores.push(downcast::<Semaphore>(semaphore.as_any(), "Signal semaphore")?.semaphore);
        }

        let fence = match info.fence {
            Some(fence) => downcast::<Fence>(fence.as_any(), "Submit fence")?.fence,
            None => vk::Fence::null(),
        };

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let _queue_guard = self.ctx.lock_queues();
        unsafe {
            self.ctx.device
                .queue_submit(self.ctx.graphics_queue, &[submit_info], fence)
                .map_err(|e| vk_error(e, "vkQueueSubmit"))
        }
    }

    fn wait_idle(&self) -> Result<()> {
        self.ctx.wait_idle()
    }

    fn limits(&self) -> DeviceLimits {
        self.limits
    }

    fn pipeline_cache_data(&self) -> Result<Vec<u8>> {
        unsafe {
            self.ctx.device
                .get_pipeline_cache_data(self.pipeline_cache)
                .map_err(|e| vk_error(e, "Failed to read pipeline cache"))
        }
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();
        unsafe {
            self.ctx.device.destroy_pipeline_cache(self.pipeline_cache, None);
        }
        // Samplers, the descriptor pool and the context drop with the fields;
        // the device itself goes away with the last object holding the context
    }
}
