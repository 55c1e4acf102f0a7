/// Swapchain - Vulkan implementation of the Swapchain trait
///
/// Owns the window surface, the VkSwapchainKHR and one image view per
/// swapchain image. Synchronization lives with the caller: acquire signals
/// the semaphore it is given and present waits on the one it is given.

use std::any::Any;
use std::sync::Arc;
use ash::vk;
use solar_engine::solar3d::{Error, Result};
use solar_engine::solar3d::render::{
    AcquireResult, Extent2D, PresentResult, RenderTarget as RendererRenderTarget,
    Semaphore as RendererSemaphore, Swapchain as RendererSwapchain, TextureFormat,
};
use solar_engine::{engine_bail, engine_debug, engine_error, engine_info};

use crate::vulkan_context::{downcast, vk_error, GpuContext};
use crate::vulkan_format::vk_to_texture_format;
use crate::vulkan_render_target::RenderTarget;
use crate::vulkan_sync::Semaphore;

pub struct Swapchain {
    ctx: Arc<GpuContext>,

    surface: vk::SurfaceKHR,
    surface_loader: ash::khr::surface::Instance,

    swapchain: vk::SwapchainKHR,
    swapchain_loader: ash::khr::swapchain::Device,
    images: Vec<vk::Image>,
    image_views: Vec<vk::ImageView>,
    /// Render targets handed to framebuffers, rebuilt on every recreate
    targets: Vec<Arc<dyn RendererRenderTarget>>,
    surface_format: vk::SurfaceFormatKHR,
    format: TextureFormat,
    extent: vk::Extent2D,
}

impl Swapchain {
    pub(crate) fn new(
        ctx: Arc<GpuContext>,
        surface: vk::SurfaceKHR,
        surface_loader: ash::khr::surface::Instance,
        width: u32,
        height: u32,
    ) -> Result<Self> {
        let surface_formats = unsafe {
            surface_loader
                .get_physical_device_surface_formats(ctx.physical_device, surface)
                .map_err(|e| {
                    engine_error!("solar3d::vulkan", "Failed to query surface formats: {:?}", e);
                    Error::InitializationFailed(format!("Failed to get surface formats: {:?}", e))
                })?
        };

        let (surface_format, format) = match choose_surface_format(&surface_formats) {
            Some(chosen) => chosen,
            None => {
                unsafe { surface_loader.destroy_surface(surface, None); }
                engine_bail!(InitializationFailed, "solar3d::vulkan",
                    "No supported surface format among {} candidates", surface_formats.len());
            }
        };

        let swapchain_loader = ash::khr::swapchain::Device::new(&ctx.instance, &ctx.device);

        let mut swapchain = Self {
            ctx,
            surface,
            surface_loader,
            swapchain: vk::SwapchainKHR::null(),
            swapchain_loader,
            images: Vec::new(),
            image_views: Vec::new(),
            targets: Vec::new(),
            surface_format,
            format,
            extent: vk::Extent2D { width, height },
        };
        swapchain.build(width, height)?;

        engine_info!("solar3d::vulkan", "Swapchain created: {}x{} {:?}, {} images",
            swapchain.extent.width, swapchain.extent.height, format, swapchain.images.len());

        Ok(swapchain)
    }

    /// (Re)create the VkSwapchainKHR, handing the old one over to the driver
    fn build(&mut self, width: u32, height: u32) -> Result<()> {
        let capabilities = unsafe {
            self.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.surface)
                .map_err(|e| vk_error(e, "Failed to get surface capabilities"))?
        };

        let extent = if capabilities.current_extent.width != u32::MAX {
            capabilities.current_extent
        } else {
            vk::Extent2D {
                width: width.clamp(capabilities.min_image_extent.width, capabilities.max_image_extent.width),
                height: height.clamp(capabilities.min_image_extent.height, capabilities.max_image_extent.height),
            }
        };

        // Minimized window: nothing to build until the surface has an area again
        if extent.width == 0 || extent.height == 0 {
            return Err(Error::SurfaceOutOfDate);
        }

        let image_count = capabilities.min_image_count + 1;
        let image_count = if capabilities.max_image_count > 0 {
            image_count.min(capabilities.max_image_count)
        } else {
            image_count
        };

        let old_swapchain = self.swapchain;
        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(self.surface)
            .min_image_count(image_count)
            .image_format(self.surface_format.format)
            .image_color_space(self.surface_format.color_space)
            .image_extent(extent)
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(vk::SharingMode::EXCLUSIVE)
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(vk::PresentModeKHR::FIFO)
            .clipped(true)
            .old_swapchain(old_swapchain);

        let swapchain = unsafe {
            self.swapchain_loader
                .create_swapchain(&create_info, None)
                .map_err(|e| vk_error(e, "Failed to create swapchain"))?
        };

        self.destroy_views();
        if old_swapchain != vk::SwapchainKHR::null() {
            unsafe { self.swapchain_loader.destroy_swapchain(old_swapchain, None); }
        }
        self.swapchain = swapchain;
        self.extent = extent;

        self.images = unsafe {
            self.swapchain_loader
                .get_swapchain_images(swapchain)
                .map_err(|e| vk_error(e, "Failed to get swapchain images"))?
        };

        for &image in &self.images {
            let create_info = vk::ImageViewCreateInfo::default()
                .image(image)
                .view_type(vk::ImageViewType::TYPE_2D)
                .format(self.surface_format.format)
                .components(vk::ComponentMapping::default())
                .subresource_range(vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                });

            let view = unsafe {
                self.ctx.device.create_image_view(&create_info, None)
                    .map_err(|e| vk_error(e, "Failed to create swapchain image view"))?
            };
            self.image_views.push(view);
            self.targets.push(Arc::new(RenderTarget::new_swapchain_target(
                extent.width,
                extent.height,
                self.format,
                view,
            )));
        }

        Ok(())
    }

    fn destroy_views(&mut self) {
        self.targets.clear();
        for view in self.image_views.drain(..) {
            unsafe { self.ctx.device.destroy_image_view(view, None); }
        }
    }
}

/// Prefer an sRGB BGRA surface, then anything the engine can describe
fn choose_surface_format(formats: &[vk::SurfaceFormatKHR]) -> Option<(vk::SurfaceFormatKHR, TextureFormat)> {
    let preferred = formats.iter().find(|f| {
        f.format == vk::Format::B8G8R8A8_SRGB && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
    });
    preferred
        .into_iter()
        .chain(formats.iter())
        .find_map(|f| vk_to_texture_format(f.format).map(|format| (*f, format)))
}

impl RendererSwapchain for Swapchain {
    fn acquire_next_image(&mut self, signal: &dyn RendererSemaphore) -> Result<AcquireResult> {
        let semaphore = downcast::<Semaphore>(signal.as_any(), "Acquire semaphore")?;

        let acquired = unsafe {
            self.swapchain_loader.acquire_next_image(
                self.swapchain,
                u64::MAX,
                semaphore.semaphore,
                vk::Fence::null(),
            )
        };

        match acquired {
            Ok((index, false)) => Ok(AcquireResult::Image(index)),
            Ok((index, true)) => Ok(AcquireResult::Suboptimal(index)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => {
                engine_debug!("solar3d::vulkan", "Swapchain out of date during acquire");
                Ok(AcquireResult::OutOfDate)
            }
            Err(e) => Err(vk_error(e, "Failed to acquire swapchain image")),
        }
    }

    fn present(&mut self, image_index: u32, wait: &dyn RendererSemaphore) -> Result<PresentResult> {
        if image_index as usize >= self.images.len() {
            engine_bail!(InvalidResource, "solar3d::vulkan",
                "present: image index {} out of range (count: {})", image_index, self.images.len());
        }

        let semaphore = downcast::<Semaphore>(wait.as_any(), "Present semaphore")?;
        let swapchains = [self.swapchain];
        let image_indices = [image_index];
        let wait_semaphores = [semaphore.semaphore];

        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let presented = {
            let _queues = self.ctx.lock_queues();
            unsafe { self.swapchain_loader.queue_present(self.ctx.present_queue, &present_info) }
        };

        match presented {
            Ok(false) => Ok(PresentResult::Optimal),
            Ok(true) => Ok(PresentResult::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentResult::OutOfDate),
            Err(e) => Err(vk_error(e, "Failed to present swapchain image")),
        }
    }

    fn recreate(&mut self, width: u32, height: u32) -> Result<()> {
        if width == 0 || height == 0 {
            return Err(Error::SurfaceOutOfDate);
        }

        self.ctx.wait_idle()?;
        self.build(width, height)?;

        engine_debug!("solar3d::vulkan", "Swapchain recreated: {}x{}", self.extent.width, self.extent.height);
        Ok(())
    }

    fn image_count(&self) -> usize {
        self.images.len()
    }

    fn extent(&self) -> Extent2D {
        Extent2D::new(self.extent.width, self.extent.height)
    }

    fn format(&self) -> TextureFormat {
        self.format
    }

    fn render_target(&self, index: usize) -> Result<Arc<dyn RendererRenderTarget>> {
        self.targets.get(index).cloned().ok_or_else(|| {
            Error::InvalidResource(format!(
                "Swapchain image {} out of range (count: {})",
                index,
                self.targets.len()
            ))
        })
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Drop for Swapchain {
    fn drop(&mut self) {
        self.ctx.wait_idle().ok();
        self.destroy_views();
        unsafe {
            if self.swapchain != vk::SwapchainKHR::null() {
                self.swapchain_loader.destroy_swapchain(self.swapchain, None);
            }
            self.surface_loader.destroy_surface(self.surface, None);
        }
    }
}
