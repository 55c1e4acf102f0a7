/// GpuContext - Shared GPU state for all Vulkan objects
///
/// Every backend object (buffers, textures, pipelines, command lists, sync
/// primitives, swapchains) holds an `Arc<GpuContext>`. The logical device and
/// the instance are destroyed when the last of them is dropped, so no object
/// can ever outlive the device it was created from.

use std::any::Any;
use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};
use solar_engine::solar3d::{Error, Result};
use solar_engine::{engine_err, engine_error};

pub struct GpuContext {
    /// Vulkan logical device
    pub device: ash::Device,

    /// GPU memory allocator
    /// Wrapped in ManuallyDrop so its memory blocks are freed BEFORE the device is destroyed
    pub allocator: ManuallyDrop<Mutex<Allocator>>,

    pub physical_device: vk::PhysicalDevice,

    /// Graphics queue (and its family) used for every submission
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,

    /// Present queue (may be the same queue as graphics)
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,

    /// Queues are externally synchronized: held for submit, present and idle waits
    queue_lock: Mutex<()>,

    /// Reusable command pool for one-shot upload operations
    /// (created with TRANSIENT + RESET_COMMAND_BUFFER flags)
    pub upload_command_pool: Mutex<vk::CommandPool>,

    pub(crate) instance: ash::Instance,
    pub(crate) entry: ash::Entry,

    /// Debug utils loader and messenger (validation enabled only)
    pub(crate) debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
    pub(crate) debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
}

/// Queue handles picked at device creation
pub(crate) struct QueueSelection {
    pub graphics_queue: vk::Queue,
    pub graphics_queue_family: u32,
    pub present_queue: vk::Queue,
    pub present_queue_family: u32,
}

impl GpuContext {
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        queues: QueueSelection,
        upload_command_pool: vk::CommandPool,
        debug_utils_loader: Option<ash::ext::debug_utils::Instance>,
        debug_messenger: Option<vk::DebugUtilsMessengerEXT>,
    ) -> Self {
        Self {
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            physical_device,
            graphics_queue: queues.graphics_queue,
            graphics_queue_family: queues.graphics_queue_family,
            present_queue: queues.present_queue,
            present_queue_family: queues.present_queue_family,
            queue_lock: Mutex::new(()),
            upload_command_pool: Mutex::new(upload_command_pool),
            instance,
            entry,
            debug_utils_loader,
            debug_messenger,
        }
    }

    /// Exclusive access to the queues for the duration of the guard
    pub(crate) fn lock_queues(&self) -> MutexGuard<'_, ()> {
        self.queue_lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn lock_allocator(&self) -> MutexGuard<'_, Allocator> {
        self.allocator.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Block until the whole device is idle
    pub(crate) fn wait_idle(&self) -> Result<()> {
        let _queues = self.lock_queues();
        unsafe { self.device.device_wait_idle() }
            .map_err(|e| vk_error(e, "vkDeviceWaitIdle"))
    }

    /// Record and execute a one-shot command buffer on the graphics queue,
    /// blocking until it has completed
    pub(crate) fn one_shot<F>(&self, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let pool = self.upload_command_pool.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        unsafe {
            let allocate_info = vk::CommandBufferAllocateInfo::default()
                .command_pool(*pool)
                .level(vk::CommandBufferLevel::PRIMARY)
                .command_buffer_count(1);

            let command_buffer = self.device.allocate_command_buffers(&allocate_info)
                .map_err(|e| engine_err!("solar3d::vulkan", "Failed to allocate upload command buffer: {:?}", e))?[0];

            let result = self.run_one_shot(command_buffer, record);
            self.device.free_command_buffers(*pool, &[command_buffer]);
            result
        }
    }

    unsafe fn run_one_shot<F>(&self, command_buffer: vk::CommandBuffer, record: F) -> Result<()>
    where
        F: FnOnce(vk::CommandBuffer),
    {
        let begin_info = vk::CommandBufferBeginInfo::default()
            .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
        self.device.begin_command_buffer(command_buffer, &begin_info)
            .map_err(|e| engine_err!("solar3d::vulkan", "Failed to begin upload command buffer: {:?}", e))?;

        record(command_buffer);

        self.device.end_command_buffer(command_buffer)
            .map_err(|e| engine_err!("solar3d::vulkan", "Failed to end upload command buffer: {:?}", e))?;

        let fence = self.device.create_fence(&vk::FenceCreateInfo::default(), None)
            .map_err(|e| engine_err!("solar3d::vulkan", "Failed to create upload fence: {:?}", e))?;

        let command_buffers = [command_buffer];
        let submit_info = vk::SubmitInfo::default().command_buffers(&command_buffers);
        let submitted = {
            let _queues = self.lock_queues();
            self.device.queue_submit(self.graphics_queue, &[submit_info], fence)
        };
        let result = submitted
            .and_then(|_| self.device.wait_for_fences(&[fence], true, u64::MAX))
            .map_err(|e| vk_error(e, "upload submission"));

        self.device.destroy_fence(fence, None);
        result
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // 1. Upload command pool
            let pool = self.upload_command_pool.get_mut().unwrap_or_else(|poisoned| poisoned.into_inner());
            if *pool != vk::CommandPool::null() {
                self.device.destroy_command_pool(*pool, None);
                *pool = vk::CommandPool::null();
            }

            // 2. Allocator: free VkDeviceMemory blocks while the device is alive
            ManuallyDrop::drop(&mut self.allocator);

            // 3. Stop routing validation messages before the messenger goes away
            crate::debug::cleanup_debug_config();
            if let (Some(debug_utils), Some(messenger)) = (&self.debug_utils_loader, self.debug_messenger) {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            // 4. Device, then instance
            self.device.destroy_device(None);
            self.instance.destroy_instance(None);
        }
    }
}

/// Map a Vulkan result code to the engine error that callers act on.
///
/// Device loss and memory exhaustion keep their own variants so the frame
/// orchestrator can classify them as fatal.
pub(crate) fn vk_error(result: vk::Result, what: &str) -> Error {
    match result {
        vk::Result::ERROR_DEVICE_LOST => {
            engine_error!("solar3d::vulkan", "{} failed: device lost", what);
            Error::DeviceLost(format!("{}: {:?}", what, result))
        }
        vk::Result::ERROR_OUT_OF_HOST_MEMORY | vk::Result::ERROR_OUT_OF_DEVICE_MEMORY => {
            engine_error!("solar3d::vulkan", "{} failed: {:?}", what, result);
            Error::OutOfMemory
        }
        vk::Result::ERROR_OUT_OF_DATE_KHR => Error::SurfaceOutOfDate,
        other => engine_err!("solar3d::vulkan", "{} failed: {:?}", what, other),
    }
}

/// Resolve a renderer trait object to this backend's concrete type.
///
/// Mixing objects from another device implementation is a caller bug and is
/// reported as InvalidResource.
pub(crate) fn downcast<'a, T: 'static>(object: &'a dyn Any, what: &str) -> Result<&'a T> {
    object.downcast_ref::<T>().ok_or_else(|| {
        engine_err!(InvalidResource, "solar3d::vulkan", "{} was not created by the Vulkan device", what)
    })
}
