//! GPU tests for VulkanGraphicsDevice
//!
//! Every test needs a Vulkan-capable GPU and a display, so all of them are
//! marked #[ignore] and run serially.
//!
//! Run with: cargo test --test vulkan_device_tests -- --ignored

use std::sync::Arc;
use serial_test::serial;
use solar_engine::solar3d::{Error, RendererConfig};
use solar_engine::solar3d::render::{
    AccessFlags, AttachmentDesc, BufferDesc, BufferUsage, ClearValue, DependencyDirection, FenceStatus,
    FramebufferDesc, GraphicsDevice, ImageLayout, LoadOp, PipelineStages, Rect2D, RenderPassDesc,
    SampleCount, ShaderDesc, ShaderStage, StoreOp, SubmitInfo, SubpassDependency, TextureDesc,
    TextureFormat, TextureUsage,
};
use solar_engine_renderer_vulkan::VulkanGraphicsDevice;
use winit::event_loop::EventLoop;
use winit::window::Window;

/// Hidden window plus its event loop (the loop must outlive the window)
#[allow(deprecated)]
fn create_test_window() -> (Window, EventLoop<()>) {
    let event_loop = EventLoop::new().unwrap();
    let window_attrs = Window::default_attributes()
        .with_title("Vulkan device test")
        .with_inner_size(winit::dpi::LogicalSize::new(320, 240))
        .with_visible(false);
    let window = event_loop.create_window(window_attrs).unwrap();
    (window, event_loop)
}

fn create_device(window: &Window) -> VulkanGraphicsDevice {
    VulkanGraphicsDevice::new(window, &RendererConfig::default()).unwrap()
}

// ============================================================================
// DEVICE
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_device_limits() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let limits = device.limits();
    // Vulkan guarantees 128 bytes of push constants and 4x MSAA for color + depth
    assert!(limits.max_push_constants_size >= 128);
    assert!(limits.max_msaa_samples >= SampleCount::S4);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_rejects_invalid_config() {
    let (window, _event_loop) = create_test_window();
    let config = RendererConfig::default().with_frames_in_flight(0);

    let result = VulkanGraphicsDevice::new(&window, &config);
    assert!(result.is_err());
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_pipeline_cache_data_readable() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let data = device.pipeline_cache_data().unwrap();
    // Header alone is 32 bytes
    assert!(data.len() >= 16);
}

// ============================================================================
// TEXTURE TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_create_sampled_texture_with_data() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let data: Vec<u8> = (0..64).collect();
    let desc = TextureDesc {
        label: "checker".to_string(),
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::Sampled,
        samples: SampleCount::S1,
        data: Some(data),
    };

    let texture = device.create_texture(desc).unwrap();
    let info = texture.info();
    assert_eq!(info.width, 4);
    assert_eq!(info.height, 4);
    assert_eq!(info.format, TextureFormat::R8G8B8A8_UNORM);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_texture_data_size_mismatch() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let desc = TextureDesc {
        label: "short".to_string(),
        width: 4,
        height: 4,
        format: TextureFormat::R8G8B8A8_UNORM,
        usage: TextureUsage::Sampled,
        samples: SampleCount::S1,
        data: Some(vec![0u8; 10]),
    };

    let result = device.create_texture(desc);
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_multisampled_depth_target() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let desc = TextureDesc::attachment("depth", 64, 64, TextureFormat::D32_FLOAT, TextureUsage::DepthStencil)
        .with_samples(SampleCount::S4);
    let texture = device.create_texture(desc).unwrap();
    let target = device.create_render_target(&texture).unwrap();

    assert_eq!(target.samples(), SampleCount::S4);
    assert_eq!(target.format(), TextureFormat::D32_FLOAT);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_render_target_requires_attachment_usage() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let desc = TextureDesc::attachment("sampled only", 8, 8, TextureFormat::R8G8B8A8_UNORM, TextureUsage::Sampled);
    let texture = device.create_texture(desc).unwrap();

    assert!(device.create_render_target(&texture).is_err());
}

// ============================================================================
// BUFFER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_uniform_buffer_update_and_read() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let buffer = device.create_buffer(BufferDesc { size: 256, usage: BufferUsage::Uniform }).unwrap();
    assert_eq!(buffer.size(), 256);

    buffer.update(16, &[1, 2, 3, 4]).unwrap();
    assert_eq!(buffer.read(16, 4).unwrap(), vec![1, 2, 3, 4]);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_buffer_update_out_of_bounds() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let buffer = device.create_buffer(BufferDesc { size: 16, usage: BufferUsage::Vertex }).unwrap();
    assert!(buffer.update(12, &[0u8; 8]).is_err());
}

// ============================================================================
// SHADER TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_invalid_spirv_rejected() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let result = device.create_shader(ShaderDesc {
        label: "garbage",
        code: &[1, 2, 3],
        stage: ShaderStage::Fragment,
        entry_point: "main",
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SYNC TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_fence_signaled_and_reset() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let fence = device.create_fence(true).unwrap();
    assert!(fence.is_signaled().unwrap());
    assert_eq!(fence.wait(1_000_000).unwrap(), FenceStatus::Signaled);

    fence.reset().unwrap();
    assert!(!fence.is_signaled().unwrap());
    assert_eq!(fence.wait(1_000).unwrap(), FenceStatus::TimedOut);
}

// ============================================================================
// CLEAR AND READBACK
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_clear_then_read_back_pixel() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let (width, height) = (8, 8);
    let texture = device
        .create_texture(TextureDesc::attachment("ids", width, height, TextureFormat::R32_UINT, TextureUsage::Readback))
        .unwrap();
    let target = device.create_render_target(&texture).unwrap();

    let render_pass = device
        .create_render_pass(&RenderPassDesc {
            label: "clear".to_string(),
            color_attachments: vec![AttachmentDesc {
                format: TextureFormat::R32_UINT,
                samples: SampleCount::S1,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::TransferSrc,
            }],
            depth_attachment: None,
            resolve_attachments: Vec::new(),
            dependencies: vec![
                SubpassDependency::color_write_after_previous(),
                SubpassDependency {
                    direction: DependencyDirection::Outgoing,
                    src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
                    dst_stages: PipelineStages::TRANSFER,
                    src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
                    dst_access: AccessFlags::TRANSFER_READ,
                },
            ],
        })
        .unwrap();

    let framebuffer = device
        .create_framebuffer(&FramebufferDesc {
            label: "clear",
            render_pass: &render_pass,
            attachments: vec![Arc::clone(&target)],
            width,
            height,
        })
        .unwrap();

    let readback = device.create_buffer(BufferDesc { size: 4, usage: BufferUsage::Readback }).unwrap();

    let mut commands = device.create_command_list().unwrap();
    commands.begin().unwrap();
    commands
        .begin_render_pass(&render_pass, &framebuffer, &[ClearValue::ColorUint([42, 0, 0, 0])])
        .unwrap();
    commands.end_render_pass().unwrap();
    commands
        .copy_texture_to_buffer(&texture, Rect2D { x: 3, y: 5, width: 1, height: 1 }, &readback, 0)
        .unwrap();
    commands.end().unwrap();

    let fence = device.create_fence(false).unwrap();
    device
        .submit(&SubmitInfo {
            command_lists: &[commands.as_ref()],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(fence.as_ref()),
        })
        .unwrap();
    assert_eq!(fence.wait(5_000_000_000).unwrap(), FenceStatus::Signaled);

    let bytes = readback.read(0, 4).unwrap();
    assert_eq!(u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]), 42);
}

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_framebuffer_size_mismatch() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let texture = device
        .create_texture(TextureDesc::attachment("small", 4, 4, TextureFormat::R8G8B8A8_UNORM, TextureUsage::RenderTarget))
        .unwrap();
    let target = device.create_render_target(&texture).unwrap();

    let render_pass = device
        .create_render_pass(&RenderPassDesc {
            label: "mismatch".to_string(),
            color_attachments: vec![AttachmentDesc {
                format: TextureFormat::R8G8B8A8_UNORM,
                samples: SampleCount::S1,
                load_op: LoadOp::Clear,
                store_op: StoreOp::Store,
                initial_layout: ImageLayout::Undefined,
                final_layout: ImageLayout::ColorAttachment,
            }],
            depth_attachment: None,
            resolve_attachments: Vec::new(),
            dependencies: Vec::new(),
        })
        .unwrap();

    let result = device.create_framebuffer(&FramebufferDesc {
        label: "mismatch",
        render_pass: &render_pass,
        attachments: vec![target],
        width: 8,
        height: 8,
    });
    assert!(matches!(result, Err(Error::InvalidResource(_))));
}

// ============================================================================
// SWAPCHAIN TESTS
// ============================================================================

#[test]
#[ignore] // Requires GPU
#[serial]
fn test_vulkan_swapchain_targets_match_extent() {
    let (window, _event_loop) = create_test_window();
    let device = create_device(&window);

    let swapchain = device.create_swapchain(&window).unwrap();
    assert!(swapchain.image_count() >= 2);

    let extent = swapchain.extent();
    let target = swapchain.render_target(0).unwrap();
    assert_eq!(target.width(), extent.width);
    assert_eq!(target.height(), extent.height);
    assert!(target.texture().is_none());

    assert!(swapchain.render_target(swapchain.image_count()).is_err());
}
