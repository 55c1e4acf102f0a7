/// Render pass objects of the bloom graph
///
/// Offscreen passes (glow, blur V, blur H, scene) discard their previous
/// contents, leave their outputs in `ColorAttachment` layout and declare an
/// outgoing dependency toward fragment-shader reads; the graph then issues
/// an explicit barrier to `ShaderReadOnly`. Only the composite pass targets
/// the swapchain and ends in `PresentSrc`.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    AttachmentDesc, GraphicsDevice, ImageLayout, LoadOp, RenderPass, RenderPassDesc, SampleCount,
    StoreOp, SubpassDependency, TextureFormat,
};

/// HDR format of every offscreen color image
pub const OFFSCREEN_FORMAT: TextureFormat = TextureFormat::R16G16B16A16_SFLOAT;
pub const DEPTH_FORMAT: TextureFormat = TextureFormat::D32_FLOAT;

pub struct BloomPasses {
    pub glow: Arc<dyn RenderPass>,
    pub blur_vertical: Arc<dyn RenderPass>,
    pub blur_horizontal: Arc<dyn RenderPass>,
    pub scene: Arc<dyn RenderPass>,
    pub composite: Arc<dyn RenderPass>,
    samples: SampleCount,
}

impl BloomPasses {
    pub fn new(device: &dyn GraphicsDevice, samples: SampleCount, swap_format: TextureFormat) -> Result<Self> {
        Ok(Self {
            glow: device.create_render_pass(&geometry_pass_desc("glow", samples))?,
            blur_vertical: device.create_render_pass(&fullscreen_pass_desc("blur_vertical"))?,
            blur_horizontal: device.create_render_pass(&fullscreen_pass_desc("blur_horizontal"))?,
            scene: device.create_render_pass(&geometry_pass_desc("scene", samples))?,
            composite: device.create_render_pass(&composite_pass_desc(swap_format))?,
            samples,
        })
    }

    /// Sample count of the glow and scene passes
    pub fn samples(&self) -> SampleCount {
        self.samples
    }

    /// Rebuild the composite pass for a new swapchain format
    pub fn rebuild_composite(&mut self, device: &dyn GraphicsDevice, swap_format: TextureFormat) -> Result<()> {
        self.composite = device.create_render_pass(&composite_pass_desc(swap_format))?;
        Ok(())
    }
}

fn color(format: TextureFormat, samples: SampleCount, store_op: StoreOp, final_layout: ImageLayout) -> AttachmentDesc {
    AttachmentDesc {
        format,
        samples,
        load_op: LoadOp::Clear,
        store_op,
        initial_layout: ImageLayout::Undefined,
        final_layout,
    }
}

/// Color + depth (+ resolve when multisampled), sampled by a later pass
pub fn geometry_pass_desc(label: &str, samples: SampleCount) -> RenderPassDesc {
    let multisampled = samples.is_multisampled();
    // The multisampled image is only an intermediate: its resolve is what gets sampled
    let color_store = if multisampled { StoreOp::DontCare } else { StoreOp::Store };
    RenderPassDesc {
        label: label.to_string(),
        color_attachments: vec![color(OFFSCREEN_FORMAT, samples, color_store, ImageLayout::ColorAttachment)],
        depth_attachment: Some(AttachmentDesc {
            format: DEPTH_FORMAT,
            samples,
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        }),
        resolve_attachments: if multisampled {
            vec![AttachmentDesc {
                load_op: LoadOp::DontCare,
                ..color(OFFSCREEN_FORMAT, SampleCount::S1, StoreOp::Store, ImageLayout::ColorAttachment)
            }]
        } else {
            Vec::new()
        },
        dependencies: vec![
            SubpassDependency::color_write_after_previous(),
            SubpassDependency::sampled_by_next_pass(),
        ],
    }
}

/// Single-sample color only (blur passes)
pub fn fullscreen_pass_desc(label: &str) -> RenderPassDesc {
    RenderPassDesc {
        label: label.to_string(),
        color_attachments: vec![color(OFFSCREEN_FORMAT, SampleCount::S1, StoreOp::Store, ImageLayout::ColorAttachment)],
        depth_attachment: None,
        resolve_attachments: Vec::new(),
        dependencies: vec![
            SubpassDependency::color_write_after_previous(),
            SubpassDependency::sampled_by_next_pass(),
        ],
    }
}

/// Swapchain image, left ready for presentation
pub fn composite_pass_desc(swap_format: TextureFormat) -> RenderPassDesc {
    RenderPassDesc {
        label: "composite".to_string(),
        color_attachments: vec![color(swap_format, SampleCount::S1, StoreOp::Store, ImageLayout::PresentSrc)],
        depth_attachment: None,
        resolve_attachments: Vec::new(),
        dependencies: vec![SubpassDependency::color_write_after_previous()],
    }
}
