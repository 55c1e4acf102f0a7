//! Extent-dependent render targets of the bloom graph.
//!
//! Everything here is rebuilt by `invalidate()`. Offscreen images are owned
//! by their [`OffscreenTarget`] and die with it; composite framebuffers only
//! view swapchain images, which stay owned by the swapchain.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    ClearValue, Extent2D, Framebuffer, FramebufferDesc, GraphicsDevice, RenderPass, RenderTarget,
    SampleCount, Swapchain, Texture, TextureDesc, TextureUsage,
};
use crate::render_graph::passes::{BloomPasses, DEPTH_FORMAT, OFFSCREEN_FORMAT};

/// One offscreen framebuffer and the image the next pass samples
pub struct OffscreenTarget {
    pub framebuffer: Arc<dyn Framebuffer>,
    /// Resolve image when multisampled, the color image otherwise
    pub sampled: Arc<dyn Texture>,
    /// Clear values in framebuffer attachment order
    pub clear_values: Vec<ClearValue>,
}

impl OffscreenTarget {
    /// Color + depth target for a geometry pass, with a resolve image when multisampled
    pub fn geometry(
        device: &dyn GraphicsDevice,
        pass: &Arc<dyn RenderPass>,
        label: &str,
        extent: Extent2D,
        samples: SampleCount,
        clear_color: [f32; 4],
    ) -> Result<Self> {
        let (w, h) = (extent.width, extent.height);
        let multisampled = samples.is_multisampled();

        let color_usage = if multisampled { TextureUsage::RenderTarget } else { TextureUsage::SampledAndRenderTarget };
        let color = device.create_texture(
            TextureDesc::attachment(format!("{}_color", label), w, h, OFFSCREEN_FORMAT, color_usage)
                .with_samples(samples),
        )?;
        let depth = device.create_texture(
            TextureDesc::attachment(format!("{}_depth", label), w, h, DEPTH_FORMAT, TextureUsage::DepthStencil)
                .with_samples(samples),
        )?;

        let mut attachments: Vec<Arc<dyn RenderTarget>> = vec![
            device.create_render_target(&color)?,
            device.create_render_target(&depth)?,
        ];
        let mut clear_values = vec![
            ClearValue::Color(clear_color),
            ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
        ];

        let sampled = if multisampled {
            let resolve = device.create_texture(TextureDesc::attachment(
                format!("{}_resolve", label), w, h, OFFSCREEN_FORMAT, TextureUsage::SampledAndRenderTarget,
            ))?;
            attachments.push(device.create_render_target(&resolve)?);
            clear_values.push(ClearValue::Color(clear_color));
            resolve
        } else {
            color
        };

        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            label,
            render_pass: pass,
            attachments,
            width: w,
            height: h,
        })?;
        Ok(Self { framebuffer, sampled, clear_values })
    }

    /// Single-sample color target for a full-screen pass
    pub fn fullscreen(
        device: &dyn GraphicsDevice,
        pass: &Arc<dyn RenderPass>,
        label: &str,
        extent: Extent2D,
    ) -> Result<Self> {
        let color = device.create_texture(TextureDesc::attachment(
            format!("{}_color", label),
            extent.width,
            extent.height,
            OFFSCREEN_FORMAT,
            TextureUsage::SampledAndRenderTarget,
        ))?;
        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            label,
            render_pass: pass,
            attachments: vec![device.create_render_target(&color)?],
            width: extent.width,
            height: extent.height,
        })?;
        Ok(Self {
            framebuffer,
            sampled: color,
            clear_values: vec![ClearValue::Color([0.0, 0.0, 0.0, 1.0])],
        })
    }
}

/// Every extent-dependent target of one swapchain generation
pub struct BloomTargets {
    /// One per swapchain image
    pub composite: Vec<Arc<dyn Framebuffer>>,
    pub scene: OffscreenTarget,
    pub blur_horizontal: OffscreenTarget,
    pub blur_vertical: OffscreenTarget,
    pub glow: OffscreenTarget,
    pub extent: Extent2D,
}

impl BloomTargets {
    pub fn new(
        device: &dyn GraphicsDevice,
        passes: &BloomPasses,
        swapchain: &dyn Swapchain,
        clear_color: [f32; 4],
    ) -> Result<Self> {
        let extent = swapchain.extent();
        if extent.is_zero_area() {
            crate::engine_bail!(InvalidResource, "solar3d::graph", "cannot build render targets for a zero-area surface");
        }
        let samples = passes.samples();

        let glow = OffscreenTarget::geometry(device, &passes.glow, "glow", extent, samples, [0.0, 0.0, 0.0, 1.0])?;
        let blur_vertical = OffscreenTarget::fullscreen(device, &passes.blur_vertical, "blur_vertical", extent)?;
        let blur_horizontal = OffscreenTarget::fullscreen(device, &passes.blur_horizontal, "blur_horizontal", extent)?;
        let scene = OffscreenTarget::geometry(device, &passes.scene, "scene", extent, samples, clear_color)?;

        let composite = (0..swapchain.image_count())
            .map(|index| {
                device.create_framebuffer(&FramebufferDesc {
                    label: &format!("composite_{}", index),
                    render_pass: &passes.composite,
                    attachments: vec![swapchain.render_target(index)?],
                    width: extent.width,
                    height: extent.height,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        crate::engine_debug!("solar3d::graph",
            "Built bloom targets {}x{} ({} samples, {} swap images)",
            extent.width, extent.height, samples.count(), composite.len());

        Ok(Self { composite, scene, blur_horizontal, blur_vertical, glow, extent })
    }
}
