//! ObjectPicker - one-shot object-ID render for pointer selection.
//!
//! Every pickable body is drawn with its object ID as the only fragment
//! output into a full-size `R32_UINT` target. The scissor restricts
//! rasterization to the queried pixel, which is then copied into a
//! 4-byte host-visible buffer. The job runs on its own command list and
//! fence, outside the frame loop, and blocks until the ID is readable.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{
    AttachmentDesc, Buffer, BufferDesc, BufferUsage, ClearValue, ColorBlendState, DepthState,
    Extent2D, FenceStatus, Framebuffer, FramebufferDesc, GraphicsDevice, ImageLayout, LoadOp,
    Pipeline, PipelineDesc, PrimitiveTopology, PushConstantRange, RasterizationState, Rect2D,
    RenderPass, RenderPassDesc, SampleCount, StoreOp, SubmitInfo, SubpassDependency, Texture,
    TextureDesc, TextureFormat, TextureUsage, Viewport,
};
use crate::render_graph::{ShaderCache, DEPTH_FORMAT};
use crate::resource::{ShaderProvider, Vertex};
use crate::scene::{Scene, PUSH_STAGES};
use crate::uniforms::PickPush;
use crate::utils::BACKGROUND_ID;

/// Pixel format of the object-ID attachment
pub const PICKING_FORMAT: TextureFormat = TextureFormat::R32_UINT;

/// ID target of one extent
struct PickTarget {
    framebuffer: Arc<dyn Framebuffer>,
    ids: Arc<dyn Texture>,
    extent: Extent2D,
}

pub struct ObjectPicker {
    target: Option<PickTarget>,
    staging: Arc<dyn Buffer>,
    pipeline: Arc<dyn Pipeline>,
    pass: Arc<dyn RenderPass>,
    fence_timeout_ns: u64,
    device: Arc<dyn GraphicsDevice>,
}

impl ObjectPicker {
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        shaders: &dyn ShaderProvider,
        extent: Extent2D,
        fence_timeout_ns: u64,
    ) -> Result<Self> {
        let pass = device.create_render_pass(&picking_pass_desc())?;

        let mut cache = ShaderCache::new(device.as_ref(), shaders);
        let pipeline = device.create_pipeline(PipelineDesc {
            label: "picking".to_string(),
            vertex_shader: cache.get("picking.vert")?,
            fragment_shader: cache.get("picking.frag")?,
            vertex_layout: Vertex::position_layout(),
            topology: PrimitiveTopology::TriangleList,
            push_constant_ranges: vec![PushConstantRange {
                stages: PUSH_STAGES.to_vec(),
                offset: 0,
                size: std::mem::size_of::<PickPush>() as u32,
            }],
            binding_group_layouts: Vec::new(),
            rasterization: RasterizationState::default(),
            depth: DepthState::default(),
            color_blend: ColorBlendState::OPAQUE,
            samples: SampleCount::S1,
            render_pass: pass.clone(),
            specialization: Vec::new(),
        })?;
        drop(cache);

        let staging = device.create_buffer(BufferDesc {
            size: PICKING_FORMAT.bytes_per_pixel() as u64,
            usage: BufferUsage::Readback,
        })?;

        let mut picker = Self {
            target: None,
            staging,
            pipeline,
            pass,
            fence_timeout_ns,
            device,
        };
        picker.resize(extent)?;
        Ok(picker)
    }

    /// Extent of the ID target, None while the surface has no area
    pub fn extent(&self) -> Option<Extent2D> {
        self.target.as_ref().map(|t| t.extent)
    }

    /// Drop the ID target. The device must be idle.
    pub fn release_target(&mut self) {
        self.target = None;
    }

    /// Rebuild the ID target for a new surface extent. The device must be idle.
    pub fn resize(&mut self, extent: Extent2D) -> Result<()> {
        self.release_target();
        if extent.is_zero_area() {
            return Ok(());
        }
        let ids = self.device.create_texture(TextureDesc::attachment(
            "picking_ids", extent.width, extent.height, PICKING_FORMAT, TextureUsage::Readback,
        ))?;
        let depth = self.device.create_texture(TextureDesc::attachment(
            "picking_depth", extent.width, extent.height, DEPTH_FORMAT, TextureUsage::DepthStencil,
        ))?;
        let framebuffer = self.device.create_framebuffer(&FramebufferDesc {
            label: "picking",
            render_pass: &self.pass,
            attachments: vec![
                self.device.create_render_target(&ids)?,
                self.device.create_render_target(&depth)?,
            ],
            width: extent.width,
            height: extent.height,
        })?;
        self.target = Some(PickTarget { framebuffer, ids, extent });
        Ok(())
    }

    /// Object ID under pixel (`x`, `y`) of the surface, or [`BACKGROUND_ID`].
    ///
    /// Blocks until the GPU has finished the ID pass.
    pub fn pick(&self, scene: &Scene, x: f64, y: f64) -> Result<u32> {
        let Some(target) = self.target.as_ref() else {
            return Ok(BACKGROUND_ID);
        };
        let extent = target.extent;
        let (px, py) = (x.floor() as i64, y.floor() as i64);
        if !Rect2D::full(extent.width, extent.height).contains(px, py) {
            return Ok(BACKGROUND_ID);
        }
        let pixel = Rect2D { x: px as i32, y: py as i32, width: 1, height: 1 };
        let view_projection = scene.camera.matrices(extent.aspect_ratio()).view_projection;

        let mut cmd = self.device.create_command_list()?;
        cmd.begin()?;
        cmd.begin_render_pass(
            &self.pass,
            &target.framebuffer,
            &[
                ClearValue::ColorUint([BACKGROUND_ID, 0, 0, 0]),
                ClearValue::DepthStencil { depth: 1.0, stencil: 0 },
            ],
        )?;
        cmd.set_viewport(Viewport::full(extent.width, extent.height))?;
        cmd.set_scissor(pixel)?;
        cmd.bind_pipeline(&self.pipeline)?;
        for (_, entity) in scene.registry.iter() {
            entity.record_picking_draw(cmd.as_mut(), view_projection)?;
        }
        cmd.end_render_pass()?;
        cmd.copy_texture_to_buffer(&target.ids, pixel, &self.staging, 0)?;
        cmd.end()?;

        let fence = self.device.create_fence(false)?;
        self.device.submit(&SubmitInfo {
            command_lists: &[&*cmd],
            wait_semaphores: &[],
            signal_semaphores: &[],
            fence: Some(fence.as_ref()),
        })?;
        if fence.wait(self.fence_timeout_ns)? == FenceStatus::TimedOut {
            crate::engine_bail!(DeviceLost, "solar3d::picking",
                "picking fence not signaled after {} ns", self.fence_timeout_ns);
        }
        self.device.wait_idle()?;

        let bytes = self.staging.read(0, 4)?;
        let Some(id) = bytes.get(0..4).map(bytemuck::pod_read_unaligned::<u32>) else {
            crate::engine_bail!("solar3d::picking", "short picking readback ({} bytes)", bytes.len());
        };
        crate::engine_trace!("solar3d::picking", "Pixel ({}, {}) -> object ID {}", px, py, id);
        Ok(id)
    }
}

/// ID color cleared to the background and left in `TransferSrc` for the copy
fn picking_pass_desc() -> RenderPassDesc {
    RenderPassDesc {
        label: "picking".to_string(),
        color_attachments: vec![AttachmentDesc {
            format: PICKING_FORMAT,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::Store,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::TransferSrc,
        }],
        depth_attachment: Some(AttachmentDesc {
            format: DEPTH_FORMAT,
            samples: SampleCount::S1,
            load_op: LoadOp::Clear,
            store_op: StoreOp::DontCare,
            initial_layout: ImageLayout::Undefined,
            final_layout: ImageLayout::DepthStencilAttachment,
        }),
        resolve_attachments: Vec::new(),
        dependencies: vec![
            SubpassDependency::color_write_after_previous(),
            SubpassDependency::copied_by_transfer(),
        ],
    }
}

#[cfg(test)]
#[path = "picker_tests.rs"]
mod tests;
