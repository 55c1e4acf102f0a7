//! BloomGraph - the five ordered passes of one frame.
//!
//! 1. glow: emissive bodies (and black occluders) into an MSAA target, resolved
//! 2. blur vertical: 1-D Gaussian over the glow image
//! 3. blur horizontal: same shader, other axis, over pass 2
//! 4. scene: skybox, bodies, rings and glow shells, resolved
//! 5. composite: scene + blurred glow into the swapchain image
//!
//! Each offscreen pass is followed by an explicit barrier making its output
//! visible to the fragment shader of the next pass. Only pass 5 touches the
//! swapchain.

use std::sync::Arc;
use glam::Vec4;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, BufferUsage, ClearValue, CommandList,
    GraphicsDevice, ImageBarrier, Pipeline, Rect2D, RenderPass, SampleCount, SamplerType,
    ShaderStage, Swapchain, TextureFormat, Viewport,
};
use crate::render_graph::{BloomPasses, BloomPipelines, BloomTargets, OffscreenTarget, PassStamps};
use crate::resource::ShaderProvider;
use crate::scene::{DrawContext, DrawLayer, Scene};
use crate::uniforms::{BlurUniform, CompositePush};

/// Inputs of one recorded frame
pub struct FrameContext<'a> {
    pub frame_number: u64,
    /// Swapchain image acquired for this frame
    pub image_index: u32,
    /// Set 0 of the frame slot being recorded
    pub frame_bindings: &'a Arc<dyn BindingGroup>,
    pub scene: &'a Scene,
}

/// Targets of one extent plus the binding groups that sample them
struct TargetGeneration {
    composite_bindings: Arc<dyn BindingGroup>,
    blur_horizontal_bindings: Arc<dyn BindingGroup>,
    blur_vertical_bindings: Arc<dyn BindingGroup>,
    targets: BloomTargets,
}

pub struct BloomGraph {
    generation: Option<TargetGeneration>,
    blur_uniforms: Arc<dyn Buffer>,
    pipelines: BloomPipelines,
    passes: BloomPasses,
    swap_format: TextureFormat,
    stamps: PassStamps,
    blur_radius: u32,
    blur_sigma: f32,
    bloom_intensity: f32,
    clear_color: [f32; 4],
    device: Arc<dyn GraphicsDevice>,
}

impl BloomGraph {
    /// Build passes, pipelines and the targets for the swapchain's current extent
    pub fn new(
        device: Arc<dyn GraphicsDevice>,
        shaders: &dyn ShaderProvider,
        config: &RendererConfig,
        samples: SampleCount,
        swapchain: &dyn Swapchain,
    ) -> Result<Self> {
        let swap_format = swapchain.format();
        let passes = BloomPasses::new(device.as_ref(), samples, swap_format)?;
        let pipelines = BloomPipelines::new(device.as_ref(), shaders, &passes)?;
        let blur_uniforms = device.create_buffer(BufferDesc {
            size: std::mem::size_of::<BlurUniform>() as u64,
            usage: BufferUsage::Uniform,
        })?;

        let mut graph = Self {
            generation: None,
            blur_uniforms,
            pipelines,
            passes,
            swap_format,
            stamps: PassStamps::default(),
            blur_radius: config.blur_radius,
            blur_sigma: config.blur_sigma,
            bloom_intensity: config.bloom_intensity,
            clear_color: config.clear_color,
            device,
        };
        if !swapchain.extent().is_zero_area() {
            graph.rebuild_targets(swapchain)?;
        }
        Ok(graph)
    }

    pub fn passes(&self) -> &BloomPasses {
        &self.passes
    }

    pub fn pipelines(&self) -> &BloomPipelines {
        &self.pipelines
    }

    /// Current extent-dependent targets, None between release and rebuild
    pub fn targets(&self) -> Option<&BloomTargets> {
        self.generation.as_ref().map(|g| &g.targets)
    }

    /// Stamps of the last recorded frame
    pub fn stamps(&self) -> PassStamps {
        self.stamps
    }

    pub fn bloom_intensity(&self) -> f32 {
        self.bloom_intensity
    }

    pub fn set_bloom_intensity(&mut self, intensity: f32) {
        self.bloom_intensity = intensity.max(0.0);
    }

    /// Set 0 binding group for a frame slot's uniform buffer
    pub fn create_frame_bindings(&self, uniforms: &Arc<dyn Buffer>) -> Result<Arc<dyn BindingGroup>> {
        self.device.create_binding_group(
            &self.pipelines.body,
            0,
            &[BindingResource::UniformBuffer(uniforms.clone())],
        )
    }

    /// Drop every extent-dependent object. The device must be idle.
    pub fn release_targets(&mut self) {
        if self.generation.take().is_some() {
            crate::engine_trace!("solar3d::graph", "Released bloom targets");
        }
    }

    /// Recreate targets (and the composite pipeline if the swapchain format
    /// changed) for the swapchain's current extent. The device must be idle.
    pub fn rebuild_targets(&mut self, swapchain: &dyn Swapchain) -> Result<()> {
        self.release_targets();

        let format = swapchain.format();
        if format != self.swap_format {
            crate::engine_info!("solar3d::graph",
                "Swapchain format changed {:?} -> {:?}, rebuilding composite pipeline", self.swap_format, format);
            self.passes.rebuild_composite(self.device.as_ref(), format)?;
            self.pipelines.rebuild_composite(self.device.as_ref(), &self.passes.composite)?;
            self.swap_format = format;
        }

        let targets = BloomTargets::new(self.device.as_ref(), &self.passes, swapchain, self.clear_color)?;
        let extent = targets.extent;
        let blur = BlurUniform::new(self.blur_radius, self.blur_sigma, extent.width, extent.height);
        self.blur_uniforms.update(0, bytemuck::bytes_of(&blur))?;

        let sampled = |target: &OffscreenTarget| {
            BindingResource::SampledTexture(target.sampled.clone(), SamplerType::LinearClamp)
        };
        let uniforms = BindingResource::UniformBuffer(self.blur_uniforms.clone());
        let blur_vertical_bindings = self.device.create_binding_group(
            &self.pipelines.blur_vertical, 0, &[sampled(&targets.glow), uniforms.clone()],
        )?;
        let blur_horizontal_bindings = self.device.create_binding_group(
            &self.pipelines.blur_horizontal, 0, &[sampled(&targets.blur_vertical), uniforms],
        )?;
        let composite_bindings = self.device.create_binding_group(
            &self.pipelines.composite, 0, &[sampled(&targets.scene), sampled(&targets.blur_horizontal)],
        )?;

        self.generation = Some(TargetGeneration {
            composite_bindings,
            blur_horizontal_bindings,
            blur_vertical_bindings,
            targets,
        });
        Ok(())
    }

    /// Encode the five passes of one frame into `cmd` (between begin and end)
    pub fn record_frame(&mut self, cmd: &mut dyn CommandList, frame: &FrameContext) -> Result<()> {
        let Some(generation) = self.generation.as_ref() else {
            crate::engine_bail!("solar3d::graph", "record_frame without render targets");
        };
        let targets = &generation.targets;
        let extent = targets.extent;
        let Some(composite_framebuffer) = targets.composite.get(frame.image_index as usize) else {
            crate::engine_bail!("solar3d::graph",
                "no composite framebuffer for swapchain image {}", frame.image_index);
        };
        let draw = DrawContext { pipelines: &self.pipelines, frame_bindings: frame.frame_bindings };
        let registry = &frame.scene.registry;
        let n = frame.frame_number;
        self.stamps = PassStamps::default();

        // 1. Glow
        begin_pass(cmd, &self.passes.glow, &targets.glow, extent.width, extent.height)?;
        for (_, entity) in registry.iter() {
            entity.record_glow_draw(cmd, &draw)?;
        }
        end_offscreen_pass(cmd, &targets.glow)?;
        self.stamps.glow = Some(n);

        // 2. Vertical blur
        fullscreen_pass(
            cmd, &self.passes.blur_vertical, &targets.blur_vertical,
            &self.pipelines.blur_vertical, &generation.blur_vertical_bindings,
        )?;
        end_offscreen_pass(cmd, &targets.blur_vertical)?;
        self.stamps.blur_vertical = Some(n);

        // 3. Horizontal blur
        fullscreen_pass(
            cmd, &self.passes.blur_horizontal, &targets.blur_horizontal,
            &self.pipelines.blur_horizontal, &generation.blur_horizontal_bindings,
        )?;
        end_offscreen_pass(cmd, &targets.blur_horizontal)?;
        self.stamps.blur_horizontal = Some(n);

        // 4. Scene
        begin_pass(cmd, &self.passes.scene, &targets.scene, extent.width, extent.height)?;
        for layer in DrawLayer::ALL {
            for (_, entity) in registry.iter().filter(|(_, e)| e.draw_layer() == layer) {
                entity.record_draw(cmd, &draw)?;
            }
        }
        end_offscreen_pass(cmd, &targets.scene)?;
        self.stamps.scene = Some(n);

        // 5. Composite
        if cfg!(debug_assertions) {
            self.stamps.verify_composite_inputs(n)?;
        }
        cmd.begin_render_pass(
            &self.passes.composite,
            composite_framebuffer,
            &[ClearValue::Color([0.0, 0.0, 0.0, 1.0])],
        )?;
        cmd.set_viewport(Viewport::full(extent.width, extent.height))?;
        cmd.set_scissor(Rect2D::full(extent.width, extent.height))?;
        cmd.bind_pipeline(&self.pipelines.composite)?;
        cmd.bind_binding_group(&self.pipelines.composite, 0, &generation.composite_bindings)?;
        let push = CompositePush { params: Vec4::new(self.bloom_intensity, 1.0, 0.0, 0.0) };
        cmd.push_constants(&[ShaderStage::Fragment], 0, bytemuck::bytes_of(&push))?;
        cmd.draw(3, 0)?;
        cmd.end_render_pass()?;
        self.stamps.composite = Some(n);
        Ok(())
    }
}

fn begin_pass(
    cmd: &mut dyn CommandList,
    pass: &Arc<dyn RenderPass>,
    target: &OffscreenTarget,
    width: u32,
    height: u32,
) -> Result<()> {
    cmd.begin_render_pass(pass, &target.framebuffer, &target.clear_values)?;
    cmd.set_viewport(Viewport::full(width, height))?;
    cmd.set_scissor(Rect2D::full(width, height))
}

/// Full-screen triangle sampling set 0
fn fullscreen_pass(
    cmd: &mut dyn CommandList,
    pass: &Arc<dyn RenderPass>,
    target: &OffscreenTarget,
    pipeline: &Arc<dyn Pipeline>,
    bindings: &Arc<dyn BindingGroup>,
) -> Result<()> {
    let (width, height) = (target.framebuffer.width(), target.framebuffer.height());
    begin_pass(cmd, pass, target, width, height)?;
    cmd.bind_pipeline(pipeline)?;
    cmd.bind_binding_group(pipeline, 0, bindings)?;
    cmd.draw(3, 0)
}

/// Close an offscreen pass and make its output readable by the next one
fn end_offscreen_pass(cmd: &mut dyn CommandList, target: &OffscreenTarget) -> Result<()> {
    cmd.end_render_pass()?;
    cmd.image_barrier(&ImageBarrier::attachment_to_sampled(target.sampled.clone()))
}
