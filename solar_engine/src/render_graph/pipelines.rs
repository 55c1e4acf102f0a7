/// Pipelines of the bloom graph and the binding layouts they share
///
/// Scene pipelines agree on set 0 (per-frame uniforms) and, when textured,
/// set 1 (material), so binding groups created against one of them bind
/// on all of them. Viewport and scissor are dynamic: only a swapchain
/// format change forces a rebuild, and only of the composite pipeline.

use std::sync::Arc;
use rustc_hash::FxHashMap;
use crate::error::Result;
use crate::graphics_device::{
    BindingGroupLayoutDesc, BindingType, ColorBlendState, CullMode, DepthState, GraphicsDevice,
    Pipeline, PipelineDesc, PrimitiveTopology, PushConstantRange, RasterizationState, RenderPass,
    Shader, ShaderDesc, ShaderStage, ShaderStageFlags, SpecializationConstant, VertexLayout,
};
use crate::render_graph::BloomPasses;
use crate::resource::{ShaderProvider, Vertex};
use crate::uniforms::{CompositePush, DrawPush};

/// Entry point of every shader module
pub const SHADER_ENTRY_POINT: &str = "main";

/// Specialization constant selecting the blur axis in `blur.frag`
pub const BLUR_AXIS_CONSTANT: u32 = 0;
pub const BLUR_AXIS_VERTICAL: u32 = 0;
pub const BLUR_AXIS_HORIZONTAL: u32 = 1;

// ============================================================================
// Binding layouts
// ============================================================================

/// Set 0 of scene pipelines: `FrameUniforms`
pub fn frame_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc::new().with(BindingType::UniformBuffer, ShaderStageFlags::VERTEX_FRAGMENT)
}

/// Set 1 of textured pipelines: surface texture
pub fn material_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc::new().with(BindingType::CombinedImageSampler, ShaderStageFlags::FRAGMENT)
}

/// Set 0 of blur pipelines: source image, then `BlurUniform`
pub fn blur_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc::new()
        .with(BindingType::CombinedImageSampler, ShaderStageFlags::FRAGMENT)
        .with(BindingType::UniformBuffer, ShaderStageFlags::FRAGMENT)
}

/// Set 0 of the composite pipeline: scene image, then blurred glow
pub fn composite_layout() -> BindingGroupLayoutDesc {
    BindingGroupLayoutDesc::new()
        .with(BindingType::CombinedImageSampler, ShaderStageFlags::FRAGMENT)
        .with(BindingType::CombinedImageSampler, ShaderStageFlags::FRAGMENT)
}

// ============================================================================
// Shader loading
// ============================================================================

/// Loads each named module once; the stage comes from the `.vert` / `.frag` suffix.
pub struct ShaderCache<'a> {
    device: &'a dyn GraphicsDevice,
    provider: &'a dyn ShaderProvider,
    loaded: FxHashMap<&'static str, Arc<dyn Shader>>,
}

impl<'a> ShaderCache<'a> {
    pub fn new(device: &'a dyn GraphicsDevice, provider: &'a dyn ShaderProvider) -> Self {
        Self { device, provider, loaded: FxHashMap::default() }
    }

    pub fn get(&mut self, name: &'static str) -> Result<Arc<dyn Shader>> {
        if let Some(shader) = self.loaded.get(name) {
            return Ok(shader.clone());
        }
        let stage = if name.ends_with(".vert") {
            ShaderStage::Vertex
        } else if name.ends_with(".frag") {
            ShaderStage::Fragment
        } else {
            crate::engine_bail!(InitializationFailed, "solar3d::graph", "unknown shader stage for '{}'", name);
        };
        let code = self.provider.load_spirv(name)?;
        let shader = self.device.create_shader(ShaderDesc {
            label: name,
            code: &code,
            stage,
            entry_point: SHADER_ENTRY_POINT,
        })?;
        self.loaded.insert(name, shader.clone());
        Ok(shader)
    }
}

// ============================================================================
// Pipelines
// ============================================================================

fn push_range<T>(stages: &[ShaderStage]) -> Vec<PushConstantRange> {
    vec![PushConstantRange {
        stages: stages.to_vec(),
        offset: 0,
        size: std::mem::size_of::<T>() as u32,
    }]
}

/// Textured, lit, depth-tested mesh pipeline; callers override what differs
fn mesh_desc(
    label: &str,
    vertex_shader: Arc<dyn Shader>,
    fragment_shader: Arc<dyn Shader>,
    render_pass: &Arc<dyn RenderPass>,
) -> PipelineDesc {
    PipelineDesc {
        label: label.to_string(),
        vertex_shader,
        fragment_shader,
        vertex_layout: Vertex::layout(),
        topology: PrimitiveTopology::TriangleList,
        push_constant_ranges: push_range::<DrawPush>(&[ShaderStage::Vertex, ShaderStage::Fragment]),
        binding_group_layouts: vec![frame_layout(), material_layout()],
        rasterization: RasterizationState::default(),
        depth: DepthState::default(),
        color_blend: ColorBlendState::OPAQUE,
        samples: render_pass.samples(),
        render_pass: render_pass.clone(),
        specialization: Vec::new(),
    }
}

/// Full-screen triangle pipeline (no vertex input, no depth)
fn fullscreen_desc(
    label: &str,
    vertex_shader: Arc<dyn Shader>,
    fragment_shader: Arc<dyn Shader>,
    render_pass: &Arc<dyn RenderPass>,
    layout: BindingGroupLayoutDesc,
) -> PipelineDesc {
    PipelineDesc {
        label: label.to_string(),
        vertex_shader,
        fragment_shader,
        vertex_layout: VertexLayout::default(),
        topology: PrimitiveTopology::TriangleList,
        push_constant_ranges: Vec::new(),
        binding_group_layouts: vec![layout],
        rasterization: RasterizationState { cull_mode: CullMode::None, ..Default::default() },
        depth: DepthState::DISABLED,
        color_blend: ColorBlendState::OPAQUE,
        samples: render_pass.samples(),
        render_pass: render_pass.clone(),
        specialization: Vec::new(),
    }
}

pub struct BloomPipelines {
    /// Flat tint into the glow target
    pub glow: Arc<dyn Pipeline>,
    pub blur_vertical: Arc<dyn Pipeline>,
    pub blur_horizontal: Arc<dyn Pipeline>,
    /// Lit, textured planets and moons
    pub body: Arc<dyn Pipeline>,
    /// Emissive sun surface
    pub sun: Arc<dyn Pipeline>,
    pub skybox: Arc<dyn Pipeline>,
    /// Orbit paths (line list)
    pub ring: Arc<dyn Pipeline>,
    /// Additive halos
    pub shell: Arc<dyn Pipeline>,
    pub composite: Arc<dyn Pipeline>,
    composite_shaders: (Arc<dyn Shader>, Arc<dyn Shader>),
}

impl BloomPipelines {
    pub fn new(
        device: &dyn GraphicsDevice,
        provider: &dyn ShaderProvider,
        passes: &BloomPasses,
    ) -> Result<Self> {
        let mut shaders = ShaderCache::new(device, provider);

        let glow = device.create_pipeline(PipelineDesc {
            binding_group_layouts: vec![frame_layout()],
            ..mesh_desc("glow", shaders.get("glow.vert")?, shaders.get("glow.frag")?, &passes.glow)
        })?;

        let blur = |label: &str, pass: &Arc<dyn RenderPass>, axis: u32, shaders: &mut ShaderCache| -> Result<Arc<dyn Pipeline>> {
            device.create_pipeline(PipelineDesc {
                specialization: vec![SpecializationConstant { constant_id: BLUR_AXIS_CONSTANT, value: axis }],
                ..fullscreen_desc(label, shaders.get("fullscreen.vert")?, shaders.get("blur.frag")?, pass, blur_layout())
            })
        };
        let blur_vertical = blur("blur_vertical", &passes.blur_vertical, BLUR_AXIS_VERTICAL, &mut shaders)?;
        let blur_horizontal = blur("blur_horizontal", &passes.blur_horizontal, BLUR_AXIS_HORIZONTAL, &mut shaders)?;

        let body = device.create_pipeline(
            mesh_desc("body", shaders.get("body.vert")?, shaders.get("body.frag")?, &passes.scene),
        )?;
        let sun = device.create_pipeline(
            mesh_desc("sun", shaders.get("body.vert")?, shaders.get("sun.frag")?, &passes.scene),
        )?;
        let skybox = device.create_pipeline(PipelineDesc {
            depth: DepthState::READ_ONLY,
            ..mesh_desc("skybox", shaders.get("skybox.vert")?, shaders.get("skybox.frag")?, &passes.scene)
        })?;
        let ring = device.create_pipeline(PipelineDesc {
            topology: PrimitiveTopology::LineList,
            binding_group_layouts: vec![frame_layout()],
            rasterization: RasterizationState { cull_mode: CullMode::None, ..Default::default() },
            depth: DepthState::READ_ONLY,
            color_blend: ColorBlendState::ALPHA,
            ..mesh_desc("ring", shaders.get("ring.vert")?, shaders.get("ring.frag")?, &passes.scene)
        })?;
        let shell = device.create_pipeline(PipelineDesc {
            binding_group_layouts: vec![frame_layout()],
            depth: DepthState::READ_ONLY,
            color_blend: ColorBlendState::ADDITIVE,
            ..mesh_desc("shell", shaders.get("body.vert")?, shaders.get("shell.frag")?, &passes.scene)
        })?;

        let composite_shaders = (shaders.get("fullscreen.vert")?, shaders.get("composite.frag")?);
        let composite = create_composite(device, &composite_shaders, &passes.composite)?;

        crate::engine_debug!("solar3d::graph", "Created bloom pipelines ({} samples)", passes.samples().count());

        Ok(Self {
            glow,
            blur_vertical,
            blur_horizontal,
            body,
            sun,
            skybox,
            ring,
            shell,
            composite,
            composite_shaders,
        })
    }

    /// Rebuild the composite pipeline against a new composite pass
    pub fn rebuild_composite(&mut self, device: &dyn GraphicsDevice, pass: &Arc<dyn RenderPass>) -> Result<()> {
        self.composite = create_composite(device, &self.composite_shaders, pass)?;
        Ok(())
    }

    /// Pipeline whose set 0 is the frame layout and set 1 the material layout
    pub fn material_pipeline(&self) -> &Arc<dyn Pipeline> {
        &self.body
    }
}

fn create_composite(
    device: &dyn GraphicsDevice,
    shaders: &(Arc<dyn Shader>, Arc<dyn Shader>),
    pass: &Arc<dyn RenderPass>,
) -> Result<Arc<dyn Pipeline>> {
    device.create_pipeline(PipelineDesc {
        push_constant_ranges: push_range::<CompositePush>(&[ShaderStage::Fragment]),
        ..fullscreen_desc("composite", shaders.0.clone(), shaders.1.clone(), pass, composite_layout())
    })
}
