/// Pipeline trait and pipeline descriptor

use std::any::Any;
use std::sync::Arc;
use crate::graphics_device::{
    BindingGroupLayoutDesc, BufferFormat, RenderPass, SampleCount, Shader, ShaderStage,
};

/// Primitive topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimitiveTopology {
    /// Triangle list
    TriangleList,
    /// Line list (orbit rings)
    LineList,
}

/// Index buffer element type
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexType {
    /// 16-bit indices (max 65535 vertices)
    U16,
    /// 32-bit indices
    U32,
}

impl IndexType {
    /// Size in bytes of one index element
    pub fn size_bytes(&self) -> u32 {
        match self {
            IndexType::U16 => 2,
            IndexType::U32 => 4,
        }
    }
}

/// Vertex attribute description
#[derive(Debug, Clone, Copy)]
pub struct VertexAttribute {
    /// Attribute location in shader
    pub location: u32,
    /// Binding index
    pub binding: u32,
    /// Format of the attribute (data type and component count)
    pub format: BufferFormat,
    /// Offset in bytes from the start of the vertex
    pub offset: u32,
}

/// Vertex binding description (always per-vertex rate)
#[derive(Debug, Clone, Copy)]
pub struct VertexBinding {
    /// Binding index
    pub binding: u32,
    /// Stride in bytes between consecutive elements
    pub stride: u32,
}

/// Vertex input layout
///
/// Empty for full-screen passes, which generate their triangle from the vertex index.
#[derive(Debug, Clone, Default)]
pub struct VertexLayout {
    pub bindings: Vec<VertexBinding>,
    pub attributes: Vec<VertexAttribute>,
}

impl VertexLayout {
    /// Stride of binding 0, if any
    pub fn stride(&self) -> Option<u32> {
        self.bindings.iter().find(|b| b.binding == 0).map(|b| b.stride)
    }
}

/// Push constant range descriptor
#[derive(Debug, Clone)]
pub struct PushConstantRange {
    /// Shader stages that can access these push constants
    pub stages: Vec<ShaderStage>,
    /// Offset in bytes
    pub offset: u32,
    /// Size in bytes
    pub size: u32,
}

// ===== RASTERIZATION =====

/// Face culling mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CullMode {
    None,
    Front,
    Back,
}

/// Front face winding order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrontFace {
    CounterClockwise,
    Clockwise,
}

/// Rasterization fixed-function state
#[derive(Debug, Clone, Copy)]
pub struct RasterizationState {
    pub cull_mode: CullMode,
    pub front_face: FrontFace,
}

impl Default for RasterizationState {
    fn default() -> Self {
        Self {
            cull_mode: CullMode::Back,
            front_face: FrontFace::CounterClockwise,
        }
    }
}

// ===== DEPTH =====

/// Comparison operator for depth tests
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Never,
    Less,
    LessOrEqual,
    Always,
}

/// Depth testing state
#[derive(Debug, Clone, Copy)]
pub struct DepthState {
    pub test_enable: bool,
    pub write_enable: bool,
    pub compare_op: CompareOp,
}

impl DepthState {
    /// No depth attachment, or depth ignored (full-screen passes)
    pub const DISABLED: Self = Self {
        test_enable: false,
        write_enable: false,
        compare_op: CompareOp::Always,
    };

    /// Tested but not written (skybox, translucent shells)
    pub const READ_ONLY: Self = Self {
        test_enable: true,
        write_enable: false,
        compare_op: CompareOp::LessOrEqual,
    };
}

impl Default for DepthState {
    fn default() -> Self {
        Self {
            test_enable: true,
            write_enable: true,
            compare_op: CompareOp::Less,
        }
    }
}

// ===== COLOR BLEND =====

/// Blend factor for color blending equations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlendFactor {
    Zero,
    One,
    SrcAlpha,
    OneMinusSrcAlpha,
}

/// Color blending state (one attachment)
#[derive(Debug, Clone, Copy)]
pub struct ColorBlendState {
    pub blend_enable: bool,
    pub src_factor: BlendFactor,
    pub dst_factor: BlendFactor,
}

impl ColorBlendState {
    /// Overwrite
    pub const OPAQUE: Self = Self {
        blend_enable: false,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::Zero,
    };

    /// src + dst (glow shells)
    pub const ADDITIVE: Self = Self {
        blend_enable: true,
        src_factor: BlendFactor::One,
        dst_factor: BlendFactor::One,
    };

    /// src * a + dst * (1 - a)
    pub const ALPHA: Self = Self {
        blend_enable: true,
        src_factor: BlendFactor::SrcAlpha,
        dst_factor: BlendFactor::OneMinusSrcAlpha,
    };
}

impl Default for ColorBlendState {
    fn default() -> Self {
        Self::OPAQUE
    }
}

/// Specialization constant (32-bit) applied to the fragment stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpecializationConstant {
    pub constant_id: u32,
    pub value: u32,
}

// ===== PIPELINE DESCRIPTOR =====

/// Descriptor for creating a graphics pipeline
///
/// Viewport and scissor are always dynamic, so a pipeline survives window resizes.
#[derive(Clone)]
pub struct PipelineDesc {
    /// Debug name
    pub label: String,
    pub vertex_shader: Arc<dyn Shader>,
    pub fragment_shader: Arc<dyn Shader>,
    pub vertex_layout: VertexLayout,
    pub topology: PrimitiveTopology,
    pub push_constant_ranges: Vec<PushConstantRange>,
    /// One layout per descriptor set, in set order
    pub binding_group_layouts: Vec<BindingGroupLayoutDesc>,
    pub rasterization: RasterizationState,
    pub depth: DepthState,
    pub color_blend: ColorBlendState,
    pub samples: SampleCount,
    /// Render pass the pipeline is compatible with
    pub render_pass: Arc<dyn RenderPass>,
    pub specialization: Vec<SpecializationConstant>,
}

/// Pipeline resource trait
///
/// Implemented by backend-specific pipeline types (e.g., VulkanPipeline).
/// The pipeline is automatically destroyed when dropped.
pub trait Pipeline: Send + Sync {
    fn label(&self) -> &str;

    /// Number of descriptor set layouts
    fn binding_group_layout_count(&self) -> u32;

    /// Layout of set `set_index`
    fn binding_group_layout(&self, set_index: u32) -> Option<&BindingGroupLayoutDesc>;

    fn as_any(&self) -> &dyn Any;
}
