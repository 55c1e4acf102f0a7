/// Render pass descriptor types and trait
///
/// A render pass declares its attachments (colors, optional depth, optional
/// MSAA resolves) and the external dependencies that order it against the
/// passes before and after it.

use std::any::Any;
use bitflags::bitflags;
use crate::graphics_device::{SampleCount, TextureFormat};

/// Render pass trait
pub trait RenderPass: Send + Sync {
    /// Number of color attachments (resolves not included)
    fn color_attachment_count(&self) -> u32;

    /// Sample count of the color attachments
    fn samples(&self) -> SampleCount;

    fn as_any(&self) -> &dyn Any;
}

/// Descriptor for a single attachment in a render pass
#[derive(Debug, Clone)]
pub struct AttachmentDesc {
    /// Pixel format
    pub format: TextureFormat,
    /// Number of samples
    pub samples: SampleCount,
    /// Load operation (what to do with existing content)
    pub load_op: LoadOp,
    /// Store operation (what to do with rendered content)
    pub store_op: StoreOp,
    /// Initial layout (how the attachment starts)
    pub initial_layout: ImageLayout,
    /// Final layout (how the attachment ends)
    pub final_layout: ImageLayout,
}

/// Descriptor for creating a render pass
///
/// Framebuffer attachments must be given in the order: colors, depth, resolves.
#[derive(Debug, Clone)]
pub struct RenderPassDesc {
    /// Debug name
    pub label: String,
    /// Color attachments
    pub color_attachments: Vec<AttachmentDesc>,
    /// Optional depth attachment
    pub depth_attachment: Option<AttachmentDesc>,
    /// One resolve target per color attachment, or empty
    pub resolve_attachments: Vec<AttachmentDesc>,
    /// External dependencies
    pub dependencies: Vec<SubpassDependency>,
}

/// Load operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOp {
    /// Load existing content
    Load,
    /// Clear the content
    Clear,
    /// Don't care about existing content
    DontCare,
}

/// Store operation for an attachment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOp {
    /// Store the rendered content
    Store,
    /// Don't care about storing the content
    DontCare,
}

/// Image layout
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageLayout {
    /// Undefined layout (initial state)
    Undefined,
    /// Layout for color attachment
    ColorAttachment,
    /// Layout for depth/stencil attachment
    DepthStencilAttachment,
    /// Layout for shader read-only access
    ShaderReadOnly,
    /// Layout for transfer source
    TransferSrc,
    /// Layout for transfer destination
    TransferDst,
    /// Layout for presenting to swapchain
    PresentSrc,
}

bitflags! {
    /// Pipeline stages used by dependencies and barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PipelineStages: u32 {
        const TOP_OF_PIPE = 1 << 0;
        const VERTEX_SHADER = 1 << 1;
        const FRAGMENT_SHADER = 1 << 2;
        const EARLY_FRAGMENT_TESTS = 1 << 3;
        const LATE_FRAGMENT_TESTS = 1 << 4;
        const COLOR_ATTACHMENT_OUTPUT = 1 << 5;
        const TRANSFER = 1 << 6;
        const BOTTOM_OF_PIPE = 1 << 7;
        const HOST = 1 << 8;
    }
}

bitflags! {
    /// Memory access kinds used by dependencies and barriers
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct AccessFlags: u32 {
        const SHADER_READ = 1 << 0;
        const COLOR_ATTACHMENT_READ = 1 << 1;
        const COLOR_ATTACHMENT_WRITE = 1 << 2;
        const DEPTH_STENCIL_ATTACHMENT_READ = 1 << 3;
        const DEPTH_STENCIL_ATTACHMENT_WRITE = 1 << 4;
        const TRANSFER_READ = 1 << 5;
        const TRANSFER_WRITE = 1 << 6;
        const HOST_READ = 1 << 7;
    }
}

/// Direction of an external dependency relative to the single subpass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DependencyDirection {
    /// Work before the pass → the subpass
    Incoming,
    /// The subpass → work after the pass
    Outgoing,
}

/// External subpass dependency
#[derive(Debug, Clone, Copy)]
pub struct SubpassDependency {
    pub direction: DependencyDirection,
    pub src_stages: PipelineStages,
    pub dst_stages: PipelineStages,
    pub src_access: AccessFlags,
    pub dst_access: AccessFlags,
}

impl SubpassDependency {
    /// Earlier color writes (or sampling of the target in a previous frame)
    /// finish before this pass writes its attachments.
    pub fn color_write_after_previous() -> Self {
        Self {
            direction: DependencyDirection::Incoming,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::FRAGMENT_SHADER,
            dst_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT | PipelineStages::EARLY_FRAGMENT_TESTS,
            src_access: AccessFlags::empty(),
            dst_access: AccessFlags::COLOR_ATTACHMENT_WRITE | AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        }
    }

    /// Color writes of this pass become visible to later fragment-shader reads.
    pub fn sampled_by_next_pass() -> Self {
        Self {
            direction: DependencyDirection::Outgoing,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::FRAGMENT_SHADER,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: AccessFlags::SHADER_READ,
        }
    }

    /// Color writes of this pass become visible to a following copy.
    pub fn copied_by_transfer() -> Self {
        Self {
            direction: DependencyDirection::Outgoing,
            src_stages: PipelineStages::COLOR_ATTACHMENT_OUTPUT,
            dst_stages: PipelineStages::TRANSFER,
            src_access: AccessFlags::COLOR_ATTACHMENT_WRITE,
            dst_access: AccessFlags::TRANSFER_READ,
        }
    }
}
