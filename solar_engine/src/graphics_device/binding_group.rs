/// BindingGroup trait and binding group descriptor
///
/// A BindingGroup is an immutable set of GPU resource bindings (one
/// descriptor set). Its layout comes from the pipeline it is created
/// against; the backend owns the pool it is allocated from.

use std::any::Any;
use std::sync::Arc;
use bitflags::bitflags;
use crate::graphics_device::{Buffer, SamplerType, Texture};

// ============================================================================
// Binding types and layout description
// ============================================================================

/// Type of resource bound at a given slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BindingType {
    /// Uniform buffer (read-only structured data)
    UniformBuffer,
    /// Combined image sampler (texture + sampler in one binding)
    CombinedImageSampler,
}

bitflags! {
    /// Shader stage visibility flags
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct ShaderStageFlags: u32 {
        const VERTEX = 0x01;
        const FRAGMENT = 0x02;
        const VERTEX_FRAGMENT = Self::VERTEX.bits() | Self::FRAGMENT.bits();
    }
}

/// Description of a single binding slot within a BindingGroupLayout
#[derive(Debug, Clone, PartialEq)]
pub struct BindingSlotDesc {
    /// Binding number (corresponds to `layout(binding = N)` in GLSL)
    pub binding: u32,
    /// Type of resource at this binding
    pub binding_type: BindingType,
    /// Shader stages that access this binding
    pub stage_flags: ShaderStageFlags,
}

/// Description of a BindingGroup layout (blueprint for a set of bindings)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BindingGroupLayoutDesc {
    pub entries: Vec<BindingSlotDesc>,
}

impl BindingGroupLayoutDesc {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a slot at the next binding number
    pub fn with(mut self, binding_type: BindingType, stage_flags: ShaderStageFlags) -> Self {
        let binding = self.entries.len() as u32;
        self.entries.push(BindingSlotDesc { binding, binding_type, stage_flags });
        self
    }

    /// Number of slots of the given type
    pub fn count_of(&self, binding_type: BindingType) -> u32 {
        self.entries.iter().filter(|e| e.binding_type == binding_type).count() as u32
    }
}

// ============================================================================
// Binding resources (concrete data passed at creation time)
// ============================================================================

/// A concrete resource to bind into a BindingGroup, in slot order
#[derive(Clone)]
pub enum BindingResource {
    /// Uniform buffer binding (whole buffer)
    UniformBuffer(Arc<dyn Buffer>),
    /// Sampled texture (the backend resolves the actual sampler from the type)
    SampledTexture(Arc<dyn Texture>, SamplerType),
}

impl BindingResource {
    pub fn binding_type(&self) -> BindingType {
        match self {
            BindingResource::UniformBuffer(_) => BindingType::UniformBuffer,
            BindingResource::SampledTexture(..) => BindingType::CombinedImageSampler,
        }
    }
}

// ============================================================================
// BindingGroup trait
// ============================================================================

/// An immutable set of GPU resource bindings.
///
/// Keeps its resources alive; dropping it returns the set to the pool.
pub trait BindingGroup: Send + Sync {
    /// Returns the set index this BindingGroup was created for
    fn set_index(&self) -> u32;

    fn as_any(&self) -> &dyn Any;
}

/// Check `resources` against `layout`, slot by slot.
pub fn validate_binding_resources(
    layout: &BindingGroupLayoutDesc,
    resources: &[BindingResource],
) -> crate::error::Result<()> {
    if layout.entries.len() != resources.len() {
        return Err(crate::error::Error::InvalidResource(format!(
            "Binding group expects {} resources, got {}",
            layout.entries.len(),
            resources.len()
        )));
    }
    for (slot, resource) in layout.entries.iter().zip(resources) {
        if slot.binding_type != resource.binding_type() {
            return Err(crate::error::Error::InvalidResource(format!(
                "Binding {} expects {:?}, got {:?}",
                slot.binding,
                slot.binding_type,
                resource.binding_type()
            )));
        }
    }
    Ok(())
}
