/// Shader module trait and descriptor

use std::any::Any;

/// Shader stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Vertex,
    Fragment,
}

/// Descriptor for creating a shader module from SPIR-V bytes
#[derive(Debug, Clone)]
pub struct ShaderDesc<'a> {
    /// Debug name
    pub label: &'a str,
    /// SPIR-V code (length must be a multiple of 4)
    pub code: &'a [u8],
    pub stage: ShaderStage,
    /// Entry point name
    pub entry_point: &'a str,
}

pub trait Shader: Send + Sync {
    fn stage(&self) -> ShaderStage;

    fn entry_point(&self) -> &str;

    fn as_any(&self) -> &dyn Any;
}
