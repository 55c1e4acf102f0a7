//! Asset and shader providers.
//!
//! The renderer never touches the filesystem for content: images and SPIR-V
//! come through these traits, supplied by the application.

use std::path::{Path, PathBuf};
use crate::error::Result;
use crate::resource::{ImageData, MeshData};

/// Source of decoded images and triangulated meshes
pub trait AssetProvider {
    /// RGBA8 image called `name` (planet surfaces, sky)
    fn load_image(&self, name: &str) -> Result<ImageData>;

    /// Mesh called `name` with 32-bit indices
    fn load_mesh(&self, name: &str) -> Result<MeshData>;
}

/// Source of compiled SPIR-V shader modules
pub trait ShaderProvider {
    /// SPIR-V bytes of the module called `name` (e.g. "blur.frag")
    fn load_spirv(&self, name: &str) -> Result<Vec<u8>>;
}

/// Reads `<root>/<name>.spv`
pub struct FileShaderProvider {
    root: PathBuf,
}

impl FileShaderProvider {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl ShaderProvider for FileShaderProvider {
    fn load_spirv(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.root.join(format!("{}.spv", name));
        let bytes = std::fs::read(&path).map_err(|e| {
            crate::engine_err!(InitializationFailed, "solar3d::resource",
                "Failed to read shader '{}': {}", path.display(), e)
        })?;
        if bytes.is_empty() || bytes.len() % 4 != 0 {
            crate::engine_bail!(InitializationFailed, "solar3d::resource",
                "Shader '{}' is not valid SPIR-V ({} bytes)", path.display(), bytes.len());
        }
        Ok(bytes)
    }
}
