/// Resource module - meshes, images, providers and pipeline cache persistence

pub mod mesh;
pub mod image;
pub mod primitives;
pub mod provider;
pub mod pipeline_cache;

pub use mesh::{GpuMesh, MeshData, Vertex};
pub use image::{upload_texture, ImageData};
pub use provider::{AssetProvider, FileShaderProvider, ShaderProvider};
pub use pipeline_cache::PipelineCacheStore;

#[cfg(test)]
#[path = "resource_tests.rs"]
mod tests;
