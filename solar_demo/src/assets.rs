//! Asset provider backed by the `image` crate and the procedural primitives.
//!
//! Images come from `<root>/textures/<name>.png` (or `.jpg`); meshes are
//! generated by name.

use std::path::{Path, PathBuf};
use solar_engine::solar3d::Result;
use solar_engine::solar3d::resource::{primitives, AssetProvider, ImageData, MeshData};
use solar_engine::{engine_bail, engine_debug, engine_err};

pub const SPHERE_MESH: &str = "sphere";
pub const SKY_MESH: &str = "sky";
pub const RING_MESH: &str = "ring";

const IMAGE_EXTENSIONS: [&str; 3] = ["png", "jpg", "jpeg"];

pub struct DemoAssets {
    root: PathBuf,
}

impl DemoAssets {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn image_path(&self, name: &str) -> Option<PathBuf> {
        let dir = self.root.join("textures");
        IMAGE_EXTENSIONS
            .iter()
            .map(|ext| dir.join(format!("{}.{}", name, ext)))
            .find(|path| path.is_file())
    }
}

fn decode(path: &Path) -> Result<ImageData> {
    let image = image::open(path).map_err(|e| {
        engine_err!(InvalidResource, "solar_demo", "Failed to decode '{}': {}", path.display(), e)
    })?;
    let rgba = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageData::new(width, height, rgba.into_raw())
}

impl AssetProvider for DemoAssets {
    fn load_image(&self, name: &str) -> Result<ImageData> {
        let Some(path) = self.image_path(name) else {
            engine_bail!(InvalidResource, "solar_demo",
                "No image '{}' under {}", name, self.root.join("textures").display());
        };
        let image = decode(&path)?;
        engine_debug!("solar_demo", "Loaded '{}' ({}x{})", path.display(), image.width, image.height);
        Ok(image)
    }

    fn load_mesh(&self, name: &str) -> Result<MeshData> {
        match name {
            SPHERE_MESH => Ok(primitives::uv_sphere(48, 24)),
            SKY_MESH => Ok(primitives::sky_sphere(32, 16)),
            RING_MESH => Ok(primitives::orbit_ring(128)),
            _ => engine_bail!(InvalidResource, "solar_demo", "Unknown mesh '{}'", name),
        }
    }
}
