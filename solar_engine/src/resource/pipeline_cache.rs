//! Pipeline cache persistence.
//!
//! The backend seeds its pipeline cache with the blob loaded here at
//! startup; the orchestrator hands the serialized cache back at shutdown.
//! A missing or unreadable file only costs slower pipeline creation.

use std::path::PathBuf;
use crate::error::Result;

#[derive(Debug, Clone)]
pub struct PipelineCacheStore {
    path: Option<PathBuf>,
}

impl PipelineCacheStore {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self { path }
    }

    /// Cache blob from disk, or empty when absent or unreadable
    pub fn load(&self) -> Vec<u8> {
        let Some(path) = &self.path else {
            return Vec::new();
        };
        if !path.exists() {
            crate::engine_debug!("solar3d::resource",
                "No existing pipeline cache at: {}", path.display());
            return Vec::new();
        }
        match std::fs::read(path) {
            Ok(data) => {
                crate::engine_info!("solar3d::resource",
                    "Loaded pipeline cache ({} bytes) from: {}", data.len(), path.display());
                data
            }
            Err(e) => {
                crate::engine_warn!("solar3d::resource", "Failed to load pipeline cache: {}", e);
                Vec::new()
            }
        }
    }

    /// Write `data` to disk (no-op without a path)
    pub fn save(&self, data: &[u8]) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                crate::engine_err!("solar3d::resource", "Failed to create cache directory: {}", e)
            })?;
        }
        std::fs::write(path, data).map_err(|e| {
            crate::engine_err!("solar3d::resource", "Failed to write pipeline cache: {}", e)
        })?;
        crate::engine_info!("solar3d::resource",
            "Saved pipeline cache ({} bytes) to: {}", data.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
#[path = "pipeline_cache_tests.rs"]
mod tests;
