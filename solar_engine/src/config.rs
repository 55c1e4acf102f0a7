/// Renderer configuration
///
/// Plain data handed to the backend at device creation and to the frame
/// orchestrator. Built with `Default` plus `with_*` setters, then checked by
/// [`RendererConfig::validate`] before anything touches the GPU.

use std::path::PathBuf;
use std::time::Duration;
use crate::error::{Error, Result};

/// Largest Gaussian blur radius the blur shader's weight array can hold
pub const MAX_BLUR_RADIUS: u32 = 15;

#[derive(Debug, Clone)]
pub struct RendererConfig {
    /// Number of frame slots recorded ahead of the GPU
    pub frames_in_flight: usize,
    /// MSAA sample count for the glow and scene passes (1, 2, 4 or 8)
    pub msaa_samples: u32,
    /// Upper bound on a frame-slot fence wait before the device is considered lost
    pub fence_timeout: Duration,
    /// Gaussian blur radius in texels (taps on each side of the center)
    pub blur_radius: u32,
    /// Gaussian blur standard deviation in texels
    pub blur_sigma: f32,
    /// Multiplier applied to the blurred glow in the composite pass
    pub bloom_intensity: f32,
    /// Scene pass clear color
    pub clear_color: [f32; 4],
    /// Where the pipeline cache blob is loaded from and saved to (None = no cache file)
    pub pipeline_cache_path: Option<PathBuf>,
    /// Descriptor pool capacity: uniform buffer descriptors
    pub max_uniform_buffers: u32,
    /// Descriptor pool capacity: combined image sampler descriptors
    pub max_combined_image_samplers: u32,
    /// Descriptor pool capacity: binding groups (descriptor sets)
    pub max_binding_groups: u32,
    /// Enable validation/debug layers
    pub enable_validation: bool,
    /// Application name
    pub app_name: String,
    /// Application version (major, minor, patch)
    pub app_version: (u32, u32, u32),
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            frames_in_flight: 2,
            msaa_samples: 4,
            fence_timeout: Duration::from_secs(1),
            blur_radius: 8,
            blur_sigma: 4.0,
            bloom_intensity: 1.0,
            clear_color: [0.0, 0.0, 0.0, 1.0],
            pipeline_cache_path: None,
            max_uniform_buffers: 64,
            max_combined_image_samplers: 128,
            max_binding_groups: 96,
            enable_validation: cfg!(debug_assertions),
            app_name: "Solar System".to_string(),
            app_version: (1, 0, 0),
        }
    }
}

impl RendererConfig {
    pub fn with_frames_in_flight(mut self, count: usize) -> Self {
        self.frames_in_flight = count;
        self
    }

    pub fn with_msaa_samples(mut self, samples: u32) -> Self {
        self.msaa_samples = samples;
        self
    }

    pub fn with_fence_timeout(mut self, timeout: Duration) -> Self {
        self.fence_timeout = timeout;
        self
    }

    pub fn with_blur(mut self, radius: u32, sigma: f32) -> Self {
        self.blur_radius = radius;
        self.blur_sigma = sigma;
        self
    }

    pub fn with_bloom_intensity(mut self, intensity: f32) -> Self {
        self.bloom_intensity = intensity;
        self
    }

    pub fn with_clear_color(mut self, color: [f32; 4]) -> Self {
        self.clear_color = color;
        self
    }

    pub fn with_pipeline_cache_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.pipeline_cache_path = Some(path.into());
        self
    }

    pub fn with_validation(mut self, enable: bool) -> Self {
        self.enable_validation = enable;
        self
    }

    pub fn with_app_name(mut self, name: impl Into<String>) -> Self {
        self.app_name = name.into();
        self
    }

    /// Fence timeout in nanoseconds, saturated to u64
    pub fn fence_timeout_ns(&self) -> u64 {
        u64::try_from(self.fence_timeout.as_nanos()).unwrap_or(u64::MAX)
    }

    /// Reject values the render graph cannot honor.
    pub fn validate(&self) -> Result<()> {
        if self.frames_in_flight == 0 {
            crate::engine_bail!(InitializationFailed, "solar3d::config",
                "frames_in_flight must be at least 1");
        }
        if !matches!(self.msaa_samples, 1 | 2 | 4 | 8) {
            crate::engine_bail!(InitializationFailed, "solar3d::config",
                "msaa_samples must be 1, 2, 4 or 8 (got {})", self.msaa_samples);
        }
        if self.blur_radius > MAX_BLUR_RADIUS {
            crate::engine_bail!(InitializationFailed, "solar3d::config",
                "blur_radius {} exceeds maximum {}", self.blur_radius, MAX_BLUR_RADIUS);
        }
        if !(self.blur_sigma > 0.0) {
            crate::engine_bail!(InitializationFailed, "solar3d::config",
                "blur_sigma must be positive (got {})", self.blur_sigma);
        }
        if self.fence_timeout.is_zero() {
            crate::engine_bail!(InitializationFailed, "solar3d::config",
                "fence_timeout must be non-zero");
        }
        let per_frame_sets = self.frames_in_flight as u32;
        if self.max_binding_groups < per_frame_sets + 4 {
            return Err(Error::InitializationFailed(format!(
                "max_binding_groups {} too small for {} frames in flight",
                self.max_binding_groups, self.frames_in_flight
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
