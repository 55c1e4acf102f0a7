//! Shared fixtures for unit tests: a fake shader source, mock-backed
//! graph/orchestrator builders and small scenes.

use std::sync::Arc;
use glam::Vec4;
use crate::config::RendererConfig;
use crate::error::Result;
use crate::frame::FrameOrchestrator;
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockSwapchainControl};
use crate::graphics_device::{GraphicsDevice, SampleCount, Swapchain};
use crate::render_graph::BloomGraph;
use crate::resource::primitives::{orbit_ring, uv_sphere};
use crate::resource::{GpuMesh, PipelineCacheStore, ShaderProvider};
use crate::scene::kinematics::Orbit;
use crate::scene::{BodyDesc, EntityKey, SceneRegistry};

/// Every module is the same four-byte blob
pub struct TestShaders;

impl ShaderProvider for TestShaders {
    fn load_spirv(&self, _name: &str) -> Result<Vec<u8>> {
        Ok(vec![0x03, 0x02, 0x23, 0x07])
    }
}

pub fn mock_device() -> Arc<MockGraphicsDevice> {
    Arc::new(MockGraphicsDevice::new())
}

pub fn shared(device: &Arc<MockGraphicsDevice>) -> Arc<dyn GraphicsDevice> {
    device.clone()
}

pub fn test_config() -> RendererConfig {
    RendererConfig::default().with_validation(false)
}

/// Graph over a fresh mock swapchain
pub fn bloom_graph(
    device: &Arc<MockGraphicsDevice>,
    width: u32,
    height: u32,
    samples: SampleCount,
) -> (BloomGraph, Box<dyn Swapchain>) {
    let (swapchain, _) = device.create_mock_swapchain(width, height, 3);
    let graph = BloomGraph::new(shared(device), &TestShaders, &test_config(), samples, swapchain.as_ref())
        .expect("bloom graph");
    (graph, swapchain)
}

/// Orchestrator over a fresh 3-image mock swapchain
pub fn orchestrator(
    device: &Arc<MockGraphicsDevice>,
    width: u32,
    height: u32,
    config: RendererConfig,
) -> (FrameOrchestrator, Arc<MockSwapchainControl>) {
    let (swapchain, control) = device.create_mock_swapchain(width, height, 3);
    let orchestrator = FrameOrchestrator::new(
        shared(device),
        swapchain,
        &TestShaders,
        config,
        PipelineCacheStore::new(None),
    )
    .expect("orchestrator");
    (orchestrator, control)
}

pub fn sphere_mesh(device: &Arc<MockGraphicsDevice>) -> Arc<GpuMesh> {
    Arc::new(GpuMesh::upload(device.as_ref(), &uv_sphere(16, 8)).expect("sphere upload"))
}

pub fn ring_mesh(device: &Arc<MockGraphicsDevice>) -> Arc<GpuMesh> {
    Arc::new(GpuMesh::upload(device.as_ref(), &orbit_ring(64)).expect("ring upload"))
}

/// Keys of [`populate_solar_system`]
pub struct SolarKeys {
    pub sun: EntityKey,
    pub planet: EntityKey,
    pub ring: EntityKey,
}

/// Sun at the origin, one planet at radius 10 with an 8 s period, one
/// unattached ring
pub fn populate_solar_system(device: &Arc<MockGraphicsDevice>, registry: &mut SceneRegistry) -> SolarKeys {
    let sphere = sphere_mesh(device);
    let sun = registry
        .add_sun(
            BodyDesc::new("Sun", sphere.clone(), 2.0)
                .with_tint(Vec4::new(1.0, 0.8, 0.3, 1.0))
                .with_emissive(1.0),
        )
        .expect("sun");
    let planet = registry
        .add_planet(BodyDesc::new("Planet", sphere, 0.5).with_orbit(Orbit::new(10.0, 8.0)))
        .expect("planet");
    let ring = registry
        .add_orbit_ring(None, Orbit::new(10.0, 8.0), Vec4::new(0.4, 0.4, 0.5, 1.0), ring_mesh(device))
        .expect("ring");
    SolarKeys { sun, planet, ring }
}
