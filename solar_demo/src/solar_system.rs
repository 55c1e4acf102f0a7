//! The demo scene: a sun, six planets, a moon, their orbit paths and a sky.

use std::sync::Arc;
use glam::{Vec3, Vec4};
use solar_engine::solar3d::Result;
use solar_engine::solar3d::frame::FrameOrchestrator;
use solar_engine::solar3d::render::{GraphicsDevice, Texture};
use solar_engine::solar3d::resource::{upload_texture, AssetProvider, GpuMesh};
use solar_engine::solar3d::scene::{BodyDesc, Orbit, OrbitCamera, Spin};
use solar_engine::{engine_info, engine_warn};

use crate::assets::{RING_MESH, SKY_MESH, SPHERE_MESH};

struct PlanetSpec {
    name: &'static str,
    radius: f32,
    orbit_radius: f32,
    orbit_period_s: f64,
    spin_period_s: f64,
    axial_tilt_deg: f32,
    inclination_deg: f32,
    tint: [f32; 3],
}

const PLANETS: [PlanetSpec; 6] = [
    PlanetSpec { name: "mercury", radius: 0.35, orbit_radius: 6.0, orbit_period_s: 12.0, spin_period_s: 30.0, axial_tilt_deg: 0.0, inclination_deg: 7.0, tint: [0.7, 0.65, 0.6] },
    PlanetSpec { name: "venus", radius: 0.6, orbit_radius: 9.0, orbit_period_s: 20.0, spin_period_s: -60.0, axial_tilt_deg: 177.0, inclination_deg: 3.4, tint: [0.95, 0.8, 0.55] },
    PlanetSpec { name: "earth", radius: 0.65, orbit_radius: 13.0, orbit_period_s: 30.0, spin_period_s: 4.0, axial_tilt_deg: 23.4, inclination_deg: 0.0, tint: [0.35, 0.55, 0.95] },
    PlanetSpec { name: "mars", radius: 0.45, orbit_radius: 17.0, orbit_period_s: 45.0, spin_period_s: 4.1, axial_tilt_deg: 25.2, inclination_deg: 1.8, tint: [0.85, 0.4, 0.25] },
    PlanetSpec { name: "jupiter", radius: 1.6, orbit_radius: 25.0, orbit_period_s: 90.0, spin_period_s: 1.7, axial_tilt_deg: 3.1, inclination_deg: 1.3, tint: [0.85, 0.75, 0.6] },
    PlanetSpec { name: "saturn", radius: 1.35, orbit_radius: 33.0, orbit_period_s: 140.0, spin_period_s: 1.8, axial_tilt_deg: 26.7, inclination_deg: 2.5, tint: [0.9, 0.82, 0.6] },
];

const SUN_RADIUS: f32 = 3.0;
const RING_COLOR: Vec4 = Vec4::new(0.5, 0.6, 0.8, 0.35);

/// Texture called `name`, or None (fallback material) when the asset is missing
fn optional_texture(
    device: &dyn GraphicsDevice,
    assets: &dyn AssetProvider,
    name: &str,
) -> Option<Arc<dyn Texture>> {
    let uploaded = assets
        .load_image(name)
        .and_then(|image| upload_texture(device, name, &image, true));
    match uploaded {
        Ok(texture) => Some(texture),
        Err(e) => {
            engine_warn!("solar_demo", "Texture '{}' unavailable, using the fallback: {}", name, e);
            None
        }
    }
}

fn tilt(degrees: f32) -> f32 {
    degrees.to_radians()
}

/// Register every entity of the demo scene and frame the camera on it
pub fn build(orchestrator: &mut FrameOrchestrator, assets: &dyn AssetProvider) -> Result<()> {
    let device = orchestrator.device().clone();
    let device = device.as_ref();

    let sphere = Arc::new(GpuMesh::upload(device, &assets.load_mesh(SPHERE_MESH)?)?);
    let sky = Arc::new(GpuMesh::upload(device, &assets.load_mesh(SKY_MESH)?)?);
    let ring = Arc::new(GpuMesh::upload(device, &assets.load_mesh(RING_MESH)?)?);

    let sky_texture = optional_texture(device, assets, "stars");
    let sun_texture = optional_texture(device, assets, "sun");
    let planet_textures: Vec<_> = PLANETS
        .iter()
        .map(|planet| optional_texture(device, assets, planet.name))
        .collect();
    let moon_texture = optional_texture(device, assets, "moon");

    let scene = orchestrator.scene_mut();
    let registry = &mut scene.registry;

    registry.add_skybox(500.0, sky.clone(), sky_texture)?;

    let mut sun = BodyDesc::new("sun", sphere.clone(), SUN_RADIUS)
        .with_spin(Spin::new(25.0, 0.0))
        .with_tint(Vec4::new(1.0, 0.85, 0.45, 1.0))
        .with_emissive(4.0);
    if let Some(texture) = sun_texture {
        sun = sun.with_texture(texture);
    }
    let sun = registry.add_sun(sun)?;
    registry.add_glow_shell(sun, 1.35, Vec4::new(1.0, 0.6, 0.2, 0.35), sphere.clone())?;

    for (index, (planet, texture)) in PLANETS.iter().zip(planet_textures).enumerate() {
        let orbit = Orbit::new(planet.orbit_radius, planet.orbit_period_s)
            .with_phase(index as f64 * 1.1)
            .with_inclination(tilt(planet.inclination_deg));
        let [r, g, b] = planet.tint;

        let mut desc = BodyDesc::new(planet.name, sphere.clone(), planet.radius)
            .with_orbit(orbit)
            .with_spin(Spin::new(planet.spin_period_s, tilt(planet.axial_tilt_deg)))
            .with_tint(Vec4::new(r, g, b, 1.0));
        if let Some(texture) = texture {
            desc = desc.with_texture(texture);
        }
        let key = registry.add_planet(desc)?;
        registry.add_orbit_ring(None, orbit, RING_COLOR, ring.clone())?;

        if planet.name == "earth" {
            let moon_orbit = Orbit::new(1.6, 5.0).with_inclination(tilt(5.1));
            let mut moon = BodyDesc::new("moon", sphere.clone(), 0.18)
                .with_orbit(moon_orbit)
                .with_spin(Spin::new(5.0, tilt(6.7)))
                .with_tint(Vec4::new(0.8, 0.8, 0.8, 1.0));
            if let Some(texture) = moon_texture.clone() {
                moon = moon.with_texture(texture);
            }
            registry.add_moon(key, moon)?;
            registry.add_orbit_ring(Some(key), moon_orbit, RING_COLOR * 0.8, ring.clone())?;
        }
    }

    scene.camera = OrbitCamera::new(Vec3::ZERO, 55.0)
        .with_angles(0.6, 0.45)
        .with_clip_planes(0.1, 2000.0);

    engine_info!("solar_demo", "Solar system ready: {} entities", scene.registry.len());
    Ok(())
}
