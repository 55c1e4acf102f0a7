//! Unit tests for Scene: deterministic updates, lighting and selection

use std::sync::Arc;
use glam::{Vec3, Vec4};
use crate::graphics_device::mock_graphics_device::MockGraphicsDevice;
use crate::graphics_device::SampleCount;
use crate::scene::{Entity, Scene, SceneRegistry};
use crate::test_support::{bloom_graph, mock_device, populate_solar_system, shared, sphere_mesh, SolarKeys};
use crate::utils::BACKGROUND_ID;

fn solar_scene(device: &Arc<MockGraphicsDevice>) -> (Scene, SolarKeys) {
    let (graph, _swapchain) = bloom_graph(device, 64, 64, SampleCount::S1);
    let mut registry =
        SceneRegistry::new(shared(device), graph.pipelines().material_pipeline().clone(), 2).expect("registry");
    let keys = populate_solar_system(device, &mut registry);
    (Scene::new(registry), keys)
}

// ============================================================================
// UPDATE
// ============================================================================

#[test]
fn test_update_is_idempotent() {
    let device = mock_device();
    let (mut scene, _) = solar_scene(&device);

    scene.update(3.7);
    let first: Vec<_> = scene.registry.iter().map(|(_, e)| e.model()).collect();
    scene.update(3.7);
    let second: Vec<_> = scene.registry.iter().map(|(_, e)| e.model()).collect();

    assert_eq!(first, second);
}

#[test]
fn test_planet_quarter_turn_after_two_seconds() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);

    scene.update(0.0);
    let start = scene.registry.get(keys.planet).expect("planet").model().w_axis.truncate();
    scene.update(2.0);
    let later = scene.registry.get(keys.planet).expect("planet").model().w_axis.truncate();

    assert!((start - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    assert!((later - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    // 2 s of an 8 s period
    assert!((start.angle_between(later) - std::f32::consts::FRAC_PI_2).abs() < 1e-4);
}

#[test]
fn test_sun_stays_at_origin() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);

    scene.update(123.0);

    assert_eq!(scene.registry.get(keys.sun).expect("sun").world_position(), Vec3::ZERO);
    assert_eq!(scene.light_position(), Vec3::ZERO);
}

#[test]
fn test_frame_uniforms_carry_time_and_ambient() {
    let device = mock_device();
    let (mut scene, _) = solar_scene(&device);
    scene.ambient = 0.2;

    scene.update(5.0);
    let uniforms = scene.frame_uniforms(16.0 / 9.0);

    assert_eq!(uniforms.camera_position.w, 5.0);
    assert_eq!(uniforms.light_position, Vec4::new(0.0, 0.0, 0.0, 0.2));
    assert_eq!(uniforms.view_projection, uniforms.projection * uniforms.view);
}

// ============================================================================
// SELECTION
// ============================================================================

#[test]
fn test_background_pick_keeps_selection() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);

    assert_eq!(scene.select_picked(1), Some(keys.sun));
    assert_eq!(scene.select_picked(BACKGROUND_ID), None);
    assert_eq!(scene.select_picked(42), None);

    assert_eq!(scene.selection.selected(), Some(keys.sun));
}

#[test]
fn test_pick_focuses_camera_on_body() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);
    scene.update(0.0);

    let planet_id = scene.registry.get(keys.planet).and_then(Entity::object_id).expect("id");
    assert_eq!(scene.select_picked(planet_id), Some(keys.planet));

    assert!((scene.camera.target() - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
}

#[test]
fn test_follow_selection_tracks_moving_body() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);
    scene.selection.select(keys.planet);

    scene.update(2.0);

    assert!((scene.camera.target() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
}

#[test]
fn test_selected_update_is_idempotent_with_skybox() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);
    let sky = scene.registry.add_skybox(500.0, sphere_mesh(&device), None).expect("sky");
    scene.update(0.0);
    scene.selection.select(keys.planet);

    scene.update(2.0);
    let first: Vec<_> = scene.registry.iter().map(|(_, e)| e.model()).collect();
    let first_view = scene.frame_uniforms(1.0);
    scene.update(2.0);
    let second: Vec<_> = scene.registry.iter().map(|(_, e)| e.model()).collect();

    assert_eq!(first, second);
    assert_eq!(first_view, scene.frame_uniforms(1.0));
    // Sky is centered on the eye of the camera that already tracks the planet at t
    let eye = scene.camera.eye();
    assert!((scene.registry.get(sky).expect("sky").world_position() - eye).length() < 1e-4);
    assert!((scene.camera.target() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
}

#[test]
fn test_selection_dropped_when_entity_removed() {
    let device = mock_device();
    let (mut scene, keys) = solar_scene(&device);
    scene.selection.select(keys.planet);

    scene.registry.remove(keys.planet).expect("remove");
    scene.update(0.0);

    assert_eq!(scene.selection.selected(), None);
}
