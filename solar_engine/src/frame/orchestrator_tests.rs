//! Unit tests for FrameOrchestrator: slot discipline, surface events,
//! error policy, picking and shutdown

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;
use glam::Vec3;
use crate::error::Error;
use crate::frame::{FrameOrchestrator, FrameOutcome, SlotState};
use crate::graphics_device::mock_graphics_device::{MockGraphicsDevice, MockSwapchainControl};
use crate::graphics_device::{BindingResource, BufferDesc, BufferUsage, Extent2D, GraphicsDevice, SampleCount};
use crate::resource::PipelineCacheStore;
use crate::scene::Entity;
use crate::test_support::{mock_device, orchestrator, populate_solar_system, shared, sphere_mesh, test_config, SolarKeys, TestShaders};

fn solar_orchestrator(
    device: &Arc<MockGraphicsDevice>,
    width: u32,
    height: u32,
) -> (FrameOrchestrator, Arc<MockSwapchainControl>, SolarKeys) {
    let (mut orchestrator, control) = orchestrator(device, width, height, test_config());
    let keys = populate_solar_system(device, &mut orchestrator.scene_mut().registry);
    (orchestrator, control, keys)
}

fn last_submission(device: &MockGraphicsDevice) -> Vec<String> {
    device.state().submissions.last().map(|s| s.commands.clone()).unwrap_or_default()
}

// ============================================================================
// CONSTRUCTION
// ============================================================================

#[test]
fn test_new_builds_one_slot_per_frame_in_flight() {
    let device = mock_device();
    let (orchestrator, _) = orchestrator(&device, 64, 64, test_config().with_frames_in_flight(3));

    assert_eq!(orchestrator.frames_in_flight(), 3);
    assert_eq!(orchestrator.frame_slot(), 0);
    assert_eq!(orchestrator.slot_state(2), Some(SlotState::Idle));
    assert_eq!(orchestrator.slot_state(3), None);
}

#[test]
fn test_invalid_config_rejected() {
    let device = mock_device();
    let (swapchain, _) = device.create_mock_swapchain(64, 64, 3);
    let result = FrameOrchestrator::new(
        shared(&device),
        swapchain,
        &TestShaders,
        test_config().with_frames_in_flight(0),
        PipelineCacheStore::new(None),
    );
    assert!(matches!(result, Err(Error::InitializationFailed(_))));
}

#[test]
fn test_msaa_capped_to_device_limit() {
    let device = mock_device();
    device.set_max_samples(SampleCount::S2);
    let (orchestrator, _) = orchestrator(&device, 64, 64, test_config().with_msaa_samples(8));

    assert_eq!(orchestrator.samples(), SampleCount::S2);
    assert_eq!(orchestrator.graph().passes().samples(), SampleCount::S2);
}

// ============================================================================
// FRAME SLOTS
// ============================================================================

#[test]
fn test_ten_thousand_frames_without_sync_violations() {
    let device = mock_device();
    let (mut orchestrator, control, _) = solar_orchestrator(&device, 64, 48);

    for _ in 0..10_000 {
        orchestrator.scene_mut().clock.advance(Duration::from_millis(16));
        assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    }

    let state = device.state();
    assert!(state.violations.is_empty(), "{:?}", state.violations);
    assert_eq!(state.submissions.len(), 10_000);
    assert!(state.submissions.iter().all(|s| s.fenced));
    drop(state);
    assert_eq!(orchestrator.frame_number(), 10_000);
    assert_eq!(orchestrator.stats().frames_submitted, 10_000);
    assert_eq!(*control.present_count.lock().expect("count"), 10_000);
}

#[test]
fn test_slots_advance_round_robin() {
    let device = mock_device();
    let (mut orchestrator, _, _) = solar_orchestrator(&device, 64, 48);

    orchestrator.render_frame().expect("frame 0");
    assert_eq!(orchestrator.slot_state(0), Some(SlotState::Submitted));
    assert_eq!(orchestrator.frame_slot(), 1);

    orchestrator.render_frame().expect("frame 1");
    assert_eq!(orchestrator.frame_slot(), 0);

    // Slot 0 is reused only after its fence wait
    orchestrator.render_frame().expect("frame 2");
    assert_eq!(orchestrator.frame_slot(), 1);
    assert!(device.state().violations.is_empty());
}

#[test]
fn test_frame_records_all_passes_into_one_submission() {
    let device = mock_device();
    let (mut orchestrator, _, _) = solar_orchestrator(&device, 64, 48);

    orchestrator.render_frame().expect("frame");

    let commands = last_submission(&device);
    assert_eq!(commands.first().map(String::as_str), Some("begin"));
    assert_eq!(commands.last().map(String::as_str), Some("end"));
    let passes = commands.iter().filter(|c| c.starts_with("begin_render_pass")).count();
    assert_eq!(passes, 5);
    assert_eq!(orchestrator.graph().stamps().composite, Some(0));
}

#[test]
fn test_fence_timeout_is_device_lost() {
    let device = mock_device();
    let (mut orchestrator, _, _) = solar_orchestrator(&device, 64, 48);
    orchestrator.render_frame().expect("frame 0");
    orchestrator.render_frame().expect("frame 1");

    device.set_hung(true);
    let result = orchestrator.render_frame();

    match result {
        Err(e @ Error::DeviceLost(_)) => assert!(e.is_fatal()),
        other => panic!("expected DeviceLost, got {:?}", other),
    }
    assert_eq!(device.state().submissions.len(), 2);
}

// ============================================================================
// SCENE UPDATE
// ============================================================================

#[test]
fn test_update_scene_is_idempotent() {
    let device = mock_device();
    let (mut orchestrator, _, _) = solar_orchestrator(&device, 64, 48);

    orchestrator.update_scene(2.5).expect("update");
    let first: Vec<_> = orchestrator.scene().registry.iter().map(|(_, e)| e.model()).collect();
    orchestrator.update_scene(2.5).expect("update");
    let second: Vec<_> = orchestrator.scene().registry.iter().map(|(_, e)| e.model()).collect();

    assert_eq!(first, second);
}

#[test]
fn test_update_scene_is_idempotent_while_following_selection() {
    let device = mock_device();
    let (mut orchestrator, _, keys) = solar_orchestrator(&device, 64, 48);
    orchestrator.scene_mut().registry.add_skybox(500.0, sphere_mesh(&device), None).expect("sky");
    orchestrator.render_frame().expect("t0");
    orchestrator.scene_mut().selection.select(keys.planet);

    orchestrator.update_scene(2.0).expect("update");
    let first: Vec<_> = orchestrator.scene().registry.iter().map(|(_, e)| e.model()).collect();
    let first_uniforms = orchestrator.scene().frame_uniforms(1.0);
    orchestrator.update_scene(2.0).expect("update");
    let second: Vec<_> = orchestrator.scene().registry.iter().map(|(_, e)| e.model()).collect();

    assert_eq!(first, second);
    assert_eq!(first_uniforms, orchestrator.scene().frame_uniforms(1.0));
    assert!((orchestrator.scene().camera.target() - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
}

#[test]
fn test_planet_rotates_quarter_orbit_in_two_seconds() {
    let device = mock_device();
    let (mut orchestrator, _, keys) = solar_orchestrator(&device, 64, 48);

    orchestrator.render_frame().expect("t0");
    let start = orchestrator.scene().registry.get(keys.planet).map(Entity::model).expect("planet");

    orchestrator.scene_mut().clock.advance(Duration::from_secs(2));
    orchestrator.render_frame().expect("t2");
    let later = orchestrator.scene().registry.get(keys.planet).map(Entity::model).expect("planet");

    let (p0, p1) = (start.w_axis.truncate(), later.w_axis.truncate());
    assert!((p0 - Vec3::new(10.0, 0.0, 0.0)).length() < 1e-4);
    assert!((p1 - Vec3::new(0.0, 0.0, -10.0)).length() < 1e-4);
    // An 8 s period turns pi/4 per second
    assert!((p0.angle_between(p1) - 2.0 * std::f32::consts::FRAC_PI_4).abs() < 1e-4);
    assert_eq!(orchestrator.scene().registry.get(keys.sun).map(Entity::world_position), Some(Vec3::ZERO));
}

// ============================================================================
// SURFACE EVENTS
// ============================================================================

#[test]
fn test_resize_rebuilds_targets_before_next_submit() {
    let device = mock_device();
    let (mut orchestrator, control, _) = solar_orchestrator(&device, 64, 48);
    orchestrator.render_frame().expect("frame");
    let (framebuffers, textures, render_targets) = {
        let state = device.state();
        (state.live_framebuffers, state.live_textures, state.live_render_targets)
    };

    orchestrator.notify_resize(320, 200);
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);

    assert_eq!(*control.recreate_count.lock().expect("count"), 1);
    assert_eq!(orchestrator.swapchain_extent(), Extent2D::new(320, 200));
    assert_eq!(orchestrator.graph().targets().map(|t| t.extent), Some(Extent2D::new(320, 200)));
    assert_eq!(orchestrator.picker().extent(), Some(Extent2D::new(320, 200)));

    let commands = last_submission(&device);
    assert!(commands.contains(&"set_scissor:0,0,320,200".to_string()));
    assert!(!commands.contains(&"set_scissor:0,0,64,48".to_string()));

    let state = device.state();
    assert_eq!(state.live_framebuffers, framebuffers);
    assert_eq!(state.live_textures, textures);
    assert_eq!(state.live_render_targets, render_targets);
    assert!(state.violations.is_empty());
}

#[test]
fn test_zero_extent_skips_until_restored() {
    let device = mock_device();
    let (mut orchestrator, control, _) = solar_orchestrator(&device, 64, 48);
    orchestrator.render_frame().expect("frame");

    orchestrator.notify_resize(0, 0);
    for _ in 0..3 {
        assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Skipped);
    }
    assert_eq!(device.state().submissions.len(), 1);
    assert_eq!(*control.recreate_count.lock().expect("count"), 0);
    assert_eq!(orchestrator.stats().frames_skipped, 3);

    orchestrator.notify_resize(200, 100);
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    assert_eq!(orchestrator.swapchain_extent(), Extent2D::new(200, 100));
    assert!(device.state().violations.is_empty());
}

#[test]
fn test_out_of_date_acquire_skips_frame_and_rebuilds() {
    let device = mock_device();
    let (mut orchestrator, control, _) = solar_orchestrator(&device, 64, 48);
    orchestrator.render_frame().expect("frame");

    control.out_of_date_on_acquire.store(true, Ordering::SeqCst);
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Skipped);
    assert_eq!(device.state().submissions.len(), 1);
    assert_eq!(*control.recreate_count.lock().expect("count"), 1);
    assert_eq!(orchestrator.stats().invalidations, 1);

    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    assert!(device.state().violations.is_empty());
}

#[test]
fn test_suboptimal_present_rebuilds_after_presenting() {
    let device = mock_device();
    let (mut orchestrator, control, _) = solar_orchestrator(&device, 64, 48);

    control.suboptimal_on_present.store(true, Ordering::SeqCst);
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);

    assert_eq!(*control.present_count.lock().expect("count"), 1);
    assert_eq!(*control.recreate_count.lock().expect("count"), 1);
    assert!(!orchestrator.needs_invalidate());
}

// ============================================================================
// ERROR POLICY
// ============================================================================

#[test]
fn test_recoverable_error_drops_frame_and_continues() {
    let device = mock_device();
    let (mut orchestrator, _, keys) = solar_orchestrator(&device, 64, 48);
    orchestrator.render_frame().expect("frame");

    // A set-0 group in the planet's material slot makes recording fail
    let buffer = device
        .create_buffer(BufferDesc { size: 16, usage: BufferUsage::Uniform })
        .expect("buffer");
    let body_pipeline = orchestrator.graph().pipelines().body.clone();
    let wrong_set = device
        .create_binding_group(&body_pipeline, 0, &[BindingResource::UniformBuffer(buffer)])
        .expect("group");
    let planet = orchestrator.scene_mut().registry.get_mut(keys.planet).and_then(Entity::body_mut).expect("planet");
    let material = std::mem::replace(&mut planet.material, wrong_set);

    assert_eq!(orchestrator.render_frame().expect("dropped"), FrameOutcome::Skipped);
    assert_eq!(orchestrator.stats().frames_skipped, 1);
    assert_eq!(device.state().submissions.len(), 1);

    let planet = orchestrator.scene_mut().registry.get_mut(keys.planet).and_then(Entity::body_mut).expect("planet");
    planet.material = material;
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    assert!(device.state().violations.is_empty(), "{:?}", device.state().violations);
}

// ============================================================================
// PICKING
// ============================================================================

#[test]
fn test_pick_selects_body_under_cursor() {
    let device = mock_device();
    let (mut orchestrator, _, keys) = solar_orchestrator(&device, 64, 64);
    orchestrator.render_frame().expect("frame");

    assert_eq!(orchestrator.pick(32.0, 32.0).expect("pick"), Some(keys.sun));
    assert_eq!(orchestrator.scene().selection.selected(), Some(keys.sun));

    // Background keeps the selection
    assert_eq!(orchestrator.pick(0.0, 0.0).expect("pick"), None);
    assert_eq!(orchestrator.pick(-4.0, 10.0).expect("pick"), None);
    assert_eq!(orchestrator.scene().selection.selected(), Some(keys.sun));

    assert_eq!(orchestrator.render_frame().expect("frame"), FrameOutcome::Presented);
    assert!(device.state().violations.is_empty());
}

// ============================================================================
// SHUTDOWN
// ============================================================================

#[test]
fn test_shutdown_saves_pipeline_cache() {
    let device = mock_device();
    let path = std::env::temp_dir().join(format!("solar3d_cache_{}.bin", std::process::id()));
    let (swapchain, _) = device.create_mock_swapchain(64, 64, 3);
    let mut orchestrator = FrameOrchestrator::new(
        shared(&device),
        swapchain,
        &TestShaders,
        test_config(),
        PipelineCacheStore::new(Some(path.clone())),
    )
    .expect("orchestrator");
    orchestrator.render_frame().expect("frame");

    orchestrator.shutdown().expect("shutdown");
    orchestrator.shutdown().expect("second shutdown is a no-op");

    assert_eq!(std::fs::read(&path).expect("cache file"), b"mock-pipeline-cache".to_vec());
    let _ = std::fs::remove_file(&path);
}

#[test]
fn test_drop_releases_every_gpu_object() {
    let device = mock_device();
    {
        let (mut orchestrator, _, _) = solar_orchestrator(&device, 64, 48);
        orchestrator.render_frame().expect("frame");
    }
    let state = device.state();
    assert_eq!(state.live_buffers, 0);
    assert_eq!(state.live_textures, 0);
    assert_eq!(state.live_framebuffers, 0);
    assert_eq!(state.live_binding_groups, 0);
    assert_eq!(state.live_pipelines, 0);
    assert_eq!(state.live_render_targets, 0);
}
