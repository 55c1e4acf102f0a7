use crate::scene::camera::*;
use glam::{Vec3, Vec4};

#[test]
fn test_eye_position() {
    let camera = OrbitCamera::new(Vec3::new(1.0, 0.0, 0.0), 10.0);
    assert!((camera.eye() - Vec3::new(1.0, 0.0, 10.0)).length() < 1e-5);
}

#[test]
fn test_target_projects_to_center() {
    let camera = OrbitCamera::new(Vec3::new(3.0, 1.0, -2.0), 12.0).with_angles(0.7, 0.3);
    let m = camera.matrices(16.0 / 9.0);
    let clip = m.view_projection * camera.target().extend(1.0);
    let ndc = clip.truncate() / clip.w;
    assert!(ndc.x.abs() < 1e-4 && ndc.y.abs() < 1e-4);
    assert!(ndc.z > 0.0 && ndc.z < 1.0);
}

#[test]
fn test_y_points_down_in_clip_space() {
    let camera = OrbitCamera::new(Vec3::ZERO, 10.0);
    let m = camera.matrices(1.0);
    let clip = m.view_projection * Vec4::new(0.0, 1.0, 0.0, 1.0);
    assert!(clip.y / clip.w < 0.0);
}

#[test]
fn test_depth_range_zero_to_one() {
    let camera = OrbitCamera::new(Vec3::ZERO, 10.0).with_clip_planes(1.0, 100.0);
    let m = camera.matrices(1.0);
    let near = m.projection * Vec4::new(0.0, 0.0, -1.0, 1.0);
    let far = m.projection * Vec4::new(0.0, 0.0, -100.0, 1.0);
    assert!((near.z / near.w).abs() < 1e-5);
    assert!((far.z / far.w - 1.0).abs() < 1e-5);
}

#[test]
fn test_pitch_and_zoom_clamped() {
    let mut camera = OrbitCamera::new(Vec3::ZERO, 10.0);
    camera.orbit(0.0, 10.0);
    assert!(camera.eye().y < 10.0);
    camera.zoom(0.0001);
    assert_eq!(camera.distance(), 0.5);
}

#[test]
fn test_focus_moves_target_only() {
    let mut camera = OrbitCamera::default();
    let distance = camera.distance();
    camera.focus(Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(camera.target(), Vec3::new(5.0, 0.0, 0.0));
    assert_eq!(camera.distance(), distance);
}
