//! Unit tests for procedural meshes

use glam::Vec3;
use crate::graphics_device::PrimitiveTopology;
use crate::resource::primitives::{orbit_ring, sky_sphere, uv_sphere};

fn face_normal(mesh: &crate::resource::MeshData, tri: usize) -> (Vec3, Vec3) {
    let p = |i: usize| Vec3::from(mesh.vertices[mesh.indices[tri * 3 + i] as usize].position);
    let (a, b, c) = (p(0), p(1), p(2));
    ((b - a).cross(c - a), (a + b + c) / 3.0)
}

#[test]
fn test_uv_sphere_shape() {
    let mesh = uv_sphere(16, 8);
    assert_eq!(mesh.topology, PrimitiveTopology::TriangleList);
    assert_eq!(mesh.vertices.len(), 17 * 9);
    assert_eq!(mesh.indices.len(), 16 * 8 * 6);
    assert!(mesh.validate().is_ok());
    for v in &mesh.vertices {
        assert!((Vec3::from(v.position).length() - 1.0).abs() < 1e-5);
    }
}

#[test]
fn test_uv_sphere_faces_outward() {
    let mesh = uv_sphere(12, 6);
    for tri in 0..mesh.indices.len() / 3 {
        let (normal, center) = face_normal(&mesh, tri);
        // Degenerate pole triangles have zero area
        if normal.length() > 1e-6 {
            assert!(normal.dot(center) > 0.0, "triangle {} faces inward", tri);
        }
    }
}

#[test]
fn test_sky_sphere_faces_inward() {
    let mesh = sky_sphere(12, 6);
    for tri in 0..mesh.indices.len() / 3 {
        let (normal, center) = face_normal(&mesh, tri);
        if normal.length() > 1e-6 {
            assert!(normal.dot(center) < 0.0);
        }
    }
    assert!(mesh.vertices.iter().all(|v| Vec3::from(v.normal).dot(Vec3::from(v.position)) < 0.0));
}

#[test]
fn test_orbit_ring_follows_orbit_path() {
    let mesh = orbit_ring(4);
    assert_eq!(mesh.topology, PrimitiveTopology::LineList);
    assert_eq!(mesh.indices, vec![0, 1, 1, 2, 2, 3, 3, 0]);
    // Quarter turn lands on -Z
    let p = Vec3::from(mesh.vertices[1].position);
    assert!((p - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    assert!(mesh.validate().is_ok());
}

#[test]
fn test_degenerate_parameters_are_clamped() {
    assert!(uv_sphere(0, 0).validate().is_ok());
    assert_eq!(orbit_ring(1).vertices.len(), 3);
}
