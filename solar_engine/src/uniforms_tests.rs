//! Unit tests for GPU data blocks

use crate::uniforms::*;
use glam::Mat4;

#[test]
fn test_block_sizes() {
    assert_eq!(std::mem::size_of::<FrameUniforms>(), 3 * 64 + 2 * 16);
    assert_eq!(std::mem::size_of::<DrawPush>(), 96);
    assert_eq!(std::mem::size_of::<PickPush>(), 80);
    assert_eq!(std::mem::size_of::<BlurUniform>(), 16 * 16 + 16);
    // Push constants must fit the guaranteed 128-byte minimum
    assert!(std::mem::size_of::<DrawPush>() <= 128);
}

#[test]
fn test_pick_push_layout() {
    let push = PickPush::new(Mat4::IDENTITY, 42);
    let bytes = bytemuck::bytes_of(&push);
    assert_eq!(&bytes[64..68], &42u32.to_le_bytes());
}

#[test]
fn test_gaussian_weights_normalized() {
    for (radius, sigma) in [(0, 1.0), (1, 0.5), (8, 4.0), (15, 6.0)] {
        let w = gaussian_weights(radius, sigma);
        assert_eq!(w.len(), radius as usize + 1);
        let total = w[0] + 2.0 * w[1..].iter().sum::<f32>();
        assert!((total - 1.0).abs() < 1e-5, "radius {} sums to {}", radius, total);
    }
}

#[test]
fn test_gaussian_weights_decrease() {
    let w = gaussian_weights(8, 3.0);
    assert!(w.windows(2).all(|pair| pair[0] > pair[1]));
}

#[test]
fn test_gaussian_radius_clamped() {
    assert_eq!(gaussian_weights(100, 4.0).len(), 16);
}

#[test]
fn test_blur_uniform_params() {
    let blur = BlurUniform::new(4, 2.0, 200, 100);
    assert_eq!(blur.params.x, 4.0);
    assert!((blur.params.y - 0.005).abs() < 1e-7);
    assert!((blur.params.z - 0.01).abs() < 1e-7);
    assert!(blur.weights[4].x > 0.0);
    assert_eq!(blur.weights[5].x, 0.0);
}
