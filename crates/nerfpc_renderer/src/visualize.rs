//! Color and depth map conversion for frame output.

use nerfpc_math::Vec3;

/// Viridis-like gradient stops, dark to bright.
const DEPTH_RAMP: [[f32; 3]; 7] = [
    [0.267, 0.005, 0.329],
    [0.283, 0.141, 0.458],
    [0.254, 0.265, 0.530],
    [0.164, 0.471, 0.558],
    [0.128, 0.567, 0.551],
    [0.369, 0.789, 0.383],
    [0.993, 0.906, 0.144],
];

/// Convert one predicted color to 8-bit RGB.
pub fn color_to_rgb8(color: Vec3) -> [u8; 3] {
    let r = (255.0 * color.x.clamp(0.0, 1.0)) as u8;
    let g = (255.0 * color.y.clamp(0.0, 1.0)) as u8;
    let b = (255.0 * color.z.clamp(0.0, 1.0)) as u8;
    [r, g, b]
}

/// Colorize a depth map against the scene bounds.
///
/// Depths are normalized into `[near, far]` and mapped through the
/// gradient; `invert` flips the ramp so near surfaces render bright.
pub fn colorize_depth(depths: &[f32], near: f32, far: f32, invert: bool) -> Vec<[u8; 3]> {
    let range = (far - near).max(f32::EPSILON);
    depths
        .iter()
        .map(|&depth| {
            let mut t = ((depth - near) / range).clamp(0.0, 1.0);
            if invert {
                t = 1.0 - t;
            }
            ramp(t)
        })
        .collect()
}

fn ramp(t: f32) -> [u8; 3] {
    let scaled = t * (DEPTH_RAMP.len() - 1) as f32;
    let index = (scaled as usize).min(DEPTH_RAMP.len() - 2);
    let frac = scaled - index as f32;

    let lo = DEPTH_RAMP[index];
    let hi = DEPTH_RAMP[index + 1];
    let mix = |a: f32, b: f32| (255.0 * (a + (b - a) * frac).clamp(0.0, 1.0)) as u8;
    [mix(lo[0], hi[0]), mix(lo[1], hi[1]), mix(lo[2], hi[2])]
}
