//! Surface point extraction from per-sample render weights.

use nerfpc_math::Vec3;

use crate::executor::RenderOutput;

/// Default accumulated-weight threshold for surface extraction.
pub const DEFAULT_OPAQUENESS_THRESHOLD: f32 = 0.5;

/// Compute the per-sample opaqueness mask.
///
/// For each ray, the mask is 1 exactly at the first sample where the
/// cumulative weight sum reaches `threshold` — the sample at which the
/// ray is considered to have hit a solid surface — and 0 everywhere else.
/// A ray whose weights never accumulate to the threshold gets an all-zero
/// mask.
///
/// `weights` holds `samples_per_ray` entries per ray, sample-major.
pub fn opaqueness_mask(weights: &[f32], samples_per_ray: usize, threshold: f32) -> Vec<f32> {
    debug_assert!(samples_per_ray > 0 && weights.len() % samples_per_ray == 0);

    let mut mask = vec![0.0; weights.len()];
    for (ray_weights, ray_mask) in weights
        .chunks_exact(samples_per_ray)
        .zip(mask.chunks_exact_mut(samples_per_ray))
    {
        let mut cumulative = 0.0;
        for (weight, out) in ray_weights.iter().zip(ray_mask.iter_mut()) {
            cumulative += weight;
            if cumulative >= threshold {
                *out = 1.0;
                break;
            }
        }
    }
    mask
}

/// Collapse a render output into one surface point and color per ray.
///
/// Each ray's point is `sum(mask * sample_position)` over its samples.
/// When no sample reaches the threshold the sum degenerates to the zero
/// point; callers treat it as a low-confidence background point. That
/// boundary behavior is part of the black-background compositing
/// convention and must not be filtered here. Colors are the render's
/// per-pixel predictions, unchanged.
pub fn extract_points(
    output: &RenderOutput,
    threshold: f32,
) -> (Vec<[f32; 3]>, Vec<[f32; 3]>) {
    let mask = opaqueness_mask(&output.weights, output.samples_per_ray, threshold);

    let points = output
        .sample_points
        .chunks_exact(output.samples_per_ray)
        .zip(mask.chunks_exact(output.samples_per_ray))
        .map(|(positions, ray_mask)| {
            let point = positions
                .iter()
                .zip(ray_mask)
                .fold(Vec3::ZERO, |sum, (position, m)| sum + *position * *m);
            point.to_array()
        })
        .collect();

    let colors = output.colors.iter().map(|c| c.to_array()).collect();
    (points, colors)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn first_active(mask: &[f32]) -> Option<usize> {
        mask.iter().position(|&m| m == 1.0)
    }

    fn output_with(weights: Vec<f32>, samples_per_ray: usize) -> RenderOutput {
        let rays = weights.len() / samples_per_ray;
        let sample_points = (0..weights.len())
            .map(|k| Vec3::new(k as f32, 0.0, -(k as f32)))
            .collect();
        RenderOutput {
            width: rays as u32,
            height: 1,
            samples_per_ray,
            colors: vec![Vec3::new(0.25, 0.5, 0.75); rays],
            depths: vec![0.0; rays],
            depths_median: vec![0.0; rays],
            acc: vec![0.0; rays],
            sample_points,
            weights,
        }
    }

    #[test]
    fn test_mask_marks_first_crossing_only() {
        let mask = opaqueness_mask(&[0.2, 0.2, 0.3, 0.4], 4, 0.5);
        assert_eq!(mask, vec![0.0, 0.0, 1.0, 0.0]);
    }

    #[test]
    fn test_mask_per_ray_independent() {
        let weights = vec![
            0.6, 0.1, 0.1, // crosses at sample 0
            0.1, 0.1, 0.1, // never crosses
        ];
        let mask = opaqueness_mask(&weights, 3, 0.5);
        assert_eq!(mask, vec![1.0, 0.0, 0.0, 0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_threshold_monotonicity() {
        // Raising the threshold never moves the activation earlier.
        let weights = [0.05, 0.1, 0.2, 0.15, 0.3, 0.1, 0.05, 0.05];
        let mut previous = 0;
        for step in 0..=10 {
            let threshold = step as f32 / 10.0;
            let mask = opaqueness_mask(&weights, weights.len(), threshold);
            if let Some(index) = first_active(&mask) {
                assert!(index >= previous);
                previous = index;
            } else {
                // Once the threshold exceeds the total weight the mask
                // stays empty for all higher thresholds.
                assert!(threshold > weights.iter().sum::<f32>());
            }
        }
    }

    #[test]
    fn test_degenerate_ray_yields_zero_point() {
        let output = output_with(vec![0.0; 8], 8);
        let (points, colors) = extract_points(&output, 0.5);
        assert_eq!(points, vec![[0.0, 0.0, 0.0]]);
        // The predicted color still comes through at full weight.
        assert_eq!(colors, vec![[0.25, 0.5, 0.75]]);
    }

    #[test]
    fn test_point_is_surface_sample_position() {
        let output = output_with(vec![0.1, 0.3, 0.4, 0.2], 4);
        let (points, _) = extract_points(&output, 0.5);
        // Cumulative weight reaches 0.5 at sample 2.
        assert_eq!(points, vec![[2.0, 0.0, -2.0]]);
    }

    #[test]
    fn test_one_point_per_ray() {
        let output = output_with(vec![0.25; 12], 4);
        let (points, colors) = extract_points(&output, 0.5);
        assert_eq!(points.len(), 3);
        assert_eq!(colors.len(), 3);
    }
}
