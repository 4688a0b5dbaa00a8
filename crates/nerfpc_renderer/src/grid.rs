//! A voxel-grid scene model.
//!
//! Density and color live on a dense grid restored from the checkpoint;
//! rays march uniform depth samples between the scene's near and far
//! bounds with standard transmittance compositing over a black
//! background.

use nerfpc_core::dataset::SceneBounds;
use nerfpc_core::{ModelState, Tensor};
use nerfpc_math::Vec3;

use crate::batch::RayShard;
use crate::model::{ModelChunk, ModelError, SceneModel};
use crate::rng::DeviceRng;

/// Scene model backed by `density` ([R,R,R]) and `color` ([R,R,R,3])
/// checkpoint tensors over the axis-aligned box in the `bounds` tensor
/// ([2,3]: min row, max row).
#[derive(Debug, Clone)]
pub struct GridModel {
    resolution: [usize; 3],
    bounds_min: Vec3,
    bounds_max: Vec3,
    near: f32,
    far: f32,
    samples_per_ray: usize,
}

impl GridModel {
    /// Validate the checkpoint tensors and build the model.
    pub fn new(
        state: &ModelState,
        scene: SceneBounds,
        samples_per_ray: usize,
    ) -> Result<Self, ModelError> {
        let density = required(state, "density")?;
        if density.shape.len() != 3 {
            return Err(format!("`density` must be rank 3, got shape {:?}", density.shape).into());
        }
        let resolution = [density.shape[0], density.shape[1], density.shape[2]];
        if resolution.iter().any(|&r| r == 0) {
            return Err(format!("`density` has an empty axis: {resolution:?}").into());
        }

        let color = required(state, "color")?;
        let expected = vec![resolution[0], resolution[1], resolution[2], 3];
        if color.shape != expected {
            return Err(format!(
                "`color` shape {:?} does not match density resolution {expected:?}",
                color.shape
            )
            .into());
        }

        let bounds = required(state, "bounds")?;
        if bounds.shape != [2, 3] {
            return Err(format!("`bounds` must have shape [2, 3], got {:?}", bounds.shape).into());
        }
        let bounds_min = Vec3::new(bounds.data[0], bounds.data[1], bounds.data[2]);
        let bounds_max = Vec3::new(bounds.data[3], bounds.data[4], bounds.data[5]);
        if !(bounds_min.cmplt(bounds_max).all()) {
            return Err("`bounds` min must be strictly below max on every axis".into());
        }

        if samples_per_ray == 0 {
            return Err("samples per ray must be positive".into());
        }

        Ok(Self {
            resolution,
            bounds_min,
            bounds_max,
            near: scene.near,
            far: scene.far,
            samples_per_ray,
        })
    }

    /// Flat cell index for a world position, or None outside the box.
    fn cell(&self, position: Vec3) -> Option<usize> {
        let rel = (position - self.bounds_min) / (self.bounds_max - self.bounds_min);
        if rel.cmplt(Vec3::ZERO).any() || rel.cmpgt(Vec3::ONE).any() {
            return None;
        }
        let [rx, ry, rz] = self.resolution;
        let ix = ((rel.x * rx as f32) as usize).min(rx - 1);
        let iy = ((rel.y * ry as f32) as usize).min(ry - 1);
        let iz = ((rel.z * rz as f32) as usize).min(rz - 1);
        Some((ix * ry + iy) * rz + iz)
    }
}

fn required<'a>(state: &'a ModelState, name: &str) -> Result<&'a Tensor, ModelError> {
    state
        .tensor(name)
        .ok_or_else(|| format!("checkpoint is missing the `{name}` tensor").into())
}

impl SceneModel for GridModel {
    // Evaluation is deterministic: the random streams and conditioning
    // metadata are accepted but unused, and the grid has no deformation
    // field for warp-alpha to scale.
    fn render_rays(
        &self,
        params: &ModelState,
        rays: &RayShard<'_>,
        _warp_alpha: f32,
        _rng: &mut DeviceRng,
    ) -> Result<ModelChunk, ModelError> {
        let density = required(params, "density")?;
        let color = required(params, "color")?;
        if density.shape != self.resolution {
            return Err(format!(
                "replica `density` shape {:?} does not match {:?}",
                density.shape, self.resolution
            )
            .into());
        }

        let n = rays.len();
        let s = self.samples_per_ray;
        let dt = (self.far - self.near) / s as f32;

        let mut colors = Vec::with_capacity(n);
        let mut depths = Vec::with_capacity(n);
        let mut depths_median = Vec::with_capacity(n);
        let mut acc = Vec::with_capacity(n);
        let mut sample_points = Vec::with_capacity(n * s);
        let mut weights = Vec::with_capacity(n * s);

        for (origin, direction) in rays.origins.iter().zip(rays.directions) {
            let mut transmittance = 1.0;
            let mut ray_color = Vec3::ZERO;
            let mut depth = 0.0;
            let mut accumulated = 0.0;
            let mut median = None;

            for k in 0..s {
                let t = self.near + (k as f32 + 0.5) * dt;
                let position = *origin + *direction * t;
                sample_points.push(position);

                let (sigma, sample_color) = match self.cell(position) {
                    Some(cell) => {
                        let sigma = density.data[cell].max(0.0);
                        let rgb = &color.data[cell * 3..cell * 3 + 3];
                        (sigma, Vec3::new(rgb[0], rgb[1], rgb[2]))
                    }
                    None => (0.0, Vec3::ZERO),
                };

                let alpha = 1.0 - (-sigma * dt).exp();
                let weight = transmittance * alpha;
                transmittance *= 1.0 - alpha;

                weights.push(weight);
                ray_color += sample_color * weight;
                depth += t * weight;
                accumulated += weight;
                if median.is_none() && accumulated >= 0.5 {
                    median = Some(t);
                }
            }

            // Black background: unaccumulated weight contributes nothing.
            colors.push(ray_color);
            depths.push(depth);
            depths_median.push(median.unwrap_or(0.0));
            acc.push(accumulated);
        }

        Ok(ModelChunk {
            samples_per_ray: s,
            colors,
            depths,
            depths_median,
            acc,
            sample_points,
            weights,
        })
    }
}
