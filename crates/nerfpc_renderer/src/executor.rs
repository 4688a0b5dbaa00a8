//! The data-parallel render executor.
//!
//! Partitions a ray batch across the available compute devices, invokes
//! the scene model on every partition in parallel, and gathers the
//! partial outputs back into one result in the original pixel order.

use std::ops::Range;

use nerfpc_core::ReplicatedState;
use nerfpc_math::Vec3;
use rayon::prelude::*;
use thiserror::Error;

use crate::batch::{RayBatch, RayShard};
use crate::model::{ModelChunk, ModelError, SceneModel};
use crate::rng::{split, DeviceRng};

/// Errors raised while rendering a batch.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("state is replicated {replicas} times but {devices} devices are active")]
    DeviceMismatch { replicas: usize, devices: usize },

    #[error("scene model evaluation failed: {0}")]
    Model(ModelError),
}

/// The gathered per-pixel render result for one camera.
///
/// Per-pixel arrays are row-major with `width * height` entries;
/// `sample_points` and `weights` hold `samples_per_ray` entries per pixel,
/// sample-major within each pixel.
#[derive(Debug, Clone)]
pub struct RenderOutput {
    pub width: u32,
    pub height: u32,
    pub samples_per_ray: usize,
    /// Predicted color per pixel
    pub colors: Vec<Vec3>,
    /// Expected depth per pixel
    pub depths: Vec<f32>,
    /// Median depth per pixel
    pub depths_median: Vec<f32>,
    /// Accumulated weight per pixel
    pub acc: Vec<f32>,
    /// Sample positions along each pixel's ray
    pub sample_points: Vec<Vec3>,
    /// Per-sample contribution weights
    pub weights: Vec<f32>,
}

/// Renders ray batches across `device_count` devices in fixed-size chunks.
///
/// Chunking bounds per-dispatch memory; it never affects output order or
/// values.
#[derive(Debug, Clone)]
pub struct RenderExecutor {
    device_count: usize,
    chunk_size: usize,
}

impl RenderExecutor {
    /// Create an executor for `device_count` devices dispatching
    /// `chunk_size` rays per device per model invocation.
    pub fn new(device_count: usize, chunk_size: usize) -> Self {
        Self {
            device_count: device_count.max(1),
            chunk_size: chunk_size.max(1),
        }
    }

    /// Number of devices this executor dispatches across.
    pub fn device_count(&self) -> usize {
        self.device_count
    }

    /// Render `batch` with `model` and gather the result in pixel order.
    ///
    /// Two independent random streams per device are derived from `seed`
    /// once per call, so runs are reproducible and devices never share a
    /// stream. A model failure on any device aborts the whole call.
    pub fn render(
        &self,
        model: &dyn SceneModel,
        state: &ReplicatedState,
        batch: &RayBatch,
        warp_alpha: f32,
        seed: u64,
    ) -> Result<RenderOutput, RenderError> {
        let devices = self.device_count;
        if state.replica_count() != devices {
            return Err(RenderError::DeviceMismatch {
                replicas: state.replica_count(),
                devices,
            });
        }

        let seeds = split(seed, devices * 2);
        let mut device_rngs: Vec<DeviceRng> = (0..devices)
            .map(|d| DeviceRng::from_seeds(seeds[2 * d], seeds[2 * d + 1]))
            .collect();

        let total = batch.len();
        log::debug!(
            "rendering {total} rays across {devices} devices, {} per device per dispatch",
            self.chunk_size
        );
        let mut samples_per_ray = 0;
        let mut colors = Vec::with_capacity(total);
        let mut depths = Vec::with_capacity(total);
        let mut depths_median = Vec::with_capacity(total);
        let mut acc = Vec::with_capacity(total);
        let mut sample_points = Vec::new();
        let mut weights = Vec::new();

        let span = self.chunk_size * devices;
        let mut start = 0;
        while start < total {
            let end = usize::min(start + span, total);
            let len = end - start;
            let padded_len = len.div_ceil(devices) * devices;
            let per_device = padded_len / devices;

            // The final chunk is padded up to a device multiple by
            // repeating its last ray; the padding is dropped after the
            // gather.
            let padded = (padded_len != len).then(|| PaddedChunk::new(batch, start..end, padded_len));
            let shards: Vec<RayShard<'_>> = (0..devices)
                .map(|d| {
                    let range = d * per_device..(d + 1) * per_device;
                    match &padded {
                        Some(chunk) => chunk.shard(range),
                        None => batch.shard(start + range.start..start + range.end),
                    }
                })
                .collect();

            let outputs: Result<Vec<ModelChunk>, ModelError> = shards
                .par_iter()
                .zip(device_rngs.par_iter_mut())
                .enumerate()
                .map(|(device, (shard, rng))| {
                    let chunk = model.render_rays(state.replica(device), shard, warp_alpha, rng)?;
                    validate_chunk(device, shard.len(), &chunk)?;
                    Ok(chunk)
                })
                .collect();
            let outputs = outputs.map_err(RenderError::Model)?;

            if samples_per_ray == 0 {
                samples_per_ray = outputs[0].samples_per_ray;
            }
            if let Some(bad) = outputs.iter().find(|o| o.samples_per_ray != samples_per_ray) {
                return Err(RenderError::Model(
                    format!(
                        "inconsistent samples per ray: {} vs {}",
                        bad.samples_per_ray, samples_per_ray
                    )
                    .into(),
                ));
            }

            // Reassemble in shard order so the chunk round-trips to the
            // original pixel ordering.
            let mut remaining = len;
            for out in outputs {
                let take = usize::min(remaining, out.colors.len());
                colors.extend_from_slice(&out.colors[..take]);
                depths.extend_from_slice(&out.depths[..take]);
                depths_median.extend_from_slice(&out.depths_median[..take]);
                acc.extend_from_slice(&out.acc[..take]);
                sample_points.extend_from_slice(&out.sample_points[..take * samples_per_ray]);
                weights.extend_from_slice(&out.weights[..take * samples_per_ray]);
                remaining -= take;
            }

            start = end;
        }

        Ok(RenderOutput {
            width: batch.width(),
            height: batch.height(),
            samples_per_ray,
            colors,
            depths,
            depths_median,
            acc,
            sample_points,
            weights,
        })
    }
}

fn validate_chunk(device: usize, rays: usize, chunk: &ModelChunk) -> Result<(), ModelError> {
    let per_ray = [
        ("colors", chunk.colors.len()),
        ("depths", chunk.depths.len()),
        ("depths_median", chunk.depths_median.len()),
        ("acc", chunk.acc.len()),
    ];
    for (name, len) in per_ray {
        if len != rays {
            return Err(format!(
                "device {device} returned {len} `{name}` entries for {rays} rays"
            )
            .into());
        }
    }

    let per_sample = rays * chunk.samples_per_ray;
    if chunk.sample_points.len() != per_sample || chunk.weights.len() != per_sample {
        return Err(format!(
            "device {device} returned {} sample points and {} weights for {per_sample} samples",
            chunk.sample_points.len(),
            chunk.weights.len()
        )
        .into());
    }
    Ok(())
}

/// Owned copy of the final partial chunk, padded to a device multiple by
/// repeating the last ray.
struct PaddedChunk {
    origins: Vec<Vec3>,
    directions: Vec<Vec3>,
    appearance: Vec<u32>,
    warp: Vec<u32>,
}

impl PaddedChunk {
    fn new(batch: &RayBatch, range: Range<usize>, padded_len: usize) -> Self {
        fn pad<T: Copy>(source: &[T], padded_len: usize) -> Vec<T> {
            let mut values = source.to_vec();
            let last = *values.last().expect("padded chunk cannot be empty");
            values.resize(padded_len, last);
            values
        }

        Self {
            origins: pad(&batch.origins()[range.clone()], padded_len),
            directions: pad(&batch.directions()[range.clone()], padded_len),
            appearance: pad(&batch.appearance()[range.clone()], padded_len),
            warp: pad(&batch.warp()[range], padded_len),
        }
    }

    fn shard(&self, range: Range<usize>) -> RayShard<'_> {
        RayShard {
            origins: &self.origins[range.clone()],
            directions: &self.directions[range.clone()],
            appearance: &self.appearance[range.clone()],
            warp: &self.warp[range],
        }
    }
}
