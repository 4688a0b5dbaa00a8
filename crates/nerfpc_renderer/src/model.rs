//! The scene-model capability consumed by the render executor.

use nerfpc_core::ModelState;
use nerfpc_math::Vec3;

use crate::batch::RayShard;
use crate::rng::DeviceRng;

/// Error type returned by scene-model implementations.
pub type ModelError = Box<dyn std::error::Error + Send + Sync>;

/// Per-ray outputs of one scene-model invocation over a shard of rays.
///
/// All per-ray arrays share the shard's length; `sample_points` and
/// `weights` hold `samples_per_ray` entries per ray, sample-major within
/// each ray.
#[derive(Debug, Clone)]
pub struct ModelChunk {
    /// Depth samples evaluated along each ray
    pub samples_per_ray: usize,
    /// Predicted color per ray
    pub colors: Vec<Vec3>,
    /// Expected (weight-averaged) depth per ray
    pub depths: Vec<f32>,
    /// Median depth per ray
    pub depths_median: Vec<f32>,
    /// Accumulated weight (alpha) per ray
    pub acc: Vec<f32>,
    /// Sample positions along each ray
    pub sample_points: Vec<Vec3>,
    /// Contribution weight of each sample
    pub weights: Vec<f32>,
}

/// A trained volumetric scene model.
///
/// The executor treats implementations as opaque: it hands each device a
/// parameter replica, a shard of rays with conditioning metadata, the
/// warp-alpha schedule value, and the device's random streams, and gets
/// back per-ray colors, depths, and sample weights. Implementations must
/// be pure with respect to their inputs — the executor relies on identical
/// inputs producing identical outputs for its fail-fast, no-retry policy.
pub trait SceneModel: Send + Sync {
    /// Evaluate the model over one shard of rays.
    fn render_rays(
        &self,
        params: &ModelState,
        rays: &RayShard<'_>,
        warp_alpha: f32,
        rng: &mut DeviceRng,
    ) -> Result<ModelChunk, ModelError>;
}
