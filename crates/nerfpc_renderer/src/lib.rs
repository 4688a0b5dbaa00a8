//! Data-parallel rendering of a trained volumetric scene model.
//!
//! The render path: a [`RayBatch`] is built from a camera, partitioned
//! across compute devices by the [`RenderExecutor`], evaluated by a
//! [`SceneModel`] with deterministic per-device random streams, and the
//! per-device partial outputs are gathered back into one [`RenderOutput`]
//! in the original pixel order. [`extract_points`] then reduces the output
//! to one surface point per ray via the opaqueness threshold.

mod batch;
mod executor;
mod extract;
mod grid;
mod model;
mod rng;
mod visualize;

pub use batch::{InvalidCameraError, RayBatch, RayShard};
pub use executor::{RenderError, RenderExecutor, RenderOutput};
pub use extract::{extract_points, opaqueness_mask, DEFAULT_OPAQUENESS_THRESHOLD};
pub use grid::GridModel;
pub use model::{ModelChunk, ModelError, SceneModel};
pub use rng::{split, DeviceRng};
pub use visualize::{color_to_rgb8, colorize_depth};

/// Re-export common math types
pub use nerfpc_math::{Ray, Vec3};
