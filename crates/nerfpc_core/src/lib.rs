//! Core types and collaborators for point-cloud extraction.
//!
//! This crate provides:
//!
//! - **Dataset access**: camera descriptors, camera-path globbing, scene bounds
//! - **Checkpoint restore**: trained model state and per-device replication
//! - **Point cloud**: the accumulator and the persisted container format
//!
//! # Example
//!
//! ```ignore
//! use nerfpc_core::checkpoint;
//! use nerfpc_core::dataset;
//!
//! let state = checkpoint::restore("train/checkpoints")?;
//! let cameras = dataset::glob_cameras("data/camera-paths/orbit-mild")?;
//! println!("Restored step {}, {} cameras", state.step, cameras.len());
//! ```

pub mod camera;
pub mod checkpoint;
pub mod container;
pub mod dataset;
pub mod export;
pub mod pointcloud;
pub mod settings;

// Re-export commonly used types
pub use camera::Camera;
pub use checkpoint::{ModelState, ReplicatedState, Tensor};
pub use pointcloud::{PointCloud, PointCloudAccumulator};
pub use settings::EvalSettings;
