//! The accumulated colored point cloud.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Chunk lengths passed to the accumulator disagree.
#[derive(Error, Debug)]
#[error("chunk length mismatch: {points} points vs {colors} colors")]
pub struct ChunkMismatch {
    pub points: usize,
    pub colors: usize,
}

/// A colored point cloud: parallel, index-aligned vertex and color arrays.
///
/// Color values keep whatever range the producer used; nothing in the
/// pipeline renormalizes them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointCloud {
    pub verts: Vec<[f32; 3]>,
    pub rgb: Vec<[f32; 3]>,
}

impl PointCloud {
    /// Number of points.
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// True when the cloud holds no points.
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }
}

/// Accumulates per-frame point/color chunks into one point cloud.
///
/// Chunks concatenate in append order; every ray of every appended frame
/// contributes exactly one point. No deduplication, no spatial filtering.
#[derive(Debug, Default)]
pub struct PointCloudAccumulator {
    verts: Vec<[f32; 3]>,
    rgb: Vec<[f32; 3]>,
    chunks: usize,
}

impl PointCloudAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one frame's points and colors.
    pub fn append(
        &mut self,
        points: Vec<[f32; 3]>,
        colors: Vec<[f32; 3]>,
    ) -> Result<(), ChunkMismatch> {
        if points.len() != colors.len() {
            return Err(ChunkMismatch {
                points: points.len(),
                colors: colors.len(),
            });
        }
        self.verts.extend(points);
        self.rgb.extend(colors);
        self.chunks += 1;
        Ok(())
    }

    /// Number of chunks appended so far.
    pub fn chunk_count(&self) -> usize {
        self.chunks
    }

    /// Total points accumulated so far.
    pub fn len(&self) -> usize {
        self.verts.len()
    }

    /// True when nothing has been appended.
    pub fn is_empty(&self) -> bool {
        self.verts.is_empty()
    }

    /// Consume the accumulator and return the unified point cloud.
    pub fn finalize(self) -> PointCloud {
        PointCloud {
            verts: self.verts,
            rgb: self.rgb,
        }
    }
}
