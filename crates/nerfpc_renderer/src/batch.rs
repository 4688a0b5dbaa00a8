//! Ray batches: the structured record of every ray a camera defines.

use std::ops::Range;

use nerfpc_core::Camera;
use nerfpc_math::Vec3;
use thiserror::Error;

/// The camera cannot produce a well-formed ray batch.
#[derive(Error, Debug)]
pub enum InvalidCameraError {
    #[error("camera defines a {width}x{height} image with no pixels")]
    EmptyImage { width: u32, height: u32 },

    #[error("camera produced a non-finite ray for pixel ({x}, {y})")]
    MalformedRay { x: u32, y: u32 },
}

/// Rays for every pixel of one camera, flat in row-major order.
///
/// All arrays share the length `width * height`. The conditioning
/// metadata (`appearance`, `warp`) is zero-filled: evaluation disables
/// appearance and warp variation. Immutable once built.
#[derive(Debug, Clone)]
pub struct RayBatch {
    width: u32,
    height: u32,
    origins: Vec<Vec3>,
    directions: Vec<Vec3>,
    appearance: Vec<u32>,
    warp: Vec<u32>,
}

impl RayBatch {
    /// Build the batch covering every pixel of `camera`.
    pub fn from_camera(camera: &Camera) -> Result<Self, InvalidCameraError> {
        let (width, height) = (camera.width(), camera.height());
        let pixel_count = camera.pixel_count();
        if pixel_count == 0 {
            return Err(InvalidCameraError::EmptyImage { width, height });
        }

        let mut origins = Vec::with_capacity(pixel_count);
        let mut directions = Vec::with_capacity(pixel_count);
        for y in 0..height {
            for x in 0..width {
                let ray = camera.pixel_to_ray(x, y);
                if !ray.origin.is_finite() || !ray.direction.is_finite() {
                    return Err(InvalidCameraError::MalformedRay { x, y });
                }
                origins.push(ray.origin);
                directions.push(ray.direction);
            }
        }

        Ok(Self {
            width,
            height,
            origins,
            directions,
            appearance: vec![0; pixel_count],
            warp: vec![0; pixel_count],
        })
    }

    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of rays.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// True when the batch holds no rays.
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Ray origins, row-major.
    pub fn origins(&self) -> &[Vec3] {
        &self.origins
    }

    /// Ray directions, row-major.
    pub fn directions(&self) -> &[Vec3] {
        &self.directions
    }

    /// Per-ray appearance conditioning ids.
    pub fn appearance(&self) -> &[u32] {
        &self.appearance
    }

    /// Per-ray warp conditioning ids.
    pub fn warp(&self) -> &[u32] {
        &self.warp
    }

    /// Borrow the contiguous shard of rays covering `range`.
    pub fn shard(&self, range: Range<usize>) -> RayShard<'_> {
        RayShard {
            origins: &self.origins[range.clone()],
            directions: &self.directions[range.clone()],
            appearance: &self.appearance[range.clone()],
            warp: &self.warp[range],
        }
    }
}

/// A borrowed contiguous slice of a ray batch, as handed to one device.
#[derive(Debug, Clone, Copy)]
pub struct RayShard<'a> {
    pub origins: &'a [Vec3],
    pub directions: &'a [Vec3],
    pub appearance: &'a [u32],
    pub warp: &'a [u32],
}

impl RayShard<'_> {
    /// Number of rays in the shard.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// True when the shard holds no rays.
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }
}
