//! Pinhole camera descriptors for ray generation.

use nerfpc_math::{Mat3, Ray, Vec3};
use serde::Deserialize;

/// A pinhole camera with enough intrinsics/extrinsics to cast one ray
/// per pixel.
///
/// Matches the on-disk JSON descriptor produced by the capture pipeline:
/// `orientation` is the world-to-camera rotation stored row-major, and
/// `position` is the camera center in world space.
#[derive(Debug, Clone, Deserialize)]
pub struct Camera {
    /// World-to-camera rotation, row-major
    pub orientation: [[f32; 3]; 3],
    /// Camera center in world space
    pub position: [f32; 3],
    /// Focal length in pixels
    pub focal_length: f32,
    /// Principal point (cx, cy) in pixels
    pub principal_point: [f32; 2],
    /// Axis skew, usually zero
    #[serde(default)]
    pub skew: f32,
    /// Image (width, height) in pixels
    pub image_size: [u32; 2],
}

impl Camera {
    /// Image width in pixels.
    pub fn width(&self) -> u32 {
        self.image_size[0]
    }

    /// Image height in pixels.
    pub fn height(&self) -> u32 {
        self.image_size[1]
    }

    /// Total pixel count.
    pub fn pixel_count(&self) -> usize {
        self.width() as usize * self.height() as usize
    }

    /// Camera-to-world rotation.
    ///
    /// `orientation` rows are the camera basis vectors in world space, so
    /// the inverse rotation is the transpose with those rows as columns.
    fn camera_to_world(&self) -> Mat3 {
        Mat3::from_cols(
            Vec3::from(self.orientation[0]),
            Vec3::from(self.orientation[1]),
            Vec3::from(self.orientation[2]),
        )
    }

    /// Cast the ray through the center of pixel (x, y).
    ///
    /// The returned direction is normalized and expressed in world space.
    pub fn pixel_to_ray(&self, x: u32, y: u32) -> Ray {
        let u = x as f32 + 0.5;
        let v = y as f32 + 0.5;

        let yl = (v - self.principal_point[1]) / self.focal_length;
        let xl = (u - self.principal_point[0] - yl * self.skew) / self.focal_length;

        let direction = self.camera_to_world() * Vec3::new(xl, yl, 1.0);
        Ray::new(Vec3::from(self.position), direction.normalize())
    }
}
