//! The `sample-points` operation: render the camera path through the
//! restored model and accumulate one surface point per ray.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};

use nerfpc_core::dataset::{self, SceneBounds};
use nerfpc_core::{checkpoint, container, Camera, EvalSettings, PointCloud, PointCloudAccumulator, ReplicatedState};
use nerfpc_renderer::{
    color_to_rgb8, colorize_depth, extract_points, GridModel, RayBatch, RenderExecutor,
    RenderOutput, SceneModel,
};

/// Flags of the `sample-points` command.
pub struct Options {
    pub data_dir: PathBuf,
    pub output_dir: PathBuf,
    pub train_dir: PathBuf,
    pub point_cloud_filename: String,
    pub frame_step: usize,
}

pub fn run(options: &Options) -> Result<()> {
    fs::create_dir_all(&options.output_dir)?;

    let settings = EvalSettings::load(&options.train_dir)?;
    let bounds = dataset::load_scene_bounds(&options.data_dir)?;
    let state = checkpoint::restore(options.train_dir.join("checkpoints"))?;

    let devices = rayon::current_num_threads();
    let model = GridModel::new(&state, bounds, settings.samples_per_ray)
        .map_err(|e| anyhow::anyhow!("failed to build scene model: {e}"))?;
    let state = state.replicate(devices);
    let executor = RenderExecutor::new(devices, settings.chunk_size);

    let camera_dir = options.data_dir.join("camera-paths").join("orbit-mild");
    let paths = dataset::glob_cameras(&camera_dir)?;
    let cameras: Vec<Camera> = paths
        .iter()
        .map(dataset::load_camera)
        .collect::<Result<_, _>>()?;
    log::info!(
        "rendering {} cameras from {} across {devices} devices",
        cameras.len(),
        camera_dir.display()
    );

    let output_dir = options.output_dir.clone();
    let warp_alpha = state.warp_alpha();
    let cloud = sample_point_cloud(
        &executor,
        &model,
        &state,
        &cameras,
        options.frame_step,
        warp_alpha,
        settings.random_seed,
        settings.opaqueness_threshold,
        |frame, output| write_frame(&output_dir, frame, output, bounds),
    )?;

    let container_path = options.output_dir.join(&options.point_cloud_filename);
    container::write(&container_path, &cloud)?;
    log::info!(
        "wrote {} points to {}",
        cloud.len(),
        container_path.display()
    );
    Ok(())
}

/// Render every `frame_step`-th camera and accumulate the extracted
/// points in camera-path order.
///
/// `on_frame` runs after each frame's extraction with the frame's index
/// and render output (frame image writing in production, instrumentation
/// in tests). Any failure aborts the loop; frames already handed to
/// `on_frame` keep whatever side effects it performed.
#[allow(clippy::too_many_arguments)]
pub fn sample_point_cloud(
    executor: &RenderExecutor,
    model: &dyn SceneModel,
    state: &ReplicatedState,
    cameras: &[Camera],
    frame_step: usize,
    warp_alpha: f32,
    seed: u64,
    threshold: f32,
    mut on_frame: impl FnMut(usize, &RenderOutput) -> Result<()>,
) -> Result<PointCloud> {
    ensure!(frame_step >= 1, "frame step must be at least 1");

    let mut accumulator = PointCloudAccumulator::new();
    let mut frame = 0;
    while frame < cameras.len() {
        log::info!("rendering frame {}/{}", frame + 1, cameras.len());
        let batch = RayBatch::from_camera(&cameras[frame])?;
        let output = executor.render(model, state, &batch, warp_alpha, seed)?;

        let (points, colors) = extract_points(&output, threshold);
        accumulator.append(points, colors)?;
        on_frame(frame, &output)?;

        frame += frame_step;
    }
    Ok(accumulator.finalize())
}

fn write_frame(
    output_dir: &Path,
    frame: usize,
    output: &RenderOutput,
    bounds: SceneBounds,
) -> Result<()> {
    let mut rgb = Vec::with_capacity(output.colors.len() * 3);
    for color in &output.colors {
        rgb.extend_from_slice(&color_to_rgb8(*color));
    }
    save_rgb(
        output_dir.join(format!("{frame:04}.jpg")),
        output.width,
        output.height,
        rgb,
    )?;

    let mut depth_rgb = Vec::with_capacity(output.depths.len() * 3);
    for pixel in colorize_depth(&output.depths, bounds.near, bounds.far, true) {
        depth_rgb.extend_from_slice(&pixel);
    }
    save_rgb(
        output_dir.join(format!("{frame:04}_depth.png")),
        output.width,
        output.height,
        depth_rgb,
    )
}

fn save_rgb(path: PathBuf, width: u32, height: u32, data: Vec<u8>) -> Result<()> {
    let image = image::RgbImage::from_raw(width, height, data)
        .context("frame buffer does not match image dimensions")?;
    image
        .save(&path)
        .with_context(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nerfpc_core::ModelState;
    use nerfpc_math::Vec3;
    use nerfpc_renderer::{DeviceRng, ModelChunk, ModelError, RayShard};
    use std::collections::BTreeMap;

    /// Every ray hits an opaque surface at its second sample.
    struct FlatModel;

    impl SceneModel for FlatModel {
        fn render_rays(
            &self,
            _params: &ModelState,
            rays: &RayShard<'_>,
            _warp_alpha: f32,
            _rng: &mut DeviceRng,
        ) -> Result<ModelChunk, ModelError> {
            let n = rays.len();
            let mut sample_points = Vec::with_capacity(n * 2);
            let mut weights = Vec::with_capacity(n * 2);
            for i in 0..n {
                sample_points.push(rays.origins[i] + rays.directions[i]);
                sample_points.push(rays.origins[i] + rays.directions[i] * 2.0);
                weights.push(0.2);
                weights.push(0.7);
            }
            Ok(ModelChunk {
                samples_per_ray: 2,
                colors: vec![Vec3::new(0.5, 0.5, 0.5); n],
                depths: vec![2.0; n],
                depths_median: vec![2.0; n],
                acc: vec![0.9; n],
                sample_points,
                weights,
            })
        }
    }

    fn test_cameras(count: usize) -> Vec<Camera> {
        (0..count)
            .map(|i| Camera {
                orientation: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
                position: [i as f32, 0.0, 0.0],
                focal_length: 4.0,
                principal_point: [2.0, 2.0],
                skew: 0.0,
                image_size: [4, 4],
            })
            .collect()
    }

    fn test_state(devices: usize) -> ReplicatedState {
        ModelState {
            tensors: BTreeMap::new(),
            warp_alpha: 0.0,
            step: 0,
        }
        .replicate(devices)
    }

    #[test]
    fn test_every_camera_contributes_full_frame() {
        let executor = RenderExecutor::new(2, 8);
        let state = test_state(2);
        let cameras = test_cameras(3);

        let mut frames = Vec::new();
        let cloud = sample_point_cloud(
            &executor,
            &FlatModel,
            &state,
            &cameras,
            1,
            0.0,
            0,
            0.5,
            |frame, output| {
                assert_eq!(output.colors.len(), 16);
                frames.push(frame);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(frames, vec![0, 1, 2]);
        assert_eq!(cloud.len(), 3 * 16);
        assert_eq!(cloud.verts.len(), cloud.rgb.len());
    }

    #[test]
    fn test_frame_step_skips_cameras() {
        let executor = RenderExecutor::new(1, 16);
        let state = test_state(1);
        let cameras = test_cameras(3);

        let mut frames = Vec::new();
        let cloud = sample_point_cloud(
            &executor,
            &FlatModel,
            &state,
            &cameras,
            2,
            0.0,
            0,
            0.5,
            |frame, _| {
                frames.push(frame);
                Ok(())
            },
        )
        .unwrap();

        assert_eq!(frames, vec![0, 2]);
        assert_eq!(cloud.len(), 2 * 16);
    }

    #[test]
    fn test_zero_frame_step_rejected() {
        let executor = RenderExecutor::new(1, 16);
        let state = test_state(1);
        let cameras = test_cameras(1);

        let result = sample_point_cloud(
            &executor,
            &FlatModel,
            &state,
            &cameras,
            0,
            0.0,
            0,
            0.5,
            |_, _| Ok(()),
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_extracted_points_sit_on_surface() {
        let executor = RenderExecutor::new(1, 16);
        let state = test_state(1);
        let cameras = test_cameras(1);

        let cloud = sample_point_cloud(
            &executor,
            &FlatModel,
            &state,
            &cameras,
            1,
            0.0,
            0,
            0.5,
            |_, _| Ok(()),
        )
        .unwrap();

        // FlatModel crosses the 0.5 threshold at its second sample,
        // so every point is origin + 2 * direction.
        let batch = RayBatch::from_camera(&cameras[0]).unwrap();
        for (point, (origin, direction)) in cloud
            .verts
            .iter()
            .zip(batch.origins().iter().zip(batch.directions()))
        {
            let expected = *origin + *direction * 2.0;
            assert!((Vec3::from(*point) - expected).length() < 1e-5);
        }
    }
}
