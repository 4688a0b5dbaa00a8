//! Dataset access: camera-path globbing and scene bounds.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use crate::camera::Camera;

/// Errors that can occur while reading dataset files.
#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no camera descriptors found in {}", .0.display())]
    NoCameras(PathBuf),
}

/// Result type for dataset operations.
pub type DatasetResult<T> = Result<T, DatasetError>;

/// Scene depth bounds, used by the scene model and depth visualization.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SceneBounds {
    pub near: f32,
    pub far: f32,
}

/// List all camera descriptors (`*.json`) under `dir`, sorted by filename.
///
/// Frame order follows the sorted descriptor paths, so camera paths
/// exported as `000000.json`, `000001.json`, ... render in sequence.
pub fn glob_cameras<P: AsRef<Path>>(dir: P) -> DatasetResult<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().map_or(false, |ext| ext == "json"))
        .collect();
    paths.sort();

    if paths.is_empty() {
        return Err(DatasetError::NoCameras(dir.to_path_buf()));
    }
    Ok(paths)
}

/// Load a single camera descriptor.
pub fn load_camera<P: AsRef<Path>>(path: P) -> DatasetResult<Camera> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    serde_json::from_reader(reader).map_err(|source| DatasetError::Decode {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the scene bounds from `scene.json` in the data directory.
pub fn load_scene_bounds<P: AsRef<Path>>(data_dir: P) -> DatasetResult<SceneBounds> {
    let path = data_dir.as_ref().join("scene.json");
    let reader = BufReader::new(File::open(&path)?);
    serde_json::from_reader(reader).map_err(|source| DatasetError::Decode { path, source })
}
