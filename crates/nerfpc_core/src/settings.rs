//! Evaluation settings loaded from the training directory.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

/// Errors raised while loading evaluation settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to decode {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Settings for an evaluation/extraction run.
///
/// Every field has a default, so a training directory without a
/// `settings.json` still renders.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EvalSettings {
    /// Base seed for the per-device random streams
    pub random_seed: u64,
    /// Rays dispatched per device per model invocation
    pub chunk_size: usize,
    /// Depth samples evaluated along each ray
    pub samples_per_ray: usize,
    /// Accumulated-weight threshold for surface extraction
    pub opaqueness_threshold: f32,
}

impl Default for EvalSettings {
    fn default() -> Self {
        Self {
            random_seed: 0,
            chunk_size: 4096,
            samples_per_ray: 128,
            opaqueness_threshold: 0.5,
        }
    }
}

impl EvalSettings {
    /// Load settings from `settings.json` in `train_dir`, falling back to
    /// defaults when the file does not exist.
    pub fn load<P: AsRef<Path>>(train_dir: P) -> Result<Self, SettingsError> {
        let path = train_dir.as_ref().join("settings.json");
        if !path.is_file() {
            log::debug!("no settings at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let reader = BufReader::new(File::open(&path)?);
        serde_json::from_reader(reader).map_err(|source| SettingsError::Decode { path, source })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EvalSettings::load(dir.path()).unwrap();
        assert_eq!(settings.chunk_size, 4096);
        assert_eq!(settings.opaqueness_threshold, 0.5);
    }

    #[test]
    fn test_partial_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let mut file = File::create(dir.path().join("settings.json")).unwrap();
        file.write_all(br#"{"chunk_size": 512, "random_seed": 7}"#)
            .unwrap();

        let settings = EvalSettings::load(dir.path()).unwrap();
        assert_eq!(settings.chunk_size, 512);
        assert_eq!(settings.random_seed, 7);
        // Unspecified fields keep their defaults
        assert_eq!(settings.samples_per_ray, 128);
    }
}
