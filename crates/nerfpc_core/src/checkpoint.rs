//! Trained model state: checkpoint restore and per-device replication.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while restoring a checkpoint.
#[derive(Error, Debug)]
pub enum CheckpointError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("no checkpoint found in {}", .0.display())]
    Missing(PathBuf),

    #[error("failed to decode checkpoint {}: {source}", .path.display())]
    Decode {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("tensor `{name}` holds {len} values but its shape {shape:?} requires {expected}")]
    BadTensor {
        name: String,
        len: usize,
        shape: Vec<usize>,
        expected: usize,
    },
}

/// A dense named array stored in a checkpoint.
///
/// The pipeline never interprets tensor contents; only the scene model
/// gives them meaning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tensor {
    pub shape: Vec<usize>,
    pub data: Vec<f32>,
}

impl Tensor {
    /// Number of elements the shape implies.
    pub fn element_count(&self) -> usize {
        self.shape.iter().product()
    }
}

/// The restored model state.
///
/// Restored once per run and never mutated afterward; evaluation is
/// read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelState {
    /// Named model parameters
    pub tensors: BTreeMap<String, Tensor>,
    /// Deformation-field strength schedule value at the restored step
    pub warp_alpha: f32,
    /// Optimizer step the checkpoint was written at
    pub step: u64,
}

impl ModelState {
    /// Look up a parameter tensor by name.
    pub fn tensor(&self, name: &str) -> Option<&Tensor> {
        self.tensors.get(name)
    }

    /// Replicate the state across `devices` compute devices.
    ///
    /// The state is immutable, so replication hands out one shared handle
    /// per device rather than deep-copying the parameters.
    pub fn replicate(self, devices: usize) -> ReplicatedState {
        let shared = Arc::new(self);
        ReplicatedState {
            replicas: vec![shared; devices],
        }
    }
}

/// Model state replicated across compute devices, one handle per device.
#[derive(Debug, Clone)]
pub struct ReplicatedState {
    replicas: Vec<Arc<ModelState>>,
}

impl ReplicatedState {
    /// Number of replicas.
    pub fn replica_count(&self) -> usize {
        self.replicas.len()
    }

    /// The replica assigned to `device`.
    pub fn replica(&self, device: usize) -> &ModelState {
        &self.replicas[device]
    }

    /// The warp-alpha schedule value carried by the state.
    pub fn warp_alpha(&self) -> f32 {
        self.replicas[0].warp_alpha
    }
}

/// Restore the model state from `checkpoint.json` in `checkpoint_dir`.
///
/// The on-disk checkpoint is consumed read-only.
pub fn restore<P: AsRef<Path>>(checkpoint_dir: P) -> Result<ModelState, CheckpointError> {
    let path = checkpoint_dir.as_ref().join("checkpoint.json");
    if !path.is_file() {
        return Err(CheckpointError::Missing(
            checkpoint_dir.as_ref().to_path_buf(),
        ));
    }

    let reader = BufReader::new(File::open(&path)?);
    let state: ModelState = serde_json::from_reader(reader).map_err(|source| {
        CheckpointError::Decode {
            path: path.clone(),
            source,
        }
    })?;

    for (name, tensor) in &state.tensors {
        let expected = tensor.element_count();
        if tensor.data.len() != expected {
            return Err(CheckpointError::BadTensor {
                name: name.clone(),
                len: tensor.data.len(),
                shape: tensor.shape.clone(),
                expected,
            });
        }
    }

    log::info!("restored checkpoint from {} at step {}", path.display(), state.step);
    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample_state() -> ModelState {
        let mut tensors = BTreeMap::new();
        tensors.insert(
            "density".to_string(),
            Tensor {
                shape: vec![2, 2, 2],
                data: vec![0.0; 8],
            },
        );
        ModelState {
            tensors,
            warp_alpha: 4.0,
            step: 250_000,
        }
    }

    #[test]
    fn test_restore_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let json = serde_json::to_string(&sample_state()).unwrap();
        let mut file = File::create(dir.path().join("checkpoint.json")).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let state = restore(dir.path()).unwrap();
        assert_eq!(state.step, 250_000);
        assert_eq!(state.warp_alpha, 4.0);
        assert_eq!(state.tensor("density").unwrap().element_count(), 8);
    }

    #[test]
    fn test_restore_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = restore(dir.path()).unwrap_err();
        assert!(matches!(err, CheckpointError::Missing(_)));
    }

    #[test]
    fn test_restore_rejects_bad_tensor() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = sample_state();
        state.tensors.get_mut("density").unwrap().data.pop();
        let json = serde_json::to_string(&state).unwrap();
        let mut file = File::create(dir.path().join("checkpoint.json")).unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let err = restore(dir.path()).unwrap_err();
        assert!(matches!(err, CheckpointError::BadTensor { .. }));
    }

    #[test]
    fn test_replicate_shares_state() {
        let replicated = sample_state().replicate(4);
        assert_eq!(replicated.replica_count(), 4);
        for device in 0..4 {
            assert_eq!(replicated.replica(device).step, 250_000);
        }
        assert_eq!(replicated.warp_alpha(), 4.0);
    }
}
