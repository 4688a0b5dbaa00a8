//! The persisted point-cloud container.
//!
//! A single tagged JSON file holding two equal-length parallel arrays keyed
//! `verts` and `rgb`. Color values round-trip exactly as stored.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use thiserror::Error;

use crate::pointcloud::PointCloud;

/// Errors raised by container reads and writes.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt point-cloud container: {0}")]
    Corrupt(String),
}

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Serialize `cloud` to a tagged container at `path`.
pub fn write<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> ContainerResult<()> {
    let writer = BufWriter::new(File::create(path.as_ref())?);
    serde_json::to_writer(writer, cloud).map_err(std::io::Error::from)?;
    Ok(())
}

/// Deserialize a point cloud from the container at `path`.
///
/// Fails with [`ContainerError::Corrupt`] when the `verts`/`rgb` keys are
/// absent or malformed, or when the two arrays disagree in length.
pub fn read<P: AsRef<Path>>(path: P) -> ContainerResult<PointCloud> {
    let reader = BufReader::new(File::open(path.as_ref())?);
    let cloud: PointCloud =
        serde_json::from_reader(reader).map_err(|e| ContainerError::Corrupt(e.to_string()))?;

    if cloud.verts.len() != cloud.rgb.len() {
        return Err(ContainerError::Corrupt(format!(
            "{} verts but {} colors",
            cloud.verts.len(),
            cloud.rgb.len()
        )));
    }
    Ok(cloud)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");

        let cloud = PointCloud {
            verts: vec![[1.0, 2.0, 3.0], [0.0, 0.0, 0.0]],
            rgb: vec![[0.5, 0.25, 1.0], [0.0, 0.0, 0.0]],
        };
        write(&path, &cloud).unwrap();
        assert_eq!(read(&path).unwrap(), cloud);
    }

    #[test]
    fn test_roundtrip_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.json");

        write(&path, &PointCloud::default()).unwrap();
        let cloud = read(&path).unwrap();
        assert!(cloud.is_empty());
    }

    #[test]
    fn test_read_missing_key() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(br#"{"verts": [[0.0, 0.0, 0.0]]}"#).unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, ContainerError::Corrupt(_)));
    }

    #[test]
    fn test_read_length_mismatch() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        let mut file = File::create(&path).unwrap();
        file.write_all(br#"{"verts": [[0.0, 0.0, 0.0]], "rgb": []}"#)
            .unwrap();

        let err = read(&path).unwrap_err();
        assert!(matches!(err, ContainerError::Corrupt(_)));
    }

    #[test]
    fn test_colors_not_renormalized() {
        // Producers may store [0,1] or [0,255] colors; both survive as-is.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("points.json");

        let cloud = PointCloud {
            verts: vec![[0.0; 3]],
            rgb: vec![[255.0, 128.0, 0.0]],
        };
        write(&path, &cloud).unwrap();
        assert_eq!(read(&path).unwrap().rgb[0], [255.0, 128.0, 0.0]);
    }
}
