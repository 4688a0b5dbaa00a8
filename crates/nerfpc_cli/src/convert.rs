//! The `visualize-point-cloud` operation: republish a persisted container
//! in the PLY interchange format.

use std::path::Path;

use anyhow::Result;

use nerfpc_core::{container, export};

/// Read the container at `point_cloud_path` and write a sibling `.ply`
/// next to it. One-directional: the container stays the source of truth.
pub fn run(point_cloud_path: &Path) -> Result<()> {
    let cloud = container::read(point_cloud_path)?;

    let ply_path = point_cloud_path.with_extension("ply");
    export::write_ply(&ply_path, &cloud)?;
    log::info!(
        "republished {} points to {}",
        cloud.len(),
        ply_path.display()
    );
    Ok(())
}
