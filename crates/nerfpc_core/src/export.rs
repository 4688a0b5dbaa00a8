//! One-directional export of a point cloud to the PLY interchange format.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::pointcloud::PointCloud;

/// Write `cloud` as an ASCII PLY file at `path`.
///
/// Positions and colors are emitted as parallel float properties. Color
/// values are written exactly as stored, whatever range the producer used.
pub fn write_ply<P: AsRef<Path>>(path: P, cloud: &PointCloud) -> std::io::Result<()> {
    let mut writer = BufWriter::new(File::create(path.as_ref())?);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", cloud.len())?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "property float red")?;
    writeln!(writer, "property float green")?;
    writeln!(writer, "property float blue")?;
    writeln!(writer, "end_header")?;

    for (vert, color) in cloud.verts.iter().zip(&cloud.rgb) {
        writeln!(
            writer,
            "{} {} {} {} {} {}",
            vert[0], vert[1], vert[2], color[0], color[1], color[2]
        )?;
    }

    writer.flush()
}
