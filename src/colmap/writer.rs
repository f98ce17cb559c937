//! `points3D.txt` writer.

use std::fmt;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

use crate::point::{Fixed6, Record};
use crate::util::{Error, Result};

/// Fixed header comment lines.
pub const HEADER_DESCRIPTION: &str = "# 3D point list with one line of data per point:";
pub const HEADER_COLUMNS: &str =
    "#   POINT3D_ID, X, Y, Z, R, G, B, ERROR, TRACK[] as (IMAGE_ID, POINT2D_IDX)";

/// One output line. Ids start at 1.
#[derive(Clone, Copy, Debug)]
pub struct ColmapPoint<'a> {
    pub id: u64,
    pub record: &'a Record,
}

impl fmt::Display for ColmapPoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let r = self.record;
        let [red, green, blue] = r.color;
        write!(
            f,
            "{} {} {} {} {} {} {} 0",
            self.id,
            Fixed6(r.x()),
            Fixed6(r.y()),
            Fixed6(r.z()),
            red,
            green,
            blue
        )
    }
}

/// Summary comment line carrying the point count.
pub fn summary_line(count: usize) -> String {
    format!("# Number of points: {count}, mean track length: 0.0")
}

/// Write a complete `points3D.txt` stream.
pub fn write_points3d<W: Write>(writer: W, points: &[Record]) -> io::Result<()> {
    let mut w = BufWriter::new(writer);

    writeln!(w, "{HEADER_DESCRIPTION}")?;
    writeln!(w, "{HEADER_COLUMNS}")?;
    writeln!(w, "{}", summary_line(points.len()))?;

    for (record, id) in points.iter().zip(1u64..) {
        writeln!(w, "{}", ColmapPoint { id, record })?;
    }

    w.flush()
}

/// Write `points3D.txt` to `path`, replacing it only once fully written.
///
/// Returns the size of the written file in bytes.
pub fn write_points3d_file(path: impl AsRef<Path>, points: &[Record]) -> Result<u64> {
    let path = path.as_ref();
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut tmp = NamedTempFile::new_in(dir)?;
    write_points3d(tmp.as_file_mut(), points)?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;

    let size = fs::metadata(path)?.len();
    debug!("wrote {} points ({} bytes) to {}", points.len(), size, path.display());
    Ok(size)
}
