//! COLMAP text model output.
//!
//! Only `points3D.txt` is produced. Each line is
//! `POINT3D_ID X Y Z R G B ERROR TRACK[]`; dense clouds carry no
//! observations, so the error is always `0` and the track is empty.

mod writer;

pub use writer::*;

/// Conventional file name of the point list inside a COLMAP sparse model.
pub const POINTS3D_FILE: &str = "points3D.txt";
