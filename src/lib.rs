//! # ply2colmap
//!
//! Converts PLY point clouds (ASCII, binary little or big endian) into the
//! `points3D.txt` point list of a COLMAP text model, dropping duplicate points
//! on the way.
//!
//! Two points are duplicates when their coordinates print the same with six
//! decimals and their colours are equal. The first occurrence wins, and output order is the
//! order of first occurrence, so converting the same file twice yields
//! byte-identical output.
//!
//! ## Modules
//!
//! - [`util`] - Errors and scalar types
//! - [`ply`] - Header parsing and record decoding
//! - [`point`] - Points and deduplication keys
//! - [`dedup`] - First-seen point set
//! - [`colmap`] - `points3D.txt` writer
//! - [`convert`] - The conversion entry point and progress reporting
//! - [`backup`] - Timestamped input backups
//! - [`settings`] - Persistent settings
//!
//! ## Example
//!
//! ```ignore
//! use ply2colmap::convert;
//!
//! let report = convert("scan/cloud.ply", None)?;
//! println!("{} unique points in {}", report.unique, report.output.display());
//! ```

pub mod util;
pub mod ply;
pub mod point;
pub mod dedup;
pub mod colmap;
pub mod convert;
pub mod backup;
pub mod settings;

// Re-export commonly used types
pub use util::{ConvertError, Error, Result, ScalarKind};
pub use convert::{
    convert, convert_ok, convert_with, ConversionReport, ConvertOptions, NoProgress, Progress,
    ProgressSink, Stage,
};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::util::{ConvertError, Error, Result, ScalarKind};
    pub use crate::ply::{Encoding, FieldDescriptor, FieldLayout, HeaderInfo, PlyReader, RecordOutcome};
    pub use crate::point::{DedupKey, Fixed6, Record};
    pub use crate::dedup::PointSet;
    pub use crate::convert::*;
    pub use crate::backup::{create_backup, Backup};
    pub use crate::settings::Settings;
}
