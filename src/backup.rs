//! Timestamped copies of input files.
//!
//! A backup of `scan/cloud.ply` is written next to it as
//! `scan/cloud_backup_20250106_142501.ply`. Backups are independent of the
//! conversion: the caller decides whether a failed backup stops it.

use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

use time::format_description;
use time::OffsetDateTime;
use tracing::info;

use crate::util::{Error, Result};

/// Timestamp layout used in backup names.
const STAMP_FORMAT: &str = "[year][month][day]_[hour][minute][second]";

/// A backup that was written.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backup {
    pub path: PathBuf,
    /// Size of the copy in bytes.
    pub size: u64,
}

/// Copy `path` to a timestamped sibling.
pub fn create_backup(path: impl AsRef<Path>) -> Result<Backup> {
    let path = path.as_ref();
    if !path.is_file() {
        return Err(Error::FileNotFound(path.to_path_buf()));
    }

    let stamp = timestamp()?;
    let mut target = backup_path(path, &stamp, 0);
    let mut attempt = 0;
    while target.exists() {
        attempt += 1;
        target = backup_path(path, &stamp, attempt);
    }

    let size = fs::copy(path, &target)?;
    info!("Backup created: {} ({} bytes)", target.display(), size);
    Ok(Backup { path: target, size })
}

/// Name of the backup of `path` taken at `stamp`.
///
/// A non-zero `attempt` is appended to keep names unique within a second.
pub fn backup_path(path: &Path, stamp: &str, attempt: u32) -> PathBuf {
    let mut name = path
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("backup"));
    name.push(format!("_backup_{stamp}"));
    if attempt > 0 {
        name.push(format!("_{attempt}"));
    }
    if let Some(ext) = path.extension() {
        name.push(".");
        name.push(ext);
    }
    path.with_file_name(name)
}

/// Current local time as `YYYYMMDD_HHMMSS`, falling back to UTC when the
/// local offset is unavailable.
fn timestamp() -> Result<String> {
    let now = OffsetDateTime::now_local().unwrap_or_else(|_| OffsetDateTime::now_utc());
    let fmt = format_description::parse(STAMP_FORMAT)
        .map_err(|e| Error::other(format!("bad timestamp format: {e}")))?;
    now.format(&fmt)
        .map_err(|e| Error::other(format!("cannot format timestamp: {e}")))
}
