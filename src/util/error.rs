//! Error types for the converter.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

use crate::convert::Stage;

/// Main error type for reading, decoding and writing.
#[derive(Error, Debug)]
pub enum Error {
    /// File does not exist or cannot be accessed
    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    /// Missing magic line, unknown encoding or unterminated header
    #[error("Invalid PLY file: {0}")]
    InvalidFormat(String),

    /// The vertex element lacks one of x, y or z
    #[error("Missing coordinate fields: {0}")]
    MissingCoordinateFields(String),

    /// Well-formed input this reader cannot lay out
    #[error("Unsupported PLY layout: {0}")]
    Unsupported(String),

    /// Memory mapping failed
    #[error("Memory mapping failed: {0}")]
    MmapFailed(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Settings (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with message
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an "other" error from a string.
    pub fn other(msg: impl Into<String>) -> Self {
        Self::Other(msg.into())
    }

    /// Create an invalid format error.
    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidFormat(msg.into())
    }

    /// True for failures caused by the input content rather than the environment.
    pub fn is_format_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidFormat(_) | Self::MissingCoordinateFields(_) | Self::Unsupported(_)
        )
    }
}

/// Result type alias for converter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// A failed conversion: the stage that was running and what went wrong.
#[derive(Debug)]
pub struct ConvertError {
    pub stage: Stage,
    pub source: Error,
}

impl ConvertError {
    pub fn new(stage: Stage, source: impl Into<Error>) -> Self {
        Self { stage, source: source.into() }
    }
}

impl fmt::Display for ConvertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conversion failed while {}: {}", self.stage.activity(), self.source)
    }
}

impl std::error::Error for ConvertError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = Error::invalid("first line is not 'ply'");
        assert!(e.to_string().contains("Invalid PLY file"));
        assert!(e.to_string().contains("'ply'"));

        let e = Error::MissingCoordinateFields("z".into());
        assert!(e.to_string().contains("z"));
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "test");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(!err.is_format_error());
    }

    #[test]
    fn test_convert_error_names_stage() {
        let e = ConvertError::new(Stage::Start, Error::invalid("bad magic"));
        let msg = e.to_string();
        assert!(msg.contains("reading the header"), "{msg}");
        assert!(msg.contains("bad magic"), "{msg}");
        assert!(std::error::Error::source(&e).is_some());
    }
}
