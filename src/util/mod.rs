//! Utility types shared by the reader, the deduplicator and the writer.
//!
//! - [`ScalarKind`] - Numeric property types a PLY header can declare
//! - [`Error`] / [`Result`] / [`ConvertError`] - Error handling
//! - Math type re-exports from glam

mod scalar;
mod error;
mod math;

pub use scalar::*;
pub use error::*;
pub use math::*;
