//! Math type re-exports.
//!
//! Coordinates are kept in double precision all the way from decode to
//! output, so only the `f64` vector types are re-exported.

pub use glam::DVec3;
