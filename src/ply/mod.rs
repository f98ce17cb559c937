//! PLY point cloud reading.
//!
//! A PLY file is a text header followed by either whitespace separated text
//! records or fixed-width binary records:
//!
//! ```text
//! +----------------------------------+
//! | ply                              |  magic line
//! | format <encoding> 1.0            |  ascii / binary_little_endian / binary_big_endian
//! | comment ...                      |  ignored
//! | element vertex <count>           |  the only element we decode
//! | property <type> <name>           |  one line per field, in record order
//! | element face <count>             |  other elements are skipped
//! | property list uchar int ...      |
//! | end_header                       |  sentinel, data starts on the next byte
//! +----------------------------------+
//! | ... records ...                  |
//! +----------------------------------+
//! ```
//!
//! [`read_header`] parses the header, [`FieldLayout`] locates the fields a
//! point needs, and [`PlyReader`] hands out a [`Records`] iterator over the
//! vertex body.

mod format;
mod header;
mod layout;
mod decode;
mod reader;

pub use format::*;
pub use header::*;
pub use layout::*;
pub use decode::*;
pub use reader::*;
