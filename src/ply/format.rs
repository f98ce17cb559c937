//! PLY keywords and the encoding variants.

use std::fmt;

/// First line of every PLY file.
pub const PLY_MAGIC: &str = "ply";

/// Sentinel line terminating the header.
pub const END_HEADER: &str = "end_header";

/// Directive keywords recognised inside the header.
pub const FORMAT_KEYWORD: &str = "format";
pub const ELEMENT_KEYWORD: &str = "element";
pub const PROPERTY_KEYWORD: &str = "property";
pub const COMMENT_KEYWORD: &str = "comment";
pub const OBJ_INFO_KEYWORD: &str = "obj_info";

/// Type token introducing a variable-length list property.
pub const LIST_KEYWORD: &str = "list";

/// Name of the record-defining element.
pub const VERTEX_ELEMENT: &str = "vertex";

/// Body encoding declared by the `format` directive.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Encoding {
    Ascii,
    BinaryLittleEndian,
    BinaryBigEndian,
}

impl Encoding {
    /// Parse the second token of a `format` directive.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ascii" => Some(Self::Ascii),
            "binary_little_endian" => Some(Self::BinaryLittleEndian),
            "binary_big_endian" => Some(Self::BinaryBigEndian),
            _ => None,
        }
    }

    /// Token as written in a header.
    pub const fn token(self) -> &'static str {
        match self {
            Self::Ascii => "ascii",
            Self::BinaryLittleEndian => "binary_little_endian",
            Self::BinaryBigEndian => "binary_big_endian",
        }
    }

    #[inline]
    pub const fn is_binary(self) -> bool {
        !matches!(self, Self::Ascii)
    }
}

impl fmt::Display for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.token())
    }
}
