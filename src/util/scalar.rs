//! Scalar property types - the numeric kinds a PLY header can declare.

use byteorder::ByteOrder;
use std::fmt;

/// Numeric type of one vertex property.
///
/// Each kind has a fixed size and a well-defined binary representation, so
/// the byte layout of a binary record follows from the ordered list of kinds.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    /// Signed 8-bit integer (`char`, `int8`)
    Int8,
    /// Unsigned 8-bit integer (`uchar`, `uint8`)
    Uint8,
    /// Signed 16-bit integer (`short`, `int16`)
    Int16,
    /// Unsigned 16-bit integer (`ushort`, `uint16`)
    Uint16,
    /// Signed 32-bit integer (`int`, `int32`)
    Int32,
    /// Unsigned 32-bit integer (`uint`, `uint32`)
    Uint32,
    /// 32-bit floating point (`float`, `float32`)
    #[default]
    Float32,
    /// 64-bit floating point (`double`, `float64`)
    Float64,
}

impl ScalarKind {
    /// All kinds, in declaration order.
    pub const ALL: [Self; 8] = [
        Self::Int8,
        Self::Uint8,
        Self::Int16,
        Self::Uint16,
        Self::Int32,
        Self::Uint32,
        Self::Float32,
        Self::Float64,
    ];

    /// Returns the size in bytes of a single value of this kind.
    #[inline]
    pub const fn num_bytes(self) -> usize {
        match self {
            Self::Int8 | Self::Uint8 => 1,
            Self::Int16 | Self::Uint16 => 2,
            Self::Int32 | Self::Uint32 | Self::Float32 => 4,
            Self::Float64 => 8,
        }
    }

    /// Canonical PLY spelling of this kind.
    #[inline]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Int8 => "char",
            Self::Uint8 => "uchar",
            Self::Int16 => "short",
            Self::Uint16 => "ushort",
            Self::Int32 => "int",
            Self::Uint32 => "uint",
            Self::Float32 => "float",
            Self::Float64 => "double",
        }
    }

    /// Parse a type token from a `property` directive.
    ///
    /// Both the classic and the sized spellings are accepted. Returns `None`
    /// for anything else; the header reader decides what to do with those.
    pub fn from_token(token: &str) -> Option<Self> {
        let kind = match token {
            "char" | "int8" => Self::Int8,
            "uchar" | "uint8" => Self::Uint8,
            "short" | "int16" => Self::Int16,
            "ushort" | "uint16" => Self::Uint16,
            "int" | "int32" => Self::Int32,
            "uint" | "uint32" => Self::Uint32,
            "float" | "float32" => Self::Float32,
            "double" | "float64" => Self::Float64,
            _ => return None,
        };
        Some(kind)
    }

    /// Decode one value from the start of `buf` with byte order `B`.
    ///
    /// `buf` must hold at least [`num_bytes`](Self::num_bytes) bytes.
    #[inline]
    pub fn read<B: ByteOrder>(self, buf: &[u8]) -> f64 {
        match self {
            Self::Int8 => buf[0] as i8 as f64,
            Self::Uint8 => buf[0] as f64,
            Self::Int16 => B::read_i16(buf) as f64,
            Self::Uint16 => B::read_u16(buf) as f64,
            Self::Int32 => B::read_i32(buf) as f64,
            Self::Uint32 => B::read_u32(buf) as f64,
            Self::Float32 => B::read_f32(buf) as f64,
            Self::Float64 => B::read_f64(buf),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}
