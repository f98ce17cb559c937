//! Decoded points and their deduplication keys.

use std::fmt::{self, Write};

use smallvec::SmallVec;

use crate::util::DVec3;

/// One logical point: a position and an 8-bit RGB colour.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Record {
    pub position: DVec3,
    pub color: [u8; 3],
}

impl Record {
    #[inline]
    pub fn new(x: f64, y: f64, z: f64, color: [u8; 3]) -> Self {
        Self {
            position: DVec3::new(x, y, z),
            color,
        }
    }

    #[inline]
    pub fn x(&self) -> f64 {
        self.position.x
    }

    #[inline]
    pub fn y(&self) -> f64 {
        self.position.y
    }

    #[inline]
    pub fn z(&self) -> f64 {
        self.position.z
    }

    /// Key under which this point is deduplicated.
    #[inline]
    pub fn key(&self) -> DedupKey {
        DedupKey::of(self)
    }
}

/// A coordinate as it appears in the output: six fractional digits.
///
/// Deduplication keys are built from this text too, so two coordinates
/// collide exactly when they print the same, sign of zero included.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Fixed6(pub f64);

impl fmt::Display for Fixed6 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// Inline capacity of a key; wider coordinate text spills to the heap.
const KEY_INLINE: usize = 32;

/// Identity of a point for deduplication.
///
/// Holds the formatted `x y z` text and the colour, so two points collide
/// exactly when their output lines would carry the same values.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DedupKey {
    coords: SmallVec<[u8; KEY_INLINE]>,
    color: [u8; 3],
}

impl DedupKey {
    pub fn of(record: &Record) -> Self {
        let mut coords = KeyText(SmallVec::new());
        // Formatting into memory cannot fail.
        let _ = write!(
            coords,
            "{} {} {}",
            Fixed6(record.x()),
            Fixed6(record.y()),
            Fixed6(record.z())
        );
        Self {
            coords: coords.0,
            color: record.color,
        }
    }

    /// The `x y z` text the key was built from.
    pub fn coords(&self) -> &str {
        std::str::from_utf8(&self.coords).unwrap_or_default()
    }
}

struct KeyText(SmallVec<[u8; KEY_INLINE]>);

impl fmt::Write for KeyText {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.0.extend_from_slice(s.as_bytes());
        Ok(())
    }
}

/// Convert a decoded colour value into a byte, rounding and clamping.
#[inline]
pub fn color_byte(v: f64) -> u8 {
    v.round().clamp(0.0, 255.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(x: f64) -> DedupKey {
        Record::new(x, 0.0, 0.0, [10, 20, 30]).key()
    }

    /// Keys must agree exactly when the printed coordinates agree.
    fn assert_key_matches_text(a: f64, b: f64) {
        let same_text = Fixed6(a).to_string() == Fixed6(b).to_string();
        assert_eq!(
            key(a) == key(b),
            same_text,
            "{a:e} -> {} vs {b:e} -> {}",
            Fixed6(a),
            Fixed6(b)
        );
    }

    #[test]
    fn test_key_rounds_to_six_decimals() {
        let a = Record::new(1.0000001, 2.0, 3.0, [10, 20, 30]);
        let b = Record::new(1.0000004, 2.0, 3.0, [10, 20, 30]);
        let c = Record::new(1.000001, 2.0, 3.0, [10, 20, 30]);
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), c.key());
        assert_eq!(a.key().coords(), "1.000000 2.000000 3.000000");
    }

    #[test]
    fn test_key_includes_color() {
        let a = Record::new(0.5, 0.5, 0.5, [1, 2, 3]);
        let b = Record::new(0.5, 0.5, 0.5, [1, 2, 4]);
        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_half_way_values_follow_formatting() {
        // 0.0000035 is stored slightly below the half, so it prints as 0.000003
        assert_eq!(Fixed6(0.0000035).to_string(), "0.000003");
        assert_eq!(key(0.0000035), key(0.000003));
        assert_ne!(key(0.0000035), key(0.000004));

        for i in 0..2000u32 {
            let base = i as f64 * 1e-6;
            assert_key_matches_text(base + 5e-7, base);
            assert_key_matches_text(base + 5e-7, base + 1e-6);
            assert_key_matches_text(-(base + 5e-7), -base);
        }
    }

    #[test]
    fn test_negative_zero_stays_distinct() {
        assert_eq!(Fixed6(-1e-7).to_string(), "-0.000000");
        assert_ne!(key(-1e-7), key(1e-7));
        assert_eq!(key(-1e-7), key(-4e-7));
        assert_eq!(key(1e-7), key(0.0));

        let a = Record::new(-1.2345674, 0.5, 7.0, [0; 3]);
        let b = Record::new(-1.2345671, 0.5, 7.0, [0; 3]);
        assert_eq!(a.key(), b.key());
    }

    #[test]
    fn test_large_coordinates_stay_distinct() {
        assert_ne!(key(1e13), key(2e13));
        assert_ne!(key(9.3e18), key(9.4e18));
        assert_ne!(key(-1e300), key(1e300));
        assert_eq!(key(1e13), key(1e13 + 1e-7));
        for (a, b) in [(1e13, 2e13), (1e20, 1e20 + 16384.0), (123456789.0000004, 123456789.0000001)] {
            assert_key_matches_text(a, b);
        }
    }

    #[test]
    fn test_color_byte() {
        assert_eq!(color_byte(0.0), 0);
        assert_eq!(color_byte(127.6), 128);
        assert_eq!(color_byte(300.0), 255);
        assert_eq!(color_byte(-4.0), 0);
    }
}
