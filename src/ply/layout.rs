//! Locating the point fields inside a vertex record.

use tracing::{debug, warn};

use super::header::FieldDescriptor;
use crate::util::{Error, Result, ScalarKind};

/// Colour used for every point when the vertex element has no colour fields.
pub const DEFAULT_COLOR: [u8; 3] = [128, 128, 128];

/// Accepted names per colour channel, long form first.
const COLOR_NAMES: [(&str, &str); 3] = [("red", "r"), ("green", "g"), ("blue", "b")];

/// Column indices of the fields a point is built from, plus the byte layout
/// of a binary record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldLayout {
    /// Indices of x, y and z.
    pub position: [usize; 3],
    /// Indices of the colour channels, `None` unless all three exist.
    pub color: Option<[usize; 3]>,
    kinds: Vec<ScalarKind>,
    offsets: Vec<usize>,
    width: usize,
}

impl FieldLayout {
    /// Resolve the point fields of a vertex element.
    ///
    /// Coordinates must be named exactly `x`, `y` and `z`. Colour channels
    /// match `red`/`r`, `green`/`g` and `blue`/`b` ignoring case. A single
    /// missing channel disables colour for the whole file.
    pub fn resolve(fields: &[FieldDescriptor]) -> Result<Self> {
        let find = |name: &str| fields.iter().position(|f| f.name == name);

        let (x, y, z) = (find("x"), find("y"), find("z"));
        let (Some(x), Some(y), Some(z)) = (x, y, z) else {
            let missing: Vec<&str> = [("x", x), ("y", y), ("z", z)]
                .iter()
                .filter(|(_, idx)| idx.is_none())
                .map(|(name, _)| *name)
                .collect();
            return Err(Error::MissingCoordinateFields(missing.join(", ")));
        };

        let channels = COLOR_NAMES.map(|(long, short)| find_color(fields, long, short));
        let color = match channels {
            [Some(r), Some(g), Some(b)] => Some([r, g, b]),
            [None, None, None] => None,
            _ => {
                warn!("incomplete colour fields, every point gets the default colour");
                None
            }
        };

        let kinds: Vec<ScalarKind> = fields.iter().map(|f| f.kind).collect();
        let mut offsets = Vec::with_capacity(kinds.len());
        let mut width = 0;
        for kind in &kinds {
            offsets.push(width);
            width += kind.num_bytes();
        }

        debug!(
            "field layout: xyz at {:?}, colour at {:?}, record width {} bytes",
            [x, y, z],
            color,
            width
        );

        Ok(Self {
            position: [x, y, z],
            color,
            kinds,
            offsets,
            width,
        })
    }

    #[inline]
    pub fn has_color(&self) -> bool {
        self.color.is_some()
    }

    /// Highest field index a point needs.
    pub fn max_index(&self) -> usize {
        let pos = self.position.iter().copied().max().unwrap_or(0);
        let col = self.color.map_or(0, |c| c.iter().copied().max().unwrap_or(0));
        pos.max(col)
    }

    /// Minimum number of tokens an ASCII line needs to yield a point.
    #[inline]
    pub fn min_tokens(&self) -> usize {
        self.max_index() + 1
    }

    /// Size in bytes of one binary record.
    #[inline]
    pub fn record_width(&self) -> usize {
        self.width
    }

    /// Kind and byte offset of field `index`.
    #[inline]
    pub fn field(&self, index: usize) -> (ScalarKind, usize) {
        (self.kinds[index], self.offsets[index])
    }
}

fn find_color(fields: &[FieldDescriptor], long: &str, short: &str) -> Option<usize> {
    fields
        .iter()
        .position(|f| f.name.eq_ignore_ascii_case(long))
        .or_else(|| fields.iter().position(|f| f.name.eq_ignore_ascii_case(short)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(entries: &[(&str, ScalarKind)]) -> Vec<FieldDescriptor> {
        entries.iter().map(|(n, k)| FieldDescriptor::new(*n, *k)).collect()
    }

    #[test]
    fn test_xyz_rgb() {
        use ScalarKind::*;
        let layout = FieldLayout::resolve(&fields(&[
            ("x", Float32),
            ("y", Float32),
            ("z", Float32),
            ("nx", Float32),
            ("ny", Float32),
            ("nz", Float32),
            ("red", Uint8),
            ("green", Uint8),
            ("blue", Uint8),
        ]))
        .unwrap();
        assert_eq!(layout.position, [0, 1, 2]);
        assert_eq!(layout.color, Some([6, 7, 8]));
        assert_eq!(layout.record_width(), 27);
        assert_eq!(layout.min_tokens(), 9);
        assert_eq!(layout.field(7), (Uint8, 25));
    }

    #[test]
    fn test_short_and_mixed_case_color_names() {
        use ScalarKind::*;
        let layout = FieldLayout::resolve(&fields(&[
            ("R", Uint8),
            ("g", Uint8),
            ("Blue", Uint8),
            ("x", Float64),
            ("y", Float64),
            ("z", Float64),
        ]))
        .unwrap();
        assert_eq!(layout.color, Some([0, 1, 2]));
        assert_eq!(layout.position, [3, 4, 5]);
        assert_eq!(layout.field(4), (Float64, 11));
    }

    #[test]
    fn test_long_color_name_wins() {
        use ScalarKind::*;
        let layout = FieldLayout::resolve(&fields(&[
            ("x", Float32),
            ("y", Float32),
            ("z", Float32),
            ("r", Uint8),
            ("red", Uint8),
            ("green", Uint8),
            ("blue", Uint8),
        ]))
        .unwrap();
        assert_eq!(layout.color, Some([4, 5, 6]));
    }

    #[test]
    fn test_partial_color_disables_color() {
        use ScalarKind::*;
        let layout = FieldLayout::resolve(&fields(&[
            ("x", Float32),
            ("y", Float32),
            ("z", Float32),
            ("red", Uint8),
            ("green", Uint8),
        ]))
        .unwrap();
        assert!(!layout.has_color());
        assert_eq!(layout.min_tokens(), 3);
    }

    #[test]
    fn test_coordinates_are_case_sensitive() {
        use ScalarKind::*;
        let err = FieldLayout::resolve(&fields(&[("X", Float32), ("y", Float32), ("Z", Float32)]))
            .unwrap_err();
        match err {
            Error::MissingCoordinateFields(names) => assert_eq!(names, "x, z"),
            other => panic!("unexpected error: {other}"),
        }
    }
}
