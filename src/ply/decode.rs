//! Vertex record decoding.
//!
//! Both decoders are iterators over [`RecordOutcome`]s. A record that cannot
//! be turned into a point is reported as [`RecordOutcome::Malformed`] and the
//! iteration carries on; only I/O failures end it with an error.

use std::io::{self, BufRead, ErrorKind, Read};

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use smallvec::SmallVec;
use tracing::{trace, warn};

use super::format::Encoding;
use super::layout::FieldLayout;
use crate::point::{color_byte, Record};
use crate::util::Result;

/// Result of examining one record.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum RecordOutcome {
    Point(Record),
    /// The record was examined but did not yield a usable point.
    Malformed,
}

impl RecordOutcome {
    pub fn point(self) -> Option<Record> {
        match self {
            Self::Point(record) => Some(record),
            Self::Malformed => None,
        }
    }
}

fn build_point(position: [f64; 3], color: Option<[f64; 3]>, default_color: [u8; 3]) -> RecordOutcome {
    if !position.iter().all(|v| v.is_finite()) {
        return RecordOutcome::Malformed;
    }
    let color = match color {
        Some(c) if c.iter().all(|v| v.is_finite()) => c.map(color_byte),
        Some(_) => return RecordOutcome::Malformed,
        None => default_color,
    };
    let [x, y, z] = position;
    RecordOutcome::Point(Record::new(x, y, z, color))
}

// ============================================================================
// ASCII
// ============================================================================

/// Decoder for whitespace separated text records.
///
/// Blank lines are not records. Every other line counts as examined, whether
/// or not it parses.
pub struct AsciiRecords<R> {
    reader: R,
    layout: FieldLayout,
    default_color: [u8; 3],
    skip: u64,
    limit: Option<u64>,
    examined: u64,
    line: Vec<u8>,
}

impl<R: BufRead> AsciiRecords<R> {
    /// Create a decoder reading from the first byte after the header.
    pub fn new(reader: R, layout: FieldLayout, default_color: [u8; 3]) -> Self {
        Self {
            reader,
            layout,
            default_color,
            skip: 0,
            limit: None,
            examined: 0,
            line: Vec::new(),
        }
    }

    /// Skip this many non-blank lines before the first vertex.
    pub fn skip_rows(mut self, rows: u64) -> Self {
        self.skip = rows;
        self
    }

    /// Stop after this many vertex lines.
    pub fn limit(mut self, rows: u64) -> Self {
        self.limit = Some(rows);
        self
    }

    /// Number of non-blank vertex lines examined so far.
    pub fn examined(&self) -> u64 {
        self.examined
    }

    fn parse_line(&self, text: &str) -> RecordOutcome {
        let tokens: SmallVec<[&str; 16]> = text.split_whitespace().collect();
        if tokens.len() < self.layout.min_tokens() {
            trace!("line with {} tokens skipped", tokens.len());
            return RecordOutcome::Malformed;
        }

        let parse = |idx: usize| tokens[idx].parse::<f64>().ok();

        let [ix, iy, iz] = self.layout.position;
        let (Some(x), Some(y), Some(z)) = (parse(ix), parse(iy), parse(iz)) else {
            return RecordOutcome::Malformed;
        };

        let color = match self.layout.color {
            Some([ir, ig, ib]) => match (parse(ir), parse(ig), parse(ib)) {
                (Some(r), Some(g), Some(b)) => Some([r, g, b]),
                _ => return RecordOutcome::Malformed,
            },
            None => None,
        };

        build_point([x, y, z], color, self.default_color)
    }
}

impl<R: BufRead> Iterator for AsciiRecords<R> {
    type Item = Result<RecordOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.limit.is_some_and(|limit| self.examined >= limit) {
                return None;
            }

            self.line.clear();
            match self.reader.read_until(b'\n', &mut self.line) {
                Ok(0) => return None,
                Ok(_) => {}
                Err(e) => return Some(Err(e.into())),
            }

            if self.line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            if self.skip > 0 {
                self.skip -= 1;
                continue;
            }

            self.examined += 1;
            let outcome = match std::str::from_utf8(&self.line) {
                Ok(text) => self.parse_line(text),
                Err(_) => RecordOutcome::Malformed,
            };
            return Some(Ok(outcome));
        }
    }
}

// ============================================================================
// Binary
// ============================================================================

/// Decoder for fixed-width binary records.
///
/// Reads at most the declared number of records. A short read ends the
/// iteration without an error and sets [`truncated`](Self::truncated).
pub struct BinaryRecords<R> {
    reader: R,
    layout: FieldLayout,
    big_endian: bool,
    default_color: [u8; 3],
    remaining: u64,
    read: u64,
    truncated: bool,
    chunk: Vec<u8>,
}

impl<R: Read> BinaryRecords<R> {
    /// Create a decoder reading from the first vertex record.
    ///
    /// `encoding` must be one of the binary variants; `Ascii` is read as
    /// little-endian.
    pub fn new(reader: R, layout: FieldLayout, encoding: Encoding, count: u64, default_color: [u8; 3]) -> Self {
        let width = layout.record_width();
        Self {
            reader,
            layout,
            big_endian: encoding == Encoding::BinaryBigEndian,
            default_color,
            remaining: count,
            read: 0,
            truncated: false,
            chunk: vec![0u8; width],
        }
    }

    /// True once the body ended before the declared record count.
    pub fn truncated(&self) -> bool {
        self.truncated
    }

    /// Number of full records read so far.
    pub fn records_read(&self) -> u64 {
        self.read
    }

    fn decode<B: ByteOrder>(&self) -> RecordOutcome {
        let value = |idx: usize| {
            let (kind, offset) = self.layout.field(idx);
            kind.read::<B>(&self.chunk[offset..])
        };
        let position = self.layout.position.map(value);
        let color = self.layout.color.map(|c| c.map(value));
        build_point(position, color, self.default_color)
    }
}

impl<R: Read> Iterator for BinaryRecords<R> {
    type Item = Result<RecordOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        let filled = match read_full(&mut self.reader, &mut self.chunk) {
            Ok(n) => n,
            Err(e) => return Some(Err(e.into())),
        };
        if filled < self.chunk.len() {
            warn!(
                "binary body ends after {} of {} declared records ({} trailing bytes dropped)",
                self.read,
                self.read + self.remaining,
                filled
            );
            self.truncated = true;
            self.remaining = 0;
            return None;
        }

        self.remaining -= 1;
        self.read += 1;
        let outcome = if self.big_endian {
            self.decode::<BigEndian>()
        } else {
            self.decode::<LittleEndian>()
        };
        Some(Ok(outcome))
    }
}

/// Read until `buf` is full or the reader is exhausted.
fn read_full<R: Read>(reader: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ply::FieldDescriptor;
    use crate::util::ScalarKind;
    use std::io::Cursor;

    fn xyz_rgb_layout(coord: ScalarKind) -> FieldLayout {
        let fields: Vec<FieldDescriptor> = [
            ("x", coord),
            ("y", coord),
            ("z", coord),
            ("red", ScalarKind::Uint8),
            ("green", ScalarKind::Uint8),
            ("blue", ScalarKind::Uint8),
        ]
        .iter()
        .map(|(n, k)| FieldDescriptor::new(*n, *k))
        .collect();
        FieldLayout::resolve(&fields).unwrap()
    }

    fn collect<I: Iterator<Item = Result<RecordOutcome>>>(iter: I) -> Vec<RecordOutcome> {
        iter.map(|r| r.unwrap()).collect()
    }

    #[test]
    fn test_ascii_records() {
        let body = "1 2 3 255 0 0\n\n  \n4.5 -5 6e1 0 255 0\n";
        let records = AsciiRecords::new(
            Cursor::new(body.as_bytes()),
            xyz_rgb_layout(ScalarKind::Float32),
            [128; 3],
        );
        let out = collect(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], RecordOutcome::Point(Record::new(1.0, 2.0, 3.0, [255, 0, 0])));
        assert_eq!(out[1], RecordOutcome::Point(Record::new(4.5, -5.0, 60.0, [0, 255, 0])));
    }

    #[test]
    fn test_ascii_malformed_lines() {
        let body = "1 2 3 4 5 6\n1 2 abc 4 5 6\n1 2 3\n1 2 3 4 5 6 7 8\nnan 0 0 0 0 0\n";
        let mut records = AsciiRecords::new(
            Cursor::new(body.as_bytes()),
            xyz_rgb_layout(ScalarKind::Float32),
            [128; 3],
        );
        let out = collect(records.by_ref());
        assert_eq!(out.len(), 5);
        assert!(out[0].point().is_some());
        assert_eq!(out[1], RecordOutcome::Malformed);
        assert_eq!(out[2], RecordOutcome::Malformed);
        assert!(out[3].point().is_some());
        assert_eq!(out[4], RecordOutcome::Malformed);
        assert_eq!(records.examined(), 5);
    }

    #[test]
    fn test_ascii_skip_and_limit() {
        let body = "9 9 9\n\n1 1 1 1 1 1\n2 2 2 2 2 2\n3 0 1 2\n";
        let records = AsciiRecords::new(
            Cursor::new(body.as_bytes()),
            xyz_rgb_layout(ScalarKind::Float32),
            [128; 3],
        )
        .skip_rows(1)
        .limit(2);
        let out = collect(records);
        assert_eq!(out.len(), 2);
        assert_eq!(out[1].point().unwrap().x(), 2.0);
    }

    #[test]
    fn test_ascii_default_color() {
        let fields: Vec<FieldDescriptor> = ["x", "y", "z"]
            .iter()
            .map(|n| FieldDescriptor::new(*n, ScalarKind::Float32))
            .collect();
        let layout = FieldLayout::resolve(&fields).unwrap();
        let out = collect(AsciiRecords::new(Cursor::new(&b"1 2 3\n"[..]), layout, [128; 3]));
        assert_eq!(out[0].point().unwrap().color, [128, 128, 128]);
    }

    fn binary_body(points: &[([f32; 3], [u8; 3])], big: bool) -> Vec<u8> {
        let mut out = Vec::new();
        for (p, c) in points {
            for v in p {
                if big {
                    out.extend_from_slice(&v.to_be_bytes());
                } else {
                    out.extend_from_slice(&v.to_le_bytes());
                }
            }
            out.extend_from_slice(c);
        }
        out
    }

    #[test]
    fn test_binary_byte_orders_agree() {
        let points = [([1.5f32, -2.0, 3.25], [1u8, 2, 3]), ([0.0, 0.0, 1.0], [4, 5, 6])];
        let le = collect(BinaryRecords::new(
            Cursor::new(binary_body(&points, false)),
            xyz_rgb_layout(ScalarKind::Float32),
            Encoding::BinaryLittleEndian,
            2,
            [128; 3],
        ));
        let be = collect(BinaryRecords::new(
            Cursor::new(binary_body(&points, true)),
            xyz_rgb_layout(ScalarKind::Float32),
            Encoding::BinaryBigEndian,
            2,
            [128; 3],
        ));
        assert_eq!(le, be);
        assert_eq!(le[0], RecordOutcome::Point(Record::new(1.5, -2.0, 3.25, [1, 2, 3])));
    }

    #[test]
    fn test_binary_truncated_body() {
        let points = [([1.0f32, 2.0, 3.0], [1u8, 1, 1]); 3];
        let mut body = binary_body(&points, false);
        body.truncate(body.len() - 4);
        let mut records = BinaryRecords::new(
            Cursor::new(body),
            xyz_rgb_layout(ScalarKind::Float32),
            Encoding::BinaryLittleEndian,
            3,
            [128; 3],
        );
        let out = collect(records.by_ref());
        assert_eq!(out.len(), 2);
        assert!(records.truncated());
        assert_eq!(records.records_read(), 2);
    }

    #[test]
    fn test_binary_stops_at_declared_count() {
        let points = [([1.0f32, 2.0, 3.0], [1u8, 1, 1]); 3];
        let mut records = BinaryRecords::new(
            Cursor::new(binary_body(&points, false)),
            xyz_rgb_layout(ScalarKind::Float32),
            Encoding::BinaryLittleEndian,
            2,
            [128; 3],
        );
        assert_eq!(collect(records.by_ref()).len(), 2);
        assert!(!records.truncated());
    }
}
