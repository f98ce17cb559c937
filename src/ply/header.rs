//! PLY header parsing.
//!
//! The header is read line by line from a [`BufRead`] positioned at offset 0.
//! Reading stops right after the `end_header` line, so the reader is left at
//! the first byte of the body and [`HeaderInfo::data_offset`] records that
//! position.

use std::io::BufRead;

use tracing::{debug, trace, warn};

use super::format::*;
use crate::util::{Error, Result, ScalarKind};

/// One property of the vertex element.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: ScalarKind,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, kind: ScalarKind) -> Self {
        Self { name: name.into(), kind }
    }
}

/// An `element` directive, vertex or not.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementDecl {
    pub name: String,
    /// Declared number of rows.
    pub count: u64,
    /// Bytes per binary row, `None` when the element has list properties.
    pub row_width: Option<usize>,
}

/// Everything the decoder needs to know about the body.
#[derive(Clone, Debug)]
pub struct HeaderInfo {
    pub encoding: Encoding,
    /// Declared vertex count. The body may hold fewer records.
    pub record_count: u64,
    /// Vertex properties in record order.
    pub fields: Vec<FieldDescriptor>,
    /// Byte offset of the first byte after the `end_header` line.
    pub data_offset: u64,
    /// All elements in declaration order.
    pub elements: Vec<ElementDecl>,
    /// Index of the vertex element in `elements`.
    pub vertex_element: Option<usize>,
}

impl HeaderInfo {
    /// Size in bytes of one binary vertex record.
    pub fn record_width(&self) -> usize {
        self.fields.iter().map(|f| f.kind.num_bytes()).sum()
    }

    /// Elements declared before the vertex element.
    pub fn leading_elements(&self) -> &[ElementDecl] {
        match self.vertex_element {
            Some(idx) => &self.elements[..idx],
            None => &self.elements,
        }
    }

    /// True when elements (faces, edges, ...) follow the vertex element.
    pub fn has_trailing_elements(&self) -> bool {
        self.vertex_element
            .is_some_and(|idx| idx + 1 < self.elements.len())
    }

    /// Number of text lines preceding the vertex rows in an ASCII body.
    ///
    /// Saturates, so absurd counts just skip the whole body.
    pub fn leading_rows(&self) -> u64 {
        self.leading_elements()
            .iter()
            .fold(0u64, |rows, e| rows.saturating_add(e.count))
    }

    /// Byte offset of the first vertex record in a binary body.
    pub fn vertex_offset(&self) -> Result<u64> {
        let mut offset = self.data_offset;
        for element in self.leading_elements() {
            let width = element.row_width.ok_or_else(|| {
                Error::Unsupported(format!(
                    "element '{}' with list properties precedes the vertex element",
                    element.name
                ))
            })?;
            let bytes = element
                .count
                .checked_mul(width as u64)
                .and_then(|b| b.checked_add(offset))
                .ok_or_else(|| Error::invalid(format!("element '{}' is too large", element.name)))?;
            offset = bytes;
        }
        Ok(offset)
    }
}

/// Parse the header from a reader positioned at the start of the file.
pub fn read_header<R: BufRead>(reader: &mut R) -> Result<HeaderInfo> {
    let mut buf = Vec::new();
    let mut offset = 0u64;
    let mut line_no = 0usize;

    let mut encoding = None;
    let mut elements: Vec<ElementDecl> = Vec::new();
    let mut vertex_element = None;
    let mut fields = Vec::new();

    loop {
        buf.clear();
        let n = reader.read_until(b'\n', &mut buf)?;
        if n == 0 {
            return Err(if line_no == 0 {
                Error::invalid("file is empty")
            } else {
                Error::invalid(format!("header is not terminated by '{END_HEADER}'"))
            });
        }
        offset += n as u64;
        line_no += 1;

        let line = std::str::from_utf8(&buf)
            .map_err(|_| Error::invalid(format!("header line {line_no} is not valid UTF-8")))?
            .trim();

        if line_no == 1 {
            if line != PLY_MAGIC {
                return Err(Error::invalid(format!("first line is not '{PLY_MAGIC}'")));
            }
            continue;
        }

        if line == END_HEADER {
            break;
        }

        let mut parts = line.split_whitespace();
        let Some(keyword) = parts.next() else {
            continue;
        };

        match keyword {
            FORMAT_KEYWORD => {
                let token = parts
                    .next()
                    .ok_or_else(|| Error::invalid(format!("line {line_no}: format directive without encoding")))?;
                let parsed = Encoding::from_token(token)
                    .ok_or_else(|| Error::invalid(format!("unknown encoding '{token}'")))?;
                debug!("PLY encoding: {}", parsed);
                encoding = Some(parsed);
            }
            ELEMENT_KEYWORD => {
                let (Some(name), Some(count)) = (parts.next(), parts.next()) else {
                    return Err(Error::invalid(format!("line {line_no}: malformed element directive")));
                };
                let count = count.parse::<u64>().map_err(|e| {
                    Error::invalid(format!("line {line_no}: invalid element count '{count}': {e}"))
                })?;
                if name == VERTEX_ELEMENT && vertex_element.is_none() {
                    vertex_element = Some(elements.len());
                }
                elements.push(ElementDecl {
                    name: name.to_string(),
                    count,
                    row_width: Some(0),
                });
            }
            PROPERTY_KEYWORD => {
                let tokens: Vec<&str> = parts.collect();
                let in_vertex = !elements.is_empty() && vertex_element == Some(elements.len() - 1);
                let Some(element) = elements.last_mut() else {
                    warn!("line {}: property before any element, ignored", line_no);
                    continue;
                };
                let (Some(&type_token), Some(&name)) = (tokens.first(), tokens.last()) else {
                    return Err(Error::invalid(format!("line {line_no}: malformed property directive")));
                };
                if tokens.len() < 2 {
                    return Err(Error::invalid(format!("line {line_no}: property '{name}' has no type")));
                }
                let kind = ScalarKind::from_token(type_token);

                // `list` is not a scalar token, so list rows lose their fixed width here.
                element.row_width = match (element.row_width, kind) {
                    (Some(width), Some(kind)) => Some(width + kind.num_bytes()),
                    _ => None,
                };

                if in_vertex {
                    if type_token == LIST_KEYWORD {
                        warn!("list property '{}' in the vertex element is read as a float", name);
                    }
                    let kind = kind.unwrap_or_else(|| {
                        warn!(
                            "unknown property type '{}' for '{}', reading it as float",
                            type_token, name
                        );
                        ScalarKind::Float32
                    });
                    fields.push(FieldDescriptor::new(name, kind));
                }
            }
            COMMENT_KEYWORD | OBJ_INFO_KEYWORD => {}
            other => trace!("line {}: ignoring header directive '{}'", line_no, other),
        }
    }

    let encoding = encoding.ok_or_else(|| Error::invalid("format directive missing"))?;
    let record_count = vertex_element.map_or(0, |idx| elements[idx].count);

    // The lossy float fallback keeps binary offsets computable.
    if let Some(idx) = vertex_element {
        elements[idx].row_width = Some(fields.iter().map(|f| f.kind.num_bytes()).sum());
    }

    debug!(
        "PLY header: {} vertices, {} fields, {} elements, body at byte {}",
        record_count,
        fields.len(),
        elements.len(),
        offset
    );

    Ok(HeaderInfo {
        encoding,
        record_count,
        fields,
        data_offset: offset,
        elements,
        vertex_element,
    })
}
