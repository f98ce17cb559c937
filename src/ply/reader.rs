//! PLY file reader.

use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use memmap2::Mmap;
use tracing::debug;

use super::decode::{AsciiRecords, BinaryRecords, RecordOutcome};
use super::format::Encoding;
use super::header::{read_header, HeaderInfo};
use super::layout::FieldLayout;
use crate::util::{Error, Result};

/// An open PLY file with its header parsed and its fields resolved.
///
/// The body is served either through the same buffered reader that parsed
/// the header or, for binary files, through a memory map.
pub struct PlyReader {
    path: PathBuf,
    header: HeaderInfo,
    layout: FieldLayout,
    file: BufReader<File>,
    size: u64,
    use_mmap: bool,
}

impl PlyReader {
    /// Open a file, memory mapping binary bodies.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_opts(path, true)
    }

    /// Open a file with optional memory mapping.
    pub fn open_opts(path: impl AsRef<Path>, use_mmap: bool) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            if e.kind() == io::ErrorKind::NotFound {
                Error::FileNotFound(path.to_path_buf())
            } else {
                Error::Io(e)
            }
        })?;
        let size = file.metadata()?.len();

        let mut file = BufReader::new(file);
        let header = read_header(&mut file)?;
        let layout = FieldLayout::resolve(&header.fields)?;

        debug!(
            "opened {}: {} bytes, {}, {} declared vertices",
            path.display(),
            size,
            header.encoding,
            header.record_count
        );

        Ok(Self {
            path: path.to_path_buf(),
            header,
            layout,
            file,
            size,
            use_mmap,
        })
    }

    #[inline]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[inline]
    pub fn header(&self) -> &HeaderInfo {
        &self.header
    }

    #[inline]
    pub fn layout(&self) -> &FieldLayout {
        &self.layout
    }

    /// Total file size in bytes.
    #[inline]
    pub fn size(&self) -> u64 {
        self.size
    }

    /// Iterate over the vertex records.
    ///
    /// Points without colour fields get `default_color`.
    pub fn records(&mut self, default_color: [u8; 3]) -> Result<Records<'_>> {
        let header = &self.header;
        let layout = self.layout.clone();

        match header.encoding {
            Encoding::Ascii => {
                self.file.seek(SeekFrom::Start(header.data_offset))?;
                let mut records = AsciiRecords::new(&mut self.file, layout, default_color)
                    .skip_rows(header.leading_rows());
                if header.has_trailing_elements() {
                    records = records.limit(header.record_count);
                }
                Ok(Records::Ascii(records))
            }
            encoding => {
                let offset = header.vertex_offset()?;
                let mapped = self.use_mmap && self.size > 0;
                let body = if mapped {
                    // Safety: the map is read-only and dropped with the iterator.
                    let map = unsafe { Mmap::map(self.file.get_ref()) }
                        .map_err(|e| Error::MmapFailed(e.to_string()))?;
                    let pos = usize::try_from(offset).unwrap_or(usize::MAX).min(map.len());
                    Body::Mapped { map, pos }
                } else {
                    self.file.seek(SeekFrom::Start(offset))?;
                    Body::Buffered(&mut self.file)
                };
                debug!("binary body at byte {}, mapped: {}", offset, mapped);
                Ok(Records::Binary(BinaryRecords::new(
                    body,
                    layout,
                    encoding,
                    header.record_count,
                    default_color,
                )))
            }
        }
    }
}

/// Source of binary record bytes.
pub enum Body<'a> {
    Buffered(&'a mut BufReader<File>),
    Mapped { map: Mmap, pos: usize },
}

impl Read for Body<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Buffered(reader) => reader.read(buf),
            Self::Mapped { map, pos } => {
                let rest = &map[*pos..];
                let n = rest.len().min(buf.len());
                buf[..n].copy_from_slice(&rest[..n]);
                *pos += n;
                Ok(n)
            }
        }
    }
}

/// Vertex records of an open file.
pub enum Records<'a> {
    Ascii(AsciiRecords<&'a mut BufReader<File>>),
    Binary(BinaryRecords<Body<'a>>),
}

impl Records<'_> {
    /// True when a binary body ended before the declared record count.
    pub fn truncated(&self) -> bool {
        match self {
            Self::Ascii(_) => false,
            Self::Binary(records) => records.truncated(),
        }
    }
}

impl Iterator for Records<'_> {
    type Item = Result<RecordOutcome>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Ascii(records) => records.next(),
            Self::Binary(records) => records.next(),
        }
    }
}
