//! Random access to chunk-compressed resources
//!
//! Disk-image and archive containers split a resource into chunks of a fixed
//! uncompressed size, each compressed on its own with XPRESS or LZX, so that
//! any offset can be reached by decompressing a single chunk. A chunk whose
//! compressed length equals its uncompressed length is stored as is.

use std::io::{self, Read, Seek, SeekFrom};

use log::debug;

pub use self::section::Section;
pub use self::table::ChunkTable;
use crate::error::Result;
use crate::{lzx, xpress};

mod section;
mod table;

/// The chunk size used by most containers
pub const DEFAULT_CHUNK_SIZE: u32 = 32768;

/// The compression method shared by every chunk of a resource
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ChunkMethod {
    /// XPRESS Huffman
    Xpress,
    /// LZX
    Lzx {
        /// The window size as a power of two, `15..=21`
        window_bits: u32,
        /// The `E8` call translation size, `0` disables the translation
        translation_size: u32,
    },
}

impl ChunkMethod {
    /// LZX with a 32 KiB window and the translation size used by WIM images
    pub fn lzx_default() -> Self {
        ChunkMethod::Lzx {
            window_bits: 15,
            translation_size: 12_000_000,
        }
    }
}

enum Chunk {
    Stored,
    Decoded(Vec<u8>),
}

/// A seekable reader over the uncompressed contents of a chunked resource
///
/// The whole of `source` is the compressed section: the chunk table followed
/// by the chunk data. Wrap it in a [`Section`] when it is part of a bigger
/// file. Only the chunk being read is kept in memory.
///
/// ```rust
/// use std::io::{Cursor, Read, Seek, SeekFrom};
///
/// use archive_codecs::{ChunkMethod, ChunkedReader};
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// // two stored chunks of 4 and 2 bytes, the second one starting at offset 4
/// let section = b"\x04\x00\x00\x00abcdef".to_vec();
/// let mut reader = ChunkedReader::new(Cursor::new(section), 4, 6, ChunkMethod::Xpress)?;
///
/// reader.seek(SeekFrom::Start(3))?;
/// let mut out = String::new();
/// reader.read_to_string(&mut out)?;
/// assert_eq!(out, "def");
/// # Ok(())
/// # }
/// ```
pub struct ChunkedReader<R> {
    source: R,
    table: ChunkTable,
    method: ChunkMethod,

    position: u64,
    current: Option<(usize, Chunk)>,
}

impl<R: Read + Seek> ChunkedReader<R> {
    /// Read the chunk table of `source`
    ///
    /// # Errors
    ///
    /// Returns an error if the chunk table is truncated or its offsets don't
    /// fit in the section.
    pub fn new(
        mut source: R,
        chunk_size: u32,
        uncompressed_size: u64,
        method: ChunkMethod,
    ) -> Result<Self> {
        let section_len = source.seek(SeekFrom::End(0))?;
        source.seek(SeekFrom::Start(0))?;

        let table = ChunkTable::read(&mut source, section_len, chunk_size, uncompressed_size)?;
        debug!(
            "chunked resource: {} chunks of {} bytes, {:?}",
            table.len(),
            chunk_size,
            method
        );

        Ok(Self {
            source,
            table,
            method,

            position: 0,
            current: None,
        })
    }

    /// The uncompressed size of the resource
    pub fn len(&self) -> u64 {
        self.table.uncompressed_size()
    }

    /// Returns `true` if the resource is empty
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// The chunk table read from the section
    pub fn table(&self) -> &ChunkTable {
        &self.table
    }

    /// Get back the underlying source
    pub fn into_inner(self) -> R {
        self.source
    }

    fn read_chunked(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() || self.position >= self.table.uncompressed_size() {
            return Ok(0);
        }

        let chunk_size = u64::from(self.table.chunk_size());
        let index = (self.position / chunk_size) as usize;
        let in_chunk = (self.position % chunk_size) as usize;

        let chunk = match self.current.take() {
            Some((open, chunk)) if open == index => chunk,
            _ => self.open_chunk(index)?,
        };

        let read = match &chunk {
            Chunk::Stored => {
                let (start, len) = self.table.compressed_range(index);
                let mut section = Section::new(&mut self.source, start, len);
                section.seek(SeekFrom::Start(in_chunk as u64))?;
                section.read(buf)?
            }
            Chunk::Decoded(data) => {
                let available = &data[in_chunk..];
                let n = available.len().min(buf.len());
                buf[..n].copy_from_slice(&available[..n]);
                n
            }
        };

        self.current = Some((index, chunk));
        self.position += read as u64;
        Ok(read)
    }

    fn open_chunk(&mut self, index: usize) -> Result<Chunk> {
        let (start, compressed_len) = self.table.compressed_range(index);
        let uncompressed_len = self.table.uncompressed_len(index);

        if compressed_len == uncompressed_len as u64 {
            debug!("chunk {}: {} bytes stored", index, uncompressed_len);
            return Ok(Chunk::Stored);
        }

        debug!(
            "chunk {}: {} -> {} bytes",
            index, compressed_len, uncompressed_len
        );
        let section = Section::new(&mut self.source, start, compressed_len);
        let data = match self.method {
            ChunkMethod::Xpress => xpress::decompress(section, uncompressed_len)?,
            ChunkMethod::Lzx {
                window_bits,
                translation_size,
            } => lzx::decompress(section, window_bits, translation_size, uncompressed_len)?,
        };

        Ok(Chunk::Decoded(data))
    }
}

impl<R: Read + Seek> Read for ChunkedReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_chunked(buf)?)
    }
}

impl<R: Read + Seek> Seek for ChunkedReader<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = section::seek_target(self.position, self.len(), pos)?;
        Ok(self.position)
    }
}
