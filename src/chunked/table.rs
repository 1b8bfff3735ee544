use std::io::{self, Read};

use crate::error::{Error, Result};

/// The offsets of the compressed chunks of a resource
///
/// The section starts with one little-endian offset for every chunk but the
/// first, counted from the end of the table. Offsets are 8 bytes wide when the
/// uncompressed size doesn't fit in 32 bits, 4 bytes otherwise.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTable {
    chunk_size: u32,
    uncompressed_size: u64,
    data_start: u64,
    // start of every chunk, followed by the end of the section
    offsets: Vec<u64>,
}

impl ChunkTable {
    /// Read the table at the start of a section of `section_len` bytes
    pub fn read<R: Read>(
        mut reader: R,
        section_len: u64,
        chunk_size: u32,
        uncompressed_size: u64,
    ) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::MalformedHeader("chunk size must not be zero"));
        }

        let chunk_size_64 = u64::from(chunk_size);
        let num_chunks =
            uncompressed_size / chunk_size_64 + u64::from(uncompressed_size % chunk_size_64 != 0);
        let entry_size = if uncompressed_size > u64::from(u32::MAX) {
            8
        } else {
            4
        };

        let data_start = num_chunks
            .saturating_sub(1)
            .checked_mul(entry_size)
            .filter(|&table_len| table_len <= section_len)
            .ok_or(Error::TruncatedInput("chunk table"))?;
        let data_len = section_len - data_start;

        let mut raw = vec![0u8; data_start as usize];
        reader.read_exact(&mut raw).map_err(|err| match err.kind() {
            io::ErrorKind::UnexpectedEof => Error::TruncatedInput("chunk table"),
            _ => Error::Io(err),
        })?;

        let mut offsets = Vec::with_capacity(num_chunks as usize + 1);
        if num_chunks > 0 {
            offsets.push(0);
        }
        for entry in raw.chunks_exact(entry_size as usize) {
            let offset = entry
                .iter()
                .rev()
                .fold(0u64, |offset, &byte| (offset << 8) | u64::from(byte));
            offsets.push(offset);
        }
        offsets.push(data_len);

        if offsets.windows(2).any(|pair| pair[0] > pair[1]) {
            return Err(Error::MalformedHeader(
                "chunk offsets out of order or past the end of the section",
            ));
        }

        Ok(Self {
            chunk_size,
            uncompressed_size,
            data_start,
            offsets,
        })
    }

    /// The number of chunks
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Returns `true` if the resource is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The uncompressed size of every chunk but the last
    pub fn chunk_size(&self) -> u32 {
        self.chunk_size
    }

    /// The uncompressed size of the whole resource
    pub fn uncompressed_size(&self) -> u64 {
        self.uncompressed_size
    }

    /// The start of the chunk `index` inside the section and its compressed
    /// length
    pub fn compressed_range(&self, index: usize) -> (u64, u64) {
        let start = self.offsets[index];
        let end = self.offsets[index + 1];
        (self.data_start + start, end - start)
    }

    /// The uncompressed length of the chunk `index`
    pub fn uncompressed_len(&self, index: usize) -> usize {
        let start = index as u64 * u64::from(self.chunk_size);
        (self.uncompressed_size - start).min(u64::from(self.chunk_size)) as usize
    }
}
