//! bzip2 stream header

use crate::error::{Error, Result};

/// The `BZh` magic every bzip2 stream starts with
pub const MAGIC: [u8; 3] = *b"BZh";

/// A bzip2 header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    raw_blocksize: u8,
    max_blocksize: u32,
}

impl Header {
    /// Parse a bzip2 header
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if the magic isn't `BZh` or the
    /// blocksize digit isn't `1..=9`
    pub fn parse(buf: [u8; 4]) -> Result<Self> {
        let signature = &buf[..2];
        if signature != b"BZ" {
            return Err(Error::MalformedHeader("invalid file signature"));
        }

        let version = buf[2];
        if version != b'h' {
            return Err(Error::MalformedHeader(
                "unsupported bzip2 version, only huffman streams are supported",
            ));
        }

        match buf[3] {
            hundred_k_blocksize @ b'1'..=b'9' => {
                Self::from_raw_blocksize(hundred_k_blocksize - b'0')
            }
            _ => Err(Error::MalformedHeader("invalid block-size")),
        }
    }

    /// Construct `Header` from the raw blocksize
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHeader`] if `raw_blocksize` isn't `1..=9`
    pub fn from_raw_blocksize(raw_blocksize: u8) -> Result<Self> {
        if !(1..=9).contains(&raw_blocksize) {
            return Err(Error::MalformedHeader("invalid block-size"));
        }

        let max_blocksize = 100 * 1000 * u32::from(raw_blocksize);
        Ok(Self {
            raw_blocksize,
            max_blocksize,
        })
    }

    /// The raw blocksize, as declared in the bzip2 header
    ///
    /// The returned value is always `1..=9`
    pub fn raw_blocksize(&self) -> u8 {
        self.raw_blocksize
    }

    /// The maximum blocksize
    ///
    /// The returned value is always `100000..=900000`
    pub fn max_blocksize(&self) -> u32 {
        self.max_blocksize
    }
}
