//! zlib stream framing around raw DEFLATE
//!
//! The DEFLATE data itself is inflated by [`flate2`]; this module checks the
//! two byte zlib header and the Adler-32 trailer.

use std::io::{self, BufReader, Read};

use flate2::bufread::DeflateDecoder;

use crate::error::{Checksum, Error, Result};

const MOD_ADLER: u32 = 65521;
// the most bytes that can be summed before `b` may overflow
const NMAX: usize = 5552;

/// A running Adler-32 checksum
#[derive(Debug, Clone, Copy)]
pub struct Adler32 {
    a: u32,
    b: u32,
}

impl Adler32 {
    /// The checksum of no bytes
    pub fn new() -> Self {
        Self { a: 1, b: 0 }
    }

    /// Add `bytes` to the checksum
    pub fn update(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(NMAX) {
            for &byte in chunk {
                self.a += u32::from(byte);
                self.b += self.a;
            }
            self.a %= MOD_ADLER;
            self.b %= MOD_ADLER;
        }
    }

    /// The checksum of every byte added so far
    pub fn finish(&self) -> u32 {
        (self.b << 16) | self.a
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

enum State {
    Header,
    Body,
    Done,
}

/// A reader inflating a zlib stream and verifying its Adler-32 trailer
///
/// ```rust
/// use std::io::{Read, Write};
///
/// use archive_codecs::ZlibReader;
/// use flate2::write::ZlibEncoder;
/// use flate2::Compression;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
/// encoder.write_all(b"hello hello hello")?;
/// let compressed = encoder.finish()?;
///
/// let mut out = Vec::new();
/// ZlibReader::new(compressed.as_slice()).read_to_end(&mut out)?;
/// assert_eq!(out, b"hello hello hello");
/// # Ok(())
/// # }
/// ```
pub struct ZlibReader<R> {
    inner: DeflateDecoder<BufReader<R>>,
    adler: Adler32,
    state: State,
}

impl<R: Read> ZlibReader<R> {
    /// Construct a new zlib reader from something implementing [`Read`]
    pub fn new(reader: R) -> Self {
        Self {
            inner: DeflateDecoder::new(BufReader::new(reader)),
            adler: Adler32::new(),
            state: State::Header,
        }
    }

    /// Get back the underlying reader
    ///
    /// Bytes buffered past the current position are lost.
    pub fn into_inner(self) -> R {
        self.inner.into_inner().into_inner()
    }

    fn read_zlib(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match self.state {
                State::Header => {
                    let mut header = [0; 2];
                    read_exact(self.inner.get_mut(), &mut header, "zlib header")?;
                    check_header(header)?;

                    self.state = State::Body;
                }
                State::Body => {
                    let read = self.inner.read(buf)?;
                    if read > 0 {
                        self.adler.update(&buf[..read]);
                        return Ok(read);
                    }

                    let mut trailer = [0; 4];
                    read_exact(self.inner.get_mut(), &mut trailer, "adler-32 trailer")?;
                    let expected = u32::from_be_bytes(trailer);
                    let computed = self.adler.finish();
                    if expected != computed {
                        return Err(Error::ChecksumMismatch {
                            checksum: Checksum::Adler32,
                            expected,
                            computed,
                        });
                    }

                    self.state = State::Done;
                }
                State::Done => return Ok(0),
            }
        }
    }
}

impl<R: Read> Read for ZlibReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.read_zlib(buf)?)
    }
}

fn check_header([cmf, flg]: [u8; 2]) -> Result<()> {
    if u16::from_be_bytes([cmf, flg]) % 31 != 0 {
        return Err(Error::MalformedHeader("zlib header check bits"));
    }
    if cmf & 0x0f != 8 {
        return Err(Error::MalformedHeader("zlib compression method isn't deflate"));
    }
    if cmf >> 4 > 7 {
        return Err(Error::MalformedHeader("zlib window larger than 32 KiB"));
    }
    if flg & 0x20 != 0 {
        return Err(Error::UnsupportedFeature("zlib preset dictionary"));
    }
    Ok(())
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &'static str) -> Result<()> {
    reader.read_exact(buf).map_err(|err| match err.kind() {
        io::ErrorKind::UnexpectedEof => Error::TruncatedInput(what),
        _ => Error::Io(err),
    })
}
