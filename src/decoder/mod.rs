//! bzip2 decoding APIs

use std::io::Read;
use std::mem;

use log::{debug, warn};

use self::block::{Decoder as BlockDecoder, Reader as BlockReader, BLOCK_MAGIC, FINAL_MAGIC};
pub use self::reader::DecoderReader;
use crate::bitreader::{BitReader, MsbFirst};
use crate::crc;
use crate::error::{Checksum, Error, Result};
use crate::header::Header;

pub mod block;
mod reader;

/// A low-level **pull-based** bzip2 decoder
///
/// Every call to [`Decoder::read`] decodes as much as needed from the
/// underlying [`Read`]er. Blocks are decoded one ahead of the caller: as soon
/// as a block has been fully read its CRC is checked and the next block or
/// the stream footer is decoded, so a checksum failure is always reported by
/// the call that returned the last byte it covers.
///
/// After an error is returned the decoder yields no more data.
///
/// ```rust
/// use archive_codecs::decoder::Decoder;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let compressed_file: &[u8] = include_bytes!("../../tests/samplefiles/sample1.bz2").as_ref();
/// let mut output = Vec::new();
///
/// let mut decoder = Decoder::new(compressed_file);
///
/// let mut buf = [0; 1024];
/// loop {
///     match decoder.read(&mut buf)? {
///         0 => break,
///         n => output.extend_from_slice(&buf[..n]),
///     }
/// }
///
/// // `output` contains the decompressed file
/// let decompressed_file: &[u8] = include_bytes!("../../tests/samplefiles/sample1.ref").as_ref();
/// assert_eq!(output, decompressed_file);
/// #
/// # Ok(())
/// # }
/// ```
pub struct Decoder<R> {
    bits: BitReader<R, MsbFirst>,
    state: State,
    multistream: bool,

    stream_crc: u32,
    streams: u32,
    blocks: u64,
}

enum State {
    // at the start of the first stream
    Start,
    Block(BlockReader),
    Eof,
}

impl<R: Read> Decoder<R> {
    /// Construct a new [`Decoder`], decoding every concatenated bzip2 stream
    /// found in `reader`
    pub fn new(reader: R) -> Self {
        Self {
            bits: BitReader::new(reader),
            state: State::Start,
            multistream: true,

            stream_crc: 0,
            streams: 0,
            blocks: 0,
        }
    }

    /// Construct a new [`Decoder`] that stops after the first stream footer
    pub fn single_stream(reader: R) -> Self {
        Self {
            multistream: false,
            ..Self::new(reader)
        }
    }

    /// Read more decompressed data from this [`Decoder`]
    ///
    /// Returns `0` at the end of the last stream or if `buf` is empty.
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match mem::replace(&mut self.state, State::Eof) {
                State::Start => {
                    let header = self.read_header()?;
                    self.next_block(BlockDecoder::new(header))?;
                }
                State::Block(mut reader) => {
                    let read = reader.read(buf);

                    if reader.is_exhausted() {
                        self.finish_block(&reader)?;
                        self.next_block(reader.recycle())?;
                    } else {
                        self.state = State::Block(reader);
                    }

                    if read > 0 {
                        return Ok(read);
                    }
                }
                State::Eof => return Ok(0),
            }
        }
    }

    /// The number of streams whose footer has been checked so far
    pub fn streams(&self) -> u32 {
        self.streams
    }

    fn read_header(&mut self) -> Result<Header> {
        let raw = self.bits.read_u32(32)?;
        if self.bits.overrun() {
            return Err(Error::TruncatedInput("stream header"));
        }

        let header = Header::parse(raw.to_be_bytes())?;
        debug!(
            "bzip2 stream {} header: max block size {}",
            self.streams,
            header.max_blocksize()
        );

        self.stream_crc = 0;
        Ok(header)
    }

    /// Decode the next block, or the footer and whatever follows it
    fn next_block(&mut self, decoder: BlockDecoder) -> Result<()> {
        let magic = self.bits.read_u64(48).map_err(|err| self.truncated(err))?;
        match magic {
            BLOCK_MAGIC => {
                let reader = decoder
                    .decode(&mut self.bits)
                    .map_err(|err| self.truncated(err))?;
                if self.bits.overrun() {
                    return Err(Error::TruncatedInput("block"));
                }

                self.blocks += 1;
                self.state = State::Block(reader);
                Ok(())
            }
            FINAL_MAGIC => {
                let expected = self.bits.read_u32(32)?;
                if self.bits.overrun() {
                    return Err(Error::TruncatedInput("stream crc"));
                }

                if expected != self.stream_crc {
                    warn!(
                        "bzip2 stream {} crc mismatch after {} blocks",
                        self.streams, self.blocks
                    );
                    return Err(Error::ChecksumMismatch {
                        checksum: Checksum::Stream,
                        expected,
                        computed: self.stream_crc,
                    });
                }

                debug!(
                    "bzip2 stream {} end, combined crc {:#010x}",
                    self.streams, expected
                );
                self.streams += 1;
                self.bits.align_to_byte()?;

                self.next_stream(decoder)
            }
            _ if self.bits.overrun() => Err(Error::TruncatedInput("block magic")),
            _ => Err(Error::MalformedHeader("bad block magic value found")),
        }
    }

    fn next_stream(&mut self, decoder: BlockDecoder) -> Result<()> {
        if !self.multistream || self.bits.is_exhausted()? {
            return Ok(());
        }

        // only a complete, valid header starts another stream
        let valid = self.bits.has_bits(32)?
            && Header::parse(self.bits.peek(32)?.to_be_bytes()).is_ok();
        if !valid {
            warn!("ignoring trailing data after the end of the bzip2 stream");
            return Ok(());
        }

        let header = self.read_header()?;
        self.next_block(decoder.with_header(header))
    }

    fn finish_block(&mut self, reader: &BlockReader) -> Result<()> {
        let expected = reader.expected_crc();
        let computed = reader.computed_crc();
        if expected != computed {
            warn!(
                "bzip2 block {} crc mismatch in stream {}",
                self.blocks, self.streams
            );
            return Err(Error::ChecksumMismatch {
                checksum: Checksum::Block,
                expected,
                computed,
            });
        }

        self.stream_crc = crc::combine(self.stream_crc, computed);
        Ok(())
    }

    // zero bits past the end of the input make for odd decoding errors
    fn truncated(&self, err: Error) -> Error {
        if self.bits.overrun() {
            Error::TruncatedInput("block")
        } else {
            err
        }
    }
}
