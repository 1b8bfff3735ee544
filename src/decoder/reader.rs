use std::io::{self, Read};

use super::Decoder;

/// A high-level **single-threaded** decoder that wraps a [`Read`] and implements [`Read`], yielding decompressed bytes
///
/// Decoding errors are returned as [`io::Error`]s carrying the crate
/// [`Error`](crate::Error), see [`Error::from_io`](crate::Error::from_io).
///
/// ```rust
/// use std::fs::File;
/// use std::io;
///
/// use archive_codecs::DecoderReader;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut compressed_file = File::open("tests/samplefiles/sample1.bz2")?;
/// # fn no_run() -> Result<(), Box<dyn std::error::Error>> {
/// let mut output = File::create("output.ref")?;
/// # Ok(())
/// # }
/// # let mut output = Vec::new();
///
/// let mut reader = DecoderReader::new(compressed_file);
/// io::copy(&mut reader, &mut output)?;
/// #
/// # let expected = std::fs::read("tests/samplefiles/sample1.ref")?;
/// # assert_eq!(expected, output);
/// #
/// # Ok(())
/// # }
/// ```
pub struct DecoderReader<R> {
    decoder: Decoder<R>,
}

impl<R: Read> DecoderReader<R> {
    /// Construct a new decoder from something implementing [`Read`]
    ///
    /// Concatenated bzip2 streams are decoded one after the other, like the
    /// reference `bzip2` tool does.
    pub fn new(reader: R) -> Self {
        Self {
            decoder: Decoder::new(reader),
        }
    }

    /// Construct a new decoder that stops at the end of the first stream
    pub fn single_stream(reader: R) -> Self {
        Self {
            decoder: Decoder::single_stream(reader),
        }
    }
}

impl<R: Read> Read for DecoderReader<R> {
    /// Decompress bzip2 data from the underlying reader
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        Ok(self.decoder.read(buf)?)
    }
}
