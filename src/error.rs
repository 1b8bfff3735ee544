use std::error::Error as StdError;
use std::fmt::{self, Display, Formatter};
use std::io;

/// A specialized `Result` type for decoding operations
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// An error returned by the decoders in this crate
///
/// Every variant other than [`Error::Io`] describes permanently corrupt or
/// unsupported input: retrying the same operation will fail the same way.
#[derive(Debug)]
pub enum Error {
    /// A magic number, flag or size field is invalid
    MalformedHeader(&'static str),
    /// A Huffman code-length description is invalid
    MalformedHuffmanTable(&'static str),
    /// A decoded symbol is outside the valid range for its context
    InvalidSymbol(&'static str),
    /// A stored checksum doesn't match the decompressed data
    ChecksumMismatch {
        /// The checksum that failed
        checksum: Checksum,
        /// The value stored in the compressed stream
        expected: u32,
        /// The value computed over the decompressed data
        computed: u32,
    },
    /// The byte source ended in the middle of a structure
    TruncatedInput(&'static str),
    /// The input uses a feature this crate doesn't implement
    UnsupportedFeature(&'static str),
    /// The underlying byte source returned an error
    Io(io::Error),
}

/// The checksum reported by [`Error::ChecksumMismatch`]
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Checksum {
    /// The CRC of a single bzip2 block
    Block,
    /// The combined CRC of a whole bzip2 stream
    Stream,
    /// The Adler-32 trailer of a zlib stream
    Adler32,
}

impl Error {
    /// Extract the [`Error`] carried by an [`io::Error`] returned from one of
    /// the `Read` implementations of this crate
    ///
    /// ```rust
    /// use std::io::Read;
    ///
    /// use archive_codecs::{DecoderReader, Error};
    ///
    /// let mut reader = DecoderReader::new(&b"BZh0"[..]);
    /// let err = reader.read(&mut [0; 16]).unwrap_err();
    /// assert!(matches!(Error::from_io(&err), Some(Error::MalformedHeader(_))));
    /// ```
    pub fn from_io(err: &io::Error) -> Option<&Error> {
        err.get_ref().and_then(|inner| inner.downcast_ref::<Error>())
    }

    fn io_kind(&self) -> io::ErrorKind {
        match self {
            Error::TruncatedInput(_) => io::ErrorKind::UnexpectedEof,
            Error::Io(err) => err.kind(),
            _ => io::ErrorKind::InvalidData,
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Error::MalformedHeader(reason) => write!(f, "malformed header: {}", reason),
            Error::MalformedHuffmanTable(reason) => {
                write!(f, "malformed huffman table: {}", reason)
            }
            Error::InvalidSymbol(reason) => write!(f, "invalid symbol: {}", reason),
            Error::ChecksumMismatch {
                checksum,
                expected,
                computed,
            } => write!(
                f,
                "{} mismatch: expected {:#010x}, computed {:#010x}",
                checksum, expected, computed
            ),
            Error::TruncatedInput(reason) => write!(f, "truncated input: {}", reason),
            Error::UnsupportedFeature(reason) => write!(f, "unsupported feature: {}", reason),
            Error::Io(err) => write!(f, "io: {}", err),
        }
    }
}

impl Display for Checksum {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Checksum::Block => "block crc",
            Checksum::Stream => "stream crc",
            Checksum::Adler32 => "adler-32",
        })
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            Error::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Io(err) => err,
            err => io::Error::new(err.io_kind(), err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_round_trip_keeps_kind() {
        let err: io::Error = Error::TruncatedInput("block crc").into();
        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
        assert!(matches!(
            Error::from_io(&err),
            Some(Error::TruncatedInput("block crc"))
        ));

        let err: io::Error = Error::ChecksumMismatch {
            checksum: Checksum::Stream,
            expected: 1,
            computed: 2,
        }
        .into();
        assert_eq!(err.kind(), io::ErrorKind::InvalidData);
        assert_eq!(
            err.to_string(),
            "stream crc mismatch: expected 0x00000001, computed 0x00000002"
        );
    }

    #[test]
    fn io_errors_are_unwrapped() {
        let original = io::Error::new(io::ErrorKind::PermissionDenied, "nope");
        let err: io::Error = Error::from(original).into();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(Error::from_io(&err).is_none());
    }
}
