//! `archive_codecs` is a collection of pure Rust decompressors for the
//! formats found inside archive and disk-image containers.
//!
//! ## Main APIs
//!
//! ### bzip2
//!
//! * [`Decoder`]: low-level, pull-based, bzip2 decoder
//! * [`DecoderReader`]: high-level synchronous bzip2 decoder
//!
//! ### Chunked resources
//!
//! * [`ChunkedReader`]: seekable reader over XPRESS or LZX compressed chunks
//! * [`Section`]: bounded view of a seekable source
//!
//! ### zlib
//!
//! * [`ZlibReader`]: zlib framing with Adler-32 verification
//!
//! ## Errors
//!
//! Every decoder reports failures as [`Error`]. The `Read` implementations
//! wrap it in an [`std::io::Error`], use [`Error::from_io`] to get it back.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::fs::File;
//! use std::io;
//!
//! use archive_codecs::DecoderReader;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut compressed_file = File::open("input.bz2")?;
//! let mut decompressed_output = File::create("output")?;
//!
//! let mut reader = DecoderReader::new(compressed_file);
//! io::copy(&mut reader, &mut decompressed_output)?;
//! # Ok(())
//! # }
//! ```
//!
//! [`Decoder`]: crate::decoder::Decoder

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    rust_2018_idioms,
    clippy::cast_lossless,
    clippy::doc_markdown,
    missing_docs,
    rustdoc::broken_intra_doc_links
)]
#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use self::chunked::{ChunkMethod, ChunkedReader, Section, DEFAULT_CHUNK_SIZE};
#[doc(no_inline)]
pub use self::decoder::DecoderReader;
pub use self::error::{Checksum, Error, Result};
pub use self::zlib::ZlibReader;

mod bitreader;
pub mod chunked;
mod crc;
pub mod decoder;
mod error;
pub mod header;
mod huffman;
pub mod lzx;
mod move_to_front;
pub mod xpress;
pub mod zlib;
