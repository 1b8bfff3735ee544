//! bzip2 low-level block APIs
//!
//! A block is decoded in two steps: [`Decoder`] reads the Huffman coded
//! symbols and links the inverse BWT, [`Reader`] then walks the links while
//! undoing derandomisation and the initial run-length encoding.

pub use self::bwt::{inverse_bwt, inverse_bwt_in_place};
pub use self::decoder::Decoder;
pub use self::reader::Reader;

/// The magic starting every compressed block, the BCD digits of pi
pub const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
/// The magic starting the stream footer, the BCD digits of `sqrt(pi)`
pub const FINAL_MAGIC: u64 = 0x1772_4538_5090;

mod bwt;
mod decoder;
mod randomise;
mod reader;
mod rle1;
