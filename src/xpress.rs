//! XPRESS Huffman decompression
//!
//! Each 64 KiB of output starts with a 256 byte table holding the 4-bit code
//! lengths of a 512 symbol alphabet: 256 literals and 256 match headers.
//! A match header packs `log2(offset)` in its high nibble and the match
//! length minus 3 in its low nibble. Long lengths are escaped with bytes taken
//! straight from the input, in between the 16-bit words of the bit stream.

use std::io::Read;

use log::trace;

use crate::bitreader::{BitReader, SwappedWords};
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;

const NUM_SYMBOLS: usize = 512;
const MAX_CODE_LENGTH: u8 = 15;
const TABLE_BYTES: usize = NUM_SYMBOLS / 2;
const BLOCK_SIZE: usize = 64 * 1024;
const MIN_MATCH: usize = 3;

/// Decompress a whole XPRESS Huffman buffer producing `uncompressed_len` bytes
///
/// # Errors
///
/// Returns an error if the input is corrupt or ends before
/// `uncompressed_len` bytes have been produced.
pub fn decompress<R: Read>(source: R, uncompressed_len: usize) -> Result<Vec<u8>> {
    let mut bits = BitReader::<_, SwappedWords>::new(source);
    let mut out = Vec::with_capacity(uncompressed_len);

    let result = decode_blocks(&mut bits, &mut out, uncompressed_len);
    // zero bits past the end of the input make for odd decoding errors
    if bits.overrun() {
        return Err(Error::TruncatedInput("xpress bit stream"));
    }
    result.map(|()| out)
}

fn decode_blocks<R: Read>(
    bits: &mut BitReader<R, SwappedWords>,
    out: &mut Vec<u8>,
    uncompressed_len: usize,
) -> Result<()> {
    let mut table = HuffmanTable::default();

    while out.len() < uncompressed_len {
        read_table(bits, &mut table)?;
        trace!("xpress block at output offset {}", out.len());

        let block_end = (out.len() + BLOCK_SIZE).min(uncompressed_len);
        while out.len() < block_end {
            decode_symbol(bits, &table, out, uncompressed_len)?;
        }
    }

    Ok(())
}

fn read_table<R: Read>(bits: &mut BitReader<R, SwappedWords>, table: &mut HuffmanTable) -> Result<()> {
    bits.discard_lookahead();

    let mut packed = [0u8; TABLE_BYTES];
    bits.read_bytes_direct(&mut packed)?;

    let mut lengths = [0u8; NUM_SYMBOLS];
    for (pair, byte) in lengths.chunks_exact_mut(2).zip(packed.iter()) {
        pair[0] = byte & 0x0f;
        pair[1] = byte >> 4;
    }

    table.rebuild(&lengths, MAX_CODE_LENGTH)
}

#[inline]
fn decode_symbol<R: Read>(
    bits: &mut BitReader<R, SwappedWords>,
    table: &HuffmanTable,
    out: &mut Vec<u8>,
    uncompressed_len: usize,
) -> Result<()> {
    let symbol = table.decode(bits)?;
    if symbol < 256 {
        out.push(symbol as u8);
        return Ok(());
    }

    let header = symbol - 256;
    let offset_bits = u32::from(header >> 4);
    let mut length = usize::from(header & 0x0f);

    if length == 15 {
        let byte = bits.read_byte_direct()?;
        length = if byte == 0xff {
            let mut word = [0; 2];
            bits.read_bytes_direct(&mut word)?;
            usize::from(u16::from_le_bytes(word))
        } else {
            15 + usize::from(byte)
        };
    }
    length += MIN_MATCH;

    let distance = (1usize << offset_bits) + bits.read_bits(offset_bits)? as usize;
    if distance > out.len() {
        return Err(Error::InvalidSymbol("xpress match before start of output"));
    }

    // the source of a match may overlap the bytes it produces
    let start = out.len() - distance;
    let length = length.min(uncompressed_len - out.len());
    for i in start..start + length {
        let byte = out[i];
        out.push(byte);
    }

    Ok(())
}
