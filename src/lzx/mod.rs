//! LZX decompression of independently compressed chunks
//!
//! This is the variant found in WIM resources: there is no intel header bit,
//! a set bit before each block size selects the default size of 32768 and
//! `E8` call translation is always applied to the output with a fixed
//! translation size.

use std::io::Read;

use log::trace;

use self::tables::{position_slots, EXTRA_BITS, POSITION_BASE};
use crate::bitreader::{BitReader, SwappedWords};
use crate::error::{Error, Result};
use crate::huffman::HuffmanTable;

mod tables;

/// The smallest supported window, as a power of two
pub const MIN_WINDOW_BITS: u32 = 15;
/// The largest supported window, as a power of two
pub const MAX_WINDOW_BITS: u32 = 21;

const NUM_CHARS: usize = 256;
const NUM_LENGTH_SYMBOLS: usize = 249;
const NUM_PRETREE_SYMBOLS: usize = 20;
const NUM_ALIGNED_SYMBOLS: usize = 8;
const MAX_CODE_LENGTH: u8 = 16;
const MAX_PRETREE_CODE_LENGTH: u8 = 15;
const MAX_ALIGNED_CODE_LENGTH: u8 = 7;
const MIN_MATCH: usize = 2;
const DEFAULT_BLOCK_SIZE: usize = 32768;
// E8 translation leaves the last bytes of a chunk alone
const E8_TAIL: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockType {
    Verbatim,
    Aligned,
    Uncompressed,
}

/// Decompress a whole LZX chunk producing `uncompressed_len` bytes
///
/// `window_bits` must be in `15..=21`. A `translation_size` of `0` disables
/// `E8` call translation.
///
/// # Errors
///
/// Returns an error if the input is corrupt, ends before `uncompressed_len`
/// bytes have been produced or `window_bits` isn't supported.
pub fn decompress<R: Read>(
    source: R,
    window_bits: u32,
    translation_size: u32,
    uncompressed_len: usize,
) -> Result<Vec<u8>> {
    if !(MIN_WINDOW_BITS..=MAX_WINDOW_BITS).contains(&window_bits) {
        return Err(Error::UnsupportedFeature("lzx window size"));
    }

    let mut decoder = Decoder::new(BitReader::new(source), window_bits);
    let mut out = Vec::with_capacity(uncompressed_len);
    let mut result = Ok(());
    while result.is_ok() && out.len() < uncompressed_len {
        result = decoder.decode_block(&mut out, uncompressed_len);
    }

    if decoder.bits.overrun() {
        return Err(Error::TruncatedInput("lzx bit stream"));
    }
    result?;

    undo_e8_translation(&mut out, translation_size);
    Ok(out)
}

struct Decoder<R> {
    bits: BitReader<R, SwappedWords>,
    window_bits: u32,

    // code lengths are delta coded against the previous block
    main_lengths: Vec<u8>,
    length_lengths: [u8; NUM_LENGTH_SYMBOLS],

    main: HuffmanTable,
    length: HuffmanTable,
    aligned: HuffmanTable,

    recent: [u32; 3],
}

impl<R: Read> Decoder<R> {
    fn new(bits: BitReader<R, SwappedWords>, window_bits: u32) -> Self {
        let main_symbols = NUM_CHARS + 8 * position_slots(window_bits);

        Self {
            bits,
            window_bits,

            main_lengths: vec![0; main_symbols],
            length_lengths: [0; NUM_LENGTH_SYMBOLS],

            main: HuffmanTable::default(),
            length: HuffmanTable::default(),
            aligned: HuffmanTable::default(),

            recent: [1; 3],
        }
    }

    fn decode_block(&mut self, out: &mut Vec<u8>, uncompressed_len: usize) -> Result<()> {
        let block_type = match self.bits.read_u8(3)? {
            1 => BlockType::Verbatim,
            2 => BlockType::Aligned,
            3 => BlockType::Uncompressed,
            _ => return Err(Error::MalformedHeader("invalid lzx block type")),
        };

        let block_size = if self.bits.read_bool()? {
            DEFAULT_BLOCK_SIZE
        } else {
            let mut size = self.bits.read_bits(16)? as usize;
            if self.window_bits >= 16 {
                size = (size << 8) | self.bits.read_bits(8)? as usize;
            }
            size
        };
        trace!(
            "lzx {:?} block of {} bytes at output offset {}",
            block_type,
            block_size,
            out.len()
        );

        let block_end = out.len() + block_size;
        match block_type {
            BlockType::Verbatim | BlockType::Aligned => {
                if block_type == BlockType::Aligned {
                    let mut lengths = [0u8; NUM_ALIGNED_SYMBOLS];
                    for length in lengths.iter_mut() {
                        *length = self.bits.read_u8(3)?;
                    }
                    self.aligned.rebuild(&lengths, MAX_ALIGNED_CODE_LENGTH)?;
                }

                read_lengths(&mut self.bits, &mut self.main_lengths[..NUM_CHARS])?;
                read_lengths(&mut self.bits, &mut self.main_lengths[NUM_CHARS..])?;
                self.main.rebuild(&self.main_lengths, MAX_CODE_LENGTH)?;

                read_lengths(&mut self.bits, &mut self.length_lengths)?;
                self.length.rebuild(&self.length_lengths, MAX_CODE_LENGTH)?;

                let end = block_end.min(uncompressed_len);
                while out.len() < end {
                    self.decode_symbol(out, block_type, block_end, end)?;
                }
                Ok(())
            }
            BlockType::Uncompressed => {
                self.bits.align_to_word()?;
                self.bits.unread_lookahead();

                let mut raw = [0u8; 12];
                self.bits.read_bytes_direct(&mut raw)?;
                for (recent, bytes) in self.recent.iter_mut().zip(raw.chunks_exact(4)) {
                    *recent = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                }

                let start = out.len();
                let end = block_end.min(uncompressed_len);
                out.resize(end, 0);
                self.bits.read_bytes_direct(&mut out[start..])?;

                // blocks are padded to 16 bits
                if block_size % 2 == 1 && out.len() < uncompressed_len {
                    self.bits.read_byte_direct()?;
                }
                Ok(())
            }
        }
    }

    #[inline]
    fn decode_symbol(
        &mut self,
        out: &mut Vec<u8>,
        block_type: BlockType,
        block_end: usize,
        end: usize,
    ) -> Result<()> {
        let symbol = usize::from(self.main.decode(&mut self.bits)?);
        if symbol < NUM_CHARS {
            out.push(symbol as u8);
            return Ok(());
        }

        let header = symbol - NUM_CHARS;
        let slot = header >> 3;
        let mut length = (header & 7) + MIN_MATCH;
        if header & 7 == 7 {
            length += usize::from(self.length.decode(&mut self.bits)?);
        }

        let offset = match slot {
            0 => self.recent[0],
            1 => {
                self.recent.swap(0, 1);
                self.recent[0]
            }
            2 => {
                self.recent.swap(0, 2);
                self.recent[0]
            }
            _ => {
                let extra = EXTRA_BITS[slot];
                let verbatim = if block_type == BlockType::Aligned && extra >= 3 {
                    let high = self.bits.read_u32(extra - 3)?;
                    (high << 3) + u32::from(self.aligned.decode(&mut self.bits)?)
                } else {
                    self.bits.read_u32(extra)?
                };

                let offset = POSITION_BASE[slot] + verbatim - 2;
                self.recent = [offset, self.recent[0], self.recent[1]];
                offset
            }
        };

        let offset = offset as usize;
        if offset == 0 || offset > out.len() {
            return Err(Error::InvalidSymbol("lzx match before start of chunk"));
        }
        if length > block_end - out.len() {
            return Err(Error::InvalidSymbol("lzx match crosses block end"));
        }

        let start = out.len() - offset;
        let length = length.min(end - out.len());
        for i in start..start + length {
            let byte = out[i];
            out.push(byte);
        }

        Ok(())
    }
}

/// Read code lengths through a pre-tree, as deltas against `lengths`
fn read_lengths<R: Read>(bits: &mut BitReader<R, SwappedWords>, lengths: &mut [u8]) -> Result<()> {
    let mut pretree_lengths = [0u8; NUM_PRETREE_SYMBOLS];
    for length in pretree_lengths.iter_mut() {
        *length = bits.read_u8(4)?;
    }
    let pretree = HuffmanTable::new(&pretree_lengths, MAX_PRETREE_CODE_LENGTH)?;

    let delta = |previous: u8, symbol: u16| (previous + 17 - symbol as u8) % 17;

    let mut i = 0;
    while i < lengths.len() {
        let symbol = pretree.decode(bits)?;
        let (run, value) = match symbol {
            0..=16 => (1, delta(lengths[i], symbol)),
            17 => (4 + bits.read_bits(4)? as usize, 0),
            18 => (20 + bits.read_bits(5)? as usize, 0),
            19 => {
                let run = 4 + bits.read_bits(1)? as usize;
                let symbol = pretree.decode(bits)?;
                if symbol > 17 {
                    return Err(Error::MalformedHuffmanTable("invalid lzx pre-tree run"));
                }
                (run, delta(lengths[i], symbol))
            }
            _ => return Err(Error::MalformedHuffmanTable("invalid lzx pre-tree symbol")),
        };

        // runs may spill past the end, the extra lengths are dropped
        let end = (i + run).min(lengths.len());
        lengths[i..end].fill(value);
        i = end;
    }

    Ok(())
}

/// Turn the absolute `call` targets written by the compressor back into
/// relative ones
fn undo_e8_translation(data: &mut [u8], translation_size: u32) {
    if translation_size == 0 || data.len() <= E8_TAIL {
        return;
    }

    let translation_size = translation_size as i32;
    let mut i = 0;
    while i < data.len() - E8_TAIL {
        if data[i] != 0xe8 {
            i += 1;
            continue;
        }

        let position = i as i32;
        let value = &mut data[i + 1..i + 5];
        let absolute = i32::from_le_bytes([value[0], value[1], value[2], value[3]]);
        if absolute >= -position && absolute < translation_size {
            let relative = if absolute >= 0 {
                absolute - position
            } else {
                absolute + translation_size
            };
            value.copy_from_slice(&relative.to_le_bytes());
        }

        i += 5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn e8_translation() {
        let mut data = vec![0u8; 32];
        // absolute 0x20 at position 3 becomes relative 0x1d
        data[3] = 0xe8;
        data[4..8].copy_from_slice(&0x20i32.to_le_bytes());
        // negative targets wrap around the translation size
        data[10] = 0xe8;
        data[11..15].copy_from_slice(&(-5i32).to_le_bytes());
        // out of range targets are left alone
        data[16] = 0xe8;
        data[17..21].copy_from_slice(&1000i32.to_le_bytes());
        // the last ten bytes aren't translated
        data[22] = 0xe8;
        data[23..27].copy_from_slice(&0x20i32.to_le_bytes());

        undo_e8_translation(&mut data, 1000);

        assert_eq!(data[4..8], 0x1di32.to_le_bytes());
        assert_eq!(data[11..15], 995i32.to_le_bytes());
        assert_eq!(data[17..21], 1000i32.to_le_bytes());
        assert_eq!(data[23..27], 0x20i32.to_le_bytes());
    }

    #[test]
    fn e8_translation_disabled() {
        let mut data = vec![0xe8u8; 64];
        undo_e8_translation(&mut data, 0);
        assert_eq!(data, vec![0xe8u8; 64]);
    }

    #[test]
    fn uncompressed_block() {
        // type 3, default size flag clear, 16-bit size 5
        // 3 + 1 + 16 = 20 bits, aligned up to 32
        let header: u32 = (3 << 29) | (5 << 12);
        let mut input = Vec::new();
        input.extend_from_slice(&((header >> 16) as u16).to_le_bytes());
        input.extend_from_slice(&(header as u16).to_le_bytes());
        for r in &[1u32, 1, 1] {
            input.extend_from_slice(&r.to_le_bytes());
        }
        input.extend_from_slice(b"hello");

        let out = decompress(input.as_slice(), 15, 0, 5).unwrap();
        assert_eq!(out, b"hello");
    }

    #[test]
    fn invalid_block_type() {
        let input = [0x00, 0xe0, 0, 0, 0, 0];
        assert!(matches!(
            decompress(&input[..], 15, 0, 10),
            Err(Error::MalformedHeader(_))
        ));
    }

    #[test]
    fn unsupported_window() {
        assert!(matches!(
            decompress(&[0u8; 4][..], 22, 0, 1),
            Err(Error::UnsupportedFeature(_))
        ));
    }
}
