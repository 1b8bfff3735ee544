use std::io::Read;

use log::debug;
use tinyvec::ArrayVec;

use super::{bwt, Reader};
use crate::bitreader::{BitReader, MsbFirst};
use crate::error::{Error, Result};
use crate::header::Header;
use crate::huffman::HuffmanTable;
use crate::move_to_front::MoveToFrontDecoder;

const MAX_CODE_LENGTH: u8 = 20;
const GROUP_SIZE: u32 = 50;
// selectors past this are read but never used
const MAX_SELECTORS: u16 = 18002;

/// Decodes the body of a bzip2 block into its inverse-BWT links
pub struct Decoder {
    header: Header,

    tt: Vec<u32>,
    trees: Vec<HuffmanTable>,
}

impl Decoder {
    /// Construct a block decoder for a stream declaring `header`
    pub fn new(header: Header) -> Self {
        let max_blocksize = header.max_blocksize();

        Self {
            header,

            tt: Vec::with_capacity(max_blocksize as usize),
            trees: Vec::new(),
        }
    }

    pub(super) fn recycle_from(
        header: Header,
        mut tt: Vec<u32>,
        trees: Vec<HuffmanTable>,
    ) -> Self {
        tt.clear();
        Self { header, tt, trees }
    }

    /// Reuse the buffers of this decoder for a stream with a new `header`
    pub fn with_header(self, header: Header) -> Self {
        Self::recycle_from(header, self.tt, self.trees)
    }

    /// The header of the stream the blocks belong to
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Decode a block, starting right after its magic
    pub fn decode<R: Read>(mut self, reader: &mut BitReader<R, MsbFirst>) -> Result<Reader> {
        let expected_crc = reader.read_u32(32)?;
        let randomised = reader.read_bool()?;
        let orig_ptr = reader.read_u32(24)?;

        let symbols = read_symbol_map(reader)?;
        let alpha_size = symbols.len() + 2;

        let huffman_groups = reader.read_u8(3)?;
        if !(2..=6).contains(&huffman_groups) {
            return Err(Error::MalformedHuffmanTable("invalid number of huffman trees"));
        }

        let num_selectors = reader.read_u16(15)?;
        if num_selectors == 0 {
            return Err(Error::MalformedHuffmanTable("no tree selectors given"));
        }

        let mut selectors = Vec::with_capacity(usize::from(num_selectors.min(MAX_SELECTORS)));
        let mut selectors_decoder = MoveToFrontDecoder::with_len(usize::from(huffman_groups));
        for i in 0..num_selectors {
            let mut index = 0;
            while reader.read_bool()? {
                index += 1;

                if index >= huffman_groups {
                    return Err(Error::MalformedHuffmanTable("tree index too large"));
                }
            }

            let selector = selectors_decoder
                .take_at(usize::from(index))
                .ok_or(Error::MalformedHuffmanTable("tree index too large"))?;
            if i < MAX_SELECTORS {
                selectors.push(selector);
            }
        }

        let mut lengths = ArrayVec::<[u8; 258]>::new();
        lengths.set_len(alpha_size);

        let huffman_groups = usize::from(huffman_groups);
        if self.trees.len() < huffman_groups {
            self.trees.resize_with(huffman_groups, HuffmanTable::default);
        }

        for tree in &mut self.trees[..huffman_groups] {
            let mut length = reader.read_u8(5)?;

            for length_item in lengths.iter_mut() {
                loop {
                    if !(1..=MAX_CODE_LENGTH).contains(&length) {
                        return Err(Error::MalformedHuffmanTable("huffman length out of range"));
                    }

                    if !reader.read_bool()? {
                        break;
                    }

                    if reader.read_bool()? {
                        length -= 1;
                    } else {
                        length += 1;
                    }
                }

                *length_item = length;
            }

            tree.rebuild(&lengths, MAX_CODE_LENGTH)?;
        }

        let max_blocksize = self.header.max_blocksize() as usize;
        let end_of_block = (alpha_size - 1) as u16;
        let mut symbols_decoder = MoveToFrontDecoder::new_from_symbols(&symbols);

        let mut selectors = selectors.into_iter();
        let mut current_huffman_tree = &self.trees[0];
        let mut group_left = 0;

        let mut repeat = 0u32;
        let mut repeat_power = 1u32;
        let mut c = [0u32; 256];

        self.tt.clear();
        loop {
            if group_left == 0 {
                let selector = selectors.next().ok_or(Error::InvalidSymbol(
                    "insufficient selector indices for number of symbols",
                ))?;

                current_huffman_tree = &self.trees[usize::from(selector)];
                group_left = GROUP_SIZE;
            }
            group_left -= 1;

            let v = current_huffman_tree.decode(reader)?;

            // RUNA and RUNB
            if v < 2 {
                repeat += repeat_power << v;
                repeat_power <<= 1;

                if repeat as usize > max_blocksize {
                    return Err(Error::InvalidSymbol("repeat count too large"));
                }
                continue;
            }

            if repeat > 0 {
                if repeat as usize > max_blocksize - self.tt.len() {
                    return Err(Error::InvalidSymbol("repeats past end of block"));
                }

                let b = symbols_decoder.peek_head();
                let new_len = self.tt.len() + repeat as usize;
                self.tt.resize(new_len, u32::from(b));
                c[usize::from(b)] += repeat;

                repeat = 0;
                repeat_power = 1;
            }

            if v == end_of_block {
                break;
            }

            let b = symbols_decoder
                .take_at(usize::from(v - 1))
                .ok_or(Error::InvalidSymbol("symbol outside of the block alphabet"))?;
            if self.tt.len() >= max_blocksize {
                return Err(Error::InvalidSymbol("data exceeds block size"));
            }

            self.tt.push(u32::from(b));
            c[usize::from(b)] += 1;
        }

        if (orig_ptr as usize) >= self.tt.len() {
            return Err(Error::MalformedHeader("orig_ptr out of bounds"));
        }

        debug!(
            "decoded bzip2 block: {} bytes before rle1, randomised: {}",
            self.tt.len(),
            randomised
        );

        let t_pos = bwt::link_successors(&mut self.tt, orig_ptr as usize, c);
        Ok(Reader::from_decoder(
            self.tt,
            self.trees,
            t_pos,
            expected_crc,
            randomised,
            self.header,
        ))
    }
}

/// Read the two-level bitmap of the bytes used in a block
fn read_symbol_map<R: Read>(reader: &mut BitReader<R, MsbFirst>) -> Result<ArrayVec<[u8; 256]>> {
    let mut symbols = ArrayVec::<[u8; 256]>::new();

    let groups = reader.read_u16(16)?;
    for group in 0..16u16 {
        if groups & (0x8000 >> group) == 0 {
            continue;
        }

        let used = reader.read_u16(16)?;
        for i in 0..16u16 {
            if used & (0x8000 >> i) != 0 {
                symbols.push((group * 16 + i) as u8);
            }
        }
    }

    if symbols.is_empty() {
        return Err(Error::MalformedHuffmanTable("block uses no symbols"));
    }
    Ok(symbols)
}

#[cfg(test)]
mod tests {
    use std::convert::TryInto;

    use super::*;
    use crate::decoder::block::BLOCK_MAGIC;

    #[test]
    fn trees_are_recycled() {
        let compressed = include_bytes!("../../../tests/samplefiles/sample2.bz2");
        let header = Header::parse(compressed[..4].try_into().unwrap()).unwrap();
        let mut bits = BitReader::<_, MsbFirst>::new(&compressed[4..]);

        let mut decoder = Decoder::new(header);
        assert!(decoder.trees.is_empty());

        let mut buf = vec![0; 4096];
        for _ in 0..3 {
            assert_eq!(bits.read_u64(48).unwrap(), BLOCK_MAGIC);

            let mut reader = decoder.decode(&mut bits).unwrap();
            while !reader.is_exhausted() {
                reader.read(&mut buf);
            }
            assert_eq!(reader.computed_crc(), reader.expected_crc());

            decoder = reader.recycle();
            assert!((2..=6).contains(&decoder.trees.len()));
            assert!(decoder.tt.is_empty());
        }
    }
}
