use std::io::Read;

use crate::bitreader::{BitOrder, BitReader};
use crate::error::{Error, Result};

// fills the lookup slots no canonical code expands to
const UNUSED: u16 = u16::MAX;

/// A canonical Huffman code, decoded through a flat lookup table
///
/// Symbols are assigned consecutive codes ordered by `(length, symbol)`.
/// A length of `0` marks an unused symbol. The table has `2^max_length`
/// slots, each holding the symbol whose code is a prefix of the slot index.
pub struct HuffmanTable {
    lookup: Vec<u16>,
    lengths: Vec<u8>,
    max_length: u8,
}

impl HuffmanTable {
    /// Build the table for a list of per-symbol code lengths
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedHuffmanTable`] if any length is greater than
    /// `max_allowed` or if the lengths describe more codes than fit
    pub fn new(lengths: &[u8], max_allowed: u8) -> Result<Self> {
        let mut this = Self::default();
        this.rebuild(lengths, max_allowed)?;
        Ok(this)
    }

    /// Same as [`HuffmanTable::new`], reusing the current allocations
    pub fn rebuild(&mut self, lengths: &[u8], max_allowed: u8) -> Result<()> {
        let max_length = lengths.iter().copied().max().unwrap_or(0);
        if max_length > max_allowed {
            return Err(Error::MalformedHuffmanTable("code length too long"));
        }

        let size = 1usize << max_length;
        self.lookup.clear();
        self.lookup.resize(size, UNUSED);
        self.lengths.clear();
        self.lengths.extend_from_slice(lengths);
        self.max_length = max_length;

        let mut next = 0;
        for length in 1..=max_length {
            let span = 1usize << (max_length - length);

            for (symbol, _) in lengths
                .iter()
                .enumerate()
                .filter(|&(_, &symbol_length)| symbol_length == length)
            {
                let end = next + span;
                if end > size {
                    return Err(Error::MalformedHuffmanTable("oversubscribed code lengths"));
                }

                self.lookup[next..end].fill(symbol as u16);
                next = end;
            }
        }

        Ok(())
    }

    /// Decode the next symbol from `reader`
    #[inline]
    pub fn decode<R: Read, O: BitOrder>(&self, reader: &mut BitReader<R, O>) -> Result<u16> {
        let bits = reader.peek(u32::from(self.max_length))?;

        let symbol = self.lookup[bits as usize];
        if symbol == UNUSED {
            return Err(Error::InvalidSymbol("bit pattern matches no huffman code"));
        }

        reader.consume(u32::from(self.lengths[usize::from(symbol)]))?;
        Ok(symbol)
    }
}

impl Default for HuffmanTable {
    fn default() -> Self {
        Self {
            lookup: vec![UNUSED],
            lengths: Vec::new(),
            max_length: 0,
        }
    }
}
