use std::io::{self, Read};
use std::marker::PhantomData;

use tinyvec::ArrayVec;

use crate::error::{Error, Result};

/// The largest number of bits [`BitReader::peek`] can look ahead
pub const MAX_PEEK: u32 = 32;

/// The largest number of bits a single [`BitReader::read_bits`] call returns
pub const MAX_READ: u32 = 16;

const INPUT_BUF_LEN: usize = 8 * 1024;

/// How a pair of source bytes becomes the next 16 bits of the stream
pub trait BitOrder {
    /// Combine two consecutive source bytes into a 16-bit refill word
    fn word(first: u8, second: u8) -> u16;

    /// Split a refill word back into the bytes it was built from
    fn split(word: u16) -> [u8; 2];
}

/// Most-significant-bit first, bytes in stream order (bzip2)
#[derive(Debug)]
pub enum MsbFirst {}

/// Little-endian 16-bit words read most-significant-bit first (XPRESS, LZX)
#[derive(Debug)]
pub enum SwappedWords {}

impl BitOrder for MsbFirst {
    #[inline(always)]
    fn word(first: u8, second: u8) -> u16 {
        u16::from_be_bytes([first, second])
    }

    fn split(word: u16) -> [u8; 2] {
        word.to_be_bytes()
    }
}

impl BitOrder for SwappedWords {
    #[inline(always)]
    fn word(first: u8, second: u8) -> u16 {
        u16::from_le_bytes([first, second])
    }

    fn split(word: u16) -> [u8; 2] {
        word.to_le_bytes()
    }
}

/// Pulls bits out of a byte source
///
/// The look-ahead is refilled two bytes at a time and never drops below
/// 16 valid bits after a read; the first refill loads 32 bits. Reading past
/// the end of the source yields zero bits and sets [`BitReader::overrun`],
/// so Huffman decoding can speculatively peek near the end of the input.
pub struct BitReader<R, O> {
    source: R,
    input: Box<[u8]>,
    input_pos: usize,
    input_len: usize,
    source_eof: bool,
    // bytes handed back by `unread_lookahead`, last one first
    pushback: ArrayVec<[u8; 8]>,

    bits: u64,
    count: u32,
    // trailing zero bits of `bits` that don't come from the source
    padding: u32,
    primed: bool,
    overrun: bool,
    position: u64,

    _order: PhantomData<O>,
}

impl<R: Read, O: BitOrder> BitReader<R, O> {
    pub fn new(source: R) -> Self {
        Self {
            source,
            input: vec![0; INPUT_BUF_LEN].into_boxed_slice(),
            input_pos: 0,
            input_len: 0,
            source_eof: false,
            pushback: ArrayVec::new(),

            bits: 0,
            count: 0,
            padding: 0,
            primed: false,
            overrun: false,
            position: 0,

            _order: PhantomData,
        }
    }

    /// Return the next `bit_count` bits without consuming them
    #[inline]
    pub fn peek(&mut self, bit_count: u32) -> Result<u32> {
        debug_assert!(bit_count <= MAX_PEEK);

        self.fill()?;
        while self.count < bit_count {
            self.push_word()?;
        }

        Ok(((self.bits >> (self.count - bit_count)) & mask(bit_count)) as u32)
    }

    /// Advance past `bit_count` bits
    #[inline]
    pub fn consume(&mut self, bit_count: u32) -> Result<()> {
        debug_assert!(bit_count <= MAX_PEEK);

        while self.count < bit_count {
            self.push_word()?;
        }

        self.count -= bit_count;
        self.bits &= mask(self.count);
        self.position += u64::from(bit_count);
        if self.padding > self.count {
            self.overrun = true;
            self.padding = self.count;
        }

        self.fill()
    }

    #[inline]
    pub fn read_bits(&mut self, bit_count: u32) -> Result<u32> {
        debug_assert!(bit_count <= MAX_READ);

        let value = self.peek(bit_count)?;
        self.consume(bit_count)?;
        Ok(value)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    pub fn read_u8(&mut self, bit_count: u32) -> Result<u8> {
        debug_assert!(bit_count <= 8);
        Ok(self.read_bits(bit_count)? as u8)
    }

    pub fn read_u16(&mut self, bit_count: u32) -> Result<u16> {
        debug_assert!(bit_count <= 16);
        Ok(self.read_bits(bit_count)? as u16)
    }

    /// Read up to 32 bits as a sequence of 16-bit reads, first bits most significant
    pub fn read_u32(&mut self, bit_count: u32) -> Result<u32> {
        debug_assert!(bit_count <= 32);
        Ok(self.read_u64(bit_count)? as u32)
    }

    /// Read up to 64 bits as a sequence of 16-bit reads, first bits most significant
    pub fn read_u64(&mut self, bit_count: u32) -> Result<u64> {
        debug_assert!(bit_count <= 64);

        let mut value = 0u64;
        let mut remaining = bit_count;
        while remaining > 0 {
            let take = remaining.min(MAX_READ);
            value = (value << take) | u64::from(self.read_bits(take)?);
            remaining -= take;
        }
        Ok(value)
    }

    /// Skip to the next byte boundary of the bit stream
    pub fn align_to_byte(&mut self) -> Result<()> {
        let misalignment = (self.position % 8) as u32;
        if misalignment != 0 {
            self.consume(8 - misalignment)?;
        }
        Ok(())
    }

    /// Skip to the next 16-bit boundary, or a whole 16 bits if already aligned
    pub fn align_to_word(&mut self) -> Result<()> {
        let misalignment = (self.position % 16) as u32;
        self.consume(16 - misalignment)
    }

    /// Give the look-ahead bytes back to the source, so that the next direct
    /// read starts exactly at the current bit position
    ///
    /// Must be called on a 16-bit boundary.
    pub fn unread_lookahead(&mut self) {
        debug_assert!(self.position % 16 == 0);

        let real_bytes = ((self.count - self.padding) / 8) as usize;
        let mut bytes = ArrayVec::<[u8; 8]>::new();
        for word_index in (0..self.count / 16).rev() {
            let word = (self.bits >> (16 * word_index)) as u16;
            bytes.extend_from_slice(&O::split(word));
        }
        bytes.truncate(real_bytes);

        for &byte in bytes.iter().rev() {
            self.pushback.push(byte);
        }
        self.discard_lookahead();
    }

    /// Drop the look-ahead bits, leaving the source just past the last refill
    pub fn discard_lookahead(&mut self) {
        self.bits = 0;
        self.count = 0;
        self.padding = 0;
        self.primed = false;
    }

    /// Read one byte straight from the source, bypassing the look-ahead
    pub fn read_byte_direct(&mut self) -> Result<u8> {
        let byte = self
            .next_byte()?
            .ok_or(Error::TruncatedInput("direct byte read past end of input"))?;
        self.position += 8;
        Ok(byte)
    }

    /// Fill `out` straight from the source, bypassing the look-ahead
    pub fn read_bytes_direct(&mut self, out: &mut [u8]) -> Result<()> {
        for byte in out.iter_mut() {
            *byte = self.read_byte_direct()?;
        }
        Ok(())
    }

    /// Returns `true` once every bit coming from the source has been consumed
    pub fn is_exhausted(&mut self) -> Result<bool> {
        self.fill()?;
        Ok(self.count == self.padding)
    }

    /// Returns `true` if the next `bit_count` bits all come from the source
    pub fn has_bits(&mut self, bit_count: u32) -> Result<bool> {
        self.peek(bit_count)?;
        Ok(self.count - self.padding >= bit_count)
    }

    /// Returns `true` if zero bits past the end of the source have been consumed
    pub fn overrun(&self) -> bool {
        self.overrun
    }

    /// Returns the position of the cursor, or how many bits have been read so far.
    pub fn position(&self) -> u64 {
        self.position
    }

    #[inline]
    fn fill(&mut self) -> Result<()> {
        if !self.primed {
            self.primed = true;
            self.push_word()?;
            self.push_word()?;
        }

        while self.count < 16 {
            self.push_word()?;
        }
        Ok(())
    }

    fn push_word(&mut self) -> Result<()> {
        let first = self.next_byte()?;
        let second = self.next_byte()?;

        let missing = u32::from(first.is_none()) + u32::from(second.is_none());
        let word = O::word(first.unwrap_or(0), second.unwrap_or(0));

        self.bits = (self.bits << 16) | u64::from(word);
        self.count += 16;
        self.padding += 8 * missing;
        Ok(())
    }

    #[inline]
    fn next_byte(&mut self) -> Result<Option<u8>> {
        if let Some(byte) = self.pushback.pop() {
            return Ok(Some(byte));
        }

        if self.input_pos == self.input_len {
            if self.source_eof {
                return Ok(None);
            }

            loop {
                match self.source.read(&mut self.input) {
                    Ok(0) => {
                        self.source_eof = true;
                        return Ok(None);
                    }
                    Ok(n) => {
                        self.input_pos = 0;
                        self.input_len = n;
                        break;
                    }
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
                    Err(err) => return Err(err.into()),
                }
            }
        }

        let byte = self.input[self.input_pos];
        self.input_pos += 1;
        Ok(Some(byte))
    }
}

#[inline(always)]
fn mask(bit_count: u32) -> u64 {
    (1u64 << bit_count) - 1
}
