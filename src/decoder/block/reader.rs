use super::randomise::RandomMask;
use super::rle1::Rle1Expander;
use super::Decoder;
use crate::crc::Hasher;
use crate::header::Header;
use crate::huffman::HuffmanTable;

/// Yields the decompressed bytes of a decoded block
pub struct Reader {
    tt: Vec<u32>,
    t_pos: u32,
    pre_rle_used: usize,
    random_mask: Option<RandomMask>,
    rle1: Rle1Expander,

    hasher: Hasher,
    expected_crc: u32,

    // needed for recycling
    header: Header,
    trees: Vec<HuffmanTable>,
}

impl Reader {
    pub(super) fn from_decoder(
        tt: Vec<u32>,
        trees: Vec<HuffmanTable>,
        t_pos: u32,
        expected_crc: u32,
        randomised: bool,
        header: Header,
    ) -> Self {
        Self {
            tt,
            t_pos,
            pre_rle_used: 0,
            random_mask: if randomised {
                Some(RandomMask::new())
            } else {
                None
            },
            rle1: Rle1Expander::new(),

            hasher: Hasher::new(),
            expected_crc,

            header,
            trees,
        }
    }

    /// Read decompressed bytes into `out`, updating the block CRC
    pub fn read(&mut self, out: &mut [u8]) -> usize {
        let mut read = 0;

        loop {
            read += self.rle1.drain(&mut out[read..]);
            if read == out.len() || self.pre_rle_used == self.tt.len() {
                break;
            }

            self.t_pos = self.tt[self.t_pos as usize];
            let mut b = self.t_pos as u8;
            self.t_pos >>= 8;
            self.pre_rle_used += 1;

            if let Some(random_mask) = &mut self.random_mask {
                b ^= random_mask.next_mask();
            }

            if let Some(b) = self.rle1.push(b) {
                out[read] = b;
                read += 1;
            }
        }

        self.hasher.update(&out[..read]);
        read
    }

    /// Returns `true` once every byte of the block has been read
    pub fn is_exhausted(&self) -> bool {
        self.pre_rle_used == self.tt.len() && !self.rle1.has_pending()
    }

    /// The CRC stored in the block header
    pub fn expected_crc(&self) -> u32 {
        self.expected_crc
    }

    /// The CRC of the bytes read so far
    pub fn computed_crc(&self) -> u32 {
        self.hasher.finalize()
    }

    /// Hand the block buffers back for decoding the next block
    pub fn recycle(self) -> Decoder {
        Decoder::recycle_from(self.header, self.tt, self.trees)
    }
}
