/// bzip2 CRC-32 (polynomial `0x04c11db7`, not reflected)
///
/// Computed with the reflected CRC-32 of `crc32fast` by reversing the bits
/// of every input byte and of the result.
#[derive(Clone)]
pub struct Hasher {
    // CRC32B hasher
    val: crc32fast::Hasher,
    // reversed bits
    bytes: [u8; 512],
}

impl Hasher {
    pub fn new() -> Self {
        Self {
            val: crc32fast::Hasher::new(),
            bytes: [0; 512],
        }
    }

    pub fn update(&mut self, mut bytes: &[u8]) {
        while !bytes.is_empty() {
            let len = bytes.len().min(self.bytes.len());
            for (reversed, byte) in self.bytes.iter_mut().zip(&bytes[..len]) {
                *reversed = byte.reverse_bits();
            }
            bytes = &bytes[len..];

            self.val.update(&self.bytes[..len]);
        }
    }

    pub fn finalize(&self) -> u32 {
        // CRC32B to CRC32
        self.val.clone().finalize().reverse_bits()
    }
}

impl Default for Hasher {
    fn default() -> Self {
        Self::new()
    }
}

/// Fold a block CRC into the combined CRC of a bzip2 stream
#[inline]
pub fn combine(stream_crc: u32, block_crc: u32) -> u32 {
    stream_crc.rotate_left(1) ^ block_crc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn crc() {
        let mut hasher = Hasher::new();
        hasher.update(b"123456789");
        assert_eq!(hasher.finalize(), 0xFC891918);
    }

    #[test]
    fn crc_incremental() {
        let data = (0..2000u32).map(|i| (i * 7 % 251) as u8).collect::<Vec<_>>();

        let mut whole = Hasher::new();
        whole.update(&data);

        let mut split = Hasher::new();
        for chunk in data.chunks(3) {
            split.update(chunk);
        }

        assert_eq!(whole.finalize(), split.finalize());
    }

    #[test]
    fn combine_rotates() {
        assert_eq!(combine(0, 0x1234_5678), 0x1234_5678);
        assert_eq!(combine(0x8000_0001, 0), 0x0000_0003);
        assert_eq!(combine(0x8000_0000, 0x1), 0x0000_0000);
    }
}
