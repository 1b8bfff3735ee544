/// Undoes the initial run-length encoding of bzip2
///
/// Four identical bytes are always followed by a count of additional copies
/// of the same byte. The state survives between calls, so a run may be split
/// across any number of [`Rle1Expander::push`] calls.
#[derive(Debug, Default)]
pub struct Rle1Expander {
    last: Option<u8>,
    // consecutive identical bytes seen, the next byte is a count once this hits 4
    run: u8,
    pending: u8,
}

impl Rle1Expander {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next input byte, returning the byte to output, if any
    ///
    /// Pending repeats must be [drained](Rle1Expander::drain) first.
    #[inline]
    pub fn push(&mut self, byte: u8) -> Option<u8> {
        debug_assert_eq!(self.pending, 0);

        if self.run == 4 {
            self.pending = byte;
            self.run = 0;
            return None;
        }

        if self.last == Some(byte) {
            self.run += 1;
        } else {
            self.last = Some(byte);
            self.run = 1;
        }
        Some(byte)
    }

    /// Write as many pending repeats as fit into `out`
    #[inline]
    pub fn drain(&mut self, out: &mut [u8]) -> usize {
        let n = usize::from(self.pending).min(out.len());
        if n > 0 {
            // `pending` is only set right after four copies of `last`
            let byte = self.last.unwrap_or_default();
            out[..n].fill(byte);
            self.pending -= n as u8;
        }
        n
    }

    pub fn has_pending(&self) -> bool {
        self.pending > 0
    }
}
