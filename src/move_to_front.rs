/// Move-to-front alphabet of up to 256 byte-sized symbols
pub struct MoveToFrontDecoder {
    symbols: [u8; 256],
    len: usize,
}

impl MoveToFrontDecoder {
    /// The identity alphabet `0..len`
    pub fn with_len(len: usize) -> Self {
        debug_assert!(len <= 256);

        let mut symbols = [0u8; 256];
        for (i, symbol) in symbols.iter_mut().enumerate() {
            *symbol = i as u8;
        }

        Self { symbols, len }
    }

    /// An alphabet made of `symbols`, in order
    pub fn new_from_symbols(symbols: &[u8]) -> Self {
        let mut this = Self {
            symbols: [0; 256],
            len: symbols.len(),
        };
        this.symbols[..symbols.len()].copy_from_slice(symbols);
        this
    }

    /// Take the symbol at `index` and move it to the front
    ///
    /// Returns `None` if `index` is outside of the alphabet.
    pub fn take_at(&mut self, index: usize) -> Option<u8> {
        if index >= self.len {
            return None;
        }

        let symbol = self.symbols[index];
        self.symbols.copy_within(..index, 1);
        self.symbols[0] = symbol;
        Some(symbol)
    }

    pub fn peek_head(&self) -> u8 {
        self.symbols[0]
    }
}
