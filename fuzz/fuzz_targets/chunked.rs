#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io::{self, Cursor};

use archive_codecs::{lzx, xpress, ChunkMethod, ChunkedReader};

fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    // the first bytes pick the shape of the resource
    let chunk_size = u32::from(data[0]) * 256 + 1;
    let uncompressed_size = u64::from(data[1]) * 512;
    let method = match data[2] % 3 {
        0 => ChunkMethod::Xpress,
        1 => ChunkMethod::lzx_default(),
        _ => ChunkMethod::Lzx {
            window_bits: 16,
            translation_size: 0,
        },
    };
    let data = &data[3..];

    if let Ok(mut reader) = ChunkedReader::new(Cursor::new(data), chunk_size, uncompressed_size, method) {
        let _ = io::copy(&mut reader, &mut io::sink());
    }

    let _ = xpress::decompress(data, 4096);
    let _ = lzx::decompress(data, 15, 12_000_000, 4096);
});
