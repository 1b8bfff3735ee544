#![no_main]
use libfuzzer_sys::fuzz_target;

use std::io;

use archive_codecs::{DecoderReader, ZlibReader};

fuzz_target!(|data: &[u8]| {
    let mut decoder = DecoderReader::new(data);
    let _ = io::copy(&mut decoder, &mut io::sink());

    let mut decoder = ZlibReader::new(data);
    let _ = io::copy(&mut decoder, &mut io::sink());
});
