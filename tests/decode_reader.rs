use std::io::{self, Read};

use pretty_assertions::assert_eq;

use archive_codecs::decoder::Decoder;
use archive_codecs::{Checksum, DecoderReader, Error};

const SAMPLE1: &[u8] = include_bytes!("samplefiles/sample1.bz2");
const SAMPLE1_REF: &[u8] = include_bytes!("samplefiles/sample1.ref");
const SAMPLE3: &[u8] = include_bytes!("samplefiles/sample3.bz2");
const SAMPLE3_REF: &[u8] = include_bytes!("samplefiles/sample3.ref");

fn decode_all(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut reader = DecoderReader::new(compressed);

    let mut out = Vec::new();
    reader.read_to_end(&mut out)?;
    Ok(out)
}

fn decode_err(compressed: &[u8]) -> io::Error {
    decode_all(compressed).unwrap_err()
}

#[test]
fn empty() {
    let compressed: &[u8] = &[];
    let mut reader = DecoderReader::new(compressed);

    let mut buf = [0; 1024];
    let err = reader.read(&mut buf).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::TruncatedInput(_))
    ));
}

#[test]
fn empty_stream() {
    let compressed = include_bytes!("samplefiles/empty.bz2");

    assert_eq!(decode_all(compressed).unwrap(), b"");
}

#[test]
fn sample1() {
    let out = decode_all(SAMPLE1).unwrap();

    assert_eq!(SAMPLE1_REF.len(), out.len());
    assert_eq!(SAMPLE1_REF, out.as_slice());
}

#[test]
fn sample2() {
    let compressed = include_bytes!("samplefiles/sample2.bz2");
    let decompressed = include_bytes!("samplefiles/sample2.ref");

    let out = decode_all(compressed).unwrap();

    assert_eq!(decompressed.len(), out.len());
    assert_eq!(decompressed.as_ref(), out.as_slice());
}

#[test]
fn sample3() {
    let out = decode_all(SAMPLE3).unwrap();

    assert_eq!(SAMPLE3_REF.len(), out.len());
    assert_eq!(SAMPLE3_REF, out.as_slice());
}

#[test]
fn randomised() {
    let compressed = include_bytes!("samplefiles/randomised.bz2");
    let decompressed = include_bytes!("samplefiles/randomised.ref");

    let out = decode_all(compressed).unwrap();

    assert_eq!(decompressed.as_ref(), out.as_slice());
}

#[test]
fn one_byte_at_a_time() {
    let mut reader = DecoderReader::new(SAMPLE1);

    let mut out = Vec::new();
    let mut buf = [0; 1];
    loop {
        match reader.read(&mut buf).unwrap() {
            0 => break,
            n => out.extend_from_slice(&buf[..n]),
        }
    }

    assert_eq!(SAMPLE1_REF, out.as_slice());
}

#[test_log::test]
fn concatenated_streams() {
    let compressed = [SAMPLE1, SAMPLE3].concat();

    let mut decoder = Decoder::new(compressed.as_slice());
    let mut out = Vec::new();
    let mut buf = [0; 4096];
    loop {
        match decoder.read(&mut buf).unwrap() {
            0 => break,
            n => out.extend_from_slice(&buf[..n]),
        }
    }

    assert_eq!(decoder.streams(), 2);
    assert_eq!([SAMPLE1_REF, SAMPLE3_REF].concat(), out);
}

#[test]
fn single_stream_stops_at_the_first_footer() {
    let compressed = [SAMPLE1, SAMPLE3].concat();
    let mut reader = DecoderReader::single_stream(compressed.as_slice());

    let mut out = Vec::new();
    reader.read_to_end(&mut out).unwrap();

    assert_eq!(SAMPLE1_REF, out.as_slice());
}

#[test_log::test]
fn trailing_garbage_is_ignored() {
    let compressed = [SAMPLE1, b"this is not a bzip2 stream".as_ref()].concat();

    assert_eq!(decode_all(&compressed).unwrap(), SAMPLE1_REF);
}

#[test_log::test]
fn trailing_partial_header_is_ignored() {
    let tails: &[&[u8]] = &[b"BZh0 not a stream", b"BZhx", b"BZh", b"B"];

    for &tail in tails {
        let compressed = [SAMPLE1, tail].concat();
        assert_eq!(
            decode_all(&compressed).unwrap(),
            SAMPLE1_REF,
            "tail {:?}",
            tail
        );
    }
}

#[test]
fn block_crc_mismatch() {
    // the block crc follows the 4 byte stream header and the 6 byte block magic
    let mut compressed = SAMPLE1.to_vec();
    for byte in &mut compressed[10..14] {
        *byte = !*byte;
    }

    let err = decode_err(&compressed);
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    match Error::from_io(&err) {
        Some(Error::ChecksumMismatch { checksum, .. }) => assert_eq!(*checksum, Checksum::Block),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn stream_crc_mismatch() {
    // the last byte holds the low bits of the stream crc
    let mut compressed = SAMPLE1.to_vec();
    *compressed.last_mut().unwrap() ^= 0xff;

    let err = decode_err(&compressed);
    match Error::from_io(&err) {
        Some(Error::ChecksumMismatch { checksum, .. }) => assert_eq!(*checksum, Checksum::Stream),
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn corrupt_payload_fails_the_block_crc() {
    // byte 16 holds the low bits of orig_ptr, 849 becomes 833: the block
    // still decodes, rotated
    let mut compressed = SAMPLE1.to_vec();
    compressed[16] ^= 0x08;

    let err = decode_err(&compressed);
    match Error::from_io(&err) {
        Some(Error::ChecksumMismatch { checksum, expected, computed }) => {
            assert_eq!(*checksum, Checksum::Block);
            assert_ne!(expected, computed);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn bit_flips_never_decode_to_wrong_data() {
    for i in 0..SAMPLE1.len() {
        for &flip in &[0x01, 0x80] {
            let mut compressed = SAMPLE1.to_vec();
            compressed[i] ^= flip;

            if let Ok(out) = decode_all(&compressed) {
                assert!(out == SAMPLE1_REF, "byte {} ^ {:#04x}", i, flip);
            }
        }
    }
}

#[test]
fn truncated() {
    for &len in &[3, 4, 9, 20, SAMPLE1.len() / 2, SAMPLE1.len() - 5] {
        let err = decode_err(&SAMPLE1[..len]);

        assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof, "cut at {}", len);
        assert!(
            matches!(Error::from_io(&err), Some(Error::TruncatedInput(_))),
            "cut at {}: {:?}",
            len,
            err
        );
    }
}

#[test]
fn bad_magic() {
    let err = decode_err(b"BZx9");
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::MalformedHeader(_))
    ));

    let mut compressed = SAMPLE1.to_vec();
    compressed[4] = 0x00;
    let err = decode_err(&compressed);
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::MalformedHeader(_))
    ));
}

#[test]
fn errors_are_sticky() {
    let mut compressed = SAMPLE1.to_vec();
    compressed[12] ^= 0x01;
    let mut reader = DecoderReader::new(compressed.as_slice());

    let mut out = Vec::new();
    assert!(reader.read_to_end(&mut out).is_err());
    assert_eq!(reader.read(&mut [0; 64]).unwrap(), 0);
}

#[test]
fn interop() {
    use bzip2::read::BzEncoder;
    use bzip2::Compression;

    let mut data = Vec::new();
    let mut seed = 0x1234_5678u32;
    for i in 0..300_000u32 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12345);
        // long runs, repeated phrases and noise
        let byte = match i % 7000 {
            0..=999 => b'a',
            1000..=3999 => b"the quick brown fox "[(i % 20) as usize],
            _ => (seed >> 16) as u8,
        };
        data.push(byte);
    }

    for &level in &[1, 6, 9] {
        let mut compressed = Vec::new();
        BzEncoder::new(data.as_slice(), Compression::new(level))
            .read_to_end(&mut compressed)
            .unwrap();

        assert_eq!(decode_all(&compressed).unwrap(), data, "level {}", level);
    }
}
