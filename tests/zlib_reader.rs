use std::io::{self, Read, Write};

use flate2::write::ZlibEncoder;
use flate2::Compression;
use pretty_assertions::assert_eq;

use archive_codecs::{Checksum, Error, ZlibReader};

fn compress(data: &[u8], level: u32) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::new(level));
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}

fn decompress(compressed: &[u8]) -> io::Result<Vec<u8>> {
    let mut out = Vec::new();
    ZlibReader::new(compressed).read_to_end(&mut out)?;
    Ok(out)
}

#[test]
fn round_trip() {
    let data = include_bytes!("samplefiles/sample3.ref");

    for &level in &[0, 1, 6, 9] {
        let out = decompress(&compress(data, level)).unwrap();
        assert_eq!(data.len(), out.len(), "level {}", level);
        assert_eq!(data.as_ref(), out.as_slice(), "level {}", level);
    }
}

#[test]
fn empty_payload() {
    assert_eq!(decompress(&compress(b"", 6)).unwrap(), b"");
}

#[test]
fn adler32_mismatch() {
    let mut compressed = compress(b"a zlib stream with a bad trailer", 6);
    *compressed.last_mut().unwrap() ^= 0x01;

    let err = decompress(&compressed).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidData);
    match Error::from_io(&err) {
        Some(Error::ChecksumMismatch {
            checksum,
            expected,
            computed,
        }) => {
            assert_eq!(*checksum, Checksum::Adler32);
            assert_eq!(expected ^ computed, 0x01);
        }
        other => panic!("unexpected error {:?}", other),
    }
}

#[test]
fn missing_trailer() {
    let compressed = compress(b"no trailer here", 6);

    let err = decompress(&compressed[..compressed.len() - 2]).unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::UnexpectedEof);
}

#[test]
fn bad_header() {
    let err = decompress(&[0x78, 0x00, 0x01, 0x00]).unwrap_err();
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::MalformedHeader(_))
    ));

    let err = decompress(&[0x78]).unwrap_err();
    assert!(matches!(
        Error::from_io(&err),
        Some(Error::TruncatedInput(_))
    ));
}

#[test]
fn small_reads() {
    let data = include_bytes!("samplefiles/sample1.ref");
    let compressed = compress(data, 9);
    let mut reader = ZlibReader::new(compressed.as_slice());

    let mut out = Vec::new();
    let mut buf = [0; 7];
    loop {
        match reader.read(&mut buf).unwrap() {
            0 => break,
            n => out.extend_from_slice(&buf[..n]),
        }
    }
    assert_eq!(data.as_ref(), out.as_slice());
}
