use std::io::{self, Read, Seek, SeekFrom};

/// A bounded view of `len` bytes of `inner`, starting at `start`
///
/// The view has its own cursor: every read seeks `inner` to the right place
/// first, so several views over the same source don't disturb each other.
#[derive(Debug)]
pub struct Section<R> {
    inner: R,
    start: u64,
    len: u64,
    position: u64,
}

impl<R> Section<R> {
    /// Construct a view of `inner[start..start + len]`
    pub fn new(inner: R, start: u64, len: u64) -> Self {
        Self {
            inner,
            start,
            len,
            position: 0,
        }
    }

    /// The length of the view in bytes
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if the view has no bytes
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Get back the underlying source
    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read + Seek> Read for Section<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let remaining = self.len.saturating_sub(self.position);
        if remaining == 0 || buf.is_empty() {
            return Ok(0);
        }

        let n = (buf.len() as u64).min(remaining) as usize;
        self.inner.seek(SeekFrom::Start(self.start + self.position))?;
        let read = self.inner.read(&mut buf[..n])?;
        self.position += read as u64;
        Ok(read)
    }
}

impl<R> Seek for Section<R> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        self.position = seek_target(self.position, self.len, pos)?;
        Ok(self.position)
    }
}

/// Resolve `pos` against a cursor at `position` in a stream of `len` bytes
pub(crate) fn seek_target(position: u64, len: u64, pos: SeekFrom) -> io::Result<u64> {
    let target = match pos {
        SeekFrom::Start(offset) => Some(offset),
        SeekFrom::Current(delta) => offset_by(position, delta),
        SeekFrom::End(delta) => offset_by(len, delta),
    };

    target.ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            "invalid seek to a negative or overflowing position",
        )
    })
}

fn offset_by(base: u64, delta: i64) -> Option<u64> {
    if delta >= 0 {
        base.checked_add(delta as u64)
    } else {
        base.checked_sub(delta.unsigned_abs())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    #[test]
    fn reads_are_bounded() {
        let mut section = Section::new(Cursor::new(b"0123456789".to_vec()), 2, 5);

        let mut out = Vec::new();
        section.read_to_end(&mut out).unwrap();
        assert_eq!(out, b"23456");
    }

    #[test]
    fn seeking() {
        let mut section = Section::new(Cursor::new(b"0123456789".to_vec()), 2, 5);

        assert_eq!(section.seek(SeekFrom::End(-2)).unwrap(), 3);
        let mut buf = [0; 4];
        assert_eq!(section.read(&mut buf).unwrap(), 2);
        assert_eq!(&buf[..2], b"56");

        assert_eq!(section.seek(SeekFrom::Current(-4)).unwrap(), 1);
        assert_eq!(section.read(&mut buf[..1]).unwrap(), 1);
        assert_eq!(buf[0], b'3');

        assert!(section.seek(SeekFrom::Current(-10)).is_err());
        assert_eq!(section.seek(SeekFrom::Start(100)).unwrap(), 100);
        assert_eq!(section.read(&mut buf).unwrap(), 0);
    }
}
