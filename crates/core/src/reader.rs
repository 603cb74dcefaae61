//! Byte reader with explicit pushback.
//!
//! The NAL scanner discovers the *next* unit's start code only after
//! consuming it. Instead of seeking the underlying file backwards by a
//! computed offset, the scanner returns the consumed bytes here via
//! [`unread`](PushbackReader::unread) so the next scan re-discovers the
//! start code at its natural position. This keeps the backtracking logic
//! testable in isolation and works over any [`Read`] source.

use std::io::{self, Read};

/// A byte-at-a-time reader over any [`Read`] source with an
/// "unread N bytes" operation.
///
/// Unread bytes are yielded again in their original stream order before
/// any further bytes from the underlying source. The scanner pushes back
/// at most one start code (up to 5 bytes) at a time.
#[derive(Debug)]
pub struct PushbackReader<R> {
    inner: R,
    // Pushback stack: read_byte pops from the end, so unread stores
    // bytes in reverse to restore original order.
    pushed: Vec<u8>,
}

impl<R: Read> PushbackReader<R> {
    /// Wrap a reader. Callers feeding from a file should hand in a
    /// `BufReader<File>`, since reads are one byte at a time.
    pub fn new(inner: R) -> Self {
        Self {
            inner,
            pushed: Vec::new(),
        }
    }

    /// Read the next byte, or `None` at end of stream.
    pub fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.pushed.pop() {
            return Ok(Some(byte));
        }

        let mut byte = [0u8; 1];
        loop {
            match self.inner.read(&mut byte) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(byte[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Push bytes back onto the stream.
    ///
    /// Subsequent [`read_byte`](Self::read_byte) calls yield them in the
    /// same order as `bytes`.
    pub fn unread(&mut self, bytes: &[u8]) {
        self.pushed.extend(bytes.iter().rev());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_reader(bytes: &[u8]) -> PushbackReader<&[u8]> {
        PushbackReader::new(bytes)
    }

    #[test]
    fn reads_bytes_in_order() {
        let mut r = make_reader(&[1, 2, 3]);
        assert_eq!(r.read_byte().unwrap(), Some(1));
        assert_eq!(r.read_byte().unwrap(), Some(2));
        assert_eq!(r.read_byte().unwrap(), Some(3));
        assert_eq!(r.read_byte().unwrap(), None);
    }

    #[test]
    fn eof_is_sticky() {
        let mut r = make_reader(&[]);
        assert_eq!(r.read_byte().unwrap(), None);
        assert_eq!(r.read_byte().unwrap(), None);
    }

    #[test]
    fn unread_restores_original_order() {
        let mut r = make_reader(&[9]);
        r.unread(&[0, 0, 1]);
        assert_eq!(r.read_byte().unwrap(), Some(0));
        assert_eq!(r.read_byte().unwrap(), Some(0));
        assert_eq!(r.read_byte().unwrap(), Some(1));
        assert_eq!(r.read_byte().unwrap(), Some(9));
    }

    #[test]
    fn unread_after_partial_read() {
        let mut r = make_reader(&[10, 20, 30]);
        assert_eq!(r.read_byte().unwrap(), Some(10));
        r.unread(&[10]);
        assert_eq!(r.read_byte().unwrap(), Some(10));
        assert_eq!(r.read_byte().unwrap(), Some(20));
        assert_eq!(r.read_byte().unwrap(), Some(30));
    }

    #[test]
    fn unread_past_eof() {
        let mut r = make_reader(&[]);
        assert_eq!(r.read_byte().unwrap(), None);
        r.unread(&[7]);
        assert_eq!(r.read_byte().unwrap(), Some(7));
        assert_eq!(r.read_byte().unwrap(), None);
    }
}
