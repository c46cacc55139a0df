//! Borrowed views into the SDP input buffer
//!
//! A [`Span`] is a slice of the original body together with the offset it
//! starts at. The offset is what the rewrite engine works with; the slice is
//! what lookups and comparisons work with. Neither owns memory, and the
//! lifetime keeps every span from outliving the buffer it points into.

use std::borrow::Cow;
use std::fmt;

/// A zero-copy view of `bytes.len()` bytes starting at `offset` in the input
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span<'a> {
    offset: usize,
    bytes: &'a [u8],
}

impl<'a> Span<'a> {
    /// View of `buf[start..end]`. Panics if the range is out of bounds.
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        Self {
            offset: start,
            bytes: &buf[start..end],
        }
    }

    /// Offset of the first byte in the input buffer
    pub fn start(&self) -> usize {
        self.offset
    }

    /// Offset one past the last byte in the input buffer
    pub fn end(&self) -> usize {
        self.offset + self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The referenced bytes, borrowed from the input
    pub fn as_bytes(&self) -> &'a [u8] {
        self.bytes
    }

    /// The referenced bytes as text, replacing invalid UTF-8
    pub fn to_str_lossy(&self) -> Cow<'a, str> {
        String::from_utf8_lossy(self.bytes)
    }

    pub fn eq_ignore_ascii_case(&self, other: &str) -> bool {
        self.bytes.eq_ignore_ascii_case(other.as_bytes())
    }
}

impl fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}@{}", self.to_str_lossy(), self.offset)
    }
}

impl fmt::Display for Span<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str_lossy())
    }
}

impl PartialEq<str> for Span<'_> {
    fn eq(&self, other: &str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<&str> for Span<'_> {
    fn eq(&self, other: &&str) -> bool {
        self.bytes == other.as_bytes()
    }
}

impl PartialEq<[u8]> for Span<'_> {
    fn eq(&self, other: &[u8]) -> bool {
        self.bytes == other
    }
}
