//! Forward-only tokenizer over a single line value

use crate::span::Span;

/// Splits `buf[start..end]` into space-separated tokens without copying.
///
/// Each call to [`next_token`](Self::next_token) consumes exactly one token and
/// the single space that follows it. The last token runs to `end`.
pub struct Tokenizer<'a> {
    buf: &'a [u8],
    pos: usize,
    end: usize,
}

impl<'a> Tokenizer<'a> {
    pub fn new(buf: &'a [u8], start: usize, end: usize) -> Self {
        Self { buf, pos: start, end }
    }

    /// Next token, or `None` if nothing is left or the next token would be empty
    pub fn next_token(&mut self) -> Option<Span<'a>> {
        if self.pos >= self.end || self.buf[self.pos] == b' ' {
            return None;
        }

        let start = self.pos;
        match self.buf[start..self.end].iter().position(|&b| b == b' ') {
            Some(rel) => {
                self.pos = start + rel + 1;
                Some(Span::new(self.buf, start, start + rel))
            }
            None => {
                self.pos = self.end;
                Some(Span::new(self.buf, start, self.end))
            }
        }
    }

    /// Offset the next token would start at
    pub fn position(&self) -> usize {
        self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_on_single_spaces() {
        let line = b"audio 10000 RTP/AVP 0 8";
        let mut tok = Tokenizer::new(line, 0, line.len());
        assert_eq!(tok.next_token().unwrap(), "audio");
        assert_eq!(tok.next_token().unwrap(), "10000");
        assert_eq!(tok.position(), 12);
        let transport = tok.next_token().unwrap();
        assert_eq!(transport, "RTP/AVP");
        assert_eq!(transport.start(), 12);
        assert_eq!(tok.next_token().unwrap(), "0");
        assert_eq!(tok.next_token().unwrap(), "8");
        assert_eq!(tok.position(), line.len());
        assert!(tok.next_token().is_none());
    }

    #[test]
    fn respects_end_bound() {
        let line = b"IN IP4 10.0.0.1\r\n";
        let mut tok = Tokenizer::new(line, 0, 15);
        tok.next_token().unwrap();
        tok.next_token().unwrap();
        assert_eq!(tok.next_token().unwrap(), "10.0.0.1");
        assert!(tok.next_token().is_none());
    }

    #[test]
    fn empty_token_fails() {
        let line = b"IN  IP4";
        let mut tok = Tokenizer::new(line, 0, line.len());
        assert_eq!(tok.next_token().unwrap(), "IN");
        assert!(tok.next_token().is_none());

        let mut tok = Tokenizer::new(b" x", 0, 2);
        assert!(tok.next_token().is_none());

        let mut tok = Tokenizer::new(b"", 0, 0);
        assert!(tok.next_token().is_none());
    }
}
