//! Scatter-gather rewrite engine
//!
//! The [`Chopper`] never re-serializes a body. It walks the input with a cursor
//! that only moves forward and records the output as an ordered list of
//! segments: ranges of the input that are kept as they are, and pieces of new
//! text. Unmodified regions are never copied; they can be handed to a vectored
//! write directly with [`Chopper::io_slices`].

use std::fmt;
use std::io::{self, IoSlice, Write};
use std::ops::Range;

use bytes::{BufMut, Bytes, BytesMut};
use tracing::warn;

use crate::error::{Error, Result};
use crate::span::Span;

/// One piece of rewritten output
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Bytes of the original input
    Input(Range<usize>),
    /// Generated bytes held in the chopper's arena
    Arena(Range<usize>),
    /// Static text
    Literal(&'static str),
}

/// Rewrites one SDP body into a list of output segments
#[derive(Debug)]
pub struct Chopper<'a> {
    input: &'a [u8],
    position: usize,
    arena: Vec<u8>,
    segments: Vec<Segment>,
    len: usize,
}

impl<'a> Chopper<'a> {
    pub fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            position: 0,
            arena: Vec::with_capacity(512),
            segments: Vec::new(),
            len: 0,
        }
    }

    /// Offset in the input up to which output has been decided
    pub fn position(&self) -> usize {
        self.position
    }

    /// Total length of the output so far
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Emit the input from the cursor up to the start of `span`
    pub fn copy_up_to(&mut self, span: &Span<'_>) -> Result<()> {
        self.copy_up_to_offset(span.start())
    }

    /// Emit the input from the cursor up to the end of `span`
    pub fn copy_up_to_end_of(&mut self, span: &Span<'_>) -> Result<()> {
        self.copy_up_to_offset(span.end())
    }

    /// Move the cursor to the end of `span` without emitting anything
    pub fn skip_over(&mut self, span: &Span<'_>) -> Result<()> {
        let target = self.check_target(span.end())?;
        self.position = target;
        Ok(())
    }

    /// Emit the rest of the input
    pub fn copy_remainder(&mut self) {
        let start = self.position;
        self.push(Segment::Input(start..self.input.len()), self.input.len() - start);
        self.position = self.input.len();
    }

    pub fn append_literal(&mut self, text: &'static str) {
        self.push(Segment::Literal(text), text.len());
    }

    /// Copy `bytes` into the arena and emit them
    pub fn append_owned(&mut self, bytes: &[u8]) {
        let start = self.arena.len();
        self.arena.extend_from_slice(bytes);
        self.push(Segment::Arena(start..self.arena.len()), bytes.len());
    }

    /// Format into the arena and emit the result
    pub fn append_fmt(&mut self, args: fmt::Arguments<'_>) {
        let start = self.arena.len();
        // writes into a Vec<u8> do not fail
        let _ = self.arena.write_fmt(args);
        let end = self.arena.len();
        self.push(Segment::Arena(start..end), end - start);
    }

    fn copy_up_to_offset(&mut self, offset: usize) -> Result<()> {
        let target = self.check_target(offset)?;
        let start = self.position;
        self.push(Segment::Input(start..target), target - start);
        self.position = target;
        Ok(())
    }

    fn check_target(&self, target: usize) -> Result<usize> {
        if target > self.input.len() {
            return Err(Error::OutOfBounds {
                target,
                len: self.input.len(),
            });
        }
        if target < self.position {
            warn!(position = self.position, target, "Malformed SDP, cannot rewrite");
            return Err(Error::malformed_rewrite(self.position, target));
        }
        Ok(target)
    }

    fn push(&mut self, segment: Segment, len: usize) {
        if len == 0 {
            return;
        }
        self.len += len;
        self.segments.push(segment);
    }

    fn resolve(&self, segment: &Segment) -> &[u8] {
        match segment {
            Segment::Input(range) => &self.input[range.clone()],
            Segment::Arena(range) => &self.arena[range.clone()],
            Segment::Literal(text) => text.as_bytes(),
        }
    }

    /// Last byte of the output so far
    pub fn last_byte(&self) -> Option<u8> {
        self.segments
            .last()
            .and_then(|segment| self.resolve(segment).last().copied())
    }

    /// The output segments as byte slices, in order
    pub fn chunks(&self) -> impl Iterator<Item = &[u8]> + '_ {
        self.segments.iter().map(move |segment| self.resolve(segment))
    }

    /// The output as a list of slices for a vectored write
    pub fn io_slices(&self) -> Vec<IoSlice<'_>> {
        self.chunks().map(IoSlice::new).collect()
    }

    /// Concatenate the output into one buffer
    pub fn to_bytes(&self) -> Bytes {
        let mut out = BytesMut::with_capacity(self.len);
        for chunk in self.chunks() {
            out.put_slice(chunk);
        }
        out.freeze()
    }

    /// Write the whole output to `writer`
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for chunk in self.chunks() {
            writer.write_all(chunk)?;
        }
        Ok(())
    }
}
