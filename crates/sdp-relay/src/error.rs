//! Error handling for SDP parsing, stream extraction and rewriting
//!
//! Every fatal condition of the engine is reported through [`Error`]. The
//! variants fall into three families (see [`ErrorKind`]): parse failures,
//! which discard the whole parsed tree, extraction failures, and rewrite
//! failures, which discard the whole rewrite pass. Non-contiguous relay ports
//! are not an error; they are logged and degraded to a single port.

use std::net::Ipv6Addr;
use thiserror::Error;

/// Result type alias for SDP relay operations
pub type Result<T> = std::result::Result<T, Error>;

/// Broad classification of an [`Error`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The SDP body could not be parsed
    Parse,
    /// Streams could not be extracted from a parsed body
    Extraction,
    /// A rewrite pass could not be completed
    Rewrite,
}

/// Errors that can occur while handling an SDP body
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Malformed SDP line
    #[error("Error parsing SDP at offset {offset}: {reason}")]
    Parse {
        /// Byte offset of the offending line in the input
        offset: usize,
        /// Short human-readable reason
        reason: &'static str,
    },

    /// A media block has neither a media-level nor a session-level connection
    #[error("No address info found for stream (m= line at offset {offset})")]
    NoStreamAddress {
        /// Byte offset of the media block's m= line
        offset: usize,
    },

    /// A rewrite directive would have moved the cursor backwards
    #[error("Malformed SDP, cannot rewrite (cursor at {position}, target {target})")]
    MalformedRewrite { position: usize, target: usize },

    /// A rewrite directive pointed past the end of the input
    #[error("Rewrite target {target} is outside of the {len} byte input")]
    OutOfBounds { target: usize, len: usize },

    /// A media block's first port was never registered by stream extraction
    #[error("Stream {address}:{port} was not extracted before rewriting")]
    UnknownStream { address: Ipv6Addr, port: u16 },

    /// A media block has no connection address to look its stream up by
    #[error("Cannot rewrite media block at offset {offset}: no address info")]
    UnresolvedMedia { offset: usize },

    /// No relay leg carries the stream number of a media block
    #[error("No relay stream for stream number {num}")]
    NoRelayStream { num: u32 },

    /// The call has no relay legs at all
    #[error("Ran out of relay streams")]
    NoRelayStreams,
}

impl Error {
    /// Create a new parse error
    pub fn parse(offset: usize, reason: &'static str) -> Self {
        Self::Parse { offset, reason }
    }

    /// Create a new malformed-rewrite error
    pub fn malformed_rewrite(position: usize, target: usize) -> Self {
        Self::MalformedRewrite { position, target }
    }

    /// The family this error belongs to
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Parse { .. } => ErrorKind::Parse,
            Self::NoStreamAddress { .. } => ErrorKind::Extraction,
            Self::MalformedRewrite { .. }
            | Self::OutOfBounds { .. }
            | Self::UnknownStream { .. }
            | Self::UnresolvedMedia { .. }
            | Self::NoRelayStream { .. }
            | Self::NoRelayStreams => ErrorKind::Rewrite,
        }
    }
}

/// Reasons a `<nettype> <addrtype> <address>` triple is rejected
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressError {
    #[error("network type is not IN")]
    NetworkType,

    #[error("address type is neither IP4 nor IP6")]
    AddressType,

    #[error("address is not a valid {family} literal")]
    Literal { family: &'static str },
}
