//! Stream extraction
//!
//! Walks a parsed body and lists every media endpoint the relay has to
//! allocate sockets for. A media line with a `/<count>` port suffix describes
//! `count` streams on ports `port, port+2, port+4, ...`.
//!
//! The [`StreamSet`] is owned by the call and outlives a single body: it is
//! how a re-INVITE that repeats an already known endpoint is recognized.

use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::net::Ipv6Addr;

use tracing::{trace, warn};

use crate::error::{Error, Result};
use crate::session::ParsedSdp;

/// Address and port identifying a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StreamKey {
    pub address: Ipv6Addr,
    pub port: u16,
}

/// One stream found in a body.
///
/// Two descriptors are equal when their address and port are; the stream
/// number and run length do not take part in comparison or hashing.
#[derive(Debug, Clone, Copy)]
pub struct StreamDescriptor {
    pub address: Ipv6Addr,
    pub port: u16,
    /// 1-based, in body order
    pub num: u32,
    /// On the first stream of a media line: the line's port count. Otherwise 1.
    pub consecutive: u16,
}

impl StreamDescriptor {
    pub fn key(&self) -> StreamKey {
        StreamKey {
            address: self.address,
            port: self.port,
        }
    }
}

impl PartialEq for StreamDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for StreamDescriptor {}

impl Hash for StreamDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

/// Streams already known for a call, by address and port
#[derive(Debug, Clone, Default)]
pub struct StreamSet {
    streams: HashMap<StreamKey, StreamDescriptor>,
}

impl StreamSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, key: &StreamKey) -> bool {
        self.streams.contains_key(key)
    }

    pub fn get(&self, key: &StreamKey) -> Option<&StreamDescriptor> {
        self.streams.get(key)
    }

    /// Insert or replace the entry for the descriptor's address and port
    pub fn insert(&mut self, stream: StreamDescriptor) -> Option<StreamDescriptor> {
        self.streams.insert(stream.key(), stream)
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &StreamDescriptor> {
        self.streams.values()
    }
}

/// Append the streams of `sdp` to `out`, numbering them from 1.
///
/// When the first stream of a media line is already in `known`, that stream is
/// skipped; the remaining streams of the line are still numbered and recorded.
/// On error the streams of earlier media lines stay in `out` and `known`, and
/// the caller must treat the whole call as failed.
pub fn extract_streams(
    sdp: &ParsedSdp<'_>,
    known: &mut StreamSet,
    out: &mut Vec<StreamDescriptor>,
) -> Result<()> {
    let mut num = 0u32;

    for (session, media) in sdp.media() {
        for i in 0..media.port_count {
            let Some(key) = media.endpoint(session, i) else {
                let err = Error::NoStreamAddress {
                    offset: media.s.start(),
                };
                warn!("Failed to extract streams from SDP: {}", err);
                return Err(err);
            };

            if i == 0 && known.contains(&key) {
                trace!("Stream {}:{} already known", key.address, key.port);
                continue;
            }

            num += 1;
            let stream = StreamDescriptor {
                address: key.address,
                port: key.port,
                num,
                consecutive: if i == 0 { media.port_count } else { 1 },
            };
            trace!(num, port = key.port, consecutive = stream.consecutive, "Extracted stream");

            known.insert(stream);
            out.push(stream);
        }
    }

    Ok(())
}
