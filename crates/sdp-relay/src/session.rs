//! Parsed SDP tree: sessions, media blocks and their connection data
//!
//! Everything here borrows from the input body. A [`ParsedSdp`] is built once
//! per body by [`parse_sdp`](crate::parser::parse_sdp) and dropped after the
//! streams have been extracted and the body rewritten.

use std::net::Ipv6Addr;

use crate::address::NetworkAddress;
use crate::attributes::AttributeIndex;
use crate::span::Span;
use crate::streams::StreamKey;

/// o= line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Origin<'a> {
    pub username: Span<'a>,
    pub session_id: Span<'a>,
    pub version: Span<'a>,
    pub address: NetworkAddress<'a>,
}

/// c= line, at session or media level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Connection<'a> {
    pub address: NetworkAddress<'a>,
}

/// One m= block and the lines that follow it
#[derive(Debug, Clone)]
pub struct Media<'a> {
    /// From the m= line through the last line of the block
    pub s: Span<'a>,
    pub media_type: Span<'a>,
    /// The port token as written, including any `/<count>` suffix
    pub port: Span<'a>,
    pub transport: Span<'a>,
    pub port_num: u16,
    /// Number of consecutive port pairs (1..=10)
    pub port_count: u16,
    pub connection: Option<Connection<'a>>,
    pub attributes: AttributeIndex<'a>,
}

impl<'a> Media<'a> {
    /// Connection address in effect for this block: its own c= line, else the
    /// session's.
    pub fn connection_address(&self, session: &Session<'a>) -> Option<Ipv6Addr> {
        self.connection
            .as_ref()
            .or(session.connection.as_ref())
            .map(|conn| conn.address.parsed)
    }

    /// Address and port of the `index`th stream of this block. Ports advance by
    /// two so that each stream keeps its odd companion port (RTCP) free.
    pub fn endpoint(&self, session: &Session<'a>, index: u16) -> Option<StreamKey> {
        let address = self.connection_address(session)?;
        let port = (u32::from(self.port_num) + 2 * u32::from(index)) & 0xffff;
        Some(StreamKey {
            address,
            port: port as u16,
        })
    }
}

/// One v= section
#[derive(Debug, Clone)]
pub struct Session<'a> {
    /// From the v= line through the last line before the first m= line
    pub s: Span<'a>,
    pub origin: Option<Origin<'a>>,
    pub connection: Option<Connection<'a>>,
    pub attributes: AttributeIndex<'a>,
    pub media: Vec<Media<'a>>,
}

impl<'a> Session<'a> {
    pub(crate) fn new(s: Span<'a>) -> Self {
        Self {
            s,
            origin: None,
            connection: None,
            attributes: AttributeIndex::new(),
            media: Vec::new(),
        }
    }
}

/// All sessions found in one SDP body
#[derive(Debug, Clone)]
pub struct ParsedSdp<'a> {
    body: &'a [u8],
    sessions: Vec<Session<'a>>,
}

impl<'a> ParsedSdp<'a> {
    pub(crate) fn new(body: &'a [u8], sessions: Vec<Session<'a>>) -> Self {
        Self { body, sessions }
    }

    /// The buffer every span of this tree points into
    pub fn body(&self) -> &'a [u8] {
        self.body
    }

    pub fn sessions(&self) -> &[Session<'a>] {
        &self.sessions
    }

    /// Every media block paired with the session it belongs to, in body order
    pub fn media(&self) -> impl Iterator<Item = (&Session<'a>, &Media<'a>)> + '_ {
        self.sessions
            .iter()
            .flat_map(|session| session.media.iter().map(move |media| (session, media)))
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
