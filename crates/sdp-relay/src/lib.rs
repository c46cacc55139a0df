//! SDP handling for the rvoip media relay.
//!
//! A relay sits in the media path of a call. For every offer and answer it has
//! to find out which RTP streams the SDP body describes, allocate relay sockets
//! for them, and forward the body with addresses and ports pointing at the
//! relay. This crate covers the SDP side of that:
//!
//! - [`parser`] turns a body into a tree of [`Span`]s that borrow from the
//!   original bytes
//! - [`streams`] extracts the numbered list of RTP streams a body announces
//! - [`chopper`] and [`rewrite`] produce the rewritten body as an ordered list
//!   of kept input ranges and inserted text
//!
//! Sockets are owned elsewhere; the rewriter sees them through the
//! [`RelayLeg`] trait.
//!
//! ```
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use rvoip_sdp_relay::prelude::*;
//! use std::net::{IpAddr, Ipv4Addr};
//!
//! let body = b"v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\n";
//! let sdp = parse_sdp(body).unwrap();
//!
//! let mut known = StreamSet::new();
//! let mut streams = Vec::new();
//! extract_streams(&sdp, &mut known, &mut streams).unwrap();
//!
//! let relay = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
//! let mut call = RelayCall::new(
//!     streams
//!         .iter()
//!         .map(|s| RelayStream::paired(s.num, relay, 30000, 40000))
//!         .collect(),
//! );
//!
//! let mut chop = Chopper::new(body);
//! let flags = RewriteFlags::default();
//! let mut rng = StdRng::seed_from_u64(1);
//! rewrite_sdp(&mut chop, &sdp, &mut call, Direction::Offer, &flags, &known, &mut rng).unwrap();
//!
//! assert_eq!(
//!     &chop.to_bytes()[..],
//!     &b"v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 192.0.2.1\r\nm=audio 30000 RTP/AVP 0\r\n"[..]
//! );
//! ```

// Error handling
pub mod error;

// Input slices and addresses
pub mod span;
pub mod address;

// Parsing
pub mod attributes;
pub mod parser;
pub mod session;

// Stream extraction
pub mod streams;

// Rewriting
pub mod chopper;
pub mod rewrite;

pub use address::{AddressFamily, AddressStyle, NetworkAddress};
pub use attributes::{Attribute, AttributeIndex};
pub use chopper::{Chopper, Segment};
pub use error::{AddressError, Error, ErrorKind, Result};
pub use parser::parse_sdp;
pub use rewrite::{
    rewrite_sdp, Component, Direction, IceCredentials, RelayCall, RelayEndpoint, RelayLeg,
    RelayStream, RewriteFlags,
};
pub use session::{Connection, Media, Origin, ParsedSdp, Session};
pub use span::Span;
pub use streams::{extract_streams, StreamDescriptor, StreamKey, StreamSet};

/// Re-export of common types and functions
pub mod prelude {
    pub use super::{
        extract_streams, parse_sdp, rewrite_sdp,
        Chopper, Direction, Component, RelayCall, RelayLeg, RelayStream, RewriteFlags,
        ParsedSdp, StreamDescriptor, StreamSet,
        Error, ErrorKind, Result,
    };
}

/// SDP and ICE constants
pub mod constants {
    /// Largest `<count>` accepted in an m= line's `<port>/<count>`
    pub const MAX_PORT_COUNT: u16 = 10;

    /// Length of generated ICE username fragments
    pub const ICE_UFRAG_LEN: usize = 4;

    /// Length of the generated ICE password
    pub const ICE_PWD_LEN: usize = 20;

    /// Host candidate priority for the RTP component
    pub const ICE_RTP_PRIORITY: u32 = 2130706431;

    /// Host candidate priority for the RTCP component
    pub const ICE_RTCP_PRIORITY: u32 = 2130706430;

    /// Attributes removed when ICE is stripped
    pub const ICE_ATTRIBUTES: [&str; 7] = [
        "ice-pwd",
        "ice-lite",
        "candidate",
        "ice-ufrag",
        "ice-options",
        "ice-mismatch",
        "remote-candidates",
    ];
}
