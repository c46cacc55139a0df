//! Network address triples (`<nettype> <addrtype> <address>`)
//!
//! Used by both o= and c= lines. Addresses are normalized to 128 bits: IPv4
//! literals are stored as IPv4-mapped IPv6 so that stream keys compare the same
//! way regardless of family.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use crate::error::AddressError;
use crate::span::Span;

/// Address family named by an SDP `<addrtype>` token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AddressFamily {
    Ip4,
    Ip6,
}

impl AddressFamily {
    /// Case-insensitive match of `IP4` / `IP6`
    pub fn from_token(token: &[u8]) -> Option<Self> {
        if token.eq_ignore_ascii_case(b"IP4") {
            Some(Self::Ip4)
        } else if token.eq_ignore_ascii_case(b"IP6") {
            Some(Self::Ip6)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ip4 => "IP4",
            Self::Ip6 => "IP6",
        }
    }
}

/// A validated network address with spans for each of its three tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkAddress<'a> {
    pub network_type: Span<'a>,
    pub address_type: Span<'a>,
    pub address: Span<'a>,
    pub family: AddressFamily,
    /// Normalized binary form
    pub parsed: Ipv6Addr,
}

impl<'a> NetworkAddress<'a> {
    /// Validate the triple and parse the address under the named family.
    ///
    /// The address is parsed straight from its bounded slice; the input buffer
    /// is never copied or modified.
    pub fn parse(
        network_type: Span<'a>,
        address_type: Span<'a>,
        address: Span<'a>,
    ) -> Result<Self, AddressError> {
        if !network_type.eq_ignore_ascii_case("IN") {
            return Err(AddressError::NetworkType);
        }
        let family =
            AddressFamily::from_token(address_type.as_bytes()).ok_or(AddressError::AddressType)?;
        let parsed = parse_literal(address.as_bytes(), family)?;

        Ok(Self {
            network_type,
            address_type,
            address,
            family,
            parsed,
        })
    }

    /// The address in its natural family (IPv4-mapped addresses come back as IPv4)
    pub fn ip(&self) -> IpAddr {
        to_ip_addr(self.parsed)
    }
}

fn parse_literal(literal: &[u8], family: AddressFamily) -> Result<Ipv6Addr, AddressError> {
    let invalid = AddressError::Literal {
        family: family.as_str(),
    };
    let text = std::str::from_utf8(literal).map_err(|_| invalid)?;

    match family {
        AddressFamily::Ip4 => text
            .parse::<Ipv4Addr>()
            .map(|v4| v4.to_ipv6_mapped())
            .map_err(|_| invalid),
        AddressFamily::Ip6 => text.parse::<Ipv6Addr>().map_err(|_| invalid),
    }
}

/// Undo the IPv4 mapping applied during parsing
pub fn to_ip_addr(addr: Ipv6Addr) -> IpAddr {
    match addr.to_ipv4_mapped() {
        Some(v4) => IpAddr::V4(v4),
        None => IpAddr::V6(addr),
    }
}

/// How a relay address is rendered into the rewritten body
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressStyle {
    /// `IP4 192.0.2.1` as used in o= and c= lines
    Sdp,
    /// Bare `192.0.2.1` as used in a=candidate lines
    Ice,
}

/// Render `addr` for substitution into an SDP body
pub fn format_address(addr: IpAddr, style: AddressStyle) -> String {
    let addr = match addr {
        IpAddr::V6(v6) => to_ip_addr(v6),
        v4 => v4,
    };
    match (style, addr) {
        (AddressStyle::Sdp, IpAddr::V4(v4)) => format!("IP4 {}", v4),
        (AddressStyle::Sdp, IpAddr::V6(v6)) => format!("IP6 {}", v6),
        (AddressStyle::Ice, ip) => ip.to_string(),
    }
}
