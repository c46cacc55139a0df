//! Relay legs as seen by the rewriter
//!
//! Socket allocation happens elsewhere; the rewriter only needs, for every
//! extracted stream number, the local port and advertised address the relay
//! uses on each side of the call. [`RelayLeg`] is that view, and
//! [`RelayCall`] holds a call's legs together with the state a call carries
//! across rewrite passes.

use std::collections::BTreeMap;
use std::net::IpAddr;

use super::ice::IceCredentials;

/// Which side of the call a rewritten body is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Body of an offer, forwarded to the callee
    Offer,
    /// Body of an answer, forwarded to the caller
    Answer,
}

impl Direction {
    pub fn index(self) -> usize {
        match self {
            Self::Offer => 0,
            Self::Answer => 1,
        }
    }
}

/// The two sockets of one relayed stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Component {
    Rtp,
    Rtcp,
}

impl Component {
    /// ICE component id (1-based)
    pub fn id(self) -> u8 {
        match self {
            Self::Rtp => 1,
            Self::Rtcp => 2,
        }
    }
}

/// A relayed stream, as owned by the socket subsystem
pub trait RelayLeg {
    /// Stream number this leg was allocated for
    fn num(&self) -> u32;

    /// Local port of the socket facing `direction`
    fn local_port(&self, direction: Direction, component: Component) -> u16;

    /// Address to advertise for the socket facing `direction`
    fn advertised_address(&self, direction: Direction, component: Component) -> IpAddr;
}

/// Local endpoint of one relay socket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RelayEndpoint {
    pub address: IpAddr,
    pub port: u16,
}

/// Plain [`RelayLeg`] holding its endpoints by value, indexed as
/// `[direction][component]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStream {
    pub num: u32,
    pub endpoints: [[RelayEndpoint; 2]; 2],
}

impl RelayStream {
    /// A leg whose RTCP socket sits on the port after RTP on each side
    pub fn paired(num: u32, address: IpAddr, offer_port: u16, answer_port: u16) -> Self {
        let side = |port: u16| {
            [
                RelayEndpoint { address, port },
                RelayEndpoint {
                    address,
                    port: port.wrapping_add(1),
                },
            ]
        };
        Self {
            num,
            endpoints: [side(offer_port), side(answer_port)],
        }
    }

    fn endpoint(&self, direction: Direction, component: Component) -> &RelayEndpoint {
        let component = match component {
            Component::Rtp => 0,
            Component::Rtcp => 1,
        };
        &self.endpoints[direction.index()][component]
    }
}

impl RelayLeg for RelayStream {
    fn num(&self) -> u32 {
        self.num
    }

    fn local_port(&self, direction: Direction, component: Component) -> u16 {
        self.endpoint(direction, component).port
    }

    fn advertised_address(&self, direction: Direction, component: Component) -> IpAddr {
        self.endpoint(direction, component).address
    }
}

/// Relay state of one call: its legs, indexed by stream number, and the ICE
/// credentials generated for it.
#[derive(Debug, Clone)]
pub struct RelayCall<L> {
    legs: Vec<L>,
    by_num: BTreeMap<u32, usize>,
    pub(crate) ice: IceCredentials,
}

impl<L: RelayLeg> RelayCall<L> {
    pub fn new(legs: Vec<L>) -> Self {
        let by_num = legs
            .iter()
            .enumerate()
            .map(|(idx, leg)| (leg.num(), idx))
            .collect();
        Self {
            legs,
            by_num,
            ice: IceCredentials::default(),
        }
    }

    pub fn legs(&self) -> &[L] {
        &self.legs
    }

    /// Position of the leg carrying stream `num`
    pub fn position(&self, num: u32) -> Option<usize> {
        self.by_num.get(&num).copied()
    }

    /// Leg carrying stream `num`
    pub fn leg(&self, num: u32) -> Option<&L> {
        self.position(num).map(|idx| &self.legs[idx])
    }

    /// ICE credentials, once a rewrite with forced ICE has generated them
    pub fn ice_credentials(&self) -> &IceCredentials {
        &self.ice
    }
}
