//! Per-request rewrite options
//!
//! These arrive with every offer/answer command from the controlling proxy.
//! Field names follow the control protocol so that a flag dictionary can be
//! deserialized straight into [`RewriteFlags`]; anything left out defaults to
//! off.

use serde::{Deserialize, Serialize};

use crate::address::AddressFamily;

/// What the rewrite pass should change besides ports
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteFlags {
    /// Keep addresses from the SDP instead of the address the message came from
    pub trust_address: bool,
    /// `IP4` or `IP6`, the family of `received_from_address`
    pub received_from_family: Option<String>,
    /// Source address the signaling message was received from
    pub received_from_address: Option<String>,
    /// Also rewrite the o= line's address
    pub replace_origin: bool,
    /// Also rewrite media-level c= lines
    pub replace_sess_conn: bool,
    /// Strip ICE attributes
    pub ice_remove: bool,
    /// Strip ICE attributes and advertise the relay as an ICE-lite agent
    pub ice_force: bool,
}

impl RewriteFlags {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_trust_address(mut self, trust: bool) -> Self {
        self.trust_address = trust;
        self
    }

    pub fn with_received_from(mut self, family: impl Into<String>, address: impl Into<String>) -> Self {
        self.received_from_family = Some(family.into());
        self.received_from_address = Some(address.into());
        self
    }

    pub fn with_replace_origin(mut self, replace: bool) -> Self {
        self.replace_origin = replace;
        self
    }

    pub fn with_replace_sess_conn(mut self, replace: bool) -> Self {
        self.replace_sess_conn = replace;
        self
    }

    pub fn with_ice_remove(mut self, remove: bool) -> Self {
        self.ice_remove = remove;
        self
    }

    pub fn with_ice_force(mut self, force: bool) -> Self {
        self.ice_force = force;
        self
    }

    /// Whether existing ICE attributes have to go
    pub fn strips_ice(&self) -> bool {
        self.ice_remove || self.ice_force
    }

    /// The caller-observed `(family, address)` to advertise instead of the
    /// relay's own address.
    ///
    /// Only used when the SDP's own addresses are not trusted and both a
    /// recognized family and a non-empty address were supplied.
    pub fn received_from(&self) -> Option<(AddressFamily, &str)> {
        if self.trust_address {
            return None;
        }
        let family = AddressFamily::from_token(self.received_from_family.as_deref()?.as_bytes())?;
        let address = self.received_from_address.as_deref().filter(|a| !a.is_empty())?;
        Some((family, address))
    }
}
