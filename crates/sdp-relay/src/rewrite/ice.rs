//! ICE attribute stripping and ICE-lite credentials

use rand::distributions::Alphanumeric;
use rand::Rng;

use crate::attributes::AttributeIndex;
use crate::chopper::Chopper;
use crate::constants::{ICE_ATTRIBUTES, ICE_PWD_LEN, ICE_UFRAG_LEN};
use crate::error::Result;

use super::relay::Direction;

/// ICE credentials the relay advertises for a call.
///
/// Generated on the first rewrite that forces ICE and reused afterwards, so
/// that re-offers keep the same credentials. Each direction has its own
/// username fragment; the password is shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IceCredentials {
    ufrag: [Option<String>; 2],
    pwd: Option<String>,
}

impl IceCredentials {
    /// Generate whatever has not been generated yet
    pub fn ensure<R: Rng + ?Sized>(&mut self, rng: &mut R) {
        for ufrag in &mut self.ufrag {
            ufrag.get_or_insert_with(|| random_string(rng, ICE_UFRAG_LEN));
        }
        self.pwd.get_or_insert_with(|| random_string(rng, ICE_PWD_LEN));
    }

    pub fn ufrag(&self, direction: Direction) -> Option<&str> {
        self.ufrag[direction.index()].as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.pwd.as_deref()
    }
}

/// `len` characters drawn uniformly from `[0-9a-zA-Z]`
fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    rng.sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn is_ice_attribute(name: &[u8]) -> bool {
    ICE_ATTRIBUTES.iter().any(|ice| ice.as_bytes() == name)
}

/// Drop every ICE attribute of one scope from the output
pub fn remove_ice(chop: &mut Chopper<'_>, attrs: &AttributeIndex<'_>) -> Result<()> {
    for attr in attrs.iter().filter(|attr| is_ice_attribute(attr.name.as_bytes())) {
        chop.copy_up_to(&attr.full_line)?;
        chop.skip_over(&attr.full_line)?;
    }
    Ok(())
}
