//! Relay rewrite of a parsed SDP body
//!
//! [`rewrite_sdp`] feeds a [`Chopper`] with the edits that make a body point
//! at the relay instead of the original endpoints:
//!
//! - o= (when requested) and session-level c= addresses become the relay's
//!   address, or the address the message was received from when the SDP is
//!   not trusted
//! - every m= port becomes the local port of the relay leg allocated for that
//!   stream, keeping the `/<count>` notation when the relay ports are
//!   consecutive too
//! - media-level c= addresses (when requested)
//! - ICE attributes are stripped, and with forced ICE the relay announces
//!   itself as an ICE-lite agent with one host candidate per component
//!
//! The edits are issued in body order. A body whose lines are in an order the
//! edits cannot follow (for example c= before o= with origin replacement on)
//! fails with a malformed-rewrite error rather than being reordered.

pub mod flags;
pub mod ice;
pub mod relay;

use rand::Rng;
use tracing::{debug, error, warn};

use crate::address::{format_address, AddressStyle, NetworkAddress};
use crate::chopper::Chopper;
use crate::constants::{ICE_RTCP_PRIORITY, ICE_RTP_PRIORITY};
use crate::error::{Error, Result};
use crate::session::{Media, ParsedSdp, Session};
use crate::streams::StreamSet;

pub use flags::RewriteFlags;
pub use ice::IceCredentials;
pub use relay::{Component, Direction, RelayCall, RelayEndpoint, RelayLeg, RelayStream};

/// Rewrite `sdp` for `direction` into `chop`.
///
/// `streams` must be the set [`extract_streams`](crate::streams::extract_streams)
/// filled for this body, and `call` must hold a relay leg for every stream
/// number it assigned. On error the chopper holds a partial rewrite and must
/// be discarded.
pub fn rewrite_sdp<L, R>(
    chop: &mut Chopper<'_>,
    sdp: &ParsedSdp<'_>,
    call: &mut RelayCall<L>,
    direction: Direction,
    flags: &RewriteFlags,
    streams: &StreamSet,
    rng: &mut R,
) -> Result<()>
where
    L: RelayLeg,
    R: Rng + ?Sized,
{
    let mut rewriter = Rewriter {
        chop,
        call,
        direction,
        flags,
        streams,
        current: 0,
    };

    rewriter.run(sdp, rng).map_err(|err| {
        error!("Error rewriting SDP: {}", err);
        err
    })
}

struct Rewriter<'c, 'i, L> {
    chop: &'c mut Chopper<'i>,
    call: &'c mut RelayCall<L>,
    direction: Direction,
    flags: &'c RewriteFlags,
    streams: &'c StreamSet,
    /// Position of the leg used last; supplies the address for o= and c=
    current: usize,
}

impl<L: RelayLeg> Rewriter<'_, '_, L> {
    fn run<R: Rng + ?Sized>(&mut self, sdp: &ParsedSdp<'_>, rng: &mut R) -> Result<()> {
        for session in sdp.sessions() {
            self.session(session, rng)?;

            for media in &session.media {
                self.media(session, media)?;
            }
        }

        self.chop.copy_remainder();
        Ok(())
    }

    fn session<R: Rng + ?Sized>(&mut self, session: &Session<'_>, rng: &mut R) -> Result<()> {
        if let Some(origin) = &session.origin {
            if self.flags.replace_origin {
                self.replace_network_address(&origin.address)?;
            }
        }
        if let Some(connection) = &session.connection {
            self.replace_network_address(&connection.address)?;
        }

        if self.flags.strips_ice() {
            ice::remove_ice(self.chop, &session.attributes)?;
        }

        if self.flags.ice_force {
            self.call.ice.ensure(rng);
            let creds = &self.call.ice;
            let ufrag = creds.ufrag(self.direction).unwrap_or_default().to_owned();
            let pwd = creds.password().unwrap_or_default().to_owned();

            self.chop.copy_up_to_end_of(&session.s)?;
            self.terminate_line();
            self.chop.append_literal("a=ice-lite\r\na=ice-ufrag:");
            self.chop.append_owned(ufrag.as_bytes());
            self.chop.append_literal("\r\na=ice-pwd:");
            self.chop.append_owned(pwd.as_bytes());
            self.chop.append_literal("\r\n");
        }

        Ok(())
    }

    fn media(&mut self, session: &Session<'_>, media: &Media<'_>) -> Result<()> {
        let key = media.endpoint(session, 0).ok_or(Error::UnresolvedMedia {
            offset: media.s.start(),
        })?;
        let num = self
            .streams
            .get(&key)
            .map(|stream| stream.num)
            .ok_or(Error::UnknownStream {
                address: key.address,
                port: key.port,
            })?;
        self.current = self.call.position(num).ok_or_else(|| {
            error!(num, "BUG! No relay stream allocated for extracted stream");
            Error::NoRelayStream { num }
        })?;

        self.replace_media_port(media, num)?;

        if let Some(connection) = &media.connection {
            if self.flags.replace_sess_conn {
                self.replace_network_address(&connection.address)?;
            }
        }

        if self.flags.strips_ice() {
            ice::remove_ice(self.chop, &media.attributes)?;
        }

        if self.flags.ice_force {
            self.chop.copy_up_to_end_of(&media.s)?;
            self.terminate_line();
            self.insert_candidate(Component::Rtp, ICE_RTP_PRIORITY);
            self.insert_candidate(Component::Rtcp, ICE_RTCP_PRIORITY);
        }

        Ok(())
    }

    /// A body may end without a line terminator; lines appended after it need one
    fn terminate_line(&mut self) {
        if self.chop.last_byte().is_some_and(|b| b != b'\n') {
            self.chop.append_literal("\r\n");
        }
    }

    fn current_leg(&self) -> Result<&L> {
        self.call.legs().get(self.current).ok_or_else(|| {
            error!("BUG! Ran out of relay streams");
            Error::NoRelayStreams
        })
    }

    /// Replace `<addrtype> <address>`; the network type stays as written
    fn replace_network_address(&mut self, address: &NetworkAddress<'_>) -> Result<()> {
        let replacement = match self.flags.received_from() {
            Some((family, received)) => format!("{} {}", family.as_str(), received),
            None => {
                let leg = self.current_leg()?;
                let ip = leg.advertised_address(self.direction, Component::Rtp);
                format_address(ip, AddressStyle::Sdp)
            }
        };

        self.chop.copy_up_to(&address.address_type)?;
        self.chop.append_owned(replacement.as_bytes());
        self.chop.skip_over(&address.address)?;
        Ok(())
    }

    fn replace_media_port(&mut self, media: &Media<'_>, num: u32) -> Result<()> {
        let port = self.current_leg()?.local_port(self.direction, Component::Rtp);

        self.chop.copy_up_to(&media.port)?;
        self.chop.append_fmt(format_args!("{}", port));
        self.chop.skip_over(&media.port)?;
        debug!(num, from = %media.port, to = port, "Replaced media port");

        if media.port_count == 1 {
            return Ok(());
        }

        let contiguous = (1..media.port_count).all(|k| {
            self.call.leg(num + u32::from(k)).is_some_and(|leg| {
                let expected = u32::from(port) + 2 * u32::from(k);
                u32::from(leg.local_port(self.direction, Component::Rtp)) == expected
            })
        });

        if contiguous {
            self.chop.append_fmt(format_args!("/{}", media.port_count));
        } else {
            warn!(
                num,
                port_count = media.port_count,
                "Failed to handle consecutive ports, advertising a single port"
            );
        }

        Ok(())
    }

    /// `a=candidate:1 <component> UDP <priority> <address> <port> typ host`
    fn insert_candidate(&mut self, component: Component, priority: u32) {
        let leg = &self.call.legs()[self.current];
        let port = leg.local_port(self.direction, component);
        let address = match self.flags.received_from() {
            Some((_, received)) => received.to_string(),
            None => format_address(
                leg.advertised_address(self.direction, component),
                AddressStyle::Ice,
            ),
        };

        self.chop.append_fmt(format_args!(
            "a=candidate:1 {} UDP {} {} {} typ host\r\n",
            component.id(),
            priority,
            address,
            port
        ));
    }
}
