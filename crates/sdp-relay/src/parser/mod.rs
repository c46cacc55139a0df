//! SDP body parser
//!
//! A single pass over the body, one `<type>=<value>` line at a time. The
//! parser is permissive: it only looks at the lines the relay
//! needs (v=, o=, c=, m=, a=), skips the other RFC 8866 line types without
//! examining them, and accepts CRLF or bare LF terminators as well as a body
//! whose last line has no terminator at all.
//!
//! Several sessions may be concatenated in one body; each v= line starts a new
//! one. c= and a= lines attach to the most recent m= block if there is one,
//! otherwise to the session.
//!
//! Any error discards everything parsed so far and reports the offset of the
//! offending line.

pub mod tokenizer;

use nom::{character::complete::digit1, IResult};
use tracing::{debug, warn};

use crate::address::NetworkAddress;
use crate::attributes::Attribute;
use crate::constants::MAX_PORT_COUNT;
use crate::error::{Error, Result};
use crate::session::{Connection, Media, Origin, ParsedSdp, Session};
use crate::span::Span;

pub use tokenizer::Tokenizer;

const ERR_MISSING_EQUALS: &str = "Missing '=' sign";
const ERR_VERSION: &str = "Error in v= line";
const ERR_ORIGIN_IN_MEDIA: &str = "o= line found within media section";
const ERR_ORIGIN: &str = "Error parsing o= line";
const ERR_MEDIA: &str = "Error parsing m= line";
const ERR_CONNECTION: &str = "Error parsing c= line";
const ERR_UNKNOWN_TYPE: &str = "Unknown SDP line type found";
const ERR_NO_SESSION: &str = "SDP line found outside of a session";

type PortError<'i> = nom::Err<nom::error::Error<&'i [u8]>>;

/// Parse an SDP body into its sessions.
///
/// # Examples
///
/// ```
/// use rvoip_sdp_relay::parser::parse_sdp;
///
/// let body = b"v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\n";
/// let sdp = parse_sdp(body).unwrap();
/// let media = &sdp.sessions()[0].media[0];
/// assert_eq!(media.port_num, 10000);
/// assert_eq!(media.port_count, 1);
/// ```
pub fn parse_sdp(body: &[u8]) -> Result<ParsedSdp<'_>> {
    match SdpParser::new(body).run() {
        Ok(sessions) => Ok(ParsedSdp::new(body, sessions)),
        Err(err) => {
            warn!("{}", err);
            Err(err)
        }
    }
}

/// Line-by-line state machine
struct SdpParser<'a> {
    body: &'a [u8],
    sessions: Vec<Session<'a>>,
    /// Whether c=/a= lines currently belong to the last m= block
    in_media: bool,
}

impl<'a> SdpParser<'a> {
    fn new(body: &'a [u8]) -> Self {
        Self {
            body,
            sessions: Vec::new(),
            in_media: false,
        }
    }

    fn run(mut self) -> Result<Vec<Session<'a>>> {
        let body = self.body;
        let end = body.len();
        let mut pos = 0;

        while pos + 1 < end {
            if body[pos + 1] != b'=' {
                return Err(Error::parse(pos, ERR_MISSING_EQUALS));
            }

            let value = pos + 2;
            let (line_end, next_line) = match body[value..].iter().position(|&b| b == b'\n') {
                Some(rel) => {
                    let lf = value + rel;
                    let line_end = if body[lf - 1] == b'\r' { lf - 1 } else { lf };
                    (line_end, Some(lf + 1))
                }
                // no terminator after the last line
                None => (end, None),
            };
            let line_next = next_line.unwrap_or(end);

            let line = Line {
                start: pos,
                value,
                end: line_end,
                next: line_next,
            };
            self.line(body[pos], &line)
                .map_err(|reason| Error::parse(pos, reason))?;
            self.extend_scope(line_next);

            match next_line {
                Some(next) => pos = next,
                None => break,
            }
        }

        Ok(self.sessions)
    }

    fn line(&mut self, tag: u8, line: &Line) -> std::result::Result<(), &'static str> {
        let body = self.body;

        match tag {
            b'v' => {
                if line.end != line.value + 1 || body[line.value] != b'0' {
                    return Err(ERR_VERSION);
                }
                self.sessions
                    .push(Session::new(Span::new(body, line.start, line.next)));
                self.in_media = false;
            }

            b'o' => {
                if self.in_media {
                    return Err(ERR_ORIGIN_IN_MEDIA);
                }
                let session = self.sessions.last_mut().ok_or(ERR_NO_SESSION)?;
                if session.origin.is_some() {
                    return Err(ERR_ORIGIN);
                }
                session.origin = Some(parse_origin(body, line).ok_or(ERR_ORIGIN)?);
            }

            b'm' => {
                let session = self.sessions.last_mut().ok_or(ERR_NO_SESSION)?;
                let media = parse_media(body, line).ok_or(ERR_MEDIA)?;
                session.media.push(media);
                self.in_media = true;
            }

            b'c' => {
                let in_media = self.in_media;
                let session = self.sessions.last_mut().ok_or(ERR_NO_SESSION)?;
                let slot = match session.media.last_mut() {
                    Some(media) if in_media => &mut media.connection,
                    _ => &mut session.connection,
                };
                if slot.is_some() {
                    return Err(ERR_CONNECTION);
                }
                *slot = Some(parse_connection(body, line).ok_or(ERR_CONNECTION)?);
            }

            b'a' => {
                let in_media = self.in_media;
                let session = self.sessions.last_mut().ok_or(ERR_NO_SESSION)?;
                let attr = Attribute::split(body, line.start, line.value, line.end, line.next);
                match session.media.last_mut() {
                    Some(media) if in_media => media.attributes.push(attr),
                    _ => session.attributes.push(attr),
                }
            }

            b's' | b'i' | b'u' | b'e' | b'p' | b'b' | b't' | b'r' | b'z' | b'k' => {
                if self.sessions.is_empty() {
                    return Err(ERR_NO_SESSION);
                }
            }

            _ => return Err(ERR_UNKNOWN_TYPE),
        }

        Ok(())
    }

    /// Stretch the `s` span of the current block over the line just parsed
    fn extend_scope(&mut self, line_next: usize) {
        let body = self.body;
        let in_media = self.in_media;
        let Some(session) = self.sessions.last_mut() else {
            return;
        };
        let s = match session.media.last_mut() {
            Some(media) if in_media => &mut media.s,
            _ => &mut session.s,
        };
        *s = Span::new(body, s.start(), line_next);
    }
}

/// Offsets of one line: tag at `start`, value in `value..end`, next line at `next`
struct Line {
    start: usize,
    value: usize,
    end: usize,
    next: usize,
}

fn parse_network_address<'a>(tokens: &mut Tokenizer<'a>) -> Option<NetworkAddress<'a>> {
    let network_type = tokens.next_token()?;
    let address_type = tokens.next_token()?;
    let address = tokens.next_token()?;

    NetworkAddress::parse(network_type, address_type, address)
        .map_err(|err| debug!("Rejecting address {}: {}", address, err))
        .ok()
}

fn parse_origin<'a>(body: &'a [u8], line: &Line) -> Option<Origin<'a>> {
    let mut tokens = Tokenizer::new(body, line.value, line.end);
    let username = tokens.next_token()?;
    let session_id = tokens.next_token()?;
    let version = tokens.next_token()?;
    let address = parse_network_address(&mut tokens)?;

    Some(Origin {
        username,
        session_id,
        version,
        address,
    })
}

fn parse_connection<'a>(body: &'a [u8], line: &Line) -> Option<Connection<'a>> {
    let mut tokens = Tokenizer::new(body, line.value, line.end);
    let address = parse_network_address(&mut tokens)?;
    Some(Connection { address })
}

fn parse_media<'a>(body: &'a [u8], line: &Line) -> Option<Media<'a>> {
    let mut tokens = Tokenizer::new(body, line.value, line.end);
    let media_type = tokens.next_token()?;
    let port = tokens.next_token()?;
    let transport = tokens.next_token()?;

    let (_, (port_num, port_count)) = parse_port_token(port.as_bytes()).ok()?;
    let port_num = u16::try_from(port_num).ok().filter(|&p| p > 0)?;
    let port_count = match port_count {
        None => 1,
        Some(count) if (1..=u32::from(MAX_PORT_COUNT)).contains(&count) => count as u16,
        Some(_) => return None,
    };

    Some(Media {
        s: Span::new(body, line.start, line.next),
        media_type,
        port,
        transport,
        port_num,
        port_count,
        connection: None,
        attributes: Default::default(),
    })
}

/// `<port>[/<count>]`. Anything after the digits other than a `/` suffix is
/// ignored; a `/` must be followed by digits.
fn parse_port_token(input: &[u8]) -> IResult<&[u8], (u32, Option<u32>)> {
    let (rest, port) = digit1::<_, nom::error::Error<&[u8]>>(input)?;
    let port = decimal(port, rest)?;

    match rest.strip_prefix(b"/") {
        Some(suffix) => {
            let (rest, count) = digit1::<_, nom::error::Error<&[u8]>>(suffix)?;
            let count = decimal(count, rest)?;
            Ok((rest, (port, Some(count))))
        }
        None => Ok((rest, (port, None))),
    }
}

fn decimal<'i>(digits: &[u8], rest: &'i [u8]) -> std::result::Result<u32, PortError<'i>> {
    std::str::from_utf8(digits)
        .ok()
        .and_then(|s| s.parse::<u32>().ok())
        .ok_or_else(|| nom::Err::Error(nom::error::Error::new(rest, nom::error::ErrorKind::Digit)))
}
