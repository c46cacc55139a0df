// End-to-end tests: parse, extract streams, rewrite

use std::net::{IpAddr, Ipv4Addr};

use rand::rngs::StdRng;
use rand::SeedableRng;

use rvoip_sdp_relay::{
    address::to_ip_addr,
    error::{Error, ErrorKind},
    extract_streams, parse_sdp, rewrite_sdp, Chopper, Direction, RelayCall, RelayStream,
    RewriteFlags, StreamDescriptor, StreamSet,
};

const RELAY_A: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 1));
const RELAY_B: IpAddr = IpAddr::V4(Ipv4Addr::new(192, 0, 2, 2));

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::TRACE)
        .try_init();
}

/// Parsed and extracted state of one body
struct Prepared {
    known: StreamSet,
    streams: Vec<StreamDescriptor>,
}

fn prepare(body: &str) -> Prepared {
    let sdp = parse_sdp(body.as_bytes()).expect("Failed to parse SDP");
    let mut known = StreamSet::new();
    let mut streams = Vec::new();
    extract_streams(&sdp, &mut known, &mut streams).expect("Failed to extract streams");
    Prepared { known, streams }
}

/// Relay legs that advertise exactly what the body already says
fn mirror_legs(streams: &[StreamDescriptor]) -> Vec<RelayStream> {
    streams
        .iter()
        .map(|s| RelayStream::paired(s.num, to_ip_addr(s.address), s.port, s.port))
        .collect()
}

fn run(
    body: &str,
    call: &mut RelayCall<RelayStream>,
    direction: Direction,
    flags: &RewriteFlags,
    rng: &mut StdRng,
) -> Result<String, Error> {
    let sdp = parse_sdp(body.as_bytes()).expect("Failed to parse SDP");
    let prepared = prepare(body);
    let mut chop = Chopper::new(body.as_bytes());
    rewrite_sdp(&mut chop, &sdp, call, direction, flags, &prepared.known, rng)?;

    let joined: Vec<u8> = chop.io_slices().iter().flat_map(|s| s.to_vec()).collect();
    assert_eq!(joined, chop.to_bytes().to_vec(), "Vectored output should match the joined output");
    Ok(String::from_utf8(joined).expect("Rewritten SDP should be UTF-8"))
}

fn rewrite_with_mirror(body: &str, flags: &RewriteFlags) -> Result<String, Error> {
    let mut call = RelayCall::new(mirror_legs(&prepare(body).streams));
    run(body, &mut call, Direction::Offer, flags, &mut StdRng::seed_from_u64(1))
}

const BASIC: &str = "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\na=rtpmap:0 PCMA/8000\r\n";

const WEBRTC_LIKE: &str = "v=0\r\n\
o=alice 2890844526 2890844527 IN IP4 10.0.0.1\r\n\
s=call\r\n\
c=IN IP4 10.0.0.1\r\n\
t=0 0\r\n\
a=ice-ufrag:F7gI\r\n\
a=ice-pwd:x9cml/YzichV2+XlhiMu8g\r\n\
a=ice-options:trickle\r\n\
m=audio 49170 RTP/AVP 0 8\r\n\
a=rtpmap:0 PCMU/8000\r\n\
a=candidate:1 1 UDP 2130706431 10.0.0.1 49170 typ host\r\n\
a=candidate:1 2 UDP 2130706430 10.0.0.1 49171 typ host\r\n\
a=sendrecv\r\n\
m=video 51372/2 RTP/AVP 96\r\n\
c=IN IP4 10.0.0.2\r\n\
a=rtpmap:96 H264/90000\r\n\
a=remote-candidates:1 10.0.0.9 5000\r\n";

#[test]
fn test_basic_body() {
    init_logging();

    let sdp = parse_sdp(BASIC.as_bytes()).expect("Failed to parse SDP");
    let session = &sdp.sessions()[0];
    let origin = session.origin.as_ref().expect("Session should have an o= line");
    assert_eq!(origin.address.address, "10.0.0.1", "Origin address should be 10.0.0.1");

    let media = &session.media[0];
    assert_eq!(media.port_num, 10000, "Media port should be 10000");
    assert_eq!(media.port_count, 1, "Media port count should be 1");

    let attr = media.attributes.iter().next().expect("Media should have one attribute");
    assert_eq!(attr.name, "rtpmap");
    assert_eq!(attr.key.expect("key"), "rtpmap:0");
    assert_eq!(attr.value.expect("value"), "0 PCMA/8000");
    assert_eq!(attr.param.expect("param"), "PCMA/8000");

    let prepared = prepare(BASIC);
    assert_eq!(prepared.streams.len(), 1, "Body should describe one stream");
    assert_eq!(to_ip_addr(prepared.streams[0].address), IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(prepared.streams[0].port, 10000);
    assert_eq!(prepared.streams[0].num, 1);
}

#[test]
fn test_rewrite_to_relay() {
    init_logging();

    let prepared = prepare(BASIC);
    let legs = prepared
        .streams
        .iter()
        .map(|s| RelayStream::paired(s.num, RELAY_A, 30000, 40000))
        .collect();
    let mut call = RelayCall::new(legs);
    let mut rng = StdRng::seed_from_u64(1);

    let offer = run(BASIC, &mut call, Direction::Offer, &RewriteFlags::default(), &mut rng)
        .expect("Offer rewrite should succeed");
    assert_eq!(
        offer,
        "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 192.0.2.1\r\nm=audio 30000 RTP/AVP 0\r\na=rtpmap:0 PCMA/8000\r\n"
    );

    let answer = run(BASIC, &mut call, Direction::Answer, &RewriteFlags::default(), &mut rng)
        .expect("Answer rewrite should succeed");
    assert!(answer.contains("m=audio 40000 RTP/AVP 0\r\n"), "Answer should use the answer-side port");
}

#[test]
fn test_unchanged_round_trip() {
    init_logging();

    for body in [
        BASIC,
        WEBRTC_LIKE,
        "v=0\nc=IN IP4 10.0.0.1\nm=audio 10000/4 RTP/AVP 0\na=sendonly",
        "v=0\r\nc=IN IP6 2001:db8::1\r\nb=AS:64\r\nm=audio 10000 RTP/AVP 0\r\nv=0\r\nm=audio 20000 RTP/AVP 8\r\nc=IN IP4 10.1.1.1\r\n",
    ] {
        let out = rewrite_with_mirror(body, &RewriteFlags::default()).expect("Rewrite should succeed");
        assert_eq!(out, body, "Rewriting with mirrored legs should not change the body");
    }
}

#[test]
fn test_consecutive_ports() {
    init_logging();

    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000/4 RTP/AVP 0\r\n";
    let prepared = prepare(body);
    assert_eq!(prepared.streams.len(), 4, "A /4 media line describes four streams");
    let ports: Vec<u16> = prepared.streams.iter().map(|s| s.port).collect();
    assert_eq!(ports, [10000, 10002, 10004, 10006]);
    assert_eq!(prepared.streams[0].consecutive, 4);
    assert_eq!(prepared.streams[3].consecutive, 1);

    let legs = [20000, 20002, 20004, 20006]
        .iter()
        .zip(1..)
        .map(|(&port, num)| RelayStream::paired(num, RELAY_A, port, port))
        .collect();
    let mut call = RelayCall::new(legs);
    let out = run(body, &mut call, Direction::Offer, &RewriteFlags::default(), &mut StdRng::seed_from_u64(1))
        .expect("Rewrite should succeed");
    assert!(out.contains("m=audio 20000/4 RTP/AVP 0\r\n"), "Unexpected output: {}", out);

    // relay ports with a gap are advertised as a single port
    let legs = [20000, 20002, 20010, 20012]
        .iter()
        .zip(1..)
        .map(|(&port, num)| RelayStream::paired(num, RELAY_A, port, port))
        .collect();
    let mut call = RelayCall::new(legs);
    let out = run(body, &mut call, Direction::Offer, &RewriteFlags::default(), &mut StdRng::seed_from_u64(1))
        .expect("Rewrite should succeed");
    assert!(out.contains("m=audio 20000 RTP/AVP 0\r\n"), "Unexpected output: {}", out);
}

#[test]
fn test_ice_removal_is_idempotent() {
    init_logging();

    let flags = RewriteFlags::new().with_ice_remove(true);
    let once = rewrite_with_mirror(WEBRTC_LIKE, &flags).expect("First strip should succeed");
    let twice = rewrite_with_mirror(&once, &flags).expect("Second strip should succeed");
    assert_eq!(once, twice, "Stripping ICE twice should equal stripping once");

    for name in ["ice-ufrag", "ice-pwd", "ice-options", "candidate", "remote-candidates"] {
        assert!(!once.contains(&format!("a={}", name)), "{} should have been removed", name);
    }
    assert!(once.contains("a=sendrecv\r\nm=video"), "Non-ICE attributes should be kept in place");
}

#[test]
fn test_forced_ice() {
    init_logging();

    let body = "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 10.0.0.1\r\na=ice-ufrag:zzzz\r\nm=audio 10000 RTP/AVP 0\r\na=candidate:9 1 UDP 1 10.0.0.1 10000 typ host\r\n";
    let prepared = prepare(body);
    let legs = prepared
        .streams
        .iter()
        .map(|s| RelayStream::paired(s.num, RELAY_A, 30000, 40000))
        .collect();
    let mut call = RelayCall::new(legs);
    let mut rng = StdRng::seed_from_u64(99);
    let flags = RewriteFlags::new().with_ice_force(true);

    let offer = run(body, &mut call, Direction::Offer, &flags, &mut rng).expect("Offer rewrite should succeed");
    let creds = call.ice_credentials().clone();
    let offer_ufrag = creds.ufrag(Direction::Offer).expect("Offer ufrag should be generated");
    let answer_ufrag = creds.ufrag(Direction::Answer).expect("Answer ufrag should be generated");
    let pwd = creds.password().expect("Password should be generated");

    assert_eq!(offer_ufrag.len(), 4);
    assert_eq!(pwd.len(), 20);
    assert!(offer_ufrag.chars().chain(pwd.chars()).all(|c| c.is_ascii_alphanumeric()));
    assert_eq!(
        offer,
        format!(
            "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 192.0.2.1\r\n\
             a=ice-lite\r\na=ice-ufrag:{}\r\na=ice-pwd:{}\r\n\
             m=audio 30000 RTP/AVP 0\r\n\
             a=candidate:1 1 UDP 2130706431 192.0.2.1 30000 typ host\r\n\
             a=candidate:1 2 UDP 2130706430 192.0.2.1 30001 typ host\r\n",
            offer_ufrag, pwd
        )
    );

    // the answer reuses the call's credentials with its own ufrag
    let answer = run(body, &mut call, Direction::Answer, &flags, &mut rng).expect("Answer rewrite should succeed");
    assert_eq!(call.ice_credentials(), &creds, "Credentials should not be regenerated");
    assert!(answer.contains(&format!("a=ice-ufrag:{}\r\n", answer_ufrag)));
    assert!(answer.contains(&format!("a=ice-pwd:{}\r\n", pwd)));
    assert!(answer.contains("a=candidate:1 1 UDP 2130706431 192.0.2.1 40000 typ host\r\n"));
    assert!(answer.contains("a=candidate:1 2 UDP 2130706430 192.0.2.1 40001 typ host\r\n"));
}

#[test]
fn test_received_from() {
    init_logging();

    let body = "v=0\r\no=- 1 1 IN IP4 10.0.0.1\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\n";
    let prepared = prepare(body);
    let legs = prepared
        .streams
        .iter()
        .map(|s| RelayStream::paired(s.num, RELAY_A, 30000, 40000))
        .collect();
    let mut call = RelayCall::new(legs);
    let flags = RewriteFlags::new()
        .with_replace_origin(true)
        .with_ice_force(true)
        .with_received_from("IP4", "203.0.113.5");

    let out = run(body, &mut call, Direction::Offer, &flags, &mut StdRng::seed_from_u64(3))
        .expect("Rewrite should succeed");
    assert!(out.starts_with("v=0\r\no=- 1 1 IN IP4 203.0.113.5\r\nc=IN IP4 203.0.113.5\r\n"), "Unexpected output: {}", out);
    assert!(out.contains("a=candidate:1 1 UDP 2130706431 203.0.113.5 30000 typ host\r\n"));

    // trusted SDP keeps the relay's own address
    let trusted = flags.clone().with_trust_address(true);
    let out = run(body, &mut call, Direction::Offer, &trusted, &mut StdRng::seed_from_u64(3))
        .expect("Rewrite should succeed");
    assert!(out.starts_with("v=0\r\no=- 1 1 IN IP4 192.0.2.1\r\nc=IN IP4 192.0.2.1\r\n"), "Unexpected output: {}", out);
}

#[test]
fn test_multiple_sessions_use_last_leg() {
    init_logging();

    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\nm=audio 10002 RTP/AVP 0\r\nv=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 10004 RTP/AVP 0\r\n";
    let mut call = RelayCall::new(vec![
        RelayStream::paired(1, RELAY_A, 30000, 30000),
        RelayStream::paired(2, RELAY_B, 30010, 30010),
        RelayStream::paired(3, RELAY_A, 30020, 30020),
    ]);

    let out = run(body, &mut call, Direction::Offer, &RewriteFlags::default(), &mut StdRng::seed_from_u64(1))
        .expect("Rewrite should succeed");
    assert_eq!(
        out,
        "v=0\r\nc=IN IP4 192.0.2.1\r\nm=audio 30000 RTP/AVP 0\r\nm=audio 30010 RTP/AVP 0\r\nv=0\r\nc=IN IP4 192.0.2.2\r\nm=audio 30020 RTP/AVP 0\r\n"
    );
}

#[test]
fn test_rewrite_failures() {
    init_logging();

    // c= before o= cannot be rewritten once the origin is replaced
    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\no=- 1 1 IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\n";
    let flags = RewriteFlags::new().with_replace_origin(true);
    let err = rewrite_with_mirror(body, &flags).expect_err("Rewrite should fail");
    assert!(matches!(err, Error::MalformedRewrite { .. }), "Unexpected error: {:?}", err);
    assert_eq!(err.kind(), ErrorKind::Rewrite);

    // no leg for the second stream
    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\nm=video 10002 RTP/AVP 96\r\n";
    let mut call = RelayCall::new(vec![RelayStream::paired(1, RELAY_A, 30000, 30000)]);
    let err = run(body, &mut call, Direction::Offer, &RewriteFlags::default(), &mut StdRng::seed_from_u64(1))
        .expect_err("Rewrite should fail");
    assert_eq!(err, Error::NoRelayStream { num: 2 });

    // streams must be extracted before rewriting
    let sdp = parse_sdp(BASIC.as_bytes()).expect("Failed to parse SDP");
    let mut call = RelayCall::new(vec![RelayStream::paired(1, RELAY_A, 30000, 30000)]);
    let mut chop = Chopper::new(BASIC.as_bytes());
    let err = rewrite_sdp(
        &mut chop,
        &sdp,
        &mut call,
        Direction::Offer,
        &RewriteFlags::default(),
        &StreamSet::new(),
        &mut StdRng::seed_from_u64(1),
    )
    .expect_err("Rewrite should fail");
    assert!(matches!(err, Error::UnknownStream { port: 10000, .. }), "Unexpected error: {:?}", err);
}

#[test]
fn test_extraction_skips_known_streams() {
    init_logging();

    let sdp = parse_sdp(BASIC.as_bytes()).expect("Failed to parse SDP");
    let mut known = StreamSet::new();
    let mut first = Vec::new();
    extract_streams(&sdp, &mut known, &mut first).expect("Failed to extract streams");

    let mut second = Vec::new();
    extract_streams(&sdp, &mut known, &mut second).expect("Failed to extract streams");
    assert_eq!(first.len(), 1);
    assert!(second.is_empty(), "Known streams should not be extracted again");
    assert_eq!(known.len(), 1);

    let err = extract_streams(
        &parse_sdp(b"v=0\r\nm=audio 10000 RTP/AVP 0\r\n").expect("Failed to parse SDP"),
        &mut known,
        &mut second,
    )
    .expect_err("A media line without connection data should fail");
    assert_eq!(err.kind(), ErrorKind::Extraction);
}

#[test]
fn test_forced_ice_without_final_terminator() {
    init_logging();

    let flags = RewriteFlags::new().with_ice_force(true);
    let mut rng = StdRng::seed_from_u64(11);

    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\nm=audio 10000 RTP/AVP 0\r\na=sendrecv";
    let mut call = RelayCall::new(vec![RelayStream::paired(1, RELAY_A, 30002, 40002)]);
    let out = run(body, &mut call, Direction::Offer, &flags, &mut rng).expect("Rewrite should succeed");
    let creds = call.ice_credentials();
    assert_eq!(
        out,
        format!(
            "v=0\r\nc=IN IP4 192.0.2.1\r\n\
             a=ice-lite\r\na=ice-ufrag:{}\r\na=ice-pwd:{}\r\n\
             m=audio 30002 RTP/AVP 0\r\na=sendrecv\r\n\
             a=candidate:1 1 UDP 2130706431 192.0.2.1 30002 typ host\r\n\
             a=candidate:1 2 UDP 2130706430 192.0.2.1 30003 typ host\r\n",
            creds.ufrag(Direction::Offer).expect("ufrag"),
            creds.password().expect("password")
        )
    );

    // session without media, ending in a stripped ICE attribute
    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\na=ice-lite";
    let mut call = RelayCall::new(vec![RelayStream::paired(1, RELAY_A, 30002, 40002)]);
    let out = run(body, &mut call, Direction::Answer, &flags, &mut rng).expect("Rewrite should succeed");
    let creds = call.ice_credentials();
    assert_eq!(
        out,
        format!(
            "v=0\r\nc=IN IP4 192.0.2.1\r\na=ice-lite\r\na=ice-ufrag:{}\r\na=ice-pwd:{}\r\n",
            creds.ufrag(Direction::Answer).expect("ufrag"),
            creds.password().expect("password")
        )
    );

    let body = "v=0\r\nc=IN IP4 10.0.0.1\r\ns=-";
    let mut call = RelayCall::new(vec![RelayStream::paired(1, RELAY_A, 30002, 40002)]);
    let out = run(body, &mut call, Direction::Offer, &flags, &mut rng).expect("Rewrite should succeed");
    assert!(out.starts_with("v=0\r\nc=IN IP4 192.0.2.1\r\ns=-\r\na=ice-lite\r\n"), "Unexpected output: {}", out);
}
