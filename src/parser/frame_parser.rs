//! Ethernet → IPv4 → UDP dissection.
//!
//! Each layer checks the bytes it needs against what is actually present
//! before reading them. A declared length is only ever compared with the
//! remaining buffer, never used to slice past it.

use std::net::Ipv4Addr;

use crate::domain::Verdict;
use crate::error::ParseError;

/// Upper bound on a captured frame.
pub const MAX_FRAME_SIZE: usize = 65536;

/// DNS service port
pub const DNS_PORT: u16 = 53;

const ETH_HEADER_LEN: usize = 14;
const ETHERTYPE_IPV4: u16 = 0x0800;

const IPV4_MIN_HEADER_LEN: usize = 20;
const IPV4_PROTO_OFFSET: usize = 9;
const IPV4_SRC_OFFSET: usize = 12;
const IP_PROTO_UDP: u8 = 17;

const UDP_HEADER_LEN: usize = 8;

/// Outcome of one layer: the next layer's bytes, or the final verdict.
type Layer<'a> = Result<&'a [u8], Verdict>;

/// Dissect a raw frame.
///
/// Defined for every input, including empty and truncated ones. Has no
/// side effects.
pub fn dissect(frame: &[u8]) -> Verdict {
    match dissect_layers(frame) {
        Ok(source) => Verdict::Match(source),
        Err(verdict) => verdict,
    }
}

fn dissect_layers(frame: &[u8]) -> Result<Ipv4Addr, Verdict> {
    let ip = ethernet_payload(frame)?;
    let (source, udp) = ipv4_udp_payload(ip)?;
    check_dns_datagram(udp)?;
    Ok(source)
}

/// Strip the Ethernet header, accepting only IPv4.
fn ethernet_payload(frame: &[u8]) -> Layer<'_> {
    let Some(header) = frame.get(..ETH_HEADER_LEN) else {
        return Err(too_short("ethernet", ETH_HEADER_LEN, frame.len()));
    };

    let ethertype = u16::from_be_bytes([header[12], header[13]]);
    if ethertype != ETHERTYPE_IPV4 {
        return Err(Verdict::NoMatch);
    }

    Ok(&frame[ETH_HEADER_LEN..])
}

/// Validate the IPv4 header and return the source address with the UDP bytes.
fn ipv4_udp_payload(packet: &[u8]) -> Result<(Ipv4Addr, &[u8]), Verdict> {
    let Some(header) = packet.get(..IPV4_MIN_HEADER_LEN) else {
        return Err(too_short("ipv4", IPV4_MIN_HEADER_LEN, packet.len()));
    };

    if header[IPV4_PROTO_OFFSET] != IP_PROTO_UDP {
        return Err(Verdict::NoMatch);
    }

    let version = header[0] >> 4;
    let ihl = header[0] & 0x0f;
    if version != 4 || ihl < 5 {
        return Err(Verdict::Malformed(ParseError::BadIpHeader { version, ihl }));
    }

    let header_len = usize::from(ihl) * 4;
    let needed = header_len + UDP_HEADER_LEN;
    let Some(udp) = packet.get(header_len..).filter(|_| packet.len() >= needed) else {
        return Err(too_short("ipv4", needed, packet.len()));
    };

    let source = Ipv4Addr::new(
        header[IPV4_SRC_OFFSET],
        header[IPV4_SRC_OFFSET + 1],
        header[IPV4_SRC_OFFSET + 2],
        header[IPV4_SRC_OFFSET + 3],
    );

    Ok((source, udp))
}

/// Require a UDP datagram from the DNS port with a consistent length.
fn check_dns_datagram(datagram: &[u8]) -> Result<(), Verdict> {
    let Some(header) = datagram.get(..UDP_HEADER_LEN) else {
        return Err(too_short("udp", UDP_HEADER_LEN, datagram.len()));
    };

    let src_port = u16::from_be_bytes([header[0], header[1]]);
    if src_port != DNS_PORT {
        return Err(Verdict::NoMatch);
    }

    let declared = u16::from_be_bytes([header[4], header[5]]);
    let declared_len = usize::from(declared);
    if declared_len < UDP_HEADER_LEN || declared_len > datagram.len() {
        return Err(Verdict::Malformed(ParseError::BadUdpLength {
            declared,
            available: datagram.len(),
        }));
    }

    Ok(())
}

fn too_short(layer: &'static str, expected: usize, actual: usize) -> Verdict {
    Verdict::Malformed(ParseError::TooShort {
        layer,
        expected,
        actual,
    })
}
