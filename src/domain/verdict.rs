//! Result of dissecting one captured frame.

use std::net::Ipv4Addr;

use crate::error::ParseError;

/// What the dissector concluded about a single frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// A UDP datagram sourced from port 53, sent by this address.
    Match(Ipv4Addr),
    /// A well-formed frame that is not a DNS response.
    NoMatch,
    /// A frame too short or internally inconsistent to parse.
    Malformed(ParseError),
}

impl Verdict {
    /// The responder address, if this verdict is a match.
    pub fn responder(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Match(addr) => Some(*addr),
            _ => None,
        }
    }

    #[cfg(test)]
    pub fn is_malformed(&self) -> bool {
        matches!(self, Self::Malformed(_))
    }
}
