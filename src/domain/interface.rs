//! Network interface identity.

use std::fmt;
use std::net::IpAddr;

/// The interface a capture is bound to for one run.
///
/// Holds identity only; the capture backend resolves it to a socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceHandle {
    /// Kernel interface index
    pub index: u32,
    /// Interface name (e.g. `eth0`)
    pub name: String,
    /// Addresses assigned to the interface when it was selected
    pub addresses: Vec<IpAddr>,
}

impl InterfaceHandle {
    pub fn new(index: u32, name: impl Into<String>, addresses: Vec<IpAddr>) -> Self {
        Self {
            index,
            name: name.into(),
            addresses,
        }
    }

    /// First address on the interface that is globally routable unicast.
    pub fn global_unicast_address(&self) -> Option<IpAddr> {
        self.addresses
            .iter()
            .copied()
            .find(|ip| is_global_unicast(*ip))
    }
}

impl fmt::Display for InterfaceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (index {})", self.name, self.index)
    }
}

/// Whether an address is a unicast address usable beyond the local link.
///
/// Private ranges count as global here: the point is to find the interface
/// that carries outbound traffic, not one reachable from the internet.
pub fn is_global_unicast(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            !(v4.is_unspecified()
                || v4.is_loopback()
                || v4.is_multicast()
                || v4.is_link_local()
                || v4.is_broadcast())
        }
        IpAddr::V6(v6) => {
            // fe80::/10
            let link_local = (v6.segments()[0] & 0xffc0) == 0xfe80;
            !(v6.is_unspecified() || v6.is_loopback() || v6.is_multicast() || link_local)
        }
    }
}
