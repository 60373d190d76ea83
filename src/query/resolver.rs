//! Name resolution backends.

use std::io;
use std::net::{IpAddr, ToSocketAddrs};

/// A blocking name resolver.
///
/// Implementations may block for as long as the host resolver takes;
/// the query driver runs them off the async executor.
pub trait Resolver: Send + Sync {
    /// Resolve `domain` to its addresses.
    fn lookup(&self, domain: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn lookup(&self, domain: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = (domain, 0u16).to_socket_addrs()?;
        Ok(addrs.map(|addr| addr.ip()).collect())
    }
}
