//! Error types for capture, dissection, lookups and configuration.

use std::io;

use thiserror::Error;

/// Errors raised while opening or reading the link-layer capture.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("insufficient privileges to open a raw capture socket (run as root or with CAP_NET_RAW)")]
    InsufficientPermissions,

    #[error("network interface not found: {0}")]
    InterfaceNotFound(String),

    #[error("failed to create capture channel: {0}")]
    ChannelCreation(String),

    #[error("failed to read packet: {0}")]
    Read(#[source] io::Error),

    #[error("capture task ended unexpectedly: {0}")]
    TaskAborted(String),
}

impl CaptureError {
    /// Whether the error happened before any capture took place.
    ///
    /// Setup failures exit with code 1, everything else with code 2.
    pub fn is_setup_failure(&self) -> bool {
        matches!(
            self,
            Self::InsufficientPermissions | Self::InterfaceNotFound(_) | Self::ChannelCreation(_)
        )
    }
}

/// Errors raised by the query driver.
#[derive(Error, Debug)]
pub enum QueryError {
    #[error("DNS lookup {attempt} for {domain} failed: {source}")]
    Lookup {
        attempt: u32,
        domain: String,
        #[source]
        source: io::Error,
    },

    #[error("DNS lookup {attempt} for {domain} returned no addresses")]
    NoAddresses { attempt: u32, domain: String },

    #[error("lookup task ended unexpectedly: {0}")]
    TaskAborted(String),
}

impl QueryError {
    /// The 1-based attempt that failed, if known.
    pub fn attempt(&self) -> Option<u32> {
        match self {
            Self::Lookup { attempt, .. } | Self::NoAddresses { attempt, .. } => Some(*attempt),
            Self::TaskAborted(_) => None,
        }
    }
}

/// Reasons a frame was discarded as malformed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{layer} header too short: expected {expected} bytes, got {actual}")]
    TooShort {
        layer: &'static str,
        expected: usize,
        actual: usize,
    },

    #[error("invalid IPv4 header: version {version}, IHL {ihl}")]
    BadIpHeader { version: u8, ihl: u8 },

    #[error("inconsistent UDP length: declared {declared}, available {available}")]
    BadUdpLength { declared: u16, available: usize },
}

/// The failure carried by a resolved run.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Capture(#[from] CaptureError),

    #[error(transparent)]
    Query(#[from] QueryError),
}

/// Invalid configuration values.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("domain must not be empty")]
    EmptyDomain,

    #[error("timeout must be greater than zero")]
    ZeroTimeout,

    #[error("query count must be greater than zero")]
    ZeroQueryCount,
}
