//! whichdns - find out which DNS server answers this host.
//!
//! Opens a link-layer capture on the primary interface, issues DNS
//! lookups, and reports the source address of the first DNS response
//! seen on the wire.

pub mod capture;
pub mod config;
pub mod correlator;
pub mod domain;
pub mod error;
pub mod parser;
pub mod query;
pub mod reporter;

pub use config::Config;
pub use correlator::Correlator;
pub use domain::{CaptureOutcome, InterfaceHandle, Verdict};
pub use error::{CaptureError, ConfigError, ParseError, QueryError, RunError};
pub use parser::dissect;

/// Crate version, printed by `whichdns version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
