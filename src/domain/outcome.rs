//! The single result of a correlation run.

use std::net::Ipv4Addr;

use crate::error::RunError;

/// Exit code for a successful run.
pub const EXIT_SUCCESS: u8 = 0;
/// Exit code when setup (privilege, interface, socket, config) failed.
pub const EXIT_SETUP_FAILURE: u8 = 1;
/// Exit code when capture, lookups, or the deadline failed the run.
pub const EXIT_CAPTURE_FAILURE: u8 = 2;

/// Outcome of one run. Exactly one is produced per run.
#[derive(Debug)]
pub enum CaptureOutcome {
    /// The first frame recognized as a DNS response came from this address.
    Responder(Ipv4Addr),
    /// Capture or lookups failed fatally.
    Failed(RunError),
    /// The deadline elapsed with no match and no error.
    TimedOut,
}

impl CaptureOutcome {
    pub fn responder(&self) -> Option<Ipv4Addr> {
        match self {
            Self::Responder(addr) => Some(*addr),
            _ => None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Responder(_))
    }

    /// Process exit code conveying this outcome.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Responder(_) => EXIT_SUCCESS,
            Self::Failed(RunError::Capture(e)) if e.is_setup_failure() => EXIT_SETUP_FAILURE,
            Self::Failed(_) | Self::TimedOut => EXIT_CAPTURE_FAILURE,
        }
    }
}
