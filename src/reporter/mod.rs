//! Presentation of run outcomes.
//!
//! This module defines the `OutcomeReporter` trait and the two
//! presentations the tool supports: human-readable and ip-only.

mod console_reporter;
mod ip_only_reporter;

pub use console_reporter::ConsoleReporter;
pub use ip_only_reporter::IpOnlyReporter;

use std::io::{self, Write};

use crate::config::Config;
use crate::domain::{CaptureOutcome, InterfaceHandle};
use crate::error::CaptureError;

/// Renders the stages of a run to an output and an error stream.
///
/// Streams are passed in so the same reporter works against the real
/// stdout/stderr and against buffers.
pub trait OutcomeReporter: Send {
    /// Called once the capture interface is known.
    fn on_start(&self, interface: &InterfaceHandle, out: &mut dyn Write) -> io::Result<()>;

    /// Called when the run could not start (privilege, interface, socket).
    fn setup_failed(&self, error: &CaptureError, err: &mut dyn Write) -> io::Result<()>;

    /// Called once with the outcome of the run.
    fn report(
        &self,
        outcome: &CaptureOutcome,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<()>;
}

/// Pick the reporter for the configured output mode.
pub fn reporter_for(config: &Config) -> Box<dyn OutcomeReporter> {
    if config.ip_only {
        Box::new(IpOnlyReporter::new())
    } else {
        Box::new(
            ConsoleReporter::new()
                .with_verbose(config.debug)
                .with_timeout(config.timeout),
        )
    }
}
