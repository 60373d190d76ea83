//! Human-readable reporter.

use std::io::{self, Write};
use std::time::Duration;

use crate::domain::{CaptureOutcome, InterfaceHandle};
use crate::error::CaptureError;
use crate::reporter::OutcomeReporter;

/// Reports progress and outcome for a person at a terminal.
pub struct ConsoleReporter {
    /// Whether to show interface index and addresses
    verbose: bool,
    /// Capture timeout, shown when a run times out
    timeout: Option<Duration>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self {
            verbose: false,
            timeout: None,
        }
    }

    /// Enable or disable verbose output.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Mention the capture timeout in timeout messages.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    fn format_interface(&self, interface: &InterfaceHandle) -> String {
        let mut output = format!("Default interface: {}", interface.name);
        if self.verbose {
            let addrs: Vec<_> = interface.addresses.iter().map(|ip| ip.to_string()).collect();
            output.push_str(&format!(
                " (index {}, {})",
                interface.index,
                if addrs.is_empty() {
                    "no IP".to_string()
                } else {
                    addrs.join(", ")
                }
            ));
        }
        output
    }
}

impl Default for ConsoleReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl OutcomeReporter for ConsoleReporter {
    fn on_start(&self, interface: &InterfaceHandle, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "{}", self.format_interface(interface))
    }

    fn setup_failed(&self, error: &CaptureError, err: &mut dyn Write) -> io::Result<()> {
        match error {
            CaptureError::InsufficientPermissions => {
                writeln!(err, "This program requires root privileges to run.")?;
                writeln!(err, "Please run it as root or with sudo.")
            }
            CaptureError::InterfaceNotFound(_) => {
                writeln!(err, "Failed to get the default interface: {}", error)
            }
            _ => writeln!(err, "Failed to open capture socket: {}", error),
        }
    }

    fn report(
        &self,
        outcome: &CaptureOutcome,
        out: &mut dyn Write,
        err: &mut dyn Write,
    ) -> io::Result<()> {
        match outcome {
            CaptureOutcome::Responder(addr) => writeln!(out, "DNS server IP: {}", addr),
            CaptureOutcome::Failed(e) => {
                writeln!(err, "Failed to capture DNS response: {}", e)
            }
            CaptureOutcome::TimedOut => match self.timeout {
                Some(timeout) => writeln!(
                    err,
                    "Failed to capture DNS response: timeout after {:?}",
                    timeout
                ),
                None => writeln!(err, "Failed to capture DNS response: timeout"),
            },
        }
    }
}
