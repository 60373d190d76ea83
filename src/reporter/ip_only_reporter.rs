//! Machine-readable reporter.

use std::io::{self, Write};

use crate::domain::{CaptureOutcome, InterfaceHandle};
use crate::error::CaptureError;
use crate::reporter::OutcomeReporter;

/// Prints the responder address and nothing else.
///
/// Failures print nothing; the exit code carries them.
#[derive(Debug, Default)]
pub struct IpOnlyReporter;

impl IpOnlyReporter {
    pub fn new() -> Self {
        Self
    }
}

impl OutcomeReporter for IpOnlyReporter {
    fn on_start(&self, _interface: &InterfaceHandle, _out: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn setup_failed(&self, _error: &CaptureError, _err: &mut dyn Write) -> io::Result<()> {
        Ok(())
    }

    fn report(
        &self,
        outcome: &CaptureOutcome,
        out: &mut dyn Write,
        _err: &mut dyn Write,
    ) -> io::Result<()> {
        if let CaptureOutcome::Responder(addr) = outcome {
            writeln!(out, "{}", addr)?;
        }
        Ok(())
    }
}
