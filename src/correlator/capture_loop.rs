//! Poll-and-dissect loop run by the capture task.

use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use tracing::{debug, trace};

use crate::capture::FrameSource;
use crate::domain::Verdict;
use crate::error::CaptureError;
use crate::parser::dissect;

/// Result of a single poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureStep {
    /// A frame dissected to a DNS response from this address.
    Matched(Ipv4Addr),
    /// A frame was read and discarded.
    Discarded,
    /// No frame was queued.
    Idle,
}

/// Owns a frame source and polls it until a match, an error, or a stop.
pub struct CaptureLoop<S> {
    source: S,
    running: Arc<AtomicBool>,
    poll_interval: Duration,
    frames_seen: u64,
}

impl<S: FrameSource> CaptureLoop<S> {
    pub fn new(source: S, running: Arc<AtomicBool>, poll_interval: Duration) -> Self {
        Self {
            source,
            running,
            poll_interval,
            frames_seen: 0,
        }
    }

    /// Number of frames read so far.
    pub fn frames_seen(&self) -> u64 {
        self.frames_seen
    }

    /// Read and dissect at most one frame.
    pub fn step(&mut self) -> Result<CaptureStep, CaptureError> {
        let Some(frame) = self.source.read_frame()? else {
            return Ok(CaptureStep::Idle);
        };
        self.frames_seen += 1;
        trace!("Packet captured: {} bytes", frame.len());

        match dissect(frame) {
            Verdict::Match(addr) => {
                debug!("DNS response detected from {}", addr);
                Ok(CaptureStep::Matched(addr))
            }
            Verdict::NoMatch => Ok(CaptureStep::Discarded),
            Verdict::Malformed(reason) => {
                trace!("Discarding malformed frame: {}", reason);
                Ok(CaptureStep::Discarded)
            }
        }
    }

    /// Poll until a match or a fatal error.
    ///
    /// Sleeps one poll interval whenever no frame is queued. Returns
    /// `None` once the running flag is cleared. The source is dropped,
    /// and so released, when this returns.
    pub fn run(mut self) -> Option<Result<Ipv4Addr, CaptureError>> {
        debug!("Capture loop started on {}", self.source.interface_name());

        while self.running.load(Ordering::SeqCst) {
            match self.step() {
                Ok(CaptureStep::Matched(addr)) => {
                    debug!("Capture loop matched after {} frame(s)", self.frames_seen());
                    return Some(Ok(addr));
                }
                Ok(CaptureStep::Discarded) => {}
                Ok(CaptureStep::Idle) => thread::sleep(self.poll_interval),
                Err(e) => return Some(Err(e)),
            }
        }

        debug!("Capture loop stopped after {} frame(s)", self.frames_seen());
        None
    }
}
