//! Capture/query correlation.
//!
//! Races the first DNS response seen on the wire against a fixed
//! deadline while lookups are issued to provoke that response.

mod capture_loop;
mod engine;

pub use capture_loop::{CaptureLoop, CaptureStep};
pub use engine::Correlator;
