//! Domain models for DNS responder detection.
//!
//! These types are independent of the capture backend and of how
//! outcomes are presented.

mod interface;
mod outcome;
mod verdict;

pub use interface::{is_global_unicast, InterfaceHandle};
pub use outcome::{CaptureOutcome, EXIT_CAPTURE_FAILURE, EXIT_SETUP_FAILURE, EXIT_SUCCESS};
pub use verdict::Verdict;
