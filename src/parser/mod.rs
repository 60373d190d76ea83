//! Frame dissection module.
//!
//! Turns raw Ethernet frames into verdicts without trusting any
//! length declared inside the frame.

mod frame_parser;

pub use frame_parser::{dissect, DNS_PORT, MAX_FRAME_SIZE};
