//! Link-layer frame acquisition.
//!
//! This module defines the `FrameSource` trait and a pnet-based
//! implementation, together with interface selection and the privilege
//! check that must pass before a capture is opened.

mod interface;
mod pnet_capture;
mod privilege;

pub use interface::{pick_default_interface, select_interface};
pub use pnet_capture::PnetFrameSource;
pub use privilege::{ensure_capture_privilege, has_capture_privilege};

use crate::error::CaptureError;

/// A source of raw link-layer frames bound to one interface.
///
/// Reads never block: when nothing is queued the source returns
/// `Ok(None)` and the caller decides when to poll again. The source is
/// released when dropped.
pub trait FrameSource: Send {
    /// Read the next queued frame.
    ///
    /// Returns `Ok(None)` when no frame is available right now and an
    /// error only for failures that end the capture.
    fn read_frame(&mut self) -> Result<Option<&[u8]>, CaptureError>;

    /// Name of the interface being captured.
    fn interface_name(&self) -> &str;
}
