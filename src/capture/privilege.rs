//! Privilege check for raw capture.

use crate::error::CaptureError;

/// Whether the process may open a raw capture socket.
#[cfg(unix)]
pub fn has_capture_privilege() -> bool {
    // SAFETY: geteuid has no preconditions and cannot fail.
    unsafe { libc::geteuid() == 0 }
}

#[cfg(not(unix))]
pub fn has_capture_privilege() -> bool {
    true
}

/// Fail with `InsufficientPermissions` unless running privileged.
pub fn ensure_capture_privilege() -> Result<(), CaptureError> {
    if has_capture_privilege() {
        tracing::debug!("Running with capture privileges");
        Ok(())
    } else {
        Err(CaptureError::InsufficientPermissions)
    }
}
