//! pnet-based frame source.

use std::io;
use std::time::Duration;

use pnet::datalink::{self, Channel, Config, DataLinkReceiver};
use tracing::debug;

use super::FrameSource;
use crate::domain::InterfaceHandle;
use crate::error::CaptureError;
use crate::parser::MAX_FRAME_SIZE;

/// Raw capture on a single interface using a pnet datalink channel.
pub struct PnetFrameSource {
    interface_name: String,
    rx: Box<dyn DataLinkReceiver>,
}

impl PnetFrameSource {
    /// Open a layer-2 capture on the given interface.
    ///
    /// The channel is configured with a zero read timeout so that
    /// `read_frame` returns immediately when nothing is queued.
    pub fn open(handle: &InterfaceHandle) -> Result<Self, CaptureError> {
        let interface = datalink::interfaces()
            .into_iter()
            .find(|iface| iface.index == handle.index && iface.name == handle.name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(handle.name.clone()))?;

        let config = Config {
            read_timeout: Some(Duration::ZERO),
            read_buffer_size: MAX_FRAME_SIZE,
            promiscuous: false,
            ..Config::default()
        };

        let rx = match datalink::channel(&interface, config) {
            Ok(Channel::Ethernet(_tx, rx)) => rx,
            Ok(_) => {
                return Err(CaptureError::ChannelCreation(
                    "unsupported channel type".to_string(),
                ))
            }
            Err(e) => return Err(map_open_error(e)),
        };

        debug!(
            "Capture channel opened on {} (index {})",
            interface.name, interface.index
        );

        Ok(Self {
            interface_name: interface.name,
            rx,
        })
    }
}

impl FrameSource for PnetFrameSource {
    fn read_frame(&mut self) -> Result<Option<&[u8]>, CaptureError> {
        match self.rx.next() {
            // Nothing useful in an empty read; poll again
            Ok([]) => Ok(None),
            Ok(frame) => Ok(Some(frame)),
            Err(e) if is_idle(&e) => Ok(None),
            Err(e) => Err(CaptureError::Read(e)),
        }
    }

    fn interface_name(&self) -> &str {
        &self.interface_name
    }
}

impl Drop for PnetFrameSource {
    fn drop(&mut self) {
        debug!("Capture socket on {} released", self.interface_name);
    }
}

/// Errors that only mean "no frame right now".
fn is_idle(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
    )
}

fn map_open_error(e: io::Error) -> CaptureError {
    let msg = e.to_string();
    if e.kind() == io::ErrorKind::PermissionDenied
        || msg.contains("permission")
        || msg.contains("Operation not permitted")
    {
        return CaptureError::InsufficientPermissions;
    }
    CaptureError::ChannelCreation(msg)
}
