//! Interface selection.

use pnet::datalink::{self, NetworkInterface};
use tracing::debug;

use crate::domain::InterfaceHandle;
use crate::error::CaptureError;

impl From<&NetworkInterface> for InterfaceHandle {
    fn from(iface: &NetworkInterface) -> Self {
        InterfaceHandle::new(
            iface.index,
            iface.name.clone(),
            iface.ips.iter().map(|net| net.ip()).collect(),
        )
    }
}

/// Select the capture interface.
///
/// With a name, that interface is used as-is. Without one, the first
/// interface carrying a globally routable unicast address is picked.
pub fn select_interface(name: Option<&str>) -> Result<InterfaceHandle, CaptureError> {
    let candidates: Vec<InterfaceHandle> = datalink::interfaces()
        .iter()
        .map(InterfaceHandle::from)
        .collect();

    match name {
        Some(name) => candidates
            .into_iter()
            .find(|iface| iface.name == name)
            .ok_or_else(|| CaptureError::InterfaceNotFound(name.to_string())),
        None => pick_default_interface(candidates).ok_or_else(|| {
            CaptureError::InterfaceNotFound("no suitable default interface found".to_string())
        }),
    }
}

/// First interface, in enumeration order, with a global unicast address.
pub fn pick_default_interface<I>(candidates: I) -> Option<InterfaceHandle>
where
    I: IntoIterator<Item = InterfaceHandle>,
{
    candidates.into_iter().find(|iface| {
        match iface.global_unicast_address() {
            Some(ip) => {
                debug!("Global unicast IP {} found on interface {}", ip, iface.name);
                true
            }
            None => {
                debug!("Skipping interface {}: no global unicast address", iface.name);
                false
            }
        }
    })
}
