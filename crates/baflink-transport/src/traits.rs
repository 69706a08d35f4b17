use std::sync::Arc;

use crate::error::Result;

/// Lifecycle and data events delivered by a serial link.
///
/// Links give no message-boundary guarantee: `DataReceived` carries whatever
/// run of bytes the port handed over, fragmented at any point.
#[derive(Debug)]
pub enum LinkEvent {
    /// Raw bytes arrived from the device.
    DataReceived(Vec<u8>),
    /// A device was attached and opened.
    DeviceAttached { device: String },
    /// The connected device went away.
    DeviceDetached,
    /// Connecting (or staying connected) failed.
    ConnectionError(String),
    /// The read loop hit an I/O error.
    ReadError(std::io::Error),
    /// A write failed after being accepted.
    WriteError(std::io::Error),
}

/// Receives [`LinkEvent`]s from a link.
///
/// Implementations must tolerate being called from the link's own delivery
/// thread and must not block it.
pub trait LinkListener: Send + Sync {
    fn on_event(&self, event: LinkEvent);
}

/// A byte-oriented serial link to a display/controller pair.
///
/// This is the transport boundary: device enumeration, permission flows, and
/// baud/parity configuration live behind implementations of this trait.
pub trait SerialLink: Send + Sync {
    /// Register (or clear) the listener receiving link events.
    fn set_listener(&self, listener: Option<Arc<dyn LinkListener>>);

    /// Trigger device discovery and connect to the first usable device.
    ///
    /// Connection outcome is reported through [`LinkEvent`]s, not the
    /// return value.
    fn find_and_connect(&self) -> Result<()>;

    /// Close the current connection. Safe to call when not connected.
    fn disconnect(&self);

    /// Write bytes to the device with a bounded timeout.
    fn send(&self, bytes: &[u8]) -> Result<()>;

    /// Whether a device is currently connected.
    fn is_connected(&self) -> bool;
}
