/// Errors surfaced by serial link implementations.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// No device is currently connected.
    #[error("not connected")]
    NotConnected,

    /// Device discovery found nothing usable.
    #[error("no suitable serial device found: {0}")]
    NoDevice(String),

    /// A write did not complete within the link's send timeout.
    #[error("send timed out after {0:?}")]
    SendTimeout(std::time::Duration),

    /// An I/O error occurred on the underlying port.
    #[error("transport I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, TransportError>;
