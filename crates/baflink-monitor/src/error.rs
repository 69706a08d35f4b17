/// Errors reported to monitor callers.
#[derive(Debug, thiserror::Error)]
pub enum MonitorError {
    /// An operation that needs a bound link service was called before
    /// `start_monitoring`.
    #[error("service not bound")]
    NotBound,

    /// The connect-wait budget ran out before the link reached `Connected`.
    #[error("timed out waiting for device connection after {attempts} attempts")]
    ConnectWaitTimeout { attempts: u32 },

    /// Transport-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] baflink_transport::TransportError),
}

pub type Result<T> = std::result::Result<T, MonitorError>;
