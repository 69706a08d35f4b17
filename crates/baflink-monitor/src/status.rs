use serde::Serialize;

/// Transport lifecycle state.
///
/// Exactly one state holds at a time. Transitions are driven only by link
/// lifecycle events and explicit connect/disconnect/unbind calls on the
/// monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum LinkStatus {
    /// No link service attached yet (initial state).
    ServiceUnbound,
    /// Link service attached, no device connected.
    ServiceBound,
    /// A device is connected and exchanging bytes.
    Connected { device: String },
    /// The device went away or was disconnected on request.
    Disconnected,
    /// The link reported a failure.
    Error { message: String },
}

impl LinkStatus {
    pub fn is_connected(&self) -> bool {
        matches!(self, LinkStatus::Connected { .. })
    }

    /// Whether a connect attempt is legal from this state.
    pub fn can_connect(&self) -> bool {
        matches!(
            self,
            LinkStatus::ServiceBound | LinkStatus::Disconnected | LinkStatus::Error { .. }
        )
    }
}

impl std::fmt::Display for LinkStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LinkStatus::ServiceUnbound => write!(f, "service unbound"),
            LinkStatus::ServiceBound => write!(f, "service bound"),
            LinkStatus::Connected { device } => write!(f, "connected to {device}"),
            LinkStatus::Disconnected => write!(f, "disconnected"),
            LinkStatus::Error { message } => write!(f, "error: {message}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connect_legality() {
        assert!(!LinkStatus::ServiceUnbound.can_connect());
        assert!(LinkStatus::ServiceBound.can_connect());
        assert!(LinkStatus::Disconnected.can_connect());
        assert!(LinkStatus::Error {
            message: "x".into()
        }
        .can_connect());
        assert!(!LinkStatus::Connected {
            device: "d".into()
        }
        .can_connect());
    }

    #[test]
    fn only_connected_counts_as_connected() {
        assert!(LinkStatus::Connected {
            device: "ttyUSB0".into()
        }
        .is_connected());
        assert!(!LinkStatus::Disconnected.is_connected());
    }
}
