//! Connection lifecycle and live message streams for a display link.
//!
//! This is the "just works" layer. Bind a [`SerialLink`], watch typed
//! messages and status changes arrive on broadcast streams, and poll the
//! display on a fixed interval.
//!
//! [`SerialLink`]: baflink_transport::SerialLink

pub mod error;
pub mod monitor;
pub mod poller;
pub mod status;

pub use error::{MonitorError, Result};
pub use monitor::{DisplayMonitor, MonitorConfig};
pub use poller::PollConfig;
pub use status::LinkStatus;
