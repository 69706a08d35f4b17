//! Bafang-style display UART protocol engine.
//!
//! baflink decodes and encodes the unframed byte protocol spoken by
//! BBS-style e-bike display heads, tracks the serial connection lifecycle,
//! and polls the display for live readings.
//!
//! # Crate Structure
//!
//! - [`transport`] — Serial link abstraction and event listener seam
//! - [`proto`] — Message model, wire encoding, incremental frame decoder
//! - [`monitor`] — Connection state machine, live streams, and poller
//!   (behind `monitor` feature)

/// Re-export transport types.
pub mod transport {
    pub use baflink_transport::*;
}

/// Re-export protocol types.
pub mod proto {
    pub use baflink_proto::*;
}

/// Re-export monitor types (requires `monitor` feature).
#[cfg(feature = "monitor")]
pub mod monitor {
    pub use baflink_monitor::*;
}
