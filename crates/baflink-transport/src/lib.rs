//! Serial transport boundary for the baflink protocol engine.
//!
//! The engine never talks to hardware directly. It consumes the
//! [`SerialLink`] trait and receives [`LinkEvent`]s through a
//! [`LinkListener`]; device enumeration, permission flows, and port
//! configuration belong to link implementations outside this workspace.
//! [`LoopbackLink`] is the in-memory implementation used by tests and the
//! CLI.

pub mod error;
pub mod loopback;
pub mod traits;

pub use error::{Result, TransportError};
pub use loopback::LoopbackLink;
pub use traits::{LinkEvent, LinkListener, SerialLink};
