//! Message model and incremental frame decoder for the Bafang/BBS-style
//! display UART protocol.
//!
//! The wire format has no length prefix and no framing delimiter: the
//! leading byte selects a message family, and frame length is a property of
//! the (family, sub-opcode) pair — when it is known at all. [`FrameDecoder`]
//! turns an arbitrarily fragmented byte stream into typed [`Message`]s,
//! waiting on incomplete frames and discarding one byte at a time to
//! recover from desynchronization.

pub mod decoder;
pub mod error;
pub mod family;
pub mod message;
pub mod opcode;

pub use decoder::FrameDecoder;
pub use error::{ProtoError, Result};
pub use family::{Family, SPEED_FRAME_TAG};
pub use message::{
    wire_checksum, Encoding, FwVersion, Message, FW_VERSION_RESPONSE_SIZE, SPEED_FRAME_SIZE,
};
