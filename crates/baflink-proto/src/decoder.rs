use bytes::{Buf, BytesMut};
use tracing::{debug, trace, warn};

use crate::family::{Family, SPEED_FRAME_TAG};
use crate::message::{Message, FW_VERSION_RESPONSE_SIZE, SPEED_FRAME_SIZE};
use crate::opcode;

const INITIAL_BUFFER_CAPACITY: usize = 256;

/// Outcome of one extraction attempt against the front of the buffer.
enum Step {
    /// A complete frame: emit the message, drop `usize` bytes.
    Emit(Message, usize),
    /// Unrecognized leading byte: drop one byte and resynchronize.
    Discard,
    /// No forward progress without more data.
    Wait,
}

/// Incremental frame decoder for the display UART stream.
///
/// Owns the only buffer of received-but-unattributed bytes. Feed it chunks
/// of any size and fragmentation via [`ingest`][FrameDecoder::ingest]; it
/// hands back every complete message it can extract and keeps the
/// remainder for the next chunk. Consumed bytes are never re-examined, and
/// unconsumed bytes are only dropped by the one-byte resynchronization
/// rule.
#[derive(Debug)]
pub struct FrameDecoder {
    buf: BytesMut,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
        }
    }

    /// Append a chunk and drain every complete frame it completes.
    ///
    /// Never fails: malformed-but-short data is a wait condition, a
    /// recognized frame that fails field validation becomes a
    /// [`Message::ProcessingError`], and an unrecognized leading byte costs
    /// exactly one discarded byte.
    pub fn ingest(&mut self, chunk: &[u8]) -> Vec<Message> {
        self.buf.extend_from_slice(chunk);
        trace!(
            chunk = %hex::encode(chunk),
            buffered = self.buf.len(),
            "ingest chunk"
        );

        let mut out = Vec::new();
        loop {
            if self.buf.len() < 2 {
                // Partial header; even a lone speed tag needs its payload.
                break;
            }
            match self.step() {
                Step::Emit(message, consumed) => {
                    debug!(kind = message.kind_name(), consumed, "decoded frame");
                    self.buf.advance(consumed);
                    out.push(message);
                }
                Step::Discard => {
                    warn!(byte = format!("{:#04x}", self.buf[0]), "unknown starting byte, discarding");
                    self.buf.advance(1);
                }
                Step::Wait => break,
            }
        }
        out
    }

    /// Bytes received but not yet attributed to a complete frame.
    pub fn pending(&self) -> &[u8] {
        &self.buf
    }

    /// Take whatever is stuck in the buffer as an [`Message::Unparsed`]
    /// diagnostic, leaving the decoder empty.
    ///
    /// Used at end of stream; the bafang-read and legacy-write response
    /// families park here deliberately until their layouts are decoded.
    pub fn flush(&mut self) -> Option<Message> {
        if self.buf.is_empty() {
            return None;
        }
        let bytes = self.buf.split().to_vec();
        Some(Message::Unparsed {
            family: Family::from_byte(bytes[0]),
            bytes,
        })
    }

    /// One extraction attempt. Families are checked in a fixed priority
    /// order: legacy-read, bafang-read, legacy-write, speed tag, unknown.
    fn step(&self) -> Step {
        let buf = &self.buf[..];
        match buf[0] {
            b if b == Family::LegacyRead.code() => self.step_legacy_read(buf),
            b if b == Family::BafangRead.code() => {
                // Response layouts for this family are not yet decoded.
                // Deliberately consume nothing rather than invent a length.
                trace!("bafang-read response family, not yet decoded");
                Step::Wait
            }
            b if b == Family::LegacyWrite.code() => {
                // ACK/NACK parsing pending.
                trace!("legacy-write response family, not yet decoded");
                Step::Wait
            }
            SPEED_FRAME_TAG => {
                if buf.len() < SPEED_FRAME_SIZE {
                    return Step::Wait;
                }
                match Message::decode_speed(&buf[..SPEED_FRAME_SIZE]) {
                    Ok(message) => Step::Emit(message, SPEED_FRAME_SIZE),
                    Err(err) => Step::Emit(
                        Message::ProcessingError {
                            message: err.to_string(),
                        },
                        SPEED_FRAME_SIZE,
                    ),
                }
            }
            _ => Step::Discard,
        }
    }

    fn step_legacy_read(&self, buf: &[u8]) -> Step {
        let sub = buf[1];
        if sub == opcode::READ_FW_VERSION {
            if buf.len() < FW_VERSION_RESPONSE_SIZE {
                trace!(
                    have = buf.len(),
                    need = FW_VERSION_RESPONSE_SIZE,
                    "firmware version response incomplete"
                );
                return Step::Wait;
            }
            match Message::decode_firmware_version(&buf[..FW_VERSION_RESPONSE_SIZE]) {
                Ok(version) => {
                    Step::Emit(Message::FirmwareVersion(version), FW_VERSION_RESPONSE_SIZE)
                }
                Err(err) => Step::Emit(
                    Message::ProcessingError {
                        message: err.to_string(),
                    },
                    FW_VERSION_RESPONSE_SIZE,
                ),
            }
        } else {
            // Other sub-opcode families may have different lengths; wait
            // for more context rather than guess.
            trace!(sub = format!("{sub:#04x}"), "legacy-read: unknown subcommand");
            Step::Wait
        }
    }
}
