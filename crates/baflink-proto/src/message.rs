use serde::Serialize;

use crate::error::{ProtoError, Result};
use crate::family::Family;
use crate::opcode;

/// Total size of a firmware-version response frame.
pub const FW_VERSION_RESPONSE_SIZE: usize = 8;
/// Total size of a speed telemetry frame (tag + two payload bytes).
pub const SPEED_FRAME_SIZE: usize = 3;

/// Firmware version triple. Plain value, no identity beyond its fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FwVersion {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl std::fmt::Display for FwVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

/// Request wire-encoding mode.
///
/// The protocol is observed in two variants: one sends bare
/// `[type, opcode]` request frames, the other appends a trailer checksum.
/// Which applies depends on the device family, so the mode is an explicit
/// argument to [`Message::to_bytes`] rather than something we infer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Encoding {
    /// `[type, opcode]`, no trailer.
    #[default]
    Plain,
    /// `[type, opcode, checksum]` with [`wire_checksum`] appended.
    Checksummed,
}

/// Trailer checksum: 8-bit truncated sum of every byte after the leading
/// type byte.
pub fn wire_checksum(frame: &[u8]) -> u8 {
    frame
        .iter()
        .skip(1)
        .fold(0u8, |sum, &byte| sum.wrapping_add(byte))
}

/// The closed set of protocol messages.
///
/// One exhaustive sum type covers requests, decoded responses, the
/// not-yet-decoded bucket, and the two observable sentinels. Adding a
/// message kind is a compile-checked change to every `match` below.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Message {
    /// Ask the controller for its firmware version.
    FirmwareVersionRequest,
    /// Ask whether event logging is enabled.
    EventLogStatusRequest,
    /// Ask for current wheel speed.
    SpeedRequest,
    /// Numbered bafang-read probe with an undocumented response.
    Probe { code: u8 },
    /// Configuration write with an opcode-specific payload.
    Write { opcode: u8, payload: Vec<u8> },

    /// Decoded firmware-version response.
    FirmwareVersion(FwVersion),
    /// Decoded speed telemetry frame.
    Speed {
        range_extension: u8,
        raw_wheel_speed: u8,
    },
    /// Bytes belonging to a response family whose layout is not yet
    /// decoded.
    Unparsed { family: Family, bytes: Vec<u8> },

    /// Idle value for observable streams.
    NoOp,
    /// A decode or transport failure, carried for observation.
    ProcessingError { message: String },
}

impl Message {
    /// The family this message travels in.
    pub fn family(&self) -> Family {
        match self {
            Message::FirmwareVersionRequest
            | Message::EventLogStatusRequest
            | Message::FirmwareVersion(_) => Family::LegacyRead,
            Message::SpeedRequest | Message::Probe { .. } | Message::Speed { .. } => {
                Family::BafangRead
            }
            Message::Write { .. } => Family::BafangWrite,
            Message::Unparsed { family, .. } => *family,
            Message::NoOp => Family::BafangRead,
            Message::ProcessingError { .. } => Family::Unknown,
        }
    }

    /// The sub-opcode byte following the type byte.
    pub fn opcode(&self) -> u8 {
        match self {
            Message::FirmwareVersionRequest | Message::FirmwareVersion(_) => {
                opcode::READ_FW_VERSION
            }
            Message::EventLogStatusRequest => opcode::READ_EVTLOG_ENABLE,
            Message::SpeedRequest | Message::Speed { .. } => opcode::READ_SPEED,
            Message::Probe { code } => *code,
            Message::Write { opcode, .. } => *opcode,
            Message::Unparsed { bytes, .. } => bytes.get(1).copied().unwrap_or(0),
            Message::NoOp => 0x00,
            Message::ProcessingError { .. } => 0x0F,
        }
    }

    /// Short kind name, for logs and listings.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Message::FirmwareVersionRequest => "fw-version-request",
            Message::EventLogStatusRequest => "evtlog-status-request",
            Message::SpeedRequest => "speed-request",
            Message::Probe { .. } => "probe",
            Message::Write { .. } => "write",
            Message::FirmwareVersion(_) => "fw-version",
            Message::Speed { .. } => "speed",
            Message::Unparsed { .. } => "unparsed",
            Message::NoOp => "noop",
            Message::ProcessingError { .. } => "processing-error",
        }
    }

    /// Wire encoding of this message.
    ///
    /// The firmware-version and event-log requests are fixed legacy frames
    /// that already carry their historical trailer; they encode identically
    /// in both modes. Everything else is `[type, opcode, payload...]` with
    /// the trailer governed by `encoding`.
    pub fn to_bytes(&self, encoding: Encoding) -> Vec<u8> {
        match self {
            Message::FirmwareVersionRequest => vec![0x01, 0x01, 0x02],
            Message::EventLogStatusRequest => vec![0x01, 0x02, 0x03],
            Message::Write { opcode, payload } => {
                let mut frame = vec![Family::BafangWrite.code(), *opcode];
                frame.extend_from_slice(payload);
                finish(frame, encoding)
            }
            other => finish(vec![other.family().code(), other.opcode()], encoding),
        }
    }

    /// Decode a complete 8-byte firmware-version response.
    ///
    /// Fails on short input; a truncated frame is an error, not version
    /// 0.0.0.
    pub fn decode_firmware_version(frame: &[u8]) -> Result<FwVersion> {
        if frame.len() < FW_VERSION_RESPONSE_SIZE {
            return Err(ProtoError::Truncated {
                have: frame.len(),
                need: FW_VERSION_RESPONSE_SIZE,
            });
        }
        Ok(FwVersion {
            major: frame[2],
            minor: frame[3],
            patch: frame[4],
        })
    }

    /// Decode a complete 3-byte speed frame.
    pub fn decode_speed(frame: &[u8]) -> Result<Message> {
        if frame.len() < SPEED_FRAME_SIZE {
            return Err(ProtoError::Truncated {
                have: frame.len(),
                need: SPEED_FRAME_SIZE,
            });
        }
        Ok(Message::Speed {
            range_extension: frame[1],
            raw_wheel_speed: frame[2],
        })
    }
}

fn finish(mut frame: Vec<u8>, encoding: Encoding) -> Vec<u8> {
    if encoding == Encoding::Checksummed {
        frame.push(wire_checksum(&frame));
    }
    frame
}
