use serde::Serialize;

/// Leading type byte of a speed telemetry frame.
///
/// Unlike the families below this is a bare frame tag: the two payload
/// bytes follow it directly, with no sub-opcode.
pub const SPEED_FRAME_TAG: u8 = 0x20;

/// Message family, selected by the first byte of every wire frame.
///
/// Every leading byte maps to exactly one family, or to [`Family::Unknown`]
/// when unrecognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Family {
    /// BBS open-firmware read family.
    LegacyRead,
    /// BBS open-firmware write family (ACK/NACK responses, undecoded).
    LegacyWrite,
    /// Stock Bafang read family (responses not yet decoded).
    BafangRead,
    /// Stock Bafang write family.
    BafangWrite,
    /// Anything else.
    Unknown,
}

impl Family {
    /// Wire value of this family's type byte.
    pub fn code(self) -> u8 {
        match self {
            Family::LegacyRead => 0x01,
            Family::LegacyWrite => 0x02,
            Family::BafangRead => 0x11,
            Family::BafangWrite => 0x16,
            Family::Unknown => 0x0F,
        }
    }

    /// Classify a leading byte.
    pub fn from_byte(byte: u8) -> Self {
        match byte {
            0x01 => Family::LegacyRead,
            0x02 => Family::LegacyWrite,
            0x11 => Family::BafangRead,
            0x16 => Family::BafangWrite,
            _ => Family::Unknown,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Family::LegacyRead => "legacy-read",
            Family::LegacyWrite => "legacy-write",
            Family::BafangRead => "bafang-read",
            Family::BafangWrite => "bafang-write",
            Family::Unknown => "unknown",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_bytes_round_trip() {
        for family in [
            Family::LegacyRead,
            Family::LegacyWrite,
            Family::BafangRead,
            Family::BafangWrite,
        ] {
            assert_eq!(Family::from_byte(family.code()), family);
        }
    }

    #[test]
    fn unrecognized_bytes_are_unknown() {
        assert_eq!(Family::from_byte(0xFF), Family::Unknown);
        assert_eq!(Family::from_byte(0x20), Family::Unknown);
        assert_eq!(Family::from_byte(0x0F), Family::Unknown);
    }
}
