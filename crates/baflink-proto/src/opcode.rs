//! Opcode table for the Bafang display protocol.
//!
//! Constants follow the bbs-fw protocol notes by Daniel Nilsson
//! (<https://github.com/danielnilsson9/bbs-fw/wiki/Bafang-Display-Protocol>),
//! which most display tooling draws from. Gathered here as one
//! table keyed by (family, opcode) instead of scattering them across the
//! message types.

use crate::family::Family;

/// Legacy-read: firmware version request/response.
pub const READ_FW_VERSION: u8 = 0x01;
/// Legacy-read: event-log enable flag.
pub const READ_EVTLOG_ENABLE: u8 = 0x02;
/// Legacy-read: full configuration block.
pub const READ_CONFIG: u8 = 0x03;

/// Legacy-write: event-log enable flag.
pub const WRITE_EVTLOG_ENABLE: u8 = 0xF0;
/// Legacy-write: full configuration block.
pub const WRITE_CONFIG: u8 = 0xF1;
/// Legacy-write: reset configuration to defaults.
pub const WRITE_RESET_CONFIG: u8 = 0xF2;
/// Legacy-write: ADC voltage calibration.
pub const WRITE_ADC_VOLTAGE_CALIBRATION: u8 = 0xF3;

/// Bafang-read: wheel speed.
pub const READ_SPEED: u8 = 0x20;
/// Bafang-read probes with undocumented responses, seen in display traffic.
pub const PROBE_CODES: [u8; 4] = [0x08, 0x0A, 0x11, 0x22];

/// Human-readable name for a (family, opcode) pair, or `None` when the pair
/// is not in the table.
pub fn describe(family: Family, opcode: u8) -> Option<&'static str> {
    match (family, opcode) {
        (Family::LegacyRead, READ_FW_VERSION) => Some("firmware version"),
        (Family::LegacyRead, READ_EVTLOG_ENABLE) => Some("event log enable"),
        (Family::LegacyRead, READ_CONFIG) => Some("configuration"),
        (Family::LegacyWrite, WRITE_EVTLOG_ENABLE) => Some("write event log enable"),
        (Family::LegacyWrite, WRITE_CONFIG) => Some("write configuration"),
        (Family::LegacyWrite, WRITE_RESET_CONFIG) => Some("reset configuration"),
        (Family::LegacyWrite, WRITE_ADC_VOLTAGE_CALIBRATION) => {
            Some("adc voltage calibration")
        }
        (Family::BafangRead, READ_SPEED) => Some("wheel speed"),
        (Family::BafangRead, code) if PROBE_CODES.contains(&code) => {
            Some("undocumented probe")
        }
        _ => None,
    }
}

/// All known table entries, for listings.
pub fn entries() -> Vec<(Family, u8, &'static str)> {
    let mut out = vec![
        (Family::LegacyRead, READ_FW_VERSION),
        (Family::LegacyRead, READ_EVTLOG_ENABLE),
        (Family::LegacyRead, READ_CONFIG),
        (Family::LegacyWrite, WRITE_EVTLOG_ENABLE),
        (Family::LegacyWrite, WRITE_CONFIG),
        (Family::LegacyWrite, WRITE_RESET_CONFIG),
        (Family::LegacyWrite, WRITE_ADC_VOLTAGE_CALIBRATION),
        (Family::BafangRead, READ_SPEED),
    ];
    out.extend(PROBE_CODES.iter().map(|&code| (Family::BafangRead, code)));
    out.into_iter()
        .map(|(family, opcode)| {
            let name = describe(family, opcode).unwrap_or("unknown");
            (family, opcode, name)
        })
        .collect()
}
