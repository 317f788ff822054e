//! CRC16/CCITT-FALSE checksum used by the payload's `63` field.
//!
//! # Parameters
//! - width 16, poly `0x1021`, init `0xFFFF`
//! - no input/output reflection, no final XOR
//! - check value for `"123456789"` is `0x29B1`

const POLY: u16 = 0x1021;
const INIT: u16 = 0xFFFF;

/// Compute CRC16/CCITT-FALSE over the given bytes.
pub fn crc16_ccitt_false(data: &[u8]) -> u16 {
    let mut crc = INIT;
    for &byte in data {
        crc ^= (byte as u16) << 8;
        for _ in 0..8 {
            crc = if crc & 0x8000 != 0 {
                (crc << 1) ^ POLY
            } else {
                crc << 1
            };
        }
    }
    crc
}

/// Render a checksum the way the payload carries it: 4 uppercase hex digits.
pub fn format_checksum(crc: u16) -> String {
    format!("{:04X}", crc)
}
