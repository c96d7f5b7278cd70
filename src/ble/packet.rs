//! # BLE Packet Framing
//!
//! Builds the on-air byte image of a BLE physical packet and the bit-level
//! access code the receiver correlates against.
//!
//! ## Packet Structure
//!
//! ```text
//! ┌───────────┬──────────────┬───────────────┬───────────┬────────┬────────┬─────────┐
//! │ Preamble  │ Base Address │ Prefix (0x00) │ S0 (0x00) │ Length │ PDU    │ CRC     │
//! ├───────────┼──────────────┼───────────────┼───────────┼────────┼────────┼─────────┤
//! │ 0xAA/0x55 │ 4 bytes (LE) │ 1 byte        │ 1 byte    │ 1 byte │ 0-255B │ 3 bytes │
//! └───────────┴──────────────┴───────────────┴───────────┴────────┴────────┴─────────┘
//! ```
//!
//! The preamble alternates against the first address bit: `0x55` when the
//! base-address LSB is 1, `0xAA` otherwise. Whitening covers S0 through CRC
//! inclusive; the CRC-24 spans S0, Length and the PDU.

use crate::ble::whitening::whiten;
use crate::constants::{BLE_MAX_PAYLOAD, WHITENING_SEED};
use crate::logging::log_warn;
use crate::util::crc::ble_crc24;

/// Preamble byte for a given base address.
pub fn preamble_for(base_address: u32) -> u8 {
    if base_address & 0x01 != 0 {
        0x55
    } else {
        0xAA
    }
}

/// Create the on-air byte image of a BLE physical packet.
///
/// Payloads longer than 255 bytes are cropped with a warning, matching the
/// radio's own behaviour.
pub fn build_phy_packet(payload: &[u8], base_address: u32) -> Vec<u8> {
    let payload = if payload.len() > BLE_MAX_PAYLOAD {
        log_warn(&format!(
            "BLE payload exceeded the maximum allowed size ({BLE_MAX_PAYLOAD}B) and has been cropped"
        ));
        &payload[..BLE_MAX_PAYLOAD]
    } else {
        payload
    };

    let preamble = preamble_for(base_address);
    let prefix = 0x00u8;
    let s0 = 0x00u8;
    let length = payload.len() as u8;

    // S0 + Length + PDU, then CRC over that span
    let mut ready_for_crc = Vec::with_capacity(2 + payload.len());
    ready_for_crc.push(s0);
    ready_for_crc.push(length);
    ready_for_crc.extend_from_slice(payload);
    let crc = ble_crc24().compute(&ready_for_crc);

    // Whiten from S0 (included) to CRC (included)
    let mut ready_for_whitening = ready_for_crc;
    ready_for_whitening.extend(crc);
    let (whitened, _) = whiten(&ready_for_whitening, WHITENING_SEED);

    let mut packet = Vec::with_capacity(6 + whitened.len());
    packet.push(preamble);
    packet.extend_from_slice(&base_address.to_le_bytes());
    packet.push(prefix);
    packet.extend(whitened);
    packet
}

fn lsb_first_bit_string(byte: u8) -> String {
    (0..8).map(|i| char::from(b'0' + ((byte >> i) & 1))).collect()
}

/// Generate the access-code string (preamble + base address + prefix) for
/// the preamble correlator, LSB-first per byte as the bits arrive on air.
pub fn generate_access_code(base_address: u32) -> String {
    let mut parts = vec![lsb_first_bit_string(preamble_for(base_address))];
    for byte in base_address.to_le_bytes() {
        parts.push(lsb_first_bit_string(byte));
    }
    parts.push("00000000".to_string());
    parts.join("_")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preamble_follows_address_lsb() {
        assert_eq!(preamble_for(0x12345678), 0xAA);
        assert_eq!(preamble_for(0x12345679), 0x55);
    }

    #[test]
    fn test_packet_header_layout() {
        let packet = build_phy_packet(&[0x01, 0x02, 0x03], 0x12345678);
        // Preamble, little-endian address, prefix
        assert_eq!(packet[0], 0xAA);
        assert_eq!(&packet[1..5], &[0x78, 0x56, 0x34, 0x12]);
        assert_eq!(packet[5], 0x00);
        // 6 header bytes + whitened (S0 + len + 3 payload + 3 CRC)
        assert_eq!(packet.len(), 6 + 2 + 3 + 3);
    }

    #[test]
    fn test_whitened_span_recovers() {
        let payload = [0x11u8, 0x22, 0x33, 0x44];
        let packet = build_phy_packet(&payload, 0x12345678);
        let (clear, _) = whiten(&packet[6..], crate::constants::WHITENING_SEED);
        assert_eq!(clear[0], 0x00); // S0
        assert_eq!(clear[1], 4); // Length
        assert_eq!(&clear[2..6], &payload);
        assert!(crate::util::crc::ble_crc24().check(&clear));
    }

    #[test]
    fn test_empty_payload_packet() {
        let packet = build_phy_packet(&[], 0x12345678);
        assert_eq!(packet.len(), 6 + 2 + 3);
        let (clear, _) = whiten(&packet[6..], crate::constants::WHITENING_SEED);
        assert_eq!(clear[1], 0);
        assert!(crate::util::crc::ble_crc24().check(&clear));
    }

    #[test]
    fn test_oversize_payload_cropped() {
        let payload = vec![0xAB; 300];
        let packet = build_phy_packet(&payload, 0x12345678);
        assert_eq!(packet.len(), 6 + 2 + 255 + 3);
    }

    #[test]
    fn test_access_code_layout() {
        let code = generate_access_code(0x12345678);
        let flat: String = code.chars().filter(|&c| c != '_').collect();
        assert_eq!(flat.len(), 48);
        // Preamble 0xAA LSB-first: 01010101
        assert!(flat.starts_with("01010101"));
        // Address byte 0x78 LSB-first: 00011110
        assert_eq!(&flat[8..16], "00011110");
        assert!(flat.ends_with("00000000"));
    }
}
