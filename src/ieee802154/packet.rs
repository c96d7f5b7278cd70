//! # IEEE 802.15.4 Packet Framing
//!
//! ## Packet Structure
//!
//! ```text
//! ┌──────────────────────────────┬────────┬────────────────────────────┬────────────────┐
//! │ Preamble sequence            │ Length │ PSDU                       │ CRC (optional) │
//! ├──────────────────────────────┼────────┼────────────────────────────┼────────────────┤
//! │ 0x00, 0x00, 0x00, 0x00, 0xA7 │ 1 byte │ 0-125B/127B (CRC / no CRC) │ 2 bytes        │
//! └──────────────────────────────┴────────┴────────────────────────────┴────────────────┘
//! ```
//!
//! When the CRC is appended it is counted by the length byte, so the PSDU
//! proper tops out at 125 bytes.

use crate::constants::{IEEE802154_CRC_SIZE, IEEE802154_MAX_PACKET_LEN};
use crate::logging::log_warn;
use crate::util::crc::ieee802154_crc16;

/// Synchronisation header: four zero preamble bytes and the SFD.
pub const SHR: [u8; 5] = [0x00, 0x00, 0x00, 0x00, 0xA7];

/// Create the byte image of an IEEE 802.15.4 physical packet.
pub fn build_phy_packet(payload: &[u8], append_crc: bool) -> Vec<u8> {
    let max_payload = if append_crc {
        IEEE802154_MAX_PACKET_LEN - IEEE802154_CRC_SIZE
    } else {
        IEEE802154_MAX_PACKET_LEN
    };

    let payload = if payload.len() > max_payload {
        log_warn(&format!(
            "802.15.4 payload exceeded {max_payload}B and has been cropped"
        ));
        &payload[..max_payload]
    } else {
        payload
    };

    let mut packet = Vec::with_capacity(SHR.len() + 1 + payload.len() + IEEE802154_CRC_SIZE);
    packet.extend_from_slice(&SHR);

    if append_crc {
        packet.push((payload.len() + IEEE802154_CRC_SIZE) as u8);
        packet.extend_from_slice(payload);
        packet.extend(ieee802154_crc16().compute(payload));
    } else {
        packet.push(payload.len() as u8);
        packet.extend_from_slice(payload);
    }

    packet
}
