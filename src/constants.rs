//! PHY Constants
//!
//! This module defines constants shared across the BLE and IEEE 802.15.4
//! pipelines: CRC parameters, whitening seed, symbol-sync loop defaults and
//! the demodulation thresholds used by the receivers.

/// Default BLE base address (DotBot radio_default.h).
pub const DEFAULT_BASE_ADDRESS: u32 = 0x12345678;

/// BLE CRC-24 initial value (before bit reversal).
pub const BLE_CRC_INIT: u64 = 0x00FFFF;

/// BLE CRC-24 polynomial (before bit reversal).
pub const BLE_CRC_POLY: u64 = 0x00065B;

/// BLE CRC size in bytes.
pub const BLE_CRC_SIZE: usize = 3;

/// Maximum BLE PDU length in bytes.
pub const BLE_MAX_PAYLOAD: usize = 255;

/// Gaussian pulse bandwidth-bit period product (BLE PHY specification).
pub const BLE_BT: f64 = 0.5;

/// IEEE 802.15.4 CRC-16 initial value (before bit reversal).
pub const IEEE802154_CRC_INIT: u64 = 0x0000;

/// IEEE 802.15.4 CRC-16 polynomial (before bit reversal).
pub const IEEE802154_CRC_POLY: u64 = 0x011021;

/// IEEE 802.15.4 CRC size in bytes.
pub const IEEE802154_CRC_SIZE: usize = 2;

/// Maximum IEEE 802.15.4 PSDU length in bytes (length byte included).
pub const IEEE802154_MAX_PACKET_LEN: usize = 127;

/// IEEE 802.15.4 chip rate in chips per second.
pub const IEEE802154_CHIP_RATE: f64 = 2e6;

/// IEEE 802.15.4 FSK deviation equivalent for the discriminators, in Hz.
pub const IEEE802154_FSK_DEVIATION: f64 = 500e3;

/// Whitening LFSR seed (nRF DATAWHITEIV default).
pub const WHITENING_SEED: u8 = 0x01;

/// Whitening LFSR feedback polynomial: x^7 + x^4 + 1, x^7 omitted.
pub const WHITENING_POLY: u8 = 0x11;

/// Symbol-sync default loop bandwidth, normalised to the symbol rate.
pub const DEFAULT_LOOP_BW: f32 = 4.5e-3;

/// Symbol-sync default damping factor.
pub const DEFAULT_DAMPING: f32 = 1.0;

/// Symbol-sync default timing-error detector gain.
pub const DEFAULT_TED_GAIN: f32 = 1.0;

/// Symbol-sync default maximum clock-period deviation in samples (locked).
pub const DEFAULT_MAX_DEVIATION: f32 = 0.0;

/// Squelch threshold relative to the stream peak, in dB.
pub const SQUELCH_THRESHOLD_DB: f32 = -20.0;

/// Squelch magnitude-smoothing IIR coefficient.
pub const SQUELCH_ALPHA: f32 = 0.3;

/// DC-tracking IIR coefficient applied to the discriminator output.
pub const DC_TRACKER_ALPHA: f32 = 160e-6;

/// Default BLE preamble correlator tolerance, in bits.
pub const BLE_PREAMBLE_THRESHOLD: u32 = 4;

/// Default IEEE 802.15.4 preamble correlator tolerance, in chips.
pub const IEEE802154_PREAMBLE_THRESHOLD: u32 = 12;

/// Chip-decode tolerance for the 802.15.4 length byte, in chips.
pub const IEEE802154_LENGTH_THRESHOLD: u32 = 10;

/// Chip-decode tolerance for the 802.15.4 payload (unconditional: closest match).
pub const IEEE802154_PAYLOAD_THRESHOLD: u32 = 32;

/// Number of taps of the fractional-delay sinc kernel.
pub const FRACTIONAL_DELAY_TAPS: usize = 21;
