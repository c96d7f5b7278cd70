//! # Utility Modules
//!
//! Bit-order helpers, the access-code correlator and the generic bit-reversed
//! CRC shared by both protocol pipelines.

pub mod bits;
pub mod crc;

pub use bits::{
    correlate_access_code, pack_bits_to_bytes, parse_access_code, reverse_bits,
    unpack_bytes_to_bits,
};
pub use crc::{ble_crc24, ieee802154_crc16, Crc};
