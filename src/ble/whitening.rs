//! # BLE Data Whitening
//!
//! 7-bit LFSR whitening over the S0..CRC span of a BLE packet, polynomial
//! x^7 + x^4 + 1 (x^7 omitted: `0x11`), seed `0x01` as in the nRF
//! DATAWHITEIV register. Whitening is an involution: applying it twice with
//! the same seed restores the input.
//!
//! Update order matters and has been a source of incompatible
//! implementations: the register is shifted and fed back *first*, and masked
//! to 7 bits *afterwards*. This is the variant that reproduces the reference
//! nRF sequence (zeros whiten to `40 B2 BC C3 ...`); masking before the
//! feedback XOR does not.

use crate::constants::WHITENING_POLY;

/// Apply whitening (or de-whitening) to a byte slice, LSB-first.
///
/// Returns the whitened bytes and the final LFSR state, so the payload pass
/// can resume with the register the header pass left behind.
///
/// # Arguments
///
/// * `data` - Input bytes
/// * `lfsr` - 7-bit register state to start from (seed `0x01` for a fresh packet)
pub fn whiten(data: &[u8], mut lfsr: u8) -> (Vec<u8>, u8) {
    let mut output = Vec::with_capacity(data.len());

    for &byte in data {
        let mut whitened_byte = 0u8;
        for bit_pos in 0..8 {
            // XOR the current data bit with the LFSR MSB (bit 6 of 7)
            let lfsr_msb = (lfsr >> 6) & 1;
            let data_bit = (byte >> bit_pos) & 1;
            whitened_byte |= (data_bit ^ lfsr_msb) << bit_pos;

            // Shift, feed back if the MSB was set, then mask to 7 bits
            if lfsr_msb == 1 {
                lfsr = (lfsr << 1) ^ WHITENING_POLY;
            } else {
                lfsr <<= 1;
            }
            lfsr &= 0x7F;
        }
        output.push(whitened_byte);
    }

    (output, lfsr)
}
