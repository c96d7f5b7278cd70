//! # Bit-Error-Rate Analysis
//!
//! Non-blind analysis tools: compare a decoded payload bit-by-bit against a
//! reference packet, and sweep the subtraction frequency to map how BER
//! degrades as the interference estimate walks off the true offset.

use crate::protocol::PhyReceiver;
use crate::sic::params::subtract_interference_auto;
use crate::util::bits::unpack_bytes_to_bits;
use crate::Complex;

/// Bitwise differences between a payload and a reference payload, LSB-first.
///
/// Returns `None` when the sizes differ (usually interference corrupted the
/// length field), in which case a BER is meaningless.
pub fn compare_bits_with_reference(payload: &[u8], reference: &[u8]) -> Option<Vec<u8>> {
    if payload.len() != reference.len() {
        return None;
    }
    let xored: Vec<u8> = payload
        .iter()
        .zip(reference.iter())
        .map(|(a, b)| a ^ b)
        .collect();
    Some(unpack_bytes_to_bits(&xored))
}

/// BER (percent) after subtracting the interference at each frequency of
/// `freq_range`, against a known reference payload.
///
/// `None` entries mark frequencies where no packet was detected or the
/// payload size mismatched.
pub fn compute_ber_vs_frequency<R: PhyReceiver>(
    freq_range: &[f64],
    affected: &[Complex],
    interference: &[Complex],
    fs: f64,
    reference_payload: &[u8],
    receiver: &R,
) -> Vec<Option<f64>> {
    freq_range
        .iter()
        .map(|&freq| {
            let (residual, _) =
                subtract_interference_auto(affected, interference, fs, &[freq], None).ok()?;

            let packets = receiver.demodulate_to_packet(&residual);
            let packet = packets.first()?;
            let differences = compare_bits_with_reference(&packet.payload, reference_payload)?;
            let errors: usize = differences.iter().map(|&b| b as usize).sum();
            Some(errors as f64 / differences.len() as f64 * 100.0)
        })
        .collect()
}
