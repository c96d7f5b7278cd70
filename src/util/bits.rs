//! # Bit-Order Utilities
//!
//! This module provides the bit manipulation functions shared by both PHY
//! pipelines: LSB-first packing between bytes and on-air bit streams, bit
//! reversal within an arbitrary width, and the sliding access-code correlator
//! used for preamble detection.
//!
//! ## Background
//!
//! Both BLE and IEEE 802.15.4 transmit each byte LSB-first on air, while the
//! natural in-memory representation is MSB-first. Every boundary between the
//! byte domain and the bit/chip domain goes through the helpers here, so the
//! ordering convention lives in exactly one place.

use crate::error::{PhyError, PhyResult};

/// Reverse the lowest `width` bits of `value`.
///
/// Used to reflect CRC polynomials and initial values into the LSB-first
/// domain before the shift-right update loop.
///
/// # Examples
///
/// ```rust
/// use sicphy::util::reverse_bits;
///
/// assert_eq!(reverse_bits(0b001, 3), 0b100);
/// assert_eq!(reverse_bits(0x00065B, 24), 0xDA6000);
/// ```
#[inline]
pub fn reverse_bits(value: u64, width: u32) -> u64 {
    let mut out = 0u64;
    for i in 0..width {
        if value >> i & 1 == 1 {
            out |= 1 << (width - 1 - i);
        }
    }
    out
}

/// Pack a sequence of bits (LSB-first on air) into bytes.
///
/// Bit `8*i + j` of the input becomes bit `j` of output byte `i`, matching
/// the on-air order of both supported protocols.
///
/// # Errors
///
/// Returns [`PhyError::BitCountNotByteAligned`] if the bit count is not a
/// multiple of 8.
pub fn pack_bits_to_bytes(bits: &[u8]) -> PhyResult<Vec<u8>> {
    if bits.len() % 8 != 0 {
        return Err(PhyError::BitCountNotByteAligned(bits.len()));
    }

    let bytes = bits
        .chunks_exact(8)
        .map(|chunk| {
            chunk
                .iter()
                .enumerate()
                .fold(0u8, |acc, (j, &bit)| acc | ((bit & 1) << j))
        })
        .collect();

    Ok(bytes)
}

/// Unpack bytes into a bit sequence, LSB first as sent on air.
pub fn unpack_bytes_to_bits(bytes: &[u8]) -> Vec<u8> {
    let mut bits = Vec::with_capacity(bytes.len() * 8);
    for &byte in bytes {
        for j in 0..8 {
            bits.push((byte >> j) & 1);
        }
    }
    bits
}

/// Parse an access-code string of `0`/`1` characters with optional `_`
/// separators into a bit vector in arrival order (first character = first
/// bit on air).
pub fn parse_access_code(access_code: &str) -> PhyResult<Vec<u8>> {
    access_code
        .chars()
        .filter(|&c| c != '_')
        .map(|c| match c {
            '0' => Ok(0u8),
            '1' => Ok(1u8),
            other => Err(PhyError::InvalidAccessCode(other)),
        })
        .collect()
}

/// Find a sequence of bits in a binary stream.
///
/// Slides a window of the access-code width over `data`, counting mismatched
/// bits, and reports the position immediately *after* every window with at
/// most `threshold` mismatches. No position before `code_len` consumed bits
/// can ever be reported.
///
/// With `reduce_mask`, the first and last bit of the code are excluded from
/// the comparison. Chip sequences for IEEE 802.15.4 are differentially
/// encoded, so the two boundary chips of a known sequence depend on their
/// unknown neighbours.
///
/// # Arguments
///
/// * `data` - Hard decisions, one bit per element (only bit 0 is read)
/// * `access_code` - Code string, e.g. `"01010101_01111000"`, arrival order
/// * `threshold` - Maximum tolerated mismatches
/// * `reduce_mask` - Exclude the boundary bits from the comparison
pub fn correlate_access_code(
    data: &[u8],
    access_code: &str,
    threshold: u32,
    reduce_mask: bool,
) -> PhyResult<Vec<usize>> {
    let code = parse_access_code(access_code)?;
    let code_len = code.len();
    let mut positions = Vec::new();

    if code_len == 0 || data.len() < code_len {
        return Ok(positions);
    }

    for start in 0..=(data.len() - code_len) {
        let mut mismatches = 0u32;
        for (k, &code_bit) in code.iter().enumerate() {
            if reduce_mask && (k == 0 || k == code_len - 1) {
                continue;
            }
            if (data[start + k] & 1) != code_bit {
                mismatches += 1;
                if mismatches > threshold {
                    break;
                }
            }
        }
        if mismatches <= threshold {
            positions.push(start + code_len);
        }
    }

    Ok(positions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reverse_bits_basic() {
        assert_eq!(reverse_bits(0b1, 8), 0b1000_0000);
        assert_eq!(reverse_bits(0b1000_0000, 8), 0b1);
        assert_eq!(reverse_bits(0xFF, 8), 0xFF);
        assert_eq!(reverse_bits(0, 24), 0);
    }

    #[test]
    fn test_reverse_bits_involution() {
        for value in [0x01u64, 0x55, 0xA7, 0x065B, 0xFFFF, 0x0011_2233] {
            assert_eq!(reverse_bits(reverse_bits(value, 24), 24), value & 0xFF_FFFF);
        }
    }

    #[test]
    fn test_pack_bits_lsb_first() {
        // [1,1,1,1,0,0,0,0] packs to 0x0F (LSB first on air)
        let bits = [1, 1, 1, 1, 0, 0, 0, 0];
        assert_eq!(pack_bits_to_bytes(&bits).unwrap(), vec![0x0F]);
    }

    #[test]
    fn test_pack_bits_rejects_misaligned() {
        let err = pack_bits_to_bytes(&[1, 0, 1]).unwrap_err();
        assert!(matches!(err, PhyError::BitCountNotByteAligned(3)));
    }

    #[test]
    fn test_unpack_then_pack_round_trip() {
        let bytes = [0x00u8, 0xFF, 0xA7, 0x12, 0x55];
        let bits = unpack_bytes_to_bits(&bytes);
        assert_eq!(bits.len(), bytes.len() * 8);
        assert_eq!(pack_bits_to_bytes(&bits).unwrap(), bytes);
    }

    #[test]
    fn test_parse_access_code_separators() {
        let code = parse_access_code("10_01").unwrap();
        assert_eq!(code, vec![1, 0, 0, 1]);
        assert!(parse_access_code("10x1").is_err());
    }

    #[test]
    fn test_correlate_exact_match() {
        // Code embedded at offset 3; position reported just after the code.
        let mut data = vec![0u8; 16];
        let code = [1u8, 0, 1, 1, 0, 0, 1, 0];
        data[3..11].copy_from_slice(&code);
        let positions = correlate_access_code(&data, "10110010", 0, false).unwrap();
        assert!(positions.contains(&11));
    }

    #[test]
    fn test_correlate_never_before_code_len() {
        let data = vec![0u8; 40];
        let positions = correlate_access_code(&data, "00000000", 8, false).unwrap();
        assert!(positions.iter().all(|&p| p >= 8));
    }

    #[test]
    fn test_correlate_threshold() {
        let mut data = vec![0u8; 20];
        let code = [1u8, 1, 1, 1, 1, 1, 1, 1];
        data[5..13].copy_from_slice(&code);
        data[6] = 0; // one flip
        data[9] = 0; // two flips
        assert!(correlate_access_code(&data, "11111111", 2, false)
            .unwrap()
            .contains(&13));
        assert!(correlate_access_code(&data, "11111111", 1, false)
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_correlate_reduce_mask_ignores_boundaries() {
        let mut data = vec![0u8; 12];
        let code = [1u8, 0, 1, 1, 0, 0, 1, 0];
        data[2..10].copy_from_slice(&code);
        data[2] ^= 1; // first code bit
        data[9] ^= 1; // last code bit
        assert!(correlate_access_code(&data, "10110010", 0, true)
            .unwrap()
            .contains(&10));
        assert!(correlate_access_code(&data, "10110010", 1, false)
            .unwrap()
            .is_empty());
    }
}
