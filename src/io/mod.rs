//! # IQ Blob I/O
//!
//! Raw capture format shared with the SDR tooling: interleaved little-endian
//! IEEE 754 f32 pairs `[I0, Q0, I1, Q1, ...]`, no header. A file whose byte
//! length is not a multiple of 8 is rejected as corrupt.

use bytes::{Buf, BufMut};
use std::fs;
use std::path::Path;

use crate::error::{PhyError, PhyResult};
use crate::Complex;

/// Read a raw complex64 blob into an IQ stream.
pub fn read_iq_file(path: &Path) -> PhyResult<Vec<Complex>> {
    let data = fs::read(path)?;
    parse_iq_bytes(&data)
}

/// Parse an in-memory complex64 blob.
pub fn parse_iq_bytes(data: &[u8]) -> PhyResult<Vec<Complex>> {
    if data.len() % 8 != 0 {
        return Err(PhyError::CorruptIqBlob(data.len() as u64));
    }

    let mut buf = data;
    let mut iq = Vec::with_capacity(data.len() / 8);
    while buf.remaining() >= 8 {
        let re = buf.get_f32_le();
        let im = buf.get_f32_le();
        iq.push(Complex::new(re, im));
    }
    Ok(iq)
}

/// Serialize an IQ stream to the raw blob format.
pub fn iq_to_bytes(iq: &[Complex]) -> Vec<u8> {
    let mut out = Vec::with_capacity(iq.len() * 8);
    for x in iq {
        out.put_f32_le(x.re);
        out.put_f32_le(x.im);
    }
    out
}

/// Write an IQ stream as a raw complex64 blob.
pub fn write_iq_file(path: &Path, iq: &[Complex]) -> PhyResult<()> {
    fs::write(path, iq_to_bytes(iq))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_bytes() {
        let iq = vec![
            Complex::new(0.5, -0.25),
            Complex::new(-1.0, 1.0),
            Complex::new(0.0, 3.5),
        ];
        let bytes = iq_to_bytes(&iq);
        assert_eq!(bytes.len(), 24);
        assert_eq!(parse_iq_bytes(&bytes).unwrap(), iq);
    }

    #[test]
    fn test_known_layout() {
        // 1.0f32 LE = 00 00 80 3F
        let bytes = [0x00u8, 0x00, 0x80, 0x3F, 0x00, 0x00, 0x00, 0x00];
        let iq = parse_iq_bytes(&bytes).unwrap();
        assert_eq!(iq, vec![Complex::new(1.0, 0.0)]);
    }

    #[test]
    fn test_rejects_misaligned_blob() {
        let bytes = [0u8; 12];
        assert!(matches!(
            parse_iq_bytes(&bytes),
            Err(PhyError::CorruptIqBlob(12))
        ));
    }

    #[test]
    fn test_empty_blob() {
        assert!(parse_iq_bytes(&[]).unwrap().is_empty());
    }
}
