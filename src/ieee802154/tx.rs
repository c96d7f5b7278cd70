//! # IEEE 802.15.4 Transmitter
//!
//! O-QPSK modulator with half-sine chip shaping: even-indexed chips drive
//! the I arm, odd-indexed chips the Q arm delayed by one chip period, which
//! yields the constant-envelope MSK-equivalent waveform.

use crate::constants::IEEE802154_CHIP_RATE;
use crate::dsp::fir::{convolve_ff, half_sine_fir_taps, ConvMode};
use crate::error::PhyResult;
use crate::ieee802154::chips::{map_nibbles_to_chips, split_iq_chips, TX_CHIP_MAP};
use crate::ieee802154::packet::build_phy_packet;
use crate::ieee802154::validate_rate;
use crate::protocol::PhyTransmitter;
use crate::{Complex, Float};

/// IEEE 802.15.4 O-QPSK transmitter.
#[derive(Debug, Clone)]
pub struct Transmitter802154 {
    sample_rate: f64,
    /// Samples per chip.
    spc: usize,
    /// Samples per O-QPSK symbol (two chips).
    sps_sym: usize,
    append_crc: bool,
    pulse: Vec<Float>,
}

impl Transmitter802154 {
    pub fn new(sample_rate: f64) -> PhyResult<Self> {
        let spc = validate_rate(sample_rate)?;
        let sps_sym = 2 * spc;
        Ok(Transmitter802154 {
            sample_rate,
            spc,
            sps_sym,
            append_crc: true,
            pulse: half_sine_fir_taps(sps_sym),
        })
    }

    /// Frame packets without the trailing CRC.
    pub fn without_crc(mut self) -> Self {
        self.append_crc = false;
        self
    }

    pub fn spc(&self) -> usize {
        self.spc
    }

    pub fn sample_rate(&self) -> f64 {
        self.sample_rate
    }

    pub fn chip_rate(&self) -> f64 {
        IEEE802154_CHIP_RATE
    }

    /// O-QPSK modulate a chip-word sequence into complex baseband IQ.
    ///
    /// Each arm runs at one chip per symbol period: impulses spaced
    /// `2 * spc` samples, shaped by the half-sine spanning a full symbol,
    /// with the Q arm delayed by `spc` samples.
    pub fn modulate(&self, chips: &[u32], zero_padding: usize) -> Vec<Complex> {
        let (i_chips, q_chips) = split_iq_chips(chips);

        let shape_arm = |arm: &[u8]| -> Vec<Float> {
            let mut upsampled = vec![0.0 as Float; arm.len() * self.sps_sym];
            for (k, &chip) in arm.iter().enumerate() {
                upsampled[k * self.sps_sym] = if chip != 0 { 1.0 } else { -1.0 };
            }
            convolve_ff(&upsampled, &self.pulse, ConvMode::Full)
        };

        let i_arm = shape_arm(&i_chips);
        let q_arm = shape_arm(&q_chips);

        let total = q_arm.len() + self.spc;
        let mut iq = Vec::with_capacity(total + 2 * zero_padding);
        iq.extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(zero_padding));
        for n in 0..total {
            let i = i_arm.get(n).copied().unwrap_or(0.0);
            let q = if n >= self.spc {
                q_arm.get(n - self.spc).copied().unwrap_or(0.0)
            } else {
                0.0
            };
            iq.push(Complex::new(i, q));
        }
        iq.extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(zero_padding));
        iq
    }

    /// Frame a payload and spread it to chip words.
    pub fn payload_to_chips(&self, payload: &[u8]) -> Vec<u32> {
        map_nibbles_to_chips(&build_phy_packet(payload, self.append_crc), &TX_CHIP_MAP)
    }
}

impl PhyTransmitter for Transmitter802154 {
    fn modulate_from_payload(&self, payload: &[u8], zero_padding: usize) -> Vec<Complex> {
        let chips = self.payload_to_chips(payload);
        self.modulate(&chips, zero_padding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_envelope_interior() {
        let tx = Transmitter802154::new(10e6).unwrap();
        let iq = tx.modulate_from_payload(&[0x42, 0x13], 0);
        // Away from the ramp-up/ramp-down the envelope is 1 (MSK property).
        let interior = &iq[tx.spc() * 4..iq.len() - tx.spc() * 4];
        for x in interior {
            assert!((x.norm() - 1.0).abs() < 0.05, "envelope {}", x.norm());
        }
    }

    #[test]
    fn test_chip_count() {
        let tx = Transmitter802154::new(10e6).unwrap();
        // 5 SHR + 1 length + 1 payload + 2 CRC = 9 bytes = 18 nibbles
        let chips = tx.payload_to_chips(&[0x7E]);
        assert_eq!(chips.len(), 18);
    }

    #[test]
    fn test_modulated_length() {
        let tx = Transmitter802154::new(10e6).unwrap();
        let spc = tx.spc();
        let chips = [TX_CHIP_MAP[0]; 2];
        let iq = tx.modulate(&chips, 50);
        // Q arm: 32 chips * spc samples upsampled + pulse tail + Q delay
        let q_len = 16 * 2 * spc * 2 + 2 * spc; // arm samples + conv tail
        assert_eq!(iq.len(), q_len + spc + 100);
    }

    #[test]
    fn test_zero_padding_is_silent() {
        let tx = Transmitter802154::new(10e6).unwrap();
        let iq = tx.modulate_from_payload(&[], 64);
        assert!(iq[..64].iter().all(|x| x.norm() == 0.0));
        assert!(iq[iq.len() - 64..].iter().all(|x| x.norm() == 0.0));
    }

    #[test]
    fn test_rejects_non_integer_spc() {
        assert!(Transmitter802154::new(5e6).is_err());
    }
}
