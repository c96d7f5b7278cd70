//! # BLE Transmitter
//!
//! GFSK modulator: bits to Gaussian-shaped frequency pulses to a unit
//! amplitude complex baseband signal. The pulse shaping is the BLE PHY
//! Gaussian (BT = 0.5) convolved with a one-symbol rectangular window, so
//! the frequency plateau of an isolated bit reaches the nominal ±deviation.

use crate::ble::packet::build_phy_packet;
use crate::ble::validate_rates;
use crate::constants::{BLE_BT, DEFAULT_BASE_ADDRESS};
use crate::dsp::fir::{ble_pulse_taps, convolve_ff, ConvMode};
use crate::error::PhyResult;
use crate::protocol::PhyTransmitter;
use crate::util::bits::unpack_bytes_to_bits;
use crate::{Complex, Float};

/// BLE GFSK transmitter.
#[derive(Debug, Clone)]
pub struct TransmitterBle {
    sample_rate: f64,
    transmission_rate: f64,
    fsk_deviation: f64,
    sps: usize,
    base_address: u32,
    pulse_taps: Vec<Float>,
}

impl TransmitterBle {
    /// Create a transmitter.
    ///
    /// # Errors
    ///
    /// Configuration errors if the rate is not a BLE rate or the sample rate
    /// is not an integer multiple of it.
    pub fn new(sample_rate: f64, transmission_rate: f64) -> PhyResult<Self> {
        let sps = validate_rates(sample_rate, transmission_rate)?;
        Ok(TransmitterBle {
            sample_rate,
            transmission_rate,
            fsk_deviation: transmission_rate * 0.25,
            sps,
            base_address: DEFAULT_BASE_ADDRESS,
            pulse_taps: ble_pulse_taps(sps, BLE_BT),
        })
    }

    /// Use a base address other than the default.
    pub fn with_base_address(mut self, base_address: u32) -> Self {
        self.base_address = base_address;
        self
    }

    pub fn sps(&self) -> usize {
        self.sps
    }

    pub fn base_address(&self) -> u32 {
        self.base_address
    }

    /// GFSK-modulate a bit stream into complex baseband IQ.
    ///
    /// Bits are mapped to ±1 impulses at the symbol positions, shaped by the
    /// Gaussian-integrator kernel, and frequency modulated by integrating the
    /// per-sample phase increments (phase starts at zero).
    pub fn modulate(&self, bits: &[u8], zero_padding: usize) -> Vec<Complex> {
        // Upsample with zeros, bits mapped to ±1
        let mut upsampled = vec![0.0 as Float; bits.len() * self.sps];
        for (k, &bit) in bits.iter().enumerate() {
            upsampled[k * self.sps] = if bit != 0 { 1.0 } else { -1.0 };
        }

        // Pulse shape, cropping the filter tail
        let shaped = convolve_ff(&upsampled, &self.pulse_taps, ConvMode::Full);
        let keep = shaped.len() - (self.sps - 1).min(shaped.len());
        let shaped = &shaped[..keep];

        // Frequency modulation: integrate phase increments, unit amplitude.
        // The integration runs in f64; the phase grows without bound.
        let rad_per_unit =
            2.0 * std::f64::consts::PI * self.fsk_deviation / self.sample_rate;
        let mut iq = Vec::with_capacity(shaped.len() + 1 + 2 * zero_padding);
        iq.extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(zero_padding));

        let mut phase = 0.0f64;
        iq.push(Complex::new(1.0, 0.0)); // prepended zero-phase sample
        for &s in shaped {
            phase += s as f64 * rad_per_unit;
            iq.push(Complex::new(phase.cos() as Float, phase.sin() as Float));
        }

        iq.extend(std::iter::repeat(Complex::new(0.0, 0.0)).take(zero_padding));
        iq
    }

    /// Frame a payload into the on-air bit stream (LSB first).
    pub fn payload_to_bits(&self, payload: &[u8]) -> Vec<u8> {
        unpack_bytes_to_bits(&build_phy_packet(payload, self.base_address))
    }
}

impl PhyTransmitter for TransmitterBle {
    fn modulate_from_payload(&self, payload: &[u8], zero_padding: usize) -> Vec<Complex> {
        let bits = self.payload_to_bits(payload);
        self.modulate(&bits, zero_padding)
    }
}
