//! # BLE Receiver
//!
//! IQ to packets in two stages: [`ReceiverBle::demodulate`] produces hard
//! bit decisions (matched filter, squelch, discriminator, symbol sync,
//! slicer) and [`ReceiverBle::process_phy_packet`] walks the decision stream
//! (access-code search, de-whitening, CRC). Both are pure with respect to
//! the receiver, so one instance serves many streams.

use crate::ble::packet::generate_access_code;
use crate::ble::validate_rates;
use crate::ble::whitening::whiten;
use crate::constants::{
    BLE_BT, BLE_CRC_SIZE, BLE_PREAMBLE_THRESHOLD, DC_TRACKER_ALPHA, DEFAULT_BASE_ADDRESS,
    SQUELCH_ALPHA, SQUELCH_THRESHOLD_DB, WHITENING_SEED,
};
use crate::dsp::fir::{ble_pulse_taps, convolve_cf, ConvMode};
use crate::dsp::freq::{band_pass_soft, binary_slicer, quadrature_demod, squelch_db};
use crate::dsp::iir::single_pole_iir;
use crate::error::PhyResult;
use crate::logging::log_debug;
use crate::protocol::{DecodedPacket, DemodMethod, PhyReceiver};
use crate::sync::{LoopParameters, SymbolSync, Ted};
use crate::util::bits::{correlate_access_code, pack_bits_to_bytes};
use crate::util::crc::ble_crc24;
use crate::{Complex, Float};

/// BLE receiver configuration and cached filter taps.
#[derive(Debug, Clone)]
pub struct ReceiverBle {
    fs: f64,
    transmission_rate: f64,
    fsk_deviation: f64,
    sps: usize,
    matched_taps: Vec<Float>,
    demod_method: DemodMethod,
    ted: Ted,
    loop_params: LoopParameters,
    base_address: u32,
    preamble_threshold: u32,
}

impl ReceiverBle {
    /// Create a receiver for the given sample rate and BLE rate.
    pub fn new(fs: f64, transmission_rate: f64) -> PhyResult<Self> {
        let sps = validate_rates(fs, transmission_rate)?;

        // Matched filter: the transmit pulse normalised to unit sum
        let mut taps = ble_pulse_taps(sps, BLE_BT);
        let sum: Float = taps.iter().sum();
        taps.iter_mut().for_each(|t| *t /= sum);

        Ok(ReceiverBle {
            fs,
            transmission_rate,
            fsk_deviation: transmission_rate * 0.25,
            sps,
            matched_taps: taps,
            demod_method: DemodMethod::InstantaneousFrequency,
            ted: Ted::ModMuellerAndMuller,
            loop_params: LoopParameters::default(),
            base_address: DEFAULT_BASE_ADDRESS,
            preamble_threshold: BLE_PREAMBLE_THRESHOLD,
        })
    }

    /// Select the soft-decision front end.
    pub fn with_demodulation(mut self, method: DemodMethod) -> Self {
        self.demod_method = method;
        self
    }

    /// Select the timing-error detector.
    pub fn with_ted(mut self, ted: Ted) -> Self {
        self.ted = ted;
        self
    }

    /// Expect packets on a base address other than the default.
    pub fn with_base_address(mut self, base_address: u32) -> Self {
        self.base_address = base_address;
        self
    }

    /// Tolerate up to `threshold` mismatched access-code bits.
    pub fn with_preamble_threshold(mut self, threshold: u32) -> Self {
        self.preamble_threshold = threshold;
        self
    }

    /// Override the symbol-sync loop parameters.
    pub fn set_symbol_sync_parameters(
        &mut self,
        ted_gain: Float,
        loop_bw: Float,
        damping: Float,
        max_deviation: Float,
    ) {
        self.loop_params = LoopParameters {
            loop_bw,
            damping,
            ted_gain,
            max_deviation,
        };
    }

    pub fn sps(&self) -> usize {
        self.sps
    }

    pub fn transmission_rate(&self) -> f64 {
        self.transmission_rate
    }

    /// Soft front end: IQ samples to one soft value per input sample.
    fn soft_decisions(&self, iq_samples: &[Complex]) -> Vec<Float> {
        match self.demod_method {
            DemodMethod::InstantaneousFrequency => {
                let filtered = convolve_cf(iq_samples, &self.matched_taps, ConvMode::Full);
                let filtered = squelch_db(&filtered, SQUELCH_THRESHOLD_DB, SQUELCH_ALPHA);

                let gain = (self.fs
                    / (2.0 * std::f64::consts::PI * self.fsk_deviation))
                    as Float;
                let freq = quadrature_demod(&filtered, gain);

                // Remove residual carrier offset with the DC tracker
                let dc = single_pole_iir(&freq, DC_TRACKER_ALPHA);
                freq.iter().zip(dc.iter()).map(|(&f, &d)| f - d).collect()
            }
            DemodMethod::BandPass => band_pass_soft(
                iq_samples,
                &self.matched_taps,
                self.fs as Float,
                self.fsk_deviation as Float,
            ),
        }
    }
}

impl PhyReceiver for ReceiverBle {
    /// Receives an array of complex data and returns hard bit decisions.
    fn demodulate(&self, iq_samples: &[Complex]) -> Vec<u8> {
        let soft = self.soft_decisions(iq_samples);
        let sync = SymbolSync::with_parameters(self.sps as Float, self.ted, self.loop_params);
        let symbols = sync.process(&soft);
        binary_slicer(&symbols)
    }

    /// Receive hard decisions and return the packets found in them.
    fn process_phy_packet(&self, bit_samples: &[u8]) -> Vec<DecodedPacket> {
        let access_code = generate_access_code(self.base_address);
        let positions = match correlate_access_code(
            bit_samples,
            &access_code,
            self.preamble_threshold,
            false,
        ) {
            Ok(positions) => positions,
            Err(_) => return Vec::new(),
        };

        let crc = ble_crc24();
        let mut detected = Vec::new();

        for preamble_end in positions {
            // S0 + Length bytes, whitened
            let payload_start = preamble_end + 2 * 8;
            if payload_start > bit_samples.len() {
                continue;
            }
            let header_bits = &bit_samples[preamble_end..payload_start];
            let Ok(header_whitened) = pack_bits_to_bytes(header_bits) else {
                continue;
            };
            let (header, lfsr) = whiten(&header_whitened, WHITENING_SEED);
            let payload_length = header[1] as usize;

            // Payload + CRC, de-whitened with the register the header left
            let total_bytes = payload_length + BLE_CRC_SIZE;
            let end = payload_start + total_bytes * 8;
            if end > bit_samples.len() {
                log_debug("BLE candidate truncated by end of stream");
                continue;
            }
            let Ok(body_whitened) = pack_bits_to_bytes(&bit_samples[payload_start..end]) else {
                continue;
            };
            let (body, _) = whiten(&body_whitened, lfsr);

            // CRC over S0, Length and PDU
            let mut frame = header.clone();
            frame.extend_from_slice(&body);
            let crc_ok = crc.check(&frame);

            let payload = body[..payload_length].to_vec();
            detected.push(DecodedPacket {
                length: payload.len() as u8,
                payload,
                crc_ok: Some(crc_ok),
                position: payload_start as u64,
            });
        }

        detected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ble::TransmitterBle;
    use crate::protocol::PhyTransmitter;

    #[test]
    fn test_loopback_bits_to_packet() {
        // Frame + deframe without the radio in between.
        let tx = TransmitterBle::new(8e6, 1e6).unwrap();
        let rx = ReceiverBle::new(8e6, 1e6).unwrap();
        let payload = [0xDEu8, 0xAD, 0xBE, 0xEF];

        let mut bits = vec![0u8; 37]; // arbitrary noise-free lead-in
        bits.extend(tx.payload_to_bits(&payload));
        bits.extend(vec![0u8; 23]);

        let packets = rx.process_phy_packet(&bits);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, Some(true));
        assert_eq!(packets[0].position, 37 + 48 + 16);
    }

    #[test]
    fn test_end_to_end_clean_iq() {
        let fs = 8e6;
        let tx = TransmitterBle::new(fs, 1e6).unwrap();
        let rx = ReceiverBle::new(fs, 1e6).unwrap();
        let payload = [0x01u8, 0x02, 0x03];

        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "no packet decoded");
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, Some(true));
    }

    #[test]
    fn test_end_to_end_band_pass() {
        let fs = 8e6;
        let tx = TransmitterBle::new(fs, 1e6).unwrap();
        let rx = ReceiverBle::new(fs, 1e6)
            .unwrap()
            .with_demodulation(DemodMethod::BandPass);
        let payload = [0x55u8, 0x0F, 0xF0];

        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "no packet decoded");
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, Some(true));
    }

    #[test]
    fn test_all_zero_iq_yields_nothing() {
        let rx = ReceiverBle::new(8e6, 1e6).unwrap();
        let iq = vec![Complex::new(0.0, 0.0); 4096];
        assert!(rx.demodulate_to_packet(&iq).is_empty());
    }

    #[test]
    fn test_truncated_stream_yields_nothing() {
        let fs = 8e6;
        let tx = TransmitterBle::new(fs, 1e6).unwrap();
        let rx = ReceiverBle::new(fs, 1e6).unwrap();
        let iq = tx.modulate_from_payload(&[0xAA; 20], 100);

        // Cut the capture in the middle of the payload.
        let truncated = &iq[..iq.len() / 2];
        assert!(rx.demodulate_to_packet(truncated).is_empty());
    }

    #[test]
    fn test_2mbps_round_trip() {
        let fs = 10e6;
        let tx = TransmitterBle::new(fs, 2e6).unwrap();
        let rx = ReceiverBle::new(fs, 2e6).unwrap();
        let payload = [0x10u8, 0x32, 0x54, 0x76, 0x98];

        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, Some(true));
    }
}
