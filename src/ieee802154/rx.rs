//! # IEEE 802.15.4 Receiver
//!
//! Chip-rate receive chain: matched filter, discriminator (band-pass by
//! default), Gardner symbol sync at one sample per chip, then DSSS despread
//! against the differential chip table.

use crate::constants::{
    DC_TRACKER_ALPHA, IEEE802154_CRC_SIZE, IEEE802154_FSK_DEVIATION,
    IEEE802154_LENGTH_THRESHOLD, IEEE802154_MAX_PACKET_LEN, IEEE802154_PAYLOAD_THRESHOLD,
    IEEE802154_PREAMBLE_THRESHOLD, SQUELCH_ALPHA, SQUELCH_THRESHOLD_DB,
};
use crate::dsp::fir::{convolve_cf, convolve_ff, half_sine_fir_taps, ConvMode};
use crate::dsp::freq::{band_pass_soft, binary_slicer, quadrature_demod, squelch_db};
use crate::dsp::iir::single_pole_iir;
use crate::error::PhyResult;
use crate::ieee802154::chips::{chips_to_string, map_nibbles_to_chips, pack_chips_to_bytes, RX_CHIP_MAP};
use crate::ieee802154::packet::SHR;
use crate::ieee802154::validate_rate;
use crate::logging::log_debug;
use crate::protocol::{DecodedPacket, DemodMethod, PhyReceiver};
use crate::sync::{LoopParameters, SymbolSync, Ted};
use crate::util::bits::correlate_access_code;
use crate::util::crc::ieee802154_crc16;
use crate::{Complex, Float};

/// IEEE 802.15.4 receiver configuration and cached filter taps.
#[derive(Debug, Clone)]
pub struct Receiver802154 {
    fs: f64,
    /// Samples per chip.
    spc: usize,
    /// Half-sine matched filter (one symbol span), unit sum.
    half_sine_taps: Vec<Float>,
    /// Rectangular chip filter, unit sum.
    rect_taps: Vec<Float>,
    demod_method: DemodMethod,
    ted: Ted,
    loop_params: LoopParameters,
    preamble_threshold: u32,
    crc_included: bool,
    /// SHR chip string, cached at construction.
    shr_code: String,
}

impl Receiver802154 {
    pub fn new(fs: f64) -> PhyResult<Self> {
        let spc = validate_rate(fs)?;

        let mut half_sine = half_sine_fir_taps(2 * spc);
        let sum: Float = half_sine.iter().sum();
        half_sine.iter_mut().for_each(|t| *t /= sum);

        let rect_taps = vec![1.0 as Float / spc as Float; spc];

        Ok(Receiver802154 {
            fs,
            spc,
            half_sine_taps: half_sine,
            rect_taps,
            demod_method: DemodMethod::BandPass,
            ted: Ted::Gardner,
            loop_params: LoopParameters::default(),
            preamble_threshold: IEEE802154_PREAMBLE_THRESHOLD,
            crc_included: true,
            shr_code: chips_to_string(&map_nibbles_to_chips(&SHR, &RX_CHIP_MAP)),
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

    /// Tolerate up to `threshold` mismatched SHR chips.
    pub fn with_preamble_threshold(mut self, threshold: u32) -> Self {
        self.preamble_threshold = threshold;
        self
    }

    /// Expect frames without the trailing CRC.
    pub fn without_crc(mut self) -> Self {
        self.crc_included = false;
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

    pub fn spc(&self) -> usize {
        self.spc
    }

    /// Soft front end: IQ samples to one soft value per input sample.
    fn soft_decisions(&self, iq_samples: &[Complex]) -> Vec<Float> {
        match self.demod_method {
            DemodMethod::InstantaneousFrequency => {
                let filtered =
                    convolve_cf(iq_samples, &self.half_sine_taps, ConvMode::Full);
                let filtered = squelch_db(&filtered, SQUELCH_THRESHOLD_DB, SQUELCH_ALPHA);

                let gain = (self.fs
                    / (2.0 * std::f64::consts::PI * IEEE802154_FSK_DEVIATION))
                    as Float;
                let freq = quadrature_demod(&filtered, gain);
                let dc = single_pole_iir(&freq, DC_TRACKER_ALPHA);
                let freq: Vec<Float> =
                    freq.iter().zip(dc.iter()).map(|(&f, &d)| f - d).collect();

                // Chip-rate matched filter after the discriminator
                convolve_ff(&freq, &self.rect_taps, ConvMode::Full)
            }
            DemodMethod::BandPass => band_pass_soft(
                iq_samples,
                &self.rect_taps,
                self.fs as Float,
                IEEE802154_FSK_DEVIATION as Float,
            ),
        }
    }
}

impl PhyReceiver for Receiver802154 {
    /// Receives an array of complex data and returns hard chip decisions.
    fn demodulate(&self, iq_samples: &[Complex]) -> Vec<u8> {
        let soft = self.soft_decisions(iq_samples);
        let sync = SymbolSync::with_parameters(self.spc as Float, self.ted, self.loop_params);
        let chips = sync.process(&soft);
        binary_slicer(&chips)
    }

    /// Receive hard chip decisions and return the packets found in them.
    fn process_phy_packet(&self, chip_samples: &[u8]) -> Vec<DecodedPacket> {
        let positions = match correlate_access_code(
            chip_samples,
            &self.shr_code,
            self.preamble_threshold,
            true,
        ) {
            Ok(positions) => positions,
            Err(_) => return Vec::new(),
        };

        let crc = ieee802154_crc16();
        let mut detected = Vec::new();

        for shr_end in positions {
            // Length byte: two 32-chip windows
            let payload_start = shr_end + 2 * 32;
            if payload_start > chip_samples.len() {
                continue;
            }
            let Some(length_byte) = pack_chips_to_bytes(
                &chip_samples[shr_end..payload_start],
                1,
                &RX_CHIP_MAP,
                IEEE802154_LENGTH_THRESHOLD,
            ) else {
                continue;
            };
            let payload_length = length_byte[0] as usize;
            if payload_length > IEEE802154_MAX_PACKET_LEN {
                log_debug("802.15.4 candidate rejected: length over 127");
                continue;
            }

            // Payload: closest-match decode, no threshold
            let end = payload_start + payload_length * 64;
            if end > chip_samples.len() {
                log_debug("802.15.4 candidate truncated by end of stream");
                continue;
            }
            let Some(mut payload) = pack_chips_to_bytes(
                &chip_samples[payload_start..end],
                payload_length,
                &RX_CHIP_MAP,
                IEEE802154_PAYLOAD_THRESHOLD,
            ) else {
                continue;
            };

            let crc_ok = if self.crc_included {
                if payload.len() < IEEE802154_CRC_SIZE {
                    continue;
                }
                let ok = crc.check(&payload);
                payload.truncate(payload.len() - IEEE802154_CRC_SIZE);
                Some(ok)
            } else {
                None
            };

            detected.push(DecodedPacket {
                length: payload.len() as u8,
                payload,
                crc_ok,
                position: payload_start as u64,
            });
        }

        detected
    }
}
