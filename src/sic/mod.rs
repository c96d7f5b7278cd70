//! # Successive Interference Cancellation
//!
//! Two co-channel packets, one substantially stronger than the other: decode
//! the stronger, re-synthesise its transmit waveform from the decoded
//! payload, estimate how that waveform sits inside the composite (frequency,
//! phase, amplitude, sample shift), subtract it, and decode the weaker
//! packet from the residual.
//!
//! If the stronger signal cannot be decoded at all, the weaker receiver is
//! still run on the unprocessed composite — both may fail, which the
//! simulator counts as delivery failures rather than errors.

pub mod ber;
pub mod params;

pub use ber::{compare_bits_with_reference, compute_ber_vs_frequency};
pub use params::{
    find_interference_parameters, frequency_grid, multiply_by_complex_exponential,
    pad_interference, subtract_interference, subtract_interference_auto, FineSearch,
    InterferenceParameters,
};

use crate::logging::{log_debug, log_info};
use crate::protocol::{DecodedPacket, PhyReceiver, PhyTransmitter};
use crate::Complex;

/// Parameter-search configuration for the cancellation stage.
#[derive(Debug, Clone)]
pub struct SicConfig {
    /// Coarse frequency grid in Hz.
    pub freq_offsets: Vec<f64>,
    /// Optional fine search around the coarse winner.
    pub fine: Option<FineSearch>,
}

impl SicConfig {
    pub fn new(freq_offsets: Vec<f64>) -> Self {
        SicConfig {
            freq_offsets,
            fine: None,
        }
    }

    pub fn with_fine_search(mut self, step: f64, window: f64) -> Self {
        self.fine = Some(FineSearch { step, window });
        self
    }
}

/// Result of one cancellation pass.
#[derive(Debug, Clone)]
pub struct SicOutcome {
    /// Packets decoded from the composite by the stronger-signal receiver.
    pub high_packets: Vec<DecodedPacket>,
    /// Packets decoded after subtraction (or from the raw composite when
    /// the stronger signal was undecodable).
    pub low_packets: Vec<DecodedPacket>,
    /// The interference estimate, when subtraction happened.
    pub parameters: Option<InterferenceParameters>,
}

impl SicOutcome {
    /// Delivery verdicts `(high, low)`: decoded with a passing CRC.
    pub fn delivered(&self) -> (bool, bool) {
        (
            self.high_packets.iter().any(DecodedPacket::delivered),
            self.low_packets.iter().any(DecodedPacket::delivered),
        )
    }
}

/// Run the full SIC pipeline on a composite capture.
///
/// The stronger packet is re-synthesised without padding, so the estimated
/// sample shift is always non-negative.
pub fn cancel_and_decode<RH, TH, RL>(
    composite: &[Complex],
    receiver_high: &RH,
    transmitter_high: &TH,
    receiver_low: &RL,
    fs: f64,
    config: &SicConfig,
) -> SicOutcome
where
    RH: PhyReceiver,
    TH: PhyTransmitter,
    RL: PhyReceiver,
{
    let high_packets = receiver_high.demodulate_to_packet(composite);

    let Some(first) = high_packets.first() else {
        log_debug("SIC: stronger signal undecodable, decoding weaker on the raw composite");
        let low_packets = receiver_low.demodulate_to_packet(composite);
        return SicOutcome {
            high_packets,
            low_packets,
            parameters: None,
        };
    };

    // Re-synthesise the stronger signal from its decoded payload (the CRC
    // verdict does not matter here: a wrong payload simply subtracts badly).
    let template = transmitter_high.modulate_from_payload(&first.payload, 0);

    let (residual, parameters) = match subtract_interference_auto(
        composite,
        &template,
        fs,
        &config.freq_offsets,
        config.fine,
    ) {
        Ok(result) => result,
        Err(err) => {
            log_debug(&format!("SIC: subtraction failed ({err}), using composite"));
            let low_packets = receiver_low.demodulate_to_packet(composite);
            return SicOutcome {
                high_packets,
                low_packets,
                parameters: None,
            };
        }
    };

    log_info(&format!(
        "SIC estimate: {:.0} Hz, amplitude {:.3}, phase {:.2} rad, shift {}",
        parameters.frequency, parameters.amplitude, parameters.phase, parameters.sample_shift
    ));

    let low_packets = receiver_low.demodulate_to_packet(&residual);
    SicOutcome {
        high_packets,
        low_packets,
        parameters: Some(parameters),
    }
}
