//! # SIC Monte-Carlo Simulator
//!
//! Generates two overlapping packets with randomised carrier offset, phase,
//! amplitude and fractional timing, pushes the composite through an ADC
//! model and the SIC pipeline, and tallies packet delivery over a
//! (power-difference × SNR) sweep.
//!
//! Trials are independent: each owns a seeded RNG and every worker thread
//! constructs its own transmitter/receiver set. The only shared state is an
//! atomic task counter and the per-cell delivery tallies, written with
//! atomic increments — no locks.

pub mod analysis;
pub mod archive;

pub use analysis::{pdr_vs_snr, snr_from_pearson, theoretical_pdr, PdrPoint};
pub use archive::{load_archive, make_filename, save_archive, SimulationArchive};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::constants::FRACTIONAL_DELAY_TAPS;
use crate::dsp::adc::adc_quantise;
use crate::dsp::delay::fractional_delay;
use crate::dsp::noise::{add_white_gaussian_noise, signal_power_db};
use crate::error::{PhyError, PhyResult};
use crate::logging::{log_debug, log_info};
use crate::protocol::{AnyReceiver, AnyTransmitter, PhyTransmitter, Protocol};
use crate::sic::{cancel_and_decode, frequency_grid, SicConfig};
use crate::{Complex, Float};

/// Successive Interference Cancellation simulation parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationConfig {
    /// Samples per second.
    pub sampling_rate: f64,
    /// Protocol of the higher-power signal.
    pub protocol_high: Protocol,
    /// Protocol of the lower-power signal.
    pub protocol_low: Protocol,
    /// BLE data rate (1e6 or 2e6), consulted for BLE participants.
    pub ble_rate: f64,
    /// Coarse frequency search range (Hz) and step for demodulation.
    pub freq_offset_min: f64,
    pub freq_offset_max: f64,
    pub freq_offset_step: f64,
    /// Optional fine search step (Hz).
    pub fine_step: Option<f64>,
    /// Optional fine search half-width (Hz).
    pub fine_window: Option<f64>,
    /// Bytes in the high-power payload.
    pub payload_len_high: usize,
    /// Bytes in the low-power payload.
    pub payload_len_low: usize,
    /// Random fractional sample shift applied to the high signal.
    pub sample_shift_range_high: (f64, f64),
    /// Random fractional sample shift applied to the low signal.
    pub sample_shift_range_low: (f64, f64),
    /// Fixed frequency offsets; `None` draws uniformly from the range.
    pub freq_high: Option<f64>,
    pub freq_low: Option<f64>,
    /// Fixed phases; `None` draws uniformly from [0, 2*pi).
    pub phase_high: Option<f64>,
    pub phase_low: Option<f64>,
    /// ADC resolution in bits.
    pub adc_bits: u32,
    /// Maximum ADC input amplitude.
    pub adc_vmax: f64,
    /// Zero padding around each modulated signal, in samples.
    pub padding: usize,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig {
            sampling_rate: 10e6,
            protocol_high: Protocol::Ble,
            protocol_low: Protocol::Ieee802154,
            ble_rate: 1e6,
            freq_offset_min: -5000.0,
            freq_offset_max: 5000.0,
            freq_offset_step: 50.0,
            fine_step: Some(2.0),
            fine_window: Some(50.0),
            payload_len_high: 30,
            payload_len_low: 200,
            sample_shift_range_high: (200.0, 2200.0),
            sample_shift_range_low: (0.0, 1.0),
            freq_high: None,
            freq_low: None,
            phase_high: None,
            phase_low: None,
            adc_bits: 12,
            adc_vmax: 1.0,
            padding: 500,
        }
    }
}

impl SimulationConfig {
    fn sic_config(&self) -> SicConfig {
        let grid = frequency_grid(
            self.freq_offset_min,
            self.freq_offset_max,
            self.freq_offset_step,
        );
        match (self.fine_step, self.fine_window) {
            (Some(step), Some(window)) => SicConfig::new(grid).with_fine_search(step, window),
            _ => SicConfig::new(grid),
        }
    }
}

/// PDR tensor indexed `[signal][power][snr]` with `signal 0 = high, 1 = low`.
pub type PdrTensor = Vec<Vec<Vec<f64>>>;

/// One worker's modem set, constructed per thread.
pub struct ModemSet {
    pub tx_high: AnyTransmitter,
    pub rx_high: AnyReceiver,
    pub tx_low: AnyTransmitter,
    pub rx_low: AnyReceiver,
}

/// Uniform draw that tolerates a degenerate (fixed) range.
fn draw(rng: &mut StdRng, range: (f64, f64)) -> f64 {
    if range.1 > range.0 {
        rng.gen_range(range.0..range.1)
    } else {
        range.0
    }
}

/// Monte-Carlo SIC simulator.
pub struct SimulatorSic {
    cfg: SimulationConfig,
}

impl SimulatorSic {
    /// Validate the configuration by constructing one modem set up front.
    pub fn new(cfg: SimulationConfig) -> PhyResult<Self> {
        let simulator = SimulatorSic { cfg };
        simulator.build_modems()?;
        Ok(simulator)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.cfg
    }

    /// Construct a modem set; workers call this once per thread.
    pub fn build_modems(&self) -> PhyResult<ModemSet> {
        let cfg = &self.cfg;
        Ok(ModemSet {
            tx_high: AnyTransmitter::new(cfg.protocol_high, cfg.sampling_rate, cfg.ble_rate)?,
            rx_high: AnyReceiver::new(cfg.protocol_high, cfg.sampling_rate, cfg.ble_rate)?,
            tx_low: AnyTransmitter::new(cfg.protocol_low, cfg.sampling_rate, cfg.ble_rate)?,
            rx_low: AnyReceiver::new(cfg.protocol_low, cfg.sampling_rate, cfg.ble_rate)?,
        })
    }

    /// Generate one participant: random payload, modulate, rotate onto its
    /// carrier, scale. Returns the IQ stream and its signal-present interval.
    fn generate_signal(
        &self,
        transmitter: &AnyTransmitter,
        payload_len: usize,
        amplitude: f64,
        fixed_freq: Option<f64>,
        fixed_phase: Option<f64>,
        rng: &mut StdRng,
    ) -> (Vec<Complex>, (usize, usize)) {
        let cfg = &self.cfg;
        let payload: Vec<u8> = (0..payload_len).map(|_| rng.gen()).collect();

        let iq = transmitter.modulate_from_payload(&payload, cfg.padding);
        let interval = (cfg.padding, iq.len() - cfg.padding);

        let freq =
            fixed_freq.unwrap_or_else(|| draw(rng, (cfg.freq_offset_min, cfg.freq_offset_max)));
        let phase =
            fixed_phase.unwrap_or_else(|| rng.gen_range(0.0..2.0 * std::f64::consts::PI));

        let rotated =
            crate::sic::multiply_by_complex_exponential(&iq, cfg.sampling_rate, freq, phase, amplitude);
        (rotated, interval)
    }

    /// Run a single trial; returns `(delivered_high, delivered_low)`.
    pub fn run_trial(
        &self,
        modems: &ModemSet,
        amplitude_high: f64,
        amplitude_low: f64,
        snr_low_db: f64,
        rng: &mut StdRng,
    ) -> (bool, bool) {
        let cfg = &self.cfg;

        let (high, _) = self.generate_signal(
            &modems.tx_high,
            cfg.payload_len_high,
            amplitude_high,
            cfg.freq_high,
            cfg.phase_high,
            rng,
        );
        let (low, low_interval) = self.generate_signal(
            &modems.tx_low,
            cfg.payload_len_low,
            amplitude_low,
            cfg.freq_low,
            cfg.phase_low,
            rng,
        );

        // Noise power pinned to the low signal before any alignment games.
        let low_power_db = signal_power_db(&low, Some(low_interval));
        let noise_power_db = low_power_db - snr_low_db;

        // Random fractional delays, then a common buffer with headroom so
        // nothing shifted falls off the end.
        let shift_high = draw(rng, cfg.sample_shift_range_high);
        let shift_low = draw(rng, cfg.sample_shift_range_low);

        let margin = shift_high.max(shift_low).ceil() as usize + FRACTIONAL_DELAY_TAPS;
        let common = high.len().max(low.len()) + margin;

        let mut composite = vec![Complex::new(0.0, 0.0); common];
        for (signal, shift) in [(&high, shift_high), (&low, shift_low)] {
            let mut extended = signal.to_vec();
            extended.resize(common, Complex::new(0.0, 0.0));
            let delayed = fractional_delay(&extended, shift, FRACTIONAL_DELAY_TAPS, true);
            for (c, d) in composite.iter_mut().zip(delayed.iter()) {
                *c += *d;
            }
        }

        let noisy = add_white_gaussian_noise(&composite, noise_power_db, true, rng);
        let quantised = match adc_quantise(&noisy, cfg.adc_vmax as Float, cfg.adc_bits) {
            Ok(q) => q,
            Err(_) => return (false, false),
        };

        let outcome = cancel_and_decode(
            &quantised,
            &modems.rx_high,
            &modems.tx_high,
            &modems.rx_low,
            cfg.sampling_rate,
            &self.cfg.sic_config(),
        );
        outcome.delivered()
    }

    /// Monte-Carlo sweep over `(power_low, snr_low)`.
    ///
    /// Trials are distributed over worker threads through an atomic task
    /// counter; each trial is seeded from `seed` and its task index, so runs
    /// are reproducible regardless of scheduling.
    pub fn run_monte_carlo(
        &self,
        high_power_db: f64,
        low_powers_db: &[f64],
        snr_lows_db: &[f64],
        num_trials: usize,
        seed: u64,
    ) -> PhyResult<PdrTensor> {
        if low_powers_db.is_empty() || snr_lows_db.is_empty() {
            return Err(PhyError::InvalidSweep("empty sweep axis".into()));
        }
        if num_trials == 0 {
            return Err(PhyError::InvalidSweep("zero trials".into()));
        }

        let n_powers = low_powers_db.len();
        let n_snrs = snr_lows_db.len();
        let total_tasks = n_powers * n_snrs * num_trials;
        let amplitude_high = 10f64.powf(high_power_db / 20.0);

        let next_task = AtomicUsize::new(0);
        let completed = AtomicUsize::new(0);
        let high_counts: Vec<AtomicU32> =
            (0..n_powers * n_snrs).map(|_| AtomicU32::new(0)).collect();
        let low_counts: Vec<AtomicU32> =
            (0..n_powers * n_snrs).map(|_| AtomicU32::new(0)).collect();

        let workers = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1)
            .min(total_tasks);

        log_info(&format!(
            "Monte-Carlo: {n_powers}x{n_snrs} sweep, {num_trials} trials/cell, {workers} workers"
        ));

        std::thread::scope(|scope| {
            for _ in 0..workers {
                scope.spawn(|| {
                    // Per-worker modem set; validated at construction.
                    let Ok(modems) = self.build_modems() else {
                        return;
                    };
                    loop {
                        let task = next_task.fetch_add(1, Ordering::Relaxed);
                        if task >= total_tasks {
                            break;
                        }
                        let cell = task / num_trials;
                        let power_idx = cell / n_snrs;
                        let snr_idx = cell % n_snrs;

                        let amplitude_low = 10f64.powf(low_powers_db[power_idx] / 20.0);
                        let mut rng = StdRng::seed_from_u64(seed ^ (task as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15));

                        let (high_ok, low_ok) = self.run_trial(
                            &modems,
                            amplitude_high,
                            amplitude_low,
                            snr_lows_db[snr_idx],
                            &mut rng,
                        );
                        if high_ok {
                            high_counts[cell].fetch_add(1, Ordering::Relaxed);
                        }
                        if low_ok {
                            low_counts[cell].fetch_add(1, Ordering::Relaxed);
                        }

                        let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
                        if done % num_trials == 0 {
                            log_debug(&format!("Monte-Carlo: {done}/{total_tasks} trials"));
                        }
                    }
                });
            }
        });

        let collect = |counts: &[AtomicU32]| -> Vec<Vec<f64>> {
            (0..n_powers)
                .map(|p| {
                    (0..n_snrs)
                        .map(|s| {
                            counts[p * n_snrs + s].load(Ordering::Relaxed) as f64
                                / num_trials as f64
                        })
                        .collect()
                })
                .collect()
        };

        Ok(vec![collect(&high_counts), collect(&low_counts)])
    }
}
