//! # Symbol-Timing Recovery
//!
//! Closed-loop interpolating resampler producing one soft output per symbol.
//!
//! The loop follows the familiar structure: interpolate at the current
//! symbol instant, feed a timing-error detector, run the error through a
//! proportional-integral loop filter, and step the clock by the resulting
//! instantaneous period. The interpolator is a polyphase windowed-sinc bank
//! ([`interp::Interpolator`]), and the detector is selected from a closed
//! enum ([`ted::Ted`]) — no plugin machinery.
//!
//! Acquisition is seeded by a coarse energy scan over the sample phases
//! (symbol centres carry the most energy in the discriminated waveform), so
//! the narrow tracking loop starts near lock instead of pulling in from an
//! arbitrary phase.

pub mod interp;
pub mod ted;

pub use interp::Interpolator;
pub use ted::{Ted, TedInput};

use crate::constants::{
    DEFAULT_DAMPING, DEFAULT_LOOP_BW, DEFAULT_MAX_DEVIATION, DEFAULT_TED_GAIN,
};
use crate::Float;

/// Loop-filter parameters, normalised to the symbol rate.
#[derive(Debug, Clone, Copy)]
pub struct LoopParameters {
    /// Normalised loop bandwidth (e.g. 4.5e-3).
    pub loop_bw: Float,
    /// Damping factor (1.0 = critically damped).
    pub damping: Float,
    /// Expected slope of the detector S-curve at the origin.
    pub ted_gain: Float,
    /// Maximum deviation of the average clock period from nominal, in
    /// samples. Zero locks the average period.
    pub max_deviation: Float,
}

impl Default for LoopParameters {
    fn default() -> Self {
        LoopParameters {
            loop_bw: DEFAULT_LOOP_BW,
            damping: DEFAULT_DAMPING,
            ted_gain: DEFAULT_TED_GAIN,
            max_deviation: DEFAULT_MAX_DEVIATION,
        }
    }
}

/// Closed-loop symbol synchroniser.
///
/// Construction fixes the nominal samples-per-symbol, the detector and the
/// loop parameters; [`SymbolSync::process`] is then a pure function of its
/// input buffer (all loop state is per-call), so one instance can be shared
/// across threads.
#[derive(Debug, Clone)]
pub struct SymbolSync {
    sps: Float,
    ted: Ted,
    params: LoopParameters,
    alpha: f64,
    beta: f64,
    interp: Interpolator,
}

impl SymbolSync {
    /// Create a synchroniser with default loop parameters.
    pub fn new(sps: Float, ted: Ted) -> Self {
        Self::with_parameters(sps, ted, LoopParameters::default())
    }

    /// Create a synchroniser with explicit loop parameters.
    pub fn with_parameters(sps: Float, ted: Ted, params: LoopParameters) -> Self {
        // Standard proportional-integral gains for a second-order digital
        // loop at one update per symbol.
        let theta = params.loop_bw as f64;
        let zeta = params.damping as f64;
        let denom = 1.0 + 2.0 * zeta * theta + theta * theta;
        let alpha = 4.0 * zeta * theta / denom / params.ted_gain as f64;
        let beta = 4.0 * theta * theta / denom / params.ted_gain as f64;

        SymbolSync {
            sps,
            ted,
            params,
            alpha,
            beta,
            interp: Interpolator::new(),
        }
    }

    /// Nominal samples per symbol.
    pub fn sps(&self) -> Float {
        self.sps
    }

    /// Coarse timing acquisition: mean power per sample phase.
    ///
    /// Returns the phase (in samples, `< round(sps)`) whose comb of samples
    /// carries the most energy — the open part of the eye.
    fn acquire_phase(&self, input: &[Float]) -> usize {
        let period = self.sps.round() as usize;
        if period <= 1 || input.len() < period {
            return 0;
        }
        let mut energy = vec![0.0f64; period];
        for (i, &x) in input.iter().enumerate() {
            energy[i % period] += (x as f64) * (x as f64);
        }
        energy
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Run the loop over a soft stream, producing one value per symbol.
    ///
    /// If the stream ends mid-symbol the tail is truncated; a symbol is never
    /// emitted without enough samples to interpolate.
    pub fn process(&self, input: &[Float]) -> Vec<Float> {
        let n = input.len();
        let nominal = self.sps as f64;
        if n == 0 || nominal < 1.0 {
            return Vec::new();
        }

        let mut out = Vec::with_capacity(n / self.sps as usize + 2);

        let mut t = self.acquire_phase(input) as f64;
        let mut avg_period = nominal;
        let max_dev = self.params.max_deviation as f64;
        let mut y_prev = 0.0 as Float;

        while t < n as f64 {
            let y = self.interp.interpolate(input, t);

            let mut probe = TedInput {
                y,
                y_prev,
                ..Default::default()
            };
            if self.ted.needs_mid_sample() {
                probe.y_mid = self.interp.interpolate(input, t - avg_period / 2.0);
            }
            if self.ted.needs_quarter_samples() {
                probe.y_early = self.interp.interpolate(input, t - avg_period / 4.0);
                probe.y_late = self.interp.interpolate(input, t + avg_period / 4.0);
            }
            if self.ted.needs_slope() {
                let ahead = self.interp.interpolate(input, t + 0.5);
                let behind = self.interp.interpolate(input, t - 0.5);
                probe.slope = ahead - behind;
            }

            let error = self.ted.compute(&probe) as f64;

            // Integrate, bound the average period, then form the
            // instantaneous period for this step.
            avg_period += self.beta * error;
            avg_period = avg_period.clamp(nominal - max_dev, nominal + max_dev);
            let inst_period =
                (avg_period + self.alpha * error).clamp(nominal * 0.5, nominal * 1.5);

            out.push(y);
            y_prev = y;
            t += inst_period;
        }

        out
    }
}
