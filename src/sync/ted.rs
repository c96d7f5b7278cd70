//! # Timing-Error Detectors
//!
//! The closed set of detectors selectable for the symbol-sync loop. Each is a
//! short pure function of the current interpolants; the loop supplies
//! whichever probes (mid-symbol sample, quarter-symbol probes, local slope)
//! the detector declares it needs.
//!
//! Sign convention matches the loop's period update: a positive error means
//! the clock is sampling early and the instantaneous period is lengthened.

use crate::Float;

/// Timing-error detector selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ted {
    MuellerAndMuller,
    ModMuellerAndMuller,
    ZeroCrossing,
    Gardner,
    EarlyLate,
    DandreaAndMengaliGenMsk,
    MengaliAndDandreaGmsk,
    SignalTimesSlopeMl,
    SignumTimesSlopeMl,
}

/// Interpolants handed to a detector for one symbol interval.
#[derive(Debug, Clone, Copy, Default)]
pub struct TedInput {
    /// Current symbol-instant interpolant.
    pub y: Float,
    /// Previous symbol-instant interpolant.
    pub y_prev: Float,
    /// Interpolant half a symbol before the current instant.
    pub y_mid: Float,
    /// Interpolant a quarter symbol before the current instant.
    pub y_early: Float,
    /// Interpolant a quarter symbol after the current instant.
    pub y_late: Float,
    /// Local slope at the current instant (central difference, one sample).
    pub slope: Float,
}

#[inline]
fn slice(x: Float) -> Float {
    if x >= 0.0 {
        1.0
    } else {
        -1.0
    }
}

impl Ted {
    /// Whether the loop must interpolate a mid-symbol probe.
    pub fn needs_mid_sample(self) -> bool {
        matches!(
            self,
            Ted::ZeroCrossing
                | Ted::Gardner
                | Ted::DandreaAndMengaliGenMsk
                | Ted::MengaliAndDandreaGmsk
        )
    }

    /// Whether the loop must interpolate quarter-symbol probes.
    pub fn needs_quarter_samples(self) -> bool {
        matches!(self, Ted::EarlyLate)
    }

    /// Whether the loop must estimate the local slope.
    pub fn needs_slope(self) -> bool {
        matches!(self, Ted::SignalTimesSlopeMl | Ted::SignumTimesSlopeMl)
    }

    /// Compute the timing error for one symbol.
    pub fn compute(self, input: &TedInput) -> Float {
        let d = slice(input.y);
        let d_prev = slice(input.y_prev);

        match self {
            Ted::MuellerAndMuller => d_prev * input.y - d * input.y_prev,
            // M&M with the error bounded, which tames slicer self-noise on
            // strong signals.
            Ted::ModMuellerAndMuller => {
                (d_prev * input.y - d * input.y_prev).clamp(-1.0, 1.0)
            }
            Ted::ZeroCrossing => (d_prev - d) * input.y_mid,
            Ted::Gardner => (input.y_prev - input.y) * input.y_mid,
            Ted::EarlyLate => d * (input.y_late - input.y_early),
            // Transition-weighted Gardner form: partial-response pulses put
            // timing information only on symbol transitions, so the error is
            // scaled by the transition magnitude.
            Ted::DandreaAndMengaliGenMsk => {
                let transition = input.y_prev - input.y;
                0.5 * transition.abs() * transition * input.y_mid
            }
            // Decision-directed counterpart, gated to actual transitions.
            Ted::MengaliAndDandreaGmsk => {
                let transition = d_prev - d;
                0.5 * transition.abs() * transition * input.y_mid
            }
            Ted::SignalTimesSlopeMl => input.y * input.slope,
            Ted::SignumTimesSlopeMl => d * input.slope,
        }
    }
}
