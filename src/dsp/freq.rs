//! # Discriminators, Squelch and Slicer
//!
//! The two soft-decision front ends shared by the receivers: the quadrature
//! (instantaneous-frequency) demodulator and the band-pass discriminator,
//! plus the squelch used to silence inter-packet noise and the hard slicer.

use crate::dsp::fir::{convolve_cc, ConvMode};
use crate::dsp::iir::single_pole_iir;
use crate::{Complex, Float};

/// Computes the instantaneous frequency of a complex IQ signal.
///
/// `out[n] = arg(x[n+1] * conj(x[n])) * gain`: the phase difference between
/// consecutive samples, inherently unwrapped by taking the principal argument
/// of the one-lag product. Output length is input length minus one.
///
/// With `gain = fs / (2 * pi * deviation)` a nominal mark/space maps to ±1.
pub fn quadrature_demod(iq_samples: &[Complex], gain: Float) -> Vec<Float> {
    iq_samples
        .windows(2)
        .map(|w| (w[1] * w[0].conj()).arg() * gain)
        .collect()
}

/// Band-pass discriminator: soft per-sample decisions without phase tracking.
///
/// Two complex-modulated copies of the low-pass taps are built at ±deviation;
/// the output is the difference of the two branch powers, normalised by its
/// peak. Robust to phase noise since no angle is ever unwrapped.
pub fn band_pass_soft(
    iq_samples: &[Complex],
    taps: &[Float],
    fs: Float,
    deviation: Float,
) -> Vec<Float> {
    use std::f64::consts::PI;

    let rot = 2.0 * PI * deviation as f64 / fs as f64;
    let upper: Vec<Complex> = taps
        .iter()
        .enumerate()
        .map(|(k, &t)| {
            let ph = rot * k as f64;
            Complex::new((ph.cos() * t as f64) as Float, (ph.sin() * t as f64) as Float)
        })
        .collect();
    let lower: Vec<Complex> = upper.iter().map(|c| c.conj()).collect();

    let branch_upper = convolve_cc(iq_samples, &upper, ConvMode::Full);
    let branch_lower = convolve_cc(iq_samples, &lower, ConvMode::Full);

    let mut soft: Vec<Float> = branch_upper
        .iter()
        .zip(branch_lower.iter())
        .map(|(u, l)| u.norm_sqr() - l.norm_sqr())
        .collect();

    let peak = soft.iter().cloned().fold(0.0 as Float, Float::max);
    if peak > Float::EPSILON {
        for s in soft.iter_mut() {
            *s /= peak;
        }
    }
    soft
}

/// Zero out samples that fall below an absolute amplitude threshold.
pub fn simple_squelch(iq_samples: &[Complex], threshold: Float) -> Vec<Complex> {
    iq_samples
        .iter()
        .map(|&x| {
            if x.norm() < threshold {
                Complex::new(0.0, 0.0)
            } else {
                x
            }
        })
        .collect()
}

/// Squelch with an IIR-smoothed power estimate and a threshold in dB
/// relative to the peak of that estimate.
///
/// # Arguments
///
/// * `iq_samples` - Input stream
/// * `threshold_db` - Threshold relative to the smoothed-power peak (e.g. -20)
/// * `alpha` - Power-smoothing IIR coefficient
pub fn squelch_db(iq_samples: &[Complex], threshold_db: Float, alpha: Float) -> Vec<Complex> {
    let power: Vec<Float> = iq_samples.iter().map(|x| x.norm_sqr()).collect();
    let smoothed = single_pole_iir(&power, alpha);

    let peak = smoothed.iter().cloned().fold(0.0 as Float, Float::max);
    if peak <= Float::EPSILON {
        return iq_samples.to_vec();
    }
    let threshold = peak * (10.0 as Float).powf(threshold_db / 10.0);

    iq_samples
        .iter()
        .zip(smoothed.iter())
        .map(|(&x, &p)| {
            if p < threshold {
                Complex::new(0.0, 0.0)
            } else {
                x
            }
        })
        .collect()
}

/// Hard decision slicer: 1 for non-negative soft values, 0 otherwise.
pub fn binary_slicer(data: &[Float]) -> Vec<u8> {
    data.iter().map(|&x| u8::from(x >= 0.0)).collect()
}
