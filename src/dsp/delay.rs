//! # Fractional Delay
//!
//! Delays a stream by an arbitrary (non-negative) number of samples: the
//! fractional part through a shifted-sinc FIR, the integer part through a
//! zero-padded shift. Used by the simulator to decorrelate the two packets'
//! sampling phases.

use crate::{Complex, Float};

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Build the shifted-sinc kernel for a fractional delay in [0, 1).
///
/// `num_taps` odd; the kernel is centred so that `frac = 0` reduces to a pure
/// `(num_taps + 1) / 2` group delay, which the caller compensates.
fn fractional_kernel(frac: f64, num_taps: usize) -> Vec<Float> {
    let centre = (num_taps + 1) / 2;
    let mut taps: Vec<f64> = (0..num_taps)
        .map(|k| sinc(k as f64 - centre as f64 - frac))
        .collect();
    let sum: f64 = taps.iter().sum();
    for t in taps.iter_mut() {
        *t /= sum;
    }
    taps.into_iter().map(|t| t as Float).collect()
}

/// Delay `data` by `delay` samples (integer + fractional part).
///
/// The sinc filter's own group delay is compensated before the integer shift,
/// so the output is aligned with the input shifted by exactly `delay`.
/// With `same_size` the output keeps the input length (samples shifted past
/// the end are lost); otherwise it is extended by `num_taps / 2` samples.
///
/// # Arguments
///
/// * `data` - Input stream
/// * `delay` - Non-negative delay in samples
/// * `num_taps` - Sinc kernel length (odd, e.g. 21)
/// * `same_size` - Truncate the output to the input length
pub fn fractional_delay(
    data: &[Complex],
    delay: f64,
    num_taps: usize,
    same_size: bool,
) -> Vec<Complex> {
    debug_assert!(delay >= 0.0, "delay must be non-negative");
    debug_assert_eq!(num_taps % 2, 1, "kernel length must be odd");

    let integer_delay = delay.floor() as usize;
    let frac = delay - delay.floor();

    let kernel = fractional_kernel(frac, num_taps);
    let centre = (num_taps + 1) / 2;

    // Full convolution, then drop the kernel group delay.
    let n = data.len();
    let mut full = vec![Complex::new(0.0, 0.0); n + num_taps - 1];
    for (i, &x) in data.iter().enumerate() {
        for (k, &t) in kernel.iter().enumerate() {
            full[i + k] += x * t;
        }
    }

    let keep = if same_size { n } else { n + num_taps / 2 };
    let frac_delayed: Vec<Complex> = (0..keep)
        .map(|i| {
            full.get(i + centre)
                .copied()
                .unwrap_or_else(|| Complex::new(0.0, 0.0))
        })
        .collect();

    // Integer shift with zero padding at the front.
    let mut out = vec![Complex::new(0.0, 0.0); keep];
    if integer_delay < keep {
        let tail = keep - integer_delay;
        out[integer_delay..].copy_from_slice(&frac_delayed[..tail]);
    }
    out
}
