//! # FIR Filtering and Tap Design
//!
//! Batch convolution in the three usual modes, a streaming FIR that carries
//! `ntaps - 1` samples of history between calls, and the tap designers used
//! by the modems: windowed-sinc low-pass, Gaussian (GFSK pulse shaping) and
//! half-sine (O-QPSK chip shaping).

use crate::{Complex, Float};

/// Convolution output trimming.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvMode {
    /// Every overlap position: `n + m - 1` samples.
    Full,
    /// Centred, same length as the input.
    Same,
    /// Only positions with complete overlap: `n - m + 1` samples.
    Valid,
}

/// Trim a full-length convolution down to the requested mode.
fn trim<T: Copy>(full: Vec<T>, input_len: usize, taps_len: usize, mode: ConvMode) -> Vec<T> {
    match mode {
        ConvMode::Full => full,
        ConvMode::Same => {
            let start = (taps_len - 1) / 2;
            full[start..start + input_len].to_vec()
        }
        ConvMode::Valid => {
            if input_len < taps_len {
                return Vec::new();
            }
            full[taps_len - 1..input_len].to_vec()
        }
    }
}

/// Convolve a real stream with real taps.
pub fn convolve_ff(input: &[Float], taps: &[Float], mode: ConvMode) -> Vec<Float> {
    if input.is_empty() || taps.is_empty() {
        return Vec::new();
    }
    let n = input.len();
    let m = taps.len();
    let mut full = vec![0.0 as Float; n + m - 1];
    for (i, &x) in input.iter().enumerate() {
        for (k, &t) in taps.iter().enumerate() {
            full[i + k] += x * t;
        }
    }
    trim(full, n, m, mode)
}

/// Convolve a complex stream with real taps.
pub fn convolve_cf(input: &[Complex], taps: &[Float], mode: ConvMode) -> Vec<Complex> {
    if input.is_empty() || taps.is_empty() {
        return Vec::new();
    }
    let n = input.len();
    let m = taps.len();
    let mut full = vec![Complex::new(0.0, 0.0); n + m - 1];
    for (i, &x) in input.iter().enumerate() {
        for (k, &t) in taps.iter().enumerate() {
            full[i + k] += x * t;
        }
    }
    trim(full, n, m, mode)
}

/// Convolve a complex stream with complex taps (full complex multiply).
pub fn convolve_cc(input: &[Complex], taps: &[Complex], mode: ConvMode) -> Vec<Complex> {
    if input.is_empty() || taps.is_empty() {
        return Vec::new();
    }
    let n = input.len();
    let m = taps.len();
    let mut full = vec![Complex::new(0.0, 0.0); n + m - 1];
    for (i, &x) in input.iter().enumerate() {
        for (k, &t) in taps.iter().enumerate() {
            full[i + k] += x * t;
        }
    }
    trim(full, n, m, mode)
}

/// Streaming FIR over a complex stream with real taps.
///
/// Carries the last `ntaps - 1` input samples between calls so that block
/// boundaries are seamless; each call returns exactly as many samples as it
/// was given.
#[derive(Debug, Clone)]
pub struct Fir {
    taps: Vec<Float>,
    history: Vec<Complex>,
}

impl Fir {
    pub fn new(taps: Vec<Float>) -> Self {
        let history = vec![Complex::new(0.0, 0.0); taps.len().saturating_sub(1)];
        Fir { taps, history }
    }

    /// Filter one block, preserving history across calls.
    pub fn filter(&mut self, block: &[Complex]) -> Vec<Complex> {
        let m = self.taps.len();
        let mut extended = Vec::with_capacity(self.history.len() + block.len());
        extended.extend_from_slice(&self.history);
        extended.extend_from_slice(block);

        let mut out = Vec::with_capacity(block.len());
        for n in 0..block.len() {
            let mut acc = Complex::new(0.0, 0.0);
            for (k, &t) in self.taps.iter().enumerate() {
                // extended index of x[n - k] in the causal filter
                acc += extended[n + m - 1 - k] * t;
            }
            out.push(acc);
        }

        if m > 1 {
            let keep = m - 1;
            let start = extended.len() - keep;
            self.history.copy_from_slice(&extended[start..]);
        }
        out
    }

    /// Drop the carried history (stream restart).
    pub fn reset(&mut self) {
        self.history.iter_mut().for_each(|h| *h = Complex::new(0.0, 0.0));
    }
}

/// Window functions for FIR design.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Window {
    Hamming,
    Blackman,
    Rectangular,
}

fn window_coeffs(kind: Window, ntaps: usize) -> Vec<Float> {
    use std::f64::consts::PI;
    let m = (ntaps - 1) as f64;
    (0..ntaps)
        .map(|i| {
            let x = i as f64;
            let w = match kind {
                Window::Hamming => 0.54 - 0.46 * (2.0 * PI * x / m).cos(),
                Window::Blackman => {
                    0.42 - 0.5 * (2.0 * PI * x / m).cos() + 0.08 * (4.0 * PI * x / m).cos()
                }
                Window::Rectangular => 1.0,
            };
            w as Float
        })
        .collect()
}

fn sinc(x: f64) -> f64 {
    if x.abs() < 1e-12 {
        1.0
    } else {
        let px = std::f64::consts::PI * x;
        px.sin() / px
    }
}

/// Design a windowed-sinc low-pass filter.
///
/// The tap count follows the 4/transition rule of thumb and is forced odd;
/// taps are normalised to unity DC gain before the optional `gain` scale.
///
/// # Arguments
///
/// * `fs` - Sample rate in Hz
/// * `cutoff` - Cutoff frequency in Hz
/// * `transition` - Transition width in Hz
/// * `window` - Window applied to the sinc kernel
/// * `gain` - Final gain scale
pub fn low_pass_taps(fs: f64, cutoff: f64, transition: f64, window: Window, gain: f64) -> Vec<Float> {
    let nyquist = fs / 2.0;
    let mut ntaps = (4.0 * nyquist / transition).ceil() as usize;
    ntaps |= 1;

    let w = window_coeffs(window, ntaps);
    let centre = (ntaps - 1) as f64 / 2.0;
    let fc = cutoff / nyquist; // normalised (1.0 = Nyquist)

    let mut taps: Vec<f64> = (0..ntaps)
        .map(|i| fc * sinc(fc * (i as f64 - centre)) * w[i] as f64)
        .collect();

    let sum: f64 = taps.iter().sum();
    for t in taps.iter_mut() {
        *t *= gain / sum;
    }
    taps.into_iter().map(|t| t as Float).collect()
}

/// Generate Gaussian FIR filter taps.
///
/// `bt` is the bandwidth-bit period product; the taps are normalised to unit
/// sum before the gain scale.
pub fn gaussian_fir_taps(sps: usize, ntaps: usize, bt: f64, gain: f64) -> Vec<Float> {
    use std::f64::consts::PI;
    // Scaling factor for time based on BT
    let t_scale = (2.0f64.ln()).sqrt() / (2.0 * PI * bt);
    let centre = (ntaps - 1) as f64 / 2.0;

    let taps: Vec<f64> = (0..ntaps)
        .map(|i| {
            let t = i as f64 - centre;
            (-(t / (sps as f64 * t_scale)).powi(2) / 2.0).exp()
        })
        .collect();

    let sum: f64 = taps.iter().sum();
    taps.into_iter().map(|t| (gain * t / sum) as Float).collect()
}

/// Generate half-sine pulse FIR taps: `sin(pi * n / sps)` for `n in 0..=sps`.
pub fn half_sine_fir_taps(sps: usize) -> Vec<Float> {
    use std::f64::consts::PI;
    (0..=sps)
        .map(|n| (PI * n as f64 / sps as f64).sin() as Float)
        .collect()
}

/// BLE pulse-shaping kernel: Gaussian (BT = 0.5) convolved with a
/// rectangular window one symbol wide. Not normalised; the transmitter wants
/// the integrator plateau at unit amplitude and the receiver normalises its
/// copy to unit sum.
pub fn ble_pulse_taps(sps: usize, bt: f64) -> Vec<Float> {
    let gauss = gaussian_fir_taps(sps, sps, bt, 1.0);
    let rect = vec![1.0 as Float; sps];
    convolve_ff(&gauss, &rect, ConvMode::Full)
}

/// Design and apply a decimating FIR low-pass front end.
///
/// Causal filtering (output trimmed to the input length) followed by the
/// downsampling step, matching an oversampled-capture front end.
pub fn decimating_fir_filter(
    data: &[Complex],
    decimation: usize,
    gain: f64,
    fs: f64,
    cutoff: f64,
    transition: f64,
    window: Window,
) -> Vec<Complex> {
    let taps = low_pass_taps(fs, cutoff, transition, window, gain);
    let filtered = convolve_cf(data, &taps, ConvMode::Full);
    filtered
        .into_iter()
        .take(data.len())
        .step_by(decimation.max(1))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convolve_modes_lengths() {
        let x = [1.0, 2.0, 3.0, 4.0, 5.0];
        let t = [1.0, 1.0, 1.0];
        assert_eq!(convolve_ff(&x, &t, ConvMode::Full).len(), 7);
        assert_eq!(convolve_ff(&x, &t, ConvMode::Same).len(), 5);
        assert_eq!(convolve_ff(&x, &t, ConvMode::Valid).len(), 3);
    }

    #[test]
    fn test_convolve_identity_tap() {
        let x = [1.0, -2.0, 3.5];
        assert_eq!(convolve_ff(&x, &[1.0], ConvMode::Full), x.to_vec());
    }

    #[test]
    fn test_convolve_known_values() {
        // [1,2,3] * [1,1] = [1,3,5,3]
        let y = convolve_ff(&[1.0, 2.0, 3.0], &[1.0, 1.0], ConvMode::Full);
        assert_eq!(y, vec![1.0, 3.0, 5.0, 3.0]);
    }

    #[test]
    fn test_convolve_cc_full_complex_multiply() {
        let x = [Complex::new(0.0, 1.0)];
        let t = [Complex::new(0.0, 1.0)];
        let y = convolve_cc(&x, &t, ConvMode::Full);
        assert!((y[0].re + 1.0).abs() < 1e-6);
        assert!(y[0].im.abs() < 1e-6);
    }

    #[test]
    fn test_streaming_matches_batch() {
        let taps = vec![0.25, 0.5, 0.25];
        let input: Vec<Complex> = (0..32)
            .map(|i| Complex::new((i as Float * 0.3).sin(), (i as Float * 0.7).cos()))
            .collect();

        // Causal batch reference: full convolution trimmed to input length.
        let batch: Vec<Complex> = convolve_cf(&input, &taps, ConvMode::Full)
            .into_iter()
            .take(input.len())
            .collect();

        let mut fir = Fir::new(taps);
        let mut streamed = Vec::new();
        for block in input.chunks(7) {
            streamed.extend(fir.filter(block));
        }

        for (a, b) in batch.iter().zip(streamed.iter()) {
            assert!((a - b).norm() < 1e-5);
        }
    }

    #[test]
    fn test_low_pass_unity_dc_gain() {
        let taps = low_pass_taps(10e6, 1.5e6, 1e6, Window::Hamming, 1.0);
        assert_eq!(taps.len() % 2, 1);
        let sum: f64 = taps.iter().map(|&t| t as f64).sum();
        assert!((sum - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_gaussian_taps_normalised_and_symmetric() {
        let taps = gaussian_fir_taps(8, 8, 0.5, 1.0);
        let sum: f64 = taps.iter().map(|&t| t as f64).sum();
        assert!((sum - 1.0).abs() < 1e-6);
        for i in 0..taps.len() / 2 {
            assert!((taps[i] - taps[taps.len() - 1 - i]).abs() < 1e-6);
        }
    }

    #[test]
    fn test_half_sine_taps_shape() {
        let taps = half_sine_fir_taps(10);
        assert_eq!(taps.len(), 11);
        assert!(taps[0].abs() < 1e-6);
        assert!(taps[10].abs() < 1e-6);
        assert!((taps[5] - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ble_pulse_plateau() {
        // Unit-sum Gaussian convolved with a one-symbol rectangle reaches a
        // plateau of ~1 in the middle, which keeps the FM deviation nominal.
        let taps = ble_pulse_taps(10, 0.5);
        assert_eq!(taps.len(), 2 * 10 - 1);
        let mid = taps[taps.len() / 2];
        assert!((mid - 1.0).abs() < 0.05, "plateau {mid}");
    }

    #[test]
    fn test_decimation_length() {
        let data = vec![Complex::new(1.0, 0.0); 100];
        let out = decimating_fir_filter(&data, 4, 1.0, 10e6, 2e6, 1e6, Window::Hamming);
        assert_eq!(out.len(), 25);
    }
}
