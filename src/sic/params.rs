//! # Interference Parameter Estimation and Subtraction
//!
//! Finds the complex exponential (frequency, phase, amplitude) and sample
//! shift that best explain a known interference inside an affected capture,
//! then subtracts the re-synthesised interference.
//!
//! The search correlates the affected stream against frequency-rotated
//! copies of the interference template over a coarse grid, optionally
//! refined by a fine grid around the best coarse hit. Correlation runs in
//! f64 through FFTs: the amplitude estimate feeds a subtraction, so the
//! extra precision is not optional.

use num_complex::Complex64;
use rustfft::FftPlanner;

use crate::error::{PhyError, PhyResult};
use crate::{Complex, Float};

/// Estimated alignment of an interference template inside a capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterferenceParameters {
    /// Frequency offset in Hz.
    pub frequency: f64,
    /// Amplitude scale of the template.
    pub amplitude: f64,
    /// Carrier phase in radians.
    pub phase: f64,
    /// Non-negative sample shift of the template into the capture.
    pub sample_shift: usize,
}

/// Fine-search refinement around the best coarse frequency.
#[derive(Debug, Clone, Copy)]
pub struct FineSearch {
    /// Step size in Hz.
    pub step: f64,
    /// Half-width of the window in Hz.
    pub window: f64,
}

/// Build an inclusive coarse frequency grid.
pub fn frequency_grid(start: f64, stop: f64, step: f64) -> Vec<f64> {
    let mut grid = Vec::new();
    let mut f = start;
    while f < stop {
        grid.push(f);
        f += step;
    }
    grid
}

/// Multiply a stream by `amplitude * exp(j*(2*pi*freq*t/fs + phase))`.
pub fn multiply_by_complex_exponential(
    input: &[Complex],
    fs: f64,
    freq: f64,
    phase: f64,
    amplitude: f64,
) -> Vec<Complex> {
    let step = 2.0 * std::f64::consts::PI * freq / fs;
    input
        .iter()
        .enumerate()
        .map(|(n, &x)| {
            let ph = step * n as f64 + phase;
            let rot = Complex::new(
                (amplitude * ph.cos()) as Float,
                (amplitude * ph.sin()) as Float,
            );
            x * rot
        })
        .collect()
}

/// Zero-pad `interference` to `affected_len` samples with `shift` leading
/// zeros, cropping the tail if it would run past the end.
pub fn pad_interference(
    affected_len: usize,
    interference: &[Complex],
    shift: usize,
) -> PhyResult<Vec<Complex>> {
    if shift >= affected_len {
        return Err(PhyError::ShiftOutOfRange {
            shift,
            len: affected_len,
        });
    }

    let max_len = affected_len - shift;
    let used = &interference[..interference.len().min(max_len)];

    let mut padded = vec![Complex::new(0.0, 0.0); affected_len];
    padded[shift..shift + used.len()].copy_from_slice(used);
    Ok(padded)
}

/// Normalised cross-correlation engine, reused across the frequency grid.
struct Correlator {
    affected_fft: Vec<Complex64>,
    affected_len: usize,
    fft_len: usize,
    planner: FftPlanner<f64>,
}

impl Correlator {
    fn new(affected: &[Complex], template_len: usize) -> Self {
        let fft_len = (affected.len() + template_len).next_power_of_two();
        let mut planner = FftPlanner::new();

        let mut affected_fft: Vec<Complex64> = affected
            .iter()
            .map(|x| Complex64::new(x.re as f64, x.im as f64))
            .collect();
        affected_fft.resize(fft_len, Complex64::new(0.0, 0.0));
        planner.plan_fft_forward(fft_len).process(&mut affected_fft);

        Correlator {
            affected_fft,
            affected_len: affected.len(),
            fft_len,
            planner,
        }
    }

    /// Correlation of the affected stream against `template` at lags
    /// `0..affected_len`, divided by the template energy.
    fn correlate(&mut self, template: &[Complex]) -> Vec<Complex64> {
        let energy: f64 = template.iter().map(|x| x.norm_sqr() as f64).sum();

        let mut spectrum: Vec<Complex64> = template
            .iter()
            .map(|x| Complex64::new(x.re as f64, x.im as f64))
            .collect();
        spectrum.resize(self.fft_len, Complex64::new(0.0, 0.0));
        self.planner
            .plan_fft_forward(self.fft_len)
            .process(&mut spectrum);

        for (s, a) in spectrum.iter_mut().zip(self.affected_fft.iter()) {
            *s = a * s.conj();
        }
        self.planner
            .plan_fft_inverse(self.fft_len)
            .process(&mut spectrum);

        let scale = 1.0 / (self.fft_len as f64 * energy.max(f64::MIN_POSITIVE));
        spectrum
            .into_iter()
            .take(self.affected_len)
            .map(|c| c * scale)
            .collect()
    }
}

fn search_grid(
    correlator: &mut Correlator,
    interference: &[Complex],
    fs: f64,
    grid: &[f64],
) -> InterferenceParameters {
    let mut best = InterferenceParameters {
        frequency: 0.0,
        amplitude: f64::NEG_INFINITY,
        phase: 0.0,
        sample_shift: 0,
    };

    for &freq in grid {
        let rotated = multiply_by_complex_exponential(interference, fs, freq, 0.0, 1.0);
        let corr = correlator.correlate(&rotated);

        let (idx, value) = corr
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.norm_sqr().total_cmp(&b.norm_sqr()))
            .map(|(i, &c)| (i, c))
            .unwrap_or((0, Complex64::new(0.0, 0.0)));

        let amplitude = value.norm();
        if amplitude > best.amplitude {
            best = InterferenceParameters {
                frequency: freq,
                amplitude,
                phase: value.arg(),
                sample_shift: idx,
            };
        }
    }

    best
}

/// Estimate the frequency, amplitude, phase and sample shift of an
/// interference template inside an affected capture.
///
/// Coarse search over `freq_offsets`, optionally refined by a fine grid of
/// half-width `fine.window` at steps of `fine.step` around the winner.
pub fn find_interference_parameters(
    affected: &[Complex],
    interference: &[Complex],
    freq_offsets: &[f64],
    fs: f64,
    fine: Option<FineSearch>,
) -> InterferenceParameters {
    let mut correlator = Correlator::new(affected, interference.len());
    let coarse = search_grid(&mut correlator, interference, fs, freq_offsets);

    match fine {
        None => coarse,
        Some(FineSearch { step, window }) => {
            let grid = frequency_grid(coarse.frequency - window, coarse.frequency + window, step);
            search_grid(&mut correlator, interference, fs, &grid)
        }
    }
}

/// Subtract a parameterised interference from the affected stream.
pub fn subtract_interference(
    affected: &[Complex],
    interference: &[Complex],
    fs: f64,
    params: InterferenceParameters,
) -> PhyResult<Vec<Complex>> {
    let ready = multiply_by_complex_exponential(
        interference,
        fs,
        params.frequency,
        params.phase,
        params.amplitude,
    );
    let padded = pad_interference(affected.len(), &ready, params.sample_shift)?;
    Ok(affected
        .iter()
        .zip(padded.iter())
        .map(|(a, i)| a - i)
        .collect())
}

/// Estimate parameters and subtract in one call, returning the residual and
/// the estimate that produced it.
pub fn subtract_interference_auto(
    affected: &[Complex],
    interference: &[Complex],
    fs: f64,
    freq_offsets: &[f64],
    fine: Option<FineSearch>,
) -> PhyResult<(Vec<Complex>, InterferenceParameters)> {
    let params = find_interference_parameters(affected, interference, freq_offsets, fs, fine);
    let residual = subtract_interference(affected, interference, fs, params)?;
    Ok((residual, params))
}
