//! # Noise Generation and Signal Power
//!
//! Additive white Gaussian noise in three flavours: fixed total power, power
//! chosen so a requested SNR holds over the signal-present interval, and
//! power chosen so the SNR holds within a bandwidth around DC (Parseval over
//! the FFT bins). Complex signals receive half the noise power in each of I
//! and Q.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use rustfft::FftPlanner;

use crate::{Complex, Float};

/// Mean power of a stream over `interval` (exclusive end), linear scale.
pub fn signal_power(signal: &[Complex], interval: Option<(usize, usize)>) -> f64 {
    let (start, end) = interval.unwrap_or((0, signal.len()));
    let end = end.min(signal.len());
    if start >= end {
        return 0.0;
    }
    let sum: f64 = signal[start..end]
        .iter()
        .map(|x| x.norm_sqr() as f64)
        .sum();
    sum / (end - start) as f64
}

/// Mean power of a stream over `interval`, in dB.
pub fn signal_power_db(signal: &[Complex], interval: Option<(usize, usize)>) -> f64 {
    10.0 * signal_power(signal, interval).log10()
}

/// Add white Gaussian noise with the given total power to a complex signal.
///
/// `noise_power` is linear unless `power_in_db`. I and Q each carry half the
/// requested power.
pub fn add_white_gaussian_noise<R: Rng>(
    signal: &[Complex],
    noise_power: f64,
    power_in_db: bool,
    rng: &mut R,
) -> Vec<Complex> {
    let power = if power_in_db {
        10f64.powf(noise_power / 10.0)
    } else {
        noise_power
    };
    let scale = power.sqrt();
    // Half the power in I and Q components respectively
    let normal = Normal::new(0.0f64, std::f64::consts::FRAC_1_SQRT_2).unwrap();

    signal
        .iter()
        .map(|&x| {
            let re = scale * normal.sample(rng);
            let im = scale * normal.sample(rng);
            x + Complex::new(re as Float, im as Float)
        })
        .collect()
}

/// Add real white Gaussian noise of the given power (variance) to a real signal.
pub fn add_white_gaussian_noise_real<R: Rng>(
    signal: &[Float],
    noise_power: f64,
    power_in_db: bool,
    rng: &mut R,
) -> Vec<Float> {
    let power = if power_in_db {
        10f64.powf(noise_power / 10.0)
    } else {
        noise_power
    };
    let normal = Normal::new(0.0f64, 1.0).unwrap();
    let scale = power.sqrt();

    signal
        .iter()
        .map(|&x| x + (scale * normal.sample(rng)) as Float)
        .collect()
}

/// Add white Gaussian noise scaled so the SNR holds relative to the signal
/// power measured over `interval` (the signal-present stretch of the stream).
pub fn add_awgn_signal_present<R: Rng>(
    signal: &[Complex],
    snr_db: f64,
    interval: Option<(usize, usize)>,
    rng: &mut R,
) -> Vec<Complex> {
    let signal_power_db = signal_power_db(signal, interval);
    let noise_power_db = signal_power_db - snr_db;
    add_white_gaussian_noise(signal, noise_power_db, true, rng)
}

/// Add white Gaussian noise such that the SNR within a bandwidth `bw`
/// centred at zero matches `snr_db`.
///
/// The in-band signal power comes from Parseval over the FFT bins inside
/// ±bw/2; the noise is still generated over the whole sampled bandwidth, so
/// its total power is scaled by `fs / bw`.
pub fn add_awgn_band_limited<R: Rng>(
    signal: &[Complex],
    snr_db: f64,
    fs: f64,
    bw: f64,
    rng: &mut R,
) -> Vec<Complex> {
    let n = signal.len();
    if n == 0 {
        return Vec::new();
    }

    let mut spectrum: Vec<Complex> = signal.to_vec();
    let mut planner = FftPlanner::<Float>::new();
    planner.plan_fft_forward(n).process(&mut spectrum);

    // Bins with |freq| <= bw/2; bin i maps to min(i, n-i) * fs / n.
    let band_power: f64 = spectrum
        .iter()
        .enumerate()
        .filter(|(i, _)| {
            let k = (*i).min(n - *i) as f64;
            k * fs / n as f64 <= bw / 2.0
        })
        .map(|(_, x)| x.norm_sqr() as f64)
        .sum::<f64>()
        / (n as f64 * n as f64);

    let snr_linear = 10f64.powf(snr_db / 10.0);
    let noise_power = (band_power / snr_linear) * (fs / bw);

    add_white_gaussian_noise(signal, noise_power, false, rng)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_signal_power_unit_tone() {
        let signal = vec![Complex::new(1.0, 0.0); 1000];
        assert!((signal_power(&signal, None) - 1.0).abs() < 1e-9);
        assert!(signal_power_db(&signal, None).abs() < 1e-9);
    }

    #[test]
    fn test_signal_power_interval() {
        let mut signal = vec![Complex::new(0.0, 0.0); 100];
        for x in signal[40..60].iter_mut() {
            *x = Complex::new(2.0, 0.0);
        }
        assert!((signal_power(&signal, Some((40, 60))) - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_awgn_measured_power() {
        let mut rng = StdRng::seed_from_u64(7);
        let zeros = vec![Complex::new(0.0, 0.0); 50_000];
        let noisy = add_white_gaussian_noise(&zeros, 0.25, false, &mut rng);
        let measured = signal_power(&noisy, None);
        assert!((measured - 0.25).abs() < 0.01, "measured {measured}");
    }

    #[test]
    fn test_awgn_db_power() {
        let mut rng = StdRng::seed_from_u64(8);
        let zeros = vec![Complex::new(0.0, 0.0); 50_000];
        let noisy = add_white_gaussian_noise(&zeros, -10.0, true, &mut rng);
        let measured = signal_power(&noisy, None);
        assert!((measured - 0.1).abs() < 0.01, "measured {measured}");
    }

    #[test]
    fn test_awgn_signal_present_snr() {
        let mut rng = StdRng::seed_from_u64(9);
        let mut signal = vec![Complex::new(0.0, 0.0); 40_000];
        for x in signal[10_000..30_000].iter_mut() {
            *x = Complex::new(1.0, 0.0);
        }
        let noisy = add_awgn_signal_present(&signal, 10.0, Some((10_000, 30_000)), &mut rng);
        // Noise power should be ~0.1 (10 dB below the unit burst).
        let noise_only: Vec<Complex> = noisy[..10_000].to_vec();
        let measured = signal_power(&noise_only, None);
        assert!((measured - 0.1).abs() < 0.02, "measured {measured}");
    }

    #[test]
    fn test_real_noise_variance() {
        let mut rng = StdRng::seed_from_u64(10);
        let zeros = vec![0.0 as Float; 50_000];
        let noisy = add_white_gaussian_noise_real(&zeros, 0.5, false, &mut rng);
        let var: f64 =
            noisy.iter().map(|&x| (x as f64) * (x as f64)).sum::<f64>() / noisy.len() as f64;
        assert!((var - 0.5).abs() < 0.02, "variance {var}");
    }

    #[test]
    fn test_band_limited_full_band_matches_plain_snr() {
        // With bw == fs the band-limited variant reduces to the plain
        // signal-power / snr relation.
        let mut rng = StdRng::seed_from_u64(11);
        let signal = vec![Complex::new(1.0, 0.0); 8192];
        let noisy = add_awgn_band_limited(&signal, 20.0, 1e6, 1e6, &mut rng);
        let noise: Vec<Complex> = noisy
            .iter()
            .zip(signal.iter())
            .map(|(n, s)| n - s)
            .collect();
        let measured = signal_power(&noise, None);
        assert!((measured - 0.01).abs() < 0.005, "measured {measured}");
    }
}
