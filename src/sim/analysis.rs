//! # Link Analysis Helpers
//!
//! Single-signal delivery analysis: the theoretical GFSK PDR curve, an SNR
//! estimate from the correlation of clean and noisy captures, and a
//! PDR-vs-SNR sweep that categorises every miss as preamble loss or CRC
//! failure.

use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use crate::dsp::noise::add_awgn_signal_present;
use crate::protocol::PhyReceiver;
use crate::Complex;

/// Gaussian tail probability Q(x), via the Abramowitz–Stegun erfc
/// approximation (max error ~1.5e-7, plenty for link curves).
pub fn qfunc(x: f64) -> f64 {
    let z = x / std::f64::consts::SQRT_2;
    let t = 1.0 / (1.0 + 0.3275911 * z.abs());
    let poly = t
        * (0.254829592
            + t * (-0.284496736 + t * (1.421413741 + t * (-1.453152027 + t * 1.061405429))));
    let erfc = poly * (-z * z).exp();
    if z >= 0.0 {
        0.5 * erfc
    } else {
        1.0 - 0.5 * erfc
    }
}

/// Theoretical BLE PDR for a PDU of `pdu_bytes` at the given SNR, assuming
/// coherent binary FSK over the occupied bandwidth.
pub fn theoretical_pdr(snr_db: f64, pdu_bytes: usize) -> f64 {
    let crc_bytes = 3.0;
    let preamble_bytes = 8.0;
    let n_bits = (pdu_bytes as f64 + crc_bytes + preamble_bytes) * 8.0;

    let snr = 10f64.powf(snr_db / 10.0);
    let eb_n0 = 1.5 * snr; // B = 1.5 * Rb
    let p_bit = qfunc((2.0 * eb_n0).sqrt());
    (1.0 - p_bit).powf(n_bits)
}

/// Estimate the SNR of `noisy` against the clean `signal` from their
/// Pearson correlation coefficient, in dB.
pub fn snr_from_pearson(signal: &[Complex], noisy: &[Complex]) -> f64 {
    let n = signal.len().min(noisy.len());
    let mean = |s: &[Complex]| -> (f64, f64) {
        let re: f64 = s[..n].iter().map(|x| x.re as f64).sum();
        let im: f64 = s[..n].iter().map(|x| x.im as f64).sum();
        (re / n as f64, im / n as f64)
    };
    let (mx_re, mx_im) = mean(signal);
    let (my_re, my_im) = mean(noisy);

    let mut cross_re = 0.0f64;
    let mut cross_im = 0.0f64;
    let mut var_x = 0.0f64;
    let mut var_y = 0.0f64;
    for (x, y) in signal[..n].iter().zip(noisy[..n].iter()) {
        let xr = x.re as f64 - mx_re;
        let xi = x.im as f64 - mx_im;
        let yr = y.re as f64 - my_re;
        let yi = y.im as f64 - my_im;
        // x * conj(y)
        cross_re += xr * yr + xi * yi;
        cross_im += xi * yr - xr * yi;
        var_x += xr * xr + xi * xi;
        var_y += yr * yr + yi * yi;
    }

    let pearson = (cross_re * cross_re + cross_im * cross_im).sqrt() / (var_x * var_y).sqrt();
    let pearson = pearson.min(1.0 - 1e-12);
    let snr = pearson * pearson / (1.0 - pearson * pearson);
    10.0 * snr.log10()
}

/// One point of a PDR-vs-SNR sweep.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PdrPoint {
    pub snr_db: f64,
    pub pdr_ratio: f64,
    pub preamble_loss_ratio: f64,
    pub crc_failure_ratio: f64,
}

/// PDR against SNR for one clean capture: every realisation adds fresh
/// noise scaled to the signal-present interval, demodulates, and lands in
/// exactly one of delivered / CRC-failure / preamble-loss.
///
/// Realisations are independent and spread over worker threads.
pub fn pdr_vs_snr<R: PhyReceiver + Sync>(
    iq_samples: &[Complex],
    snr_range: &[f64],
    sample_interval: Option<(usize, usize)>,
    receiver: &R,
    noise_realisations: usize,
    seed: u64,
) -> Vec<PdrPoint> {
    snr_range
        .iter()
        .map(|&snr_db| {
            let delivered = AtomicU32::new(0);
            let crc_failures = AtomicU32::new(0);
            let next = AtomicUsize::new(0);

            let workers = std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
                .min(noise_realisations.max(1));

            std::thread::scope(|scope| {
                for _ in 0..workers {
                    scope.spawn(|| loop {
                        let trial = next.fetch_add(1, Ordering::Relaxed);
                        if trial >= noise_realisations {
                            break;
                        }
                        let mut rng = StdRng::seed_from_u64(
                            seed ^ (snr_db.to_bits()) ^ (trial as u64) << 20,
                        );
                        let noisy =
                            add_awgn_signal_present(iq_samples, snr_db, sample_interval, &mut rng);
                        let packets = receiver.demodulate_to_packet(&noisy);
                        match packets.first() {
                            Some(p) if p.crc_ok == Some(true) => {
                                delivered.fetch_add(1, Ordering::Relaxed);
                            }
                            Some(_) => {
                                crc_failures.fetch_add(1, Ordering::Relaxed);
                            }
                            None => {} // preamble loss
                        }
                    });
                }
            });

            let n = noise_realisations.max(1) as f64;
            let pdr_ratio = delivered.load(Ordering::Relaxed) as f64 / n;
            let crc_failure_ratio = crc_failures.load(Ordering::Relaxed) as f64 / n;
            PdrPoint {
                snr_db,
                pdr_ratio,
                preamble_loss_ratio: 1.0 - pdr_ratio - crc_failure_ratio,
                crc_failure_ratio,
            }
        })
        .collect()
}
