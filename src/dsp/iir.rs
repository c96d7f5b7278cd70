//! # Single-Pole IIR Filter
//!
//! `y[n] = alpha * x[n] + (1 - alpha) * y[n-1]`, the classic leaky
//! integrator. With a very small `alpha` it tracks the DC component of the
//! discriminator output so residual carrier offset can be subtracted.

use crate::Float;

/// Apply a single-pole IIR low-pass to a real stream (zero initial state).
///
/// The accumulator runs in f64: with the tiny alphas used for DC tracking,
/// single-precision updates stall before convergence.
pub fn single_pole_iir(input: &[Float], alpha: Float) -> Vec<Float> {
    let mut out = Vec::with_capacity(input.len());
    let mut y = 0.0f64;
    let alpha = alpha as f64;
    let one_minus = 1.0 - alpha;
    for &x in input {
        y = alpha * x as f64 + one_minus * y;
        out.push(y as Float);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_converges_to_dc() {
        let input = vec![1.0; 50_000];
        let out = single_pole_iir(&input, 1e-3);
        assert!((out.last().unwrap() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_dc_tracker_attenuation() {
        // Subtracting the tracker output removes a constant offset by at
        // least 20 dB over a one-second window at the pipeline alpha.
        let fs = 1_000_000usize;
        let offset = 0.5 as Float;
        let input = vec![offset; fs];
        let tracked = single_pole_iir(&input, 160e-6);

        let residual_mean: f64 = input
            .iter()
            .zip(tracked.iter())
            .map(|(&x, &t)| (x - t) as f64)
            .sum::<f64>()
            / fs as f64;

        let attenuation_db = 20.0 * (offset as f64 / residual_mean.abs()).log10();
        assert!(attenuation_db >= 20.0, "got {attenuation_db:.1} dB");
    }

    #[test]
    fn test_alpha_one_is_identity() {
        let input = [0.3, -0.7, 1.2];
        assert_eq!(single_pole_iir(&input, 1.0), input.to_vec());
    }
}
