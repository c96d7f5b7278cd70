//! # ADC Model
//!
//! Symmetric linear quantiser used by the simulator: `2^bits - 1` levels
//! (odd, so zero is a level) clipped to ±vmax.

use crate::error::{PhyError, PhyResult};
use crate::{Complex, Float};

/// Quantise a complex stream with a symmetric linear ADC.
///
/// # Arguments
///
/// * `iq` - Input stream
/// * `vmax` - Full-scale input amplitude; inputs are clipped to ±vmax
/// * `bits` - ADC resolution (2..=32)
pub fn adc_quantise(iq: &[Complex], vmax: Float, bits: u32) -> PhyResult<Vec<Complex>> {
    if !(2..=32).contains(&bits) {
        return Err(PhyError::InvalidAdcBits(bits));
    }
    let levels = (1u64 << bits) - 1; // Odd number of levels
    let level_size = 2.0 * vmax / (levels - 1) as Float;

    let q = |v: Float| -> Float { level_size * (v.clamp(-vmax, vmax) / level_size).round() };

    Ok(iq.iter().map(|x| Complex::new(q(x.re), q(x.im))).collect())
}
