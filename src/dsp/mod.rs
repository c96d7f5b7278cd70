//! # DSP Primitives
//!
//! Filtering, discriminators, noise and quantisation building blocks shared
//! by the BLE and IEEE 802.15.4 pipelines. Everything here is a pure
//! function over its input buffer except [`fir::Fir`], which carries filter
//! history for streaming operation.

pub mod adc;
pub mod delay;
pub mod fir;
pub mod freq;
pub mod iir;
pub mod noise;

pub use adc::adc_quantise;
pub use delay::fractional_delay;
pub use fir::{
    ble_pulse_taps, convolve_cc, convolve_cf, convolve_ff, decimating_fir_filter,
    gaussian_fir_taps, half_sine_fir_taps, low_pass_taps, ConvMode, Fir, Window,
};
pub use freq::{band_pass_soft, binary_slicer, quadrature_demod, simple_squelch, squelch_db};
pub use iir::single_pole_iir;
pub use noise::{
    add_awgn_band_limited, add_awgn_signal_present, add_white_gaussian_noise, signal_power,
    signal_power_db,
};
