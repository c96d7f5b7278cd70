//! # sicphy - 2.4 GHz PHY Processing with Successive Interference Cancellation
//!
//! The sicphy crate implements two software-defined 2.4 GHz physical layers
//! over complex baseband IQ streams: Bluetooth Low Energy (GFSK at 1 or
//! 2 Mb/s) and IEEE 802.15.4 (O-QPSK DSSS at 2 Mchip/s). It modulates
//! payloads to IQ, demodulates IQ captures back to verified packets, and
//! cancels co-channel collisions: decode the stronger packet, re-synthesise
//! its waveform, subtract it, decode the weaker one.
//!
//! ## Features
//!
//! - GFSK and O-QPSK half-sine modulators producing unit-amplitude baseband IQ
//! - Receivers with selectable discriminators (instantaneous frequency or
//!   band-pass) and closed-loop symbol-timing recovery with pluggable
//!   timing-error detectors
//! - BLE packet framing with CRC-24 and whitening; 802.15.4 framing with
//!   CRC-16 and 32-chip DSSS spreading
//! - Interference parameter search (frequency, phase, amplitude, sample
//!   shift) by FFT correlation and subtract-and-decode SIC pipeline
//! - Monte-Carlo simulator sweeping power difference against SNR with
//!   parallel, reproducible trials and a JSON result archive
//! - Raw complex64 IQ blob I/O
//!
//! ## Usage
//!
//! ```rust
//! use sicphy::ble::{ReceiverBle, TransmitterBle};
//! use sicphy::protocol::{PhyReceiver, PhyTransmitter};
//!
//! let fs = 8e6;
//! let tx = TransmitterBle::new(fs, 1e6).unwrap();
//! let rx = ReceiverBle::new(fs, 1e6).unwrap();
//!
//! let iq = tx.modulate_from_payload(&[0x01, 0x02, 0x03], 200);
//! let packets = rx.demodulate_to_packet(&iq);
//! assert_eq!(packets[0].payload, vec![0x01, 0x02, 0x03]);
//! assert_eq!(packets[0].crc_ok, Some(true));
//! ```

pub mod ble;
pub mod constants;
pub mod dsp;
pub mod error;
pub mod ieee802154;
pub mod io;
pub mod logging;
pub mod protocol;
pub mod sic;
pub mod sim;
pub mod sync;
pub mod util;

/// Sample scalar used across the pipeline.
pub type Float = f32;

/// Complex baseband sample.
pub type Complex = num_complex::Complex<Float>;

pub use crate::error::{PhyError, PhyResult};
pub use crate::logging::{init_logger, log_info};

// Core PHY types
pub use ble::{ReceiverBle, TransmitterBle};
pub use ieee802154::{Receiver802154, Transmitter802154};
pub use protocol::{
    AnyReceiver, AnyTransmitter, DecodedPacket, DemodMethod, PhyReceiver, PhyTransmitter,
    Protocol,
};

// Interference cancellation and simulation
pub use sic::{cancel_and_decode, SicConfig, SicOutcome};
pub use sim::{SimulationArchive, SimulationConfig, SimulatorSic};

// IQ capture I/O
pub use io::{read_iq_file, write_iq_file};
