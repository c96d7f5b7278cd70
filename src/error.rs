//! # PHY Error Handling
//!
//! This module defines the PhyError enum, which represents the different error
//! types that can occur in the sicphy crate.
//!
//! Decode misses and CRC failures are deliberately *not* errors: a missed
//! preamble returns an empty packet list and a CRC mismatch is reported inside
//! [`crate::protocol::DecodedPacket`]. Errors here are reserved for conditions
//! that make the requested operation meaningless.

use thiserror::Error;

/// Represents the different error types that can occur in the PHY crate.
#[derive(Debug, Error)]
pub enum PhyError {
    /// Indicates an unsupported BLE transmission rate (only 1 Mb/s and 2 Mb/s exist).
    #[error("Invalid BLE transmission rate: {0} (must be 1e6 or 2e6)")]
    InvalidBleRate(f64),

    /// Indicates a sampling rate that is not an integer multiple of the
    /// transmission (or chip) rate.
    #[error("Sampling rate {fs} is not an integer multiple of rate {rate}")]
    NonIntegerSps { fs: f64, rate: f64 },

    /// Indicates an unknown protocol name was supplied.
    #[error("Unknown protocol: {0}")]
    UnknownProtocol(String),

    /// Indicates a bit array whose length is not a multiple of 8.
    #[error("Bit array length {0} is not a multiple of 8")]
    BitCountNotByteAligned(usize),

    /// Indicates an access code string containing characters other than 0/1/_.
    #[error("Invalid access code character {0:?}")]
    InvalidAccessCode(char),

    /// Indicates a chip window of the wrong width.
    #[error("Chip window length {0} is not 32")]
    BadChipWindow(usize),

    /// Indicates an IQ blob whose byte length is not a multiple of 8
    /// (interleaved f32 pairs).
    #[error("IQ file length {0} is not a multiple of 8 bytes")]
    CorruptIqBlob(u64),

    /// Indicates an invalid ADC configuration.
    #[error("Invalid ADC configuration: {0} bits")]
    InvalidAdcBits(u32),

    /// Indicates an interference alignment shift outside the affected stream.
    #[error("Sample shift {shift} out of range for stream of {len} samples")]
    ShiftOutOfRange { shift: usize, len: usize },

    /// Indicates an invalid simulation sweep (empty axis or zero trials).
    #[error("Invalid simulation sweep: {0}")]
    InvalidSweep(String),

    /// Indicates an I/O failure while reading or writing an IQ blob or archive.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Indicates a failure serializing or deserializing the result archive.
    #[error("Archive serialization error: {0}")]
    Archive(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type PhyResult<T> = Result<T, PhyError>;
