//! # BLE PHY
//!
//! Bluetooth Low Energy physical layer at 1 Mb/s or 2 Mb/s: GFSK modulation
//! with BT = 0.5 Gaussian shaping, packet framing with CRC-24 and data
//! whitening, and the matching receiver chain.

pub mod packet;
pub mod rx;
pub mod tx;
pub mod whitening;

pub use packet::{build_phy_packet, generate_access_code};
pub use rx::ReceiverBle;
pub use tx::TransmitterBle;
pub use whitening::whiten;

use crate::error::{PhyError, PhyResult};

/// The two BLE PHY rates, in bits per second.
pub const VALID_RATES: [f64; 2] = [1e6, 2e6];

/// Validate a BLE rate / sample rate pair, returning samples per symbol.
pub(crate) fn validate_rates(fs: f64, transmission_rate: f64) -> PhyResult<usize> {
    if !VALID_RATES.contains(&transmission_rate) {
        return Err(PhyError::InvalidBleRate(transmission_rate));
    }
    let sps = fs / transmission_rate;
    if sps < 1.0 || sps.fract() != 0.0 {
        return Err(PhyError::NonIntegerSps {
            fs,
            rate: transmission_rate,
        });
    }
    Ok(sps as usize)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_rates() {
        assert_eq!(validate_rates(8e6, 1e6).unwrap(), 8);
        assert_eq!(validate_rates(10e6, 2e6).unwrap(), 5);
        assert!(matches!(
            validate_rates(8e6, 3e6),
            Err(PhyError::InvalidBleRate(_))
        ));
        assert!(matches!(
            validate_rates(2.5e6, 1e6),
            Err(PhyError::NonIntegerSps { .. })
        ));
    }
}
