//! # Protocol-Neutral Interfaces
//!
//! The two modems expose the same three-step receive surface (soft
//! demodulation, packet framing, and the composition of both) and a
//! one-step transmit surface. The simulator and the SIC engine select the
//! concrete pair at construction through the [`AnyReceiver`] /
//! [`AnyTransmitter`] tagged unions — no runtime reflection, the set of
//! protocols is closed.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ble::{ReceiverBle, TransmitterBle};
use crate::error::{PhyError, PhyResult};
use crate::ieee802154::{Receiver802154, Transmitter802154};
use crate::Complex;

/// Supported PHY protocols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Protocol {
    Ble,
    Ieee802154,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Ble => write!(f, "BLE"),
            Protocol::Ieee802154 => write!(f, "802154"),
        }
    }
}

impl FromStr for Protocol {
    type Err = PhyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ble" => Ok(Protocol::Ble),
            "802154" | "ieee802154" | "zigbee" => Ok(Protocol::Ieee802154),
            other => Err(PhyError::UnknownProtocol(other.to_string())),
        }
    }
}

/// Soft-decision front end selection for the receivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DemodMethod {
    /// Quadrature discriminator with DC tracking.
    InstantaneousFrequency,
    /// Upper/lower band-pass power difference; no phase unwrapping.
    BandPass,
}

/// One decoded packet, produced at a correlator-match position.
///
/// CRC failure is data, not an error: `crc_ok` is `Some(false)` for a
/// structurally decoded packet whose CRC mismatched, and `None` when the
/// packet format carried no CRC (802.15.4 with `crc_included = false`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedPacket {
    /// Payload bytes (CRC stripped).
    pub payload: Vec<u8>,
    /// Payload length in bytes.
    pub length: u8,
    /// CRC verdict, if the format carries one.
    pub crc_ok: Option<bool>,
    /// Offset into the decision stream where the payload starts.
    pub position: u64,
}

impl DecodedPacket {
    /// True when the packet decoded and its CRC verified.
    pub fn delivered(&self) -> bool {
        self.crc_ok == Some(true)
    }
}

/// Receive surface shared by both protocols.
pub trait PhyReceiver {
    /// IQ samples to hard decisions (bits for BLE, chips for 802.15.4).
    fn demodulate(&self, iq_samples: &[Complex]) -> Vec<u8>;

    /// Hard decisions to decoded packets.
    fn process_phy_packet(&self, decisions: &[u8]) -> Vec<DecodedPacket>;

    /// IQ samples straight to decoded packets.
    fn demodulate_to_packet(&self, iq_samples: &[Complex]) -> Vec<DecodedPacket> {
        let decisions = self.demodulate(iq_samples);
        self.process_phy_packet(&decisions)
    }
}

/// Transmit surface shared by both protocols.
pub trait PhyTransmitter {
    /// Frame a payload and modulate it to unit-amplitude baseband IQ,
    /// with `zero_padding` zero samples on both ends.
    fn modulate_from_payload(&self, payload: &[u8], zero_padding: usize) -> Vec<Complex>;
}

/// Tagged union over the two receivers.
pub enum AnyReceiver {
    Ble(ReceiverBle),
    Ieee802154(Receiver802154),
}

impl AnyReceiver {
    /// Construct the receiver for `protocol` at sample rate `fs`.
    /// `ble_rate` is only consulted for BLE.
    pub fn new(protocol: Protocol, fs: f64, ble_rate: f64) -> PhyResult<Self> {
        match protocol {
            Protocol::Ble => Ok(AnyReceiver::Ble(ReceiverBle::new(fs, ble_rate)?)),
            Protocol::Ieee802154 => Ok(AnyReceiver::Ieee802154(Receiver802154::new(fs)?)),
        }
    }
}

impl PhyReceiver for AnyReceiver {
    fn demodulate(&self, iq_samples: &[Complex]) -> Vec<u8> {
        match self {
            AnyReceiver::Ble(rx) => rx.demodulate(iq_samples),
            AnyReceiver::Ieee802154(rx) => rx.demodulate(iq_samples),
        }
    }

    fn process_phy_packet(&self, decisions: &[u8]) -> Vec<DecodedPacket> {
        match self {
            AnyReceiver::Ble(rx) => rx.process_phy_packet(decisions),
            AnyReceiver::Ieee802154(rx) => rx.process_phy_packet(decisions),
        }
    }
}

/// Tagged union over the two transmitters.
pub enum AnyTransmitter {
    Ble(TransmitterBle),
    Ieee802154(Transmitter802154),
}

impl AnyTransmitter {
    /// Construct the transmitter for `protocol` at sample rate `fs`.
    pub fn new(protocol: Protocol, fs: f64, ble_rate: f64) -> PhyResult<Self> {
        match protocol {
            Protocol::Ble => Ok(AnyTransmitter::Ble(TransmitterBle::new(fs, ble_rate)?)),
            Protocol::Ieee802154 => {
                Ok(AnyTransmitter::Ieee802154(Transmitter802154::new(fs)?))
            }
        }
    }
}

impl PhyTransmitter for AnyTransmitter {
    fn modulate_from_payload(&self, payload: &[u8], zero_padding: usize) -> Vec<Complex> {
        match self {
            AnyTransmitter::Ble(tx) => tx.modulate_from_payload(payload, zero_padding),
            AnyTransmitter::Ieee802154(tx) => tx.modulate_from_payload(payload, zero_padding),
        }
    }
}
