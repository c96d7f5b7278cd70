//! # Simulation Result Archive
//!
//! Persists a Monte-Carlo sweep (axes, PDR tensor and the full
//! configuration) as JSON. Archive names encode the participants:
//! `BLE1Mbps-30B_802154-200B_10Msps_500trials.json`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::PhyResult;
use crate::logging::log_info;
use crate::protocol::Protocol;
use crate::sim::{PdrTensor, SimulationConfig};

/// A completed sweep, ready to persist.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationArchive {
    pub high_power_db: f64,
    pub low_powers_db: Vec<f64>,
    pub snr_lows_db: Vec<f64>,
    pub num_trials: usize,
    /// `[signal][power][snr]`, signal 0 = high, 1 = low.
    pub pdr: PdrTensor,
    pub cfg: SimulationConfig,
}

/// Protocol tag for the archive name: BLE carries its rate, e.g.
/// `BLE1Mbps-200B`; anything else is `802154-30B`.
fn proto_payload_tag(protocol: Protocol, payload_len: usize, ble_rate: f64) -> String {
    match protocol {
        Protocol::Ble => {
            let mbps = (ble_rate / 1e6) as u64;
            format!("BLE{mbps}Mbps-{payload_len}B")
        }
        Protocol::Ieee802154 => format!("802154-{payload_len}B"),
    }
}

/// Build the archive file name for a configuration.
pub fn make_filename(cfg: &SimulationConfig, num_trials: usize) -> String {
    let entries = [
        proto_payload_tag(cfg.protocol_high, cfg.payload_len_high, cfg.ble_rate),
        proto_payload_tag(cfg.protocol_low, cfg.payload_len_low, cfg.ble_rate),
        format!("{}Msps", (cfg.sampling_rate / 1e6) as u64),
        format!("{num_trials}trials"),
    ];
    format!("{}.json", entries.join("_"))
}

/// Save an archive under `folder` (created if missing); returns the path.
pub fn save_archive(archive: &SimulationArchive, folder: &Path) -> PhyResult<PathBuf> {
    fs::create_dir_all(folder)?;
    let path = folder.join(make_filename(&archive.cfg, archive.num_trials));
    fs::write(&path, serde_json::to_vec_pretty(archive)?)?;
    log_info(&format!("Saved simulation to {}", path.display()));
    Ok(path)
}

/// Load an archive back from disk.
pub fn load_archive(path: &Path) -> PhyResult<SimulationArchive> {
    let data = fs::read(path)?;
    Ok(serde_json::from_slice(&data)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_format() {
        let cfg = SimulationConfig {
            protocol_high: Protocol::Ieee802154,
            protocol_low: Protocol::Ble,
            payload_len_high: 30,
            payload_len_low: 200,
            ble_rate: 1e6,
            sampling_rate: 10e6,
            ..Default::default()
        };
        assert_eq!(
            make_filename(&cfg, 20),
            "802154-30B_BLE1Mbps-200B_10Msps_20trials.json"
        );
    }

    #[test]
    fn test_filename_ble_rate_tag() {
        let cfg = SimulationConfig {
            protocol_high: Protocol::Ble,
            ble_rate: 2e6,
            payload_len_high: 12,
            ..Default::default()
        };
        assert!(make_filename(&cfg, 5).starts_with("BLE2Mbps-12B_"));
    }
}
