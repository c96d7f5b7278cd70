use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

use sicphy::logging::{init_logger, log_info};
use sicphy::protocol::{
    AnyReceiver, AnyTransmitter, DecodedPacket, DemodMethod, PhyReceiver, Protocol,
};
use sicphy::sic::{cancel_and_decode, frequency_grid, SicConfig};
use sicphy::sim::{save_archive, SimulationArchive, SimulationConfig, SimulatorSic};
use sicphy::{read_iq_file, Receiver802154, ReceiverBle};

#[derive(Parser)]
#[command(name = "sicphy")]
#[command(about = "2.4 GHz PHY toolkit: BLE / IEEE 802.15.4 receive, SIC and simulation")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn parse_hex_u32(s: &str) -> Result<u32, String> {
    let trimmed = s.trim_start_matches("0x").trim_start_matches("0X");
    u32::from_str_radix(trimmed, 16).map_err(|e| e.to_string())
}

#[derive(Subcommand)]
enum Commands {
    /// Decode BLE packets from a raw complex64 capture.
    ReceiveBle {
        #[arg(long)]
        file: PathBuf,
        /// Sample rate in Hz.
        #[arg(long)]
        fs: f64,
        /// BLE rate: 1e6 or 2e6.
        #[arg(long, default_value = "1e6")]
        rate: f64,
        /// Base address (hex).
        #[arg(long, value_parser = parse_hex_u32, default_value = "12345678")]
        base_address: u32,
        #[arg(long, default_value = "4")]
        preamble_threshold: u32,
        /// Use the band-pass discriminator instead of the quadrature one.
        #[arg(long)]
        band_pass: bool,
        /// Low-pass and decimate the capture before the receiver.
        #[arg(long, default_value = "1")]
        decimation: usize,
        /// Front-end low-pass cutoff in Hz (with --decimation > 1).
        #[arg(long, default_value = "1.5e6")]
        cutoff: f64,
        /// Front-end low-pass transition width in Hz.
        #[arg(long, default_value = "1e6")]
        transition: f64,
    },
    /// Decode IEEE 802.15.4 packets from a raw complex64 capture.
    Receive802154 {
        #[arg(long)]
        file: PathBuf,
        /// Sample rate in Hz.
        #[arg(long)]
        fs: f64,
        #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
        crc_included: bool,
        #[arg(long, default_value = "12")]
        preamble_threshold: u32,
        /// Low-pass and decimate the capture before the receiver.
        #[arg(long, default_value = "1")]
        decimation: usize,
        /// Front-end low-pass cutoff in Hz (with --decimation > 1).
        #[arg(long, default_value = "3e6")]
        cutoff: f64,
        /// Front-end low-pass transition width in Hz.
        #[arg(long, default_value = "1e6")]
        transition: f64,
    },
    /// Cancel the stronger packet out of a composite capture, then decode
    /// the weaker one.
    Sic {
        /// Protocol of the (weaker) affected signal.
        #[arg(long)]
        affected: Protocol,
        /// Protocol of the (stronger) interference signal.
        #[arg(long)]
        interference: Protocol,
        /// Sample rate in Hz.
        #[arg(long)]
        fs: f64,
        /// Composite capture file.
        #[arg(long)]
        file: PathBuf,
        #[arg(long, default_value = "1e6")]
        ble_rate: f64,
        #[arg(long, default_value = "0")]
        freq_min: f64,
        #[arg(long, default_value = "35000")]
        freq_max: f64,
        #[arg(long, default_value = "50")]
        freq_step: f64,
        #[arg(long)]
        fine_step: Option<f64>,
        #[arg(long)]
        fine_window: Option<f64>,
    },
    /// Monte-Carlo SIC sweep over power difference and SNR.
    SimulateSic {
        #[arg(long)]
        protocol_high: Protocol,
        #[arg(long)]
        protocol_low: Protocol,
        /// BLE data rate (1e6 or 2e6).
        #[arg(long, default_value = "1e6")]
        ble_rate: f64,
        /// Bytes in the high-power payload.
        #[arg(long, default_value = "30")]
        payload_len_high: usize,
        /// Bytes in the low-power payload.
        #[arg(long, default_value = "200")]
        payload_len_low: usize,
        /// Monte-Carlo trials per sweep cell.
        #[arg(long, default_value = "4")]
        num_trials: usize,
        #[arg(long, default_value = "10e6")]
        sampling_rate: f64,
        #[arg(long, default_value = "0")]
        seed: u64,
        #[arg(long, default_value = "./sic_simulations")]
        output_dir: PathBuf,
    },
}

/// Optional decimating low-pass front end for oversampled captures.
fn front_end(
    iq: Vec<sicphy::Complex>,
    fs: f64,
    decimation: usize,
    cutoff: f64,
    transition: f64,
) -> (Vec<sicphy::Complex>, f64) {
    if decimation <= 1 {
        return (iq, fs);
    }
    let filtered = sicphy::dsp::decimating_fir_filter(
        &iq,
        decimation,
        1.0,
        fs,
        cutoff,
        transition,
        sicphy::dsp::Window::Hamming,
    );
    (filtered, fs / decimation as f64)
}

fn print_packets(packets: &[DecodedPacket]) {
    if packets.is_empty() {
        println!("No packets detected");
        return;
    }
    for (i, packet) in packets.iter().enumerate() {
        let crc = match packet.crc_ok {
            Some(true) => "ok",
            Some(false) => "FAIL",
            None => "n/a",
        };
        println!(
            "packet {i}: len={} crc={} position={} payload={}",
            packet.length,
            crc,
            packet.position,
            hex::encode(&packet.payload)
        );
    }
}

fn main() -> anyhow::Result<()> {
    init_logger();
    let cli = Cli::parse();

    match cli.command {
        Commands::ReceiveBle {
            file,
            fs,
            rate,
            base_address,
            preamble_threshold,
            band_pass,
            decimation,
            cutoff,
            transition,
        } => {
            let iq = read_iq_file(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let (iq, fs) = front_end(iq, fs, decimation, cutoff, transition);
            let mut rx = ReceiverBle::new(fs, rate)?
                .with_base_address(base_address)
                .with_preamble_threshold(preamble_threshold);
            if band_pass {
                rx = rx.with_demodulation(DemodMethod::BandPass);
            }
            let packets = rx.demodulate_to_packet(&iq);
            print_packets(&packets);
        }

        Commands::Receive802154 {
            file,
            fs,
            crc_included,
            preamble_threshold,
            decimation,
            cutoff,
            transition,
        } => {
            let iq = read_iq_file(&file)
                .with_context(|| format!("reading {}", file.display()))?;
            let (iq, fs) = front_end(iq, fs, decimation, cutoff, transition);
            let mut rx =
                Receiver802154::new(fs)?.with_preamble_threshold(preamble_threshold);
            if !crc_included {
                rx = rx.without_crc();
            }
            let packets = rx.demodulate_to_packet(&iq);
            print_packets(&packets);
        }

        Commands::Sic {
            affected,
            interference,
            fs,
            file,
            ble_rate,
            freq_min,
            freq_max,
            freq_step,
            fine_step,
            fine_window,
        } => {
            anyhow::ensure!(
                affected != interference,
                "'interference' must be different from 'affected'"
            );
            let composite = read_iq_file(&file)
                .with_context(|| format!("reading {}", file.display()))?;

            let rx_high = AnyReceiver::new(interference, fs, ble_rate)?;
            let tx_high = AnyTransmitter::new(interference, fs, ble_rate)?;
            let rx_low = AnyReceiver::new(affected, fs, ble_rate)?;

            let mut config = SicConfig::new(frequency_grid(freq_min, freq_max, freq_step));
            if let (Some(step), Some(window)) = (fine_step, fine_window) {
                config = config.with_fine_search(step, window);
            }

            let outcome =
                cancel_and_decode(&composite, &rx_high, &tx_high, &rx_low, fs, &config);

            if let Some(p) = outcome.parameters {
                println!(
                    "interference estimate: {:.1} Hz, amplitude {:.3}, phase {:.3} rad, shift {}",
                    p.frequency, p.amplitude, p.phase, p.sample_shift
                );
            }
            println!("-- interference ({interference}) packets --");
            print_packets(&outcome.high_packets);
            println!("-- affected ({affected}) packets --");
            print_packets(&outcome.low_packets);
        }

        Commands::SimulateSic {
            protocol_high,
            protocol_low,
            ble_rate,
            payload_len_high,
            payload_len_low,
            num_trials,
            sampling_rate,
            seed,
            output_dir,
        } => {
            let cfg = SimulationConfig {
                sampling_rate,
                protocol_high,
                protocol_low,
                ble_rate,
                payload_len_high,
                payload_len_low,
                ..Default::default()
            };

            let high_power_db = -6.0;
            let low_powers_db: Vec<f64> = (0..14).map(|i| -6.0 - i as f64).collect();
            let snr_lows_db: Vec<f64> = (0..8).map(|i| (i * 2) as f64).collect();

            let simulator = SimulatorSic::new(cfg.clone())?;
            let pdr = simulator.run_monte_carlo(
                high_power_db,
                &low_powers_db,
                &snr_lows_db,
                num_trials,
                seed,
            )?;

            let archive = SimulationArchive {
                high_power_db,
                low_powers_db,
                snr_lows_db,
                num_trials,
                pdr,
                cfg,
            };
            let path = save_archive(&archive, &output_dir)?;
            log_info(&format!("Archive written to {}", path.display()));
            println!("{}", path.display());
        }
    }

    Ok(())
}
