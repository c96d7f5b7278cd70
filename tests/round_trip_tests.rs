//! End-to-end round trips through the full modulate → channel → demodulate
//! chain, including noisy channels and the boundary behaviour the receivers
//! must not trip over.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use sicphy::dsp::noise::add_awgn_signal_present;
use sicphy::protocol::{DemodMethod, PhyReceiver, PhyTransmitter};
use sicphy::{Complex, Receiver802154, ReceiverBle, Transmitter802154, TransmitterBle};

fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..len).map(|_| rng.gen()).collect()
}

#[test]
fn ble_round_trip_payload_lengths() {
    let fs = 8e6;
    let tx = TransmitterBle::new(fs, 1e6).unwrap();
    let rx = ReceiverBle::new(fs, 1e6).unwrap();

    for &len in &[0usize, 1, 37, 255] {
        let payload = random_payload(len, 100 + len as u64);
        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "payload length {len}: no packet");
        assert_eq!(packets[0].payload, payload, "payload length {len}");
        assert_eq!(packets[0].crc_ok, Some(true), "payload length {len}");
        assert_eq!(packets[0].length as usize, len);
    }
}

#[test]
fn ble_round_trip_base_addresses() {
    let fs = 8e6;
    for &address in &[0x12345678u32, 0xDEADBEEF, 0x00000001, 0x80000000] {
        let tx = TransmitterBle::new(fs, 1e6)
            .unwrap()
            .with_base_address(address);
        let rx = ReceiverBle::new(fs, 1e6).unwrap().with_base_address(address);
        let payload = random_payload(11, address as u64);

        let iq = tx.modulate_from_payload(&payload, 150);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "address {address:#010X}: no packet");
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, Some(true));
    }
}

#[test]
fn ble_round_trip_noisy_channel() {
    // Comfortably above the 10 dB the pipeline is specified for.
    let fs = 8e6;
    let tx = TransmitterBle::new(fs, 1e6).unwrap();
    let rx = ReceiverBle::new(fs, 1e6).unwrap();
    let payload = random_payload(20, 7);

    let iq = tx.modulate_from_payload(&payload, 300);
    let interval = Some((300, iq.len() - 300));
    let mut rng = StdRng::seed_from_u64(99);
    let noisy = add_awgn_signal_present(&iq, 20.0, interval, &mut rng);

    let packets = rx.demodulate_to_packet(&noisy);
    assert_eq!(packets.len(), 1, "no packet at 20 dB SNR");
    assert_eq!(packets[0].payload, payload);
    assert_eq!(packets[0].crc_ok, Some(true));
}

#[test]
fn ble_round_trip_2mbps_band_pass() {
    let fs = 10e6;
    let tx = TransmitterBle::new(fs, 2e6).unwrap();
    let rx = ReceiverBle::new(fs, 2e6)
        .unwrap()
        .with_demodulation(DemodMethod::BandPass);
    let payload = random_payload(16, 2);

    let iq = tx.modulate_from_payload(&payload, 250);
    let packets = rx.demodulate_to_packet(&iq);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].payload, payload);
    assert_eq!(packets[0].crc_ok, Some(true));
}

#[test]
fn ieee802154_round_trip_with_crc() {
    let fs = 10e6;
    let tx = Transmitter802154::new(fs).unwrap();
    let rx = Receiver802154::new(fs).unwrap();

    for &len in &[0usize, 1, 50, 125] {
        let payload = random_payload(len, 200 + len as u64);
        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "payload length {len}: no packet");
        assert_eq!(packets[0].payload, payload, "payload length {len}");
        assert_eq!(packets[0].crc_ok, Some(true));
    }
}

#[test]
fn ieee802154_round_trip_without_crc() {
    let fs = 10e6;
    let tx = Transmitter802154::new(fs).unwrap().without_crc();
    let rx = Receiver802154::new(fs).unwrap().without_crc();

    for &len in &[0usize, 64, 127] {
        let payload = random_payload(len, 300 + len as u64);
        let iq = tx.modulate_from_payload(&payload, 200);
        let packets = rx.demodulate_to_packet(&iq);
        assert_eq!(packets.len(), 1, "payload length {len}: no packet");
        assert_eq!(packets[0].payload, payload);
        assert_eq!(packets[0].crc_ok, None);
    }
}

#[test]
fn ieee802154_round_trip_noisy_channel() {
    let fs = 10e6;
    let tx = Transmitter802154::new(fs).unwrap();
    let rx = Receiver802154::new(fs).unwrap();
    let payload = random_payload(30, 5);

    let iq = tx.modulate_from_payload(&payload, 300);
    let interval = Some((300, iq.len() - 300));
    let mut rng = StdRng::seed_from_u64(17);
    let noisy = add_awgn_signal_present(&iq, 20.0, interval, &mut rng);

    let packets = rx.demodulate_to_packet(&noisy);
    assert_eq!(packets.len(), 1, "no packet at 20 dB SNR");
    assert_eq!(packets[0].payload, payload);
    assert_eq!(packets[0].crc_ok, Some(true));
}

#[test]
fn truncated_iq_yields_no_packets_and_no_panic() {
    let fs = 8e6;
    let tx = TransmitterBle::new(fs, 1e6).unwrap();
    let rx = ReceiverBle::new(fs, 1e6).unwrap();
    let iq = tx.modulate_from_payload(&random_payload(40, 1), 100);

    // Cut inside the payload: the candidate is discarded quietly.
    for cut in [iq.len() / 3, iq.len() / 2, iq.len() - 40] {
        assert!(rx.demodulate_to_packet(&iq[..cut]).is_empty(), "cut {cut}");
    }

    let tx154 = Transmitter802154::new(10e6).unwrap();
    let rx154 = Receiver802154::new(10e6).unwrap();
    let iq = tx154.modulate_from_payload(&random_payload(40, 2), 100);
    assert!(rx154.demodulate_to_packet(&iq[..iq.len() / 2]).is_empty());
}

#[test]
fn all_zero_and_empty_iq() {
    let rx_ble = ReceiverBle::new(8e6, 1e6).unwrap();
    let rx_154 = Receiver802154::new(10e6).unwrap();

    let zeros = vec![Complex::new(0.0, 0.0); 10_000];
    assert!(rx_ble.demodulate_to_packet(&zeros).is_empty());
    assert!(rx_154.demodulate_to_packet(&zeros).is_empty());

    assert!(rx_ble.demodulate_to_packet(&[]).is_empty());
    assert!(rx_154.demodulate_to_packet(&[]).is_empty());
}

#[test]
fn two_packets_in_one_capture() {
    // Two BLE packets separated by silence decode as two records in order.
    let fs = 8e6;
    let tx = TransmitterBle::new(fs, 1e6).unwrap();
    let rx = ReceiverBle::new(fs, 1e6).unwrap();

    let first = random_payload(8, 11);
    let second = random_payload(5, 12);
    let mut capture = tx.modulate_from_payload(&first, 200);
    capture.extend(tx.modulate_from_payload(&second, 200));

    let packets = rx.demodulate_to_packet(&capture);
    assert_eq!(packets.len(), 2, "expected two packets");
    assert_eq!(packets[0].payload, first);
    assert_eq!(packets[1].payload, second);
    assert!(packets[0].position < packets[1].position);
    assert!(packets.iter().all(|p| p.crc_ok == Some(true)));
}
