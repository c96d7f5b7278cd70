//! Golden packet vectors: literal byte/bit sequences pinned down so a
//! regression in framing, whitening, CRC or chip mapping cannot hide behind
//! a self-consistent round trip.

use sicphy::ble::whitening::whiten;
use sicphy::ble::{build_phy_packet, generate_access_code};
use sicphy::constants::WHITENING_SEED;
use sicphy::ieee802154::{map_nibbles_to_chips, RX_CHIP_MAP, TX_CHIP_MAP};
use sicphy::protocol::PhyReceiver;
use sicphy::util::bits::correlate_access_code;
use sicphy::util::crc::ble_crc24;
use sicphy::Receiver802154;

/// S1 - BLE framing: payload [01 02 03], base address 0x12345678.
#[test]
fn ble_framing_golden_bytes() {
    let payload = [0x01u8, 0x02, 0x03];
    let packet = build_phy_packet(&payload, 0x12345678);

    // Before whitening the packet reads:
    // AA 78 56 34 12 00 | 00 03 01 02 03 CRC0 CRC1 CRC2
    let crc = ble_crc24().compute(&[0x00, 0x03, 0x01, 0x02, 0x03]);
    let mut expected_clear = vec![0x00u8, 0x03, 0x01, 0x02, 0x03];
    expected_clear.extend(&crc);

    assert_eq!(&packet[..6], &[0xAA, 0x78, 0x56, 0x34, 0x12, 0x00]);
    let (dewhitened, _) = whiten(&packet[6..], WHITENING_SEED);
    assert_eq!(dewhitened, expected_clear);

    // De-whiten then CRC on the on-air packet recovers the payload.
    assert!(ble_crc24().check(&dewhitened));
    assert_eq!(&dewhitened[2..5], &payload);
}

/// S1 addendum: the preamble flips to 0x55 for an odd base address.
#[test]
fn ble_preamble_polarity() {
    assert_eq!(build_phy_packet(&[], 0x12345678)[0], 0xAA);
    assert_eq!(build_phy_packet(&[], 0x12345679)[0], 0x55);
}

/// S2 - 802.15.4 chip expansion: nibble 0x0 spreads to 0xD9C3522E, and the
/// decoder recovers payload [0x7E] with a passing CRC from the full chip
/// sequence (length byte = 3: payload plus two CRC bytes).
#[test]
fn ieee802154_chip_expansion_golden() {
    assert_eq!(TX_CHIP_MAP[0x0], 0xD9C3522E);
    assert_eq!(RX_CHIP_MAP[0x0], 0xE077AE6C);

    // SHR + length + payload + CRC, spread in the receiver's chip domain.
    let packet = sicphy::ieee802154::build_phy_packet(&[0x7E], true);
    assert_eq!(packet[5], 3);
    let words = map_nibbles_to_chips(&packet, &RX_CHIP_MAP);
    let mut stream = Vec::with_capacity(words.len() * 32);
    for w in &words {
        for bit in 0..32 {
            stream.push(((w >> (31 - bit)) & 1) as u8);
        }
    }

    let rx = Receiver802154::new(10e6).unwrap();
    let packets = rx.process_phy_packet(&stream);
    assert_eq!(packets.len(), 1);
    assert_eq!(packets[0].payload, vec![0x7E]);
    assert_eq!(packets[0].crc_ok, Some(true));
}

/// S3 - BLE whitening: seed 0x01 over zeros produces the first 32 bits of
/// the whitening sequence.
#[test]
fn ble_whitening_reference_sequence() {
    let (out, lfsr) = whiten(&[0x00, 0x00, 0x00, 0x00], 0x01);
    // Keystream bits (LSB-first per byte):
    // 00000010 01001101 00111101 11000011
    assert_eq!(out, vec![0x40, 0xB2, 0xBC, 0xC3]);
    assert_eq!(lfsr, 0x73);
}

/// S4 - preamble search with bit errors: 2 flips found at threshold 2,
/// rejected at threshold 1.
#[test]
fn preamble_with_bit_errors() {
    let code = "1101001010001111_0110010100111010_01011100";
    let code_bits: Vec<u8> = code
        .chars()
        .filter(|&c| c != '_')
        .map(|c| (c == '1') as u8)
        .collect();
    assert_eq!(code_bits.len(), 40);

    let mut stream = vec![0u8; 160];
    stream[61..101].copy_from_slice(&code_bits);
    stream[65] ^= 1;
    stream[88] ^= 1;

    let hits = correlate_access_code(&stream, code, 2, false).unwrap();
    assert!(hits.contains(&101), "hits {hits:?}");
    assert!(!correlate_access_code(&stream, code, 1, false)
        .unwrap()
        .contains(&101));
}

/// The BLE access code pins preamble, little-endian address and prefix.
#[test]
fn ble_access_code_golden() {
    let code = generate_access_code(0x12345678);
    assert_eq!(
        code,
        "01010101_00011110_01101010_00101100_01001000_00000000"
    );
}
