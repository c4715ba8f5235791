//! Everything the transmitter puts on the wire must be read back unchanged by
//! the receiver, for every frame length and for more than one timer clock.
mod helpers {
    include!("../../helpers/mod.rs");
}

use helpers::SimBus;
use korri_j1850::{
    core::{Frame, MAX_FRAME_LEN},
    infra::timing::Timing,
    protocol::transport::vpw_bus::{VpwBus, VpwConfig},
};

/// Send `frame` on one simulated bus, replay the recorded pulse train on a
/// second one, and return what the receiver decoded there.
fn replay(frame: &[u8], config: VpwConfig) -> Vec<u8> {
    let sender = SimBus::new();
    let mut tx = VpwBus::new(sender.line(), sender.clock(), config);
    tx.transmit(frame).expect("transmit on a quiet bus");

    let listener = SimBus::new();
    listener.script(&sender.transmitted_intervals(20));
    let mut rx = VpwBus::new(listener.line(), listener.clock(), config);
    let mut buffer = [0u8; MAX_FRAME_LEN];
    let len = rx.receive(&mut buffer).expect("receive the replayed frame");
    buffer[..len].to_vec()
}

fn pattern(len: usize, seed: u8) -> Vec<u8> {
    (0..len)
        .map(|i| seed.wrapping_mul(31).wrapping_add((i as u8).wrapping_mul(97)) ^ 0x5A)
        .collect()
}

#[test]
fn test_round_trip_every_length() {
    for len in 1..=MAX_FRAME_LEN {
        for seed in [0u8, 1, 7, 200] {
            let frame = pattern(len, seed);
            assert_eq!(replay(&frame, VpwConfig::default()), frame, "len {len} seed {seed}");
        }
    }
}

#[test]
/// Uniform bytes produce runs of identical symbols.
fn test_round_trip_uniform_bytes() {
    for byte in [0x00, 0xFF, 0xAA, 0x55] {
        let frame = [byte; MAX_FRAME_LEN];
        assert_eq!(replay(&frame, VpwConfig::default()), frame, "byte {byte:#04x}");
    }
}

#[test]
fn test_round_trip_checksummed_frame() {
    let frame = Frame::with_checksum(&[0x8D, 0x93, 0x01, 0x00, 0x00]).unwrap();
    let decoded = replay(frame.as_bytes(), VpwConfig::default());
    assert_eq!(decoded, [0x8D, 0x93, 0x01, 0x00, 0x00, 0xBE]);
    assert!(Frame::new(&decoded).unwrap().has_valid_checksum());
}

#[test]
/// A 2 MHz pulse timer (16 MHz crystal, prescaler 8) doubles every window.
fn test_round_trip_scaled_timer() {
    let config = VpwConfig::new(Timing::for_mcu(16_000_000, 8));
    assert_eq!(config.timing.tx_sof, 400);
    for len in [1, 5, MAX_FRAME_LEN] {
        let frame = pattern(len, 3);
        assert_eq!(replay(&frame, config), frame, "len {len}");
    }
}
