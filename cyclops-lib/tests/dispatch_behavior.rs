//! Tests for command dispatch and channel state mutation

mod common;

use common::*;

#[test]
fn test_identity_emits_descriptor_and_mutates_nothing() {
    let mut engine = test_engine();
    let event = engine.feed(0x87);
    match event {
        Some(EngineEvent::Identity(descriptor)) => {
            assert_eq!(descriptor.as_ref(), TEST_DESCRIPTOR)
        }
        other => panic!("expected identity, got {other:?}"),
    }
    for channel in 0..MAX_CHANNELS as u8 {
        assert_eq!(
            *engine.registry().get(channel).unwrap(),
            ChannelState::default()
        );
    }
    assert!(engine.sources().calls.is_empty());
}

#[test]
fn test_start_stop_reset_reach_device_control() {
    let mut engine = test_engine();
    engine.feed(0x80);
    engine.feed(0x81);
    engine.feed(0x82);
    assert_eq!(engine.control().started, 1);
    assert_eq!(engine.control().stopped, 1);
    assert_eq!(engine.control().resets, 1);

    // reset reinitializes sources, never the registry
    for channel in 0..MAX_CHANNELS as u8 {
        assert_eq!(
            *engine.registry().get(channel).unwrap(),
            ChannelState::default()
        );
    }
}

#[test]
fn test_change_source_sets_mode_and_shot_cycle() {
    let mut engine = test_engine();

    engine.feed_slice(&hex_to_bytes("0005")); // loopback, ch0, src 5
    engine.feed_slice(&hex_to_bytes("2102")); // one-shot, ch1, src 2
    engine.feed_slice(&hex_to_bytes("420703")); // n-shot, ch2, src 7, 3 shots

    let ch0 = engine.registry().get(0).unwrap();
    assert_eq!((ch0.src_id, ch0.mode, ch0.shot_cycle), (5, Mode::Loopback, 0));

    let ch1 = engine.registry().get(1).unwrap();
    assert_eq!((ch1.src_id, ch1.mode, ch1.shot_cycle), (2, Mode::OneShot, 0));

    let ch2 = engine.registry().get(2).unwrap();
    assert_eq!((ch2.src_id, ch2.mode, ch2.shot_cycle), (7, Mode::NShot, 3));
}

#[test]
fn test_swap_exchanges_full_state_and_leaves_others_alone() {
    let mut engine = test_engine();

    // Give channels 0 and 1 distinct configurations first.
    engine.feed_slice(&hex_to_bytes("0005")); // ch0: src 5, loopback
    engine.feed_slice(&hex_to_bytes("220903")); // ch1: src 9, n-shot x3
    engine.feed_slice(&hex_to_bytes("2500002040")); // ch1: time factor 2.5

    let event = engine.feed(0x8b); // swap (0, 1)
    assert!(matches!(
        event,
        Some(EngineEvent::Applied(Command::Swap(SwapPair {
            first: 0,
            second: 1,
        })))
    ));

    let ch0 = engine.registry().get(0).unwrap();
    assert_eq!((ch0.src_id, ch0.mode, ch0.shot_cycle), (9, Mode::NShot, 3));
    assert_eq!(ch0.time_factor, 2.5);

    let ch1 = engine.registry().get(1).unwrap();
    assert_eq!((ch1.src_id, ch1.mode, ch1.shot_cycle), (5, Mode::Loopback, 0));
    assert_eq!(ch1.time_factor, 1.0);

    assert_eq!(*engine.registry().get(2).unwrap(), ChannelState::default());
    assert_eq!(*engine.registry().get(3).unwrap(), ChannelState::default());

    // the source subsystem saw the same pair
    assert!(engine.sources().calls.contains(&"swap 0 1".to_string()));
}

#[test]
fn test_time_period_rejected_when_hold_time_dynamic() {
    let mut engine = test_engine();
    engine.sources_mut().constant_hold_time[0] = false;

    let events = engine.feed_slice(&hex_to_bytes("0340420f00"));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EngineEvent::Error(CyclopsError::RejectedMutation(_))
    ));

    // rejected in entirety: no partial update
    assert_eq!(*engine.registry().get(0).unwrap(), ChannelState::default());
    assert!(engine.sources().calls.is_empty());
}

#[test]
fn test_time_factor_accumulates_on_the_channel() {
    let mut engine = test_engine();
    engine.feed_slice(&hex_to_bytes("2500002040")); // x2.5
    engine.feed_slice(&hex_to_bytes("2500000040")); // x2.0
    assert_eq!(engine.registry().get(1).unwrap().time_factor, 5.0);
}

#[test]
fn test_non_positive_time_factor_rejected() {
    let mut engine = test_engine();

    // 0.0 and -1.0 are outside the documented (0, inf) domain
    for hex_frame in ["2500000000", "25000080bf"] {
        let events = engine.feed_slice(&hex_to_bytes(hex_frame));
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            EngineEvent::Error(CyclopsError::RejectedMutation(_))
        ));
    }
    assert_eq!(engine.registry().get(1).unwrap().time_factor, 1.0);
    assert!(engine.sources().calls.is_empty());
}

#[test]
fn test_zero_voltage_offset_rejected() {
    let mut engine = test_engine();
    let events = engine.feed_slice(&hex_to_bytes("070000"));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EngineEvent::Error(CyclopsError::RejectedMutation(_))
    ));
    assert_eq!(engine.registry().get(0).unwrap().voltage_offset_mv, 0);
}

#[test]
fn test_square_times_update_the_channel() {
    let mut engine = test_engine();
    engine.feed_slice(&hex_to_bytes("08e8030000")); // on 1000, ch0
    engine.feed_slice(&hex_to_bytes("49d0070000")); // off 2000, ch2
    assert_eq!(engine.registry().get(0).unwrap().square_on_us, 1000);
    assert_eq!(engine.registry().get(2).unwrap().square_off_us, 2000);
}

#[test]
fn test_invalid_channel_reported_and_dropped() {
    // Device populated with two channels; the wire can still address 4.
    let mut engine = test_engine_with(RecordingBank::default(), ChannelRegistry::new(2));

    // voltage_offset on channel 3
    let events = engine.feed_slice(&hex_to_bytes("67f401"));
    assert_eq!(events.len(), 1);
    assert!(matches!(
        events[0],
        EngineEvent::Error(CyclopsError::InvalidChannel(3))
    ));
    assert!(engine.sources().calls.is_empty());

    // parsing continues on the populated channels
    let events = engine.feed_slice(&hex_to_bytes("27f401"));
    assert_eq!(events.len(), 1);
    assert!(matches!(events[0], EngineEvent::Applied(_)));
    assert_eq!(engine.registry().get(1).unwrap().voltage_offset_mv, 500);
}

#[test]
fn test_swap_with_unpopulated_channel_rejected() {
    let mut engine = test_engine_with(RecordingBank::default(), ChannelRegistry::new(2));

    // swap (2, 3) on a two-channel device: 0b1011 -> 0xDB
    let event = engine.feed(0xdb);
    assert!(matches!(
        event,
        Some(EngineEvent::Error(CyclopsError::InvalidChannel(2)))
    ));
    assert!(engine.sources().calls.is_empty());
}
