//! Stall detection as seen through a board session

mod common;

use common::*;
use openbci_lib::constants::DEFAULT_MAX_MISSED_CYCLES;

fn idle_session() -> OpenBci<MemorySource> {
    let mut session = OpenBci::new(DecoderConfig::default());
    session.attach(MemorySource::new(&[]));
    session
}

fn poll(session: &mut OpenBci<MemorySource>) -> Vec<DecodedPacket> {
    session.update().expect("update failed");
    session.drain()
}

#[test]
fn test_stall_fires_once_at_threshold() {
    let mut session = idle_session();
    let mut stalls = 0;

    for cycle in 1..=DEFAULT_MAX_MISSED_CYCLES {
        assert!(poll(&mut session).is_empty());
        if let Some(event) = session.take_stall() {
            assert_eq!(cycle, DEFAULT_MAX_MISSED_CYCLES);
            assert_eq!(event.missed_cycles, DEFAULT_MAX_MISSED_CYCLES);
            stalls += 1;
        }
    }

    assert_eq!(stalls, 1);
    assert_eq!(session.missed_cycles(), 0);
    assert!(session.take_stall().is_none(), "signal must be edge-triggered");
}

#[test]
fn test_packet_before_threshold_prevents_stall() {
    let mut session = idle_session();

    for _ in 1..DEFAULT_MAX_MISSED_CYCLES {
        assert!(poll(&mut session).is_empty());
    }
    assert_eq!(session.missed_cycles(), DEFAULT_MAX_MISSED_CYCLES - 1);

    session.link_mut().unwrap().feed(&clean_frame(9));
    let packets = poll(&mut session);
    assert_eq!(packets.len(), 1);
    assert!(session.take_stall().is_none());
    assert_eq!(session.missed_cycles(), 0);
}

#[test]
fn test_stall_repeats_after_each_threshold_crossing() {
    let mut session = idle_session();
    let mut stalls = 0;

    for _ in 0..DEFAULT_MAX_MISSED_CYCLES * 2 {
        poll(&mut session);
        if session.take_stall().is_some() {
            stalls += 1;
        }
    }
    assert_eq!(stalls, 2);
}

#[test]
fn test_acknowledge_restart_resets_counter() {
    let mut session = OpenBci::new(DecoderConfig {
        max_missed_cycles: 5,
        ..DecoderConfig::default()
    });
    session.attach(MemorySource::new(&[]));

    for _ in 0..4 {
        poll(&mut session);
    }
    session.acknowledge_restart();
    assert_eq!(session.missed_cycles(), 0);

    for _ in 0..4 {
        poll(&mut session);
    }
    assert!(session.take_stall().is_none());
    poll(&mut session);
    assert!(session.take_stall().is_some());
}

#[test]
fn test_not_ready_source_counts_as_empty_poll() {
    let mut session = OpenBci::new(DecoderConfig {
        max_missed_cycles: 3,
        ..DecoderConfig::default()
    });
    let mut source = MemorySource::new(&clean_frame(1));
    source.set_ready(false);
    session.attach(source);

    for _ in 0..3 {
        assert_eq!(session.update().unwrap(), 0);
        assert!(session.drain().is_empty());
    }
    assert!(session.take_stall().is_some());
}
