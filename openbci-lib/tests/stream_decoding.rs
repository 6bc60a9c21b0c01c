//! Decoding behavior over realistic and hostile byte streams

mod common;

use common::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

#[test]
fn test_single_frame_surrounded_by_noise() {
    let frame = build_frame(42, [100, -100, 8_388_607, -8_388_608, 0, 1, -1, 65_536], [10, -10, 0]);
    let noise_before: Vec<u8> = vec![0x01, 0x02, 0xFF, 0x7E, 0x00];
    let noise_after: Vec<u8> = vec![0x10, 0x20, 0x30];

    for before in 0..=noise_before.len() {
        for after in 0..=noise_after.len() {
            let mut stream = noise_before[..before].to_vec();
            stream.extend_from_slice(&frame);
            stream.extend_from_slice(&noise_after[..after]);

            let packets = FrameAssembler::new().push(&stream);
            assert_eq!(packets.len(), 1, "before={} after={}", before, after);
            assert_eq!(packets[0].sample_index, 42);
            assert_eq!(
                packets[0].channels,
                [100, -100, 8_388_607, -8_388_608, 0, 1, -1, 65_536]
            );
            assert_eq!(packets[0].aux, [10, -10, 0]);
        }
    }
}

#[test]
fn test_split_call_equivalence() {
    let stream = marker_stream();
    let expected = summarize(&FrameAssembler::new().push(&stream));
    assert_eq!(expected.len(), 10);

    for split in 0..=stream.len() {
        let mut assembler = FrameAssembler::new();
        let mut packets = assembler.push(&stream[..split]);
        packets.extend(assembler.push(&stream[split..]));
        assert_eq!(summarize(&packets), expected, "split at {}", split);
        assert_eq!(assembler.leftover_len(), 0);
    }
}

#[test]
fn test_byte_at_a_time_delivery() {
    let stream = marker_stream();
    let expected = summarize(&FrameAssembler::new().push(&stream));

    let mut assembler = FrameAssembler::new();
    let mut packets = Vec::new();
    for byte in &stream {
        packets.extend(assembler.push(std::slice::from_ref(byte)));
    }

    assert_eq!(summarize(&packets), expected);
    let indices: Vec<u8> = packets.iter().map(|p| p.sample_index).collect();
    assert_eq!(indices, vec![0xBE, 0xBD, 0xBE, 0xC0, 0xC1, 0xA0, 0xA1, 0x00, 0x01, 0x7F]);
}

#[test]
fn test_random_frames_in_random_chunks() {
    let mut rng = StdRng::seed_from_u64(0xC0);
    let stream: Vec<u8> = (0..=255u8).flat_map(|index| random_frame(&mut rng, index)).collect();
    let expected = summarize(&FrameAssembler::new().push(&stream));
    assert_eq!(expected.len(), 256);

    for _ in 0..50 {
        let mut assembler = FrameAssembler::new();
        let mut packets = Vec::new();
        let mut rest = &stream[..];
        while !rest.is_empty() {
            let (chunk, tail) = rest.split_at(rng.random_range(1..=rest.len().min(70)));
            packets.extend(assembler.push(chunk));
            assert!(assembler.leftover_len() < FRAME_SIZE);
            rest = tail;
        }
        assert_eq!(summarize(&packets), expected);
    }
}

#[test]
fn test_sample_index_wraps() {
    let mut stream = build_frame(254, [0; 8], [0; 3]);
    stream.extend(build_frame(255, [0; 8], [0; 3]));
    stream.extend(build_frame(0, [0; 8], [0; 3]));

    let packets = FrameAssembler::new().push(&stream);
    let indices: Vec<u8> = packets.iter().map(|p| p.sample_index).collect();
    assert_eq!(indices, vec![254, 255, 0]);
}

#[test]
fn test_dropped_byte_loses_only_one_frame() {
    let mut stream = clean_frame(1);
    let mut damaged = clean_frame(2);
    damaged.remove(10);
    stream.extend_from_slice(&damaged);
    stream.extend_from_slice(&clean_frame(3));

    let packets = FrameAssembler::new().push(&stream);
    let indices: Vec<u8> = packets.iter().map(|p| p.sample_index).collect();
    assert_eq!(indices, vec![1, 3]);
}

#[test]
fn test_random_bytes_never_fail_and_leftover_stays_bounded() {
    init_tracing();
    let mut rng = StdRng::seed_from_u64(0x0BC1);
    let mut assembler = FrameAssembler::new();

    for _ in 0..2_000 {
        let len = rng.random_range(0..600);
        let mut chunk = vec![0u8; len];
        rng.fill(&mut chunk[..]);
        // Bias toward marker bytes so the framing paths are exercised
        for byte in chunk.iter_mut() {
            match rng.random_range(0..10) {
                0 => *byte = START_BYTE,
                1 => *byte = END_BYTE,
                _ => {}
            }
        }

        let _ = assembler.push(&chunk);
        assert!(assembler.leftover_len() <= MAX_LEFTOVER_BYTES);
    }
}

#[test]
fn test_valid_frames_survive_random_noise() {
    let mut rng = StdRng::seed_from_u64(7);
    let mut assembler = FrameAssembler::new();
    let mut decoded = Vec::new();

    for index in 0..50u8 {
        // Noise without markers cannot be mistaken for a frame
        let noise: Vec<u8> = (0..rng.random_range(0..40))
            .map(|_| rng.random_range(0x00..0xA0))
            .collect();
        decoded.extend(assembler.push(&noise));
        decoded.extend(assembler.push(&random_frame(&mut rng, index)));
    }

    let indices: Vec<u8> = decoded.iter().map(|p| p.sample_index).collect();
    assert_eq!(indices, (0..50).collect::<Vec<u8>>());
}
