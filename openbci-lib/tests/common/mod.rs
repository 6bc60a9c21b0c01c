//! Common test utilities and shared imports

// Shared across several test files; not every item is used by each of them
#[allow(unused_imports)]
pub use openbci_lib::constants::{END_BYTE, FRAME_SIZE, MAX_LEFTOVER_BYTES, START_BYTE};
#[allow(unused_imports)]
pub use openbci_lib::{
    BciError, ByteSource, Command, CommandSink, DataMode, DecodedPacket, DecoderConfig, FrameAssembler,
    MemorySource, OpenBci, PortRegistry,
};

/// Encode a frame the way the board puts it on the wire
#[allow(dead_code)]
pub fn build_frame(sample_index: u8, channels: [i32; 8], aux: [i16; 3]) -> Vec<u8> {
    let mut frame = Vec::with_capacity(FRAME_SIZE);
    frame.push(START_BYTE);
    frame.push(sample_index);
    for value in channels {
        frame.extend_from_slice(&value.to_be_bytes()[1..]);
    }
    for value in aux {
        frame.extend_from_slice(&value.to_be_bytes());
    }
    frame.push(END_BYTE);
    frame
}

/// A frame whose body never contains the end marker, for tests that count on the
/// only `0xC0` bytes in a stream being frame ends
#[allow(dead_code)]
pub fn clean_frame(sample_index: u8) -> Vec<u8> {
    assert_ne!(sample_index, END_BYTE, "sample index would collide with the end marker");
    let mut seed = sample_index as i32 * 7919;
    loop {
        let channels: [i32; 8] = std::array::from_fn(|ch| (seed + ch as i32 * 104_729) % 4_000_000 - 2_000_000);
        let aux = [(seed % 2000) as i16, -((seed % 1500) as i16), 512];
        let frame = build_frame(sample_index, channels, aux);
        if !frame[1..FRAME_SIZE - 1].contains(&END_BYTE) {
            return frame;
        }
        seed += 1;
    }
}

/// Frames whose index, channel and aux bytes are packed with start and end markers,
/// interleaved with clean frames
#[allow(dead_code)]
pub fn marker_stream() -> Vec<u8> {
    let mut stream = clean_frame(0xBE);
    for (n, index) in [0xBDu8, END_BYTE, START_BYTE, 0x00].into_iter().enumerate() {
        let channels = [0xC0, 0xC0C0, 0xC0_C0C0, 0xA0_00C0, n as i32, -1, 0xC0 << 8, 0xA0];
        let aux = [0xC0, 0xC0C0_u16 as i16, 0xA0C0_u16 as i16];
        stream.extend(build_frame(index, channels, aux));
        stream.extend(clean_frame(index.wrapping_add(1)));
    }
    stream.extend(build_frame(0x7F, [0xC0_C0C0; 8], [0xC0C0_u16 as i16; 3]));
    stream
}

/// Frame with random channel and aux values; roughly one in eight carries an end
/// marker byte in its payload
#[allow(dead_code)]
pub fn random_frame(rng: &mut impl rand::Rng, sample_index: u8) -> Vec<u8> {
    let channels: [i32; 8] = std::array::from_fn(|_| rng.random_range(-8_388_608..=8_388_607));
    let aux: [i16; 3] = std::array::from_fn(|_| rng.random());
    build_frame(sample_index, channels, aux)
}

/// Sample indices and channel values, ignoring the host timestamp
#[allow(dead_code)]
pub fn summarize(packets: &[DecodedPacket]) -> Vec<(u8, [i32; 8], [i16; 3])> {
    packets.iter().map(|p| (p.sample_index, p.channels, p.aux)).collect()
}

#[allow(dead_code)]
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
