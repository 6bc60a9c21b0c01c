// Protocol constants for the OpenBCI 32-bit board

/// First byte of every binary frame
pub const START_BYTE: u8 = 0xA0;

/// Last byte of every binary frame
pub const END_BYTE: u8 = 0xC0;

/// Size of a complete binary frame (33 bytes)
pub const FRAME_SIZE: usize = 33;

/// Offset of the end marker relative to the start marker
pub const END_BYTE_OFFSET: usize = FRAME_SIZE - 1;

/// Offset of the sample index counter
pub const SAMPLE_INDEX_OFFSET: usize = 1;

/// Offset of the first 24-bit channel value
pub const CHANNEL_DATA_OFFSET: usize = 2;

/// Number of EEG channels carried in each frame
pub const CHANNEL_COUNT: usize = 8;

/// Width of a single channel value on the wire
pub const CHANNEL_VALUE_SIZE: usize = 3;

/// Offset of the first 16-bit auxiliary value
pub const AUX_DATA_OFFSET: usize = CHANNEL_DATA_OFFSET + CHANNEL_COUNT * CHANNEL_VALUE_SIZE;

/// Number of auxiliary (accelerometer) values carried in each frame
pub const AUX_COUNT: usize = 3;

/// Upper bound on bytes carried between decode calls
pub const MAX_LEFTOVER_BYTES: usize = 200;

/// Empty polls before the stream is reported as stalled.
/// At 30-60 polls per second this is roughly 15-30 seconds without data.
pub const DEFAULT_MAX_MISSED_CYCLES: u32 = 900;

/// Serial link speed used by the board
pub const BAUD_RATE: u32 = 115_200;

/// ADS1299 scale factor at gain 24 (µV per count)
pub const COUNT_TO_MICROVOLT: f64 = 0.02232;
