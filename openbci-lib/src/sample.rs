use crate::constants::{
    AUX_COUNT, AUX_DATA_OFFSET, CHANNEL_COUNT, CHANNEL_DATA_OFFSET, CHANNEL_VALUE_SIZE, COUNT_TO_MICROVOLT, END_BYTE,
    END_BYTE_OFFSET, FRAME_SIZE, SAMPLE_INDEX_OFFSET, START_BYTE,
};
use crate::error::BciError;
use chrono::{DateTime, Utc};
use std::fmt;
use std::mem::{offset_of, size_of};
use zerocopy::byteorder::big_endian::I16;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout, Unaligned};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Binary frame as it appears on the wire (33 bytes)
///
/// ```text
/// 0      start marker 0xA0
/// 1      sample index
/// 2..26  8 channels, 24-bit big-endian two's complement
/// 26..32 3 aux values, 16-bit big-endian two's complement
/// 32     end marker 0xC0
/// ```
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub struct FrameRaw {
    pub start: u8,
    pub sample_index: u8,
    pub channels: [[u8; CHANNEL_VALUE_SIZE]; CHANNEL_COUNT],
    pub aux: [I16; AUX_COUNT],
    pub end: u8,
}

const _: () = {
    assert!(size_of::<FrameRaw>() == FRAME_SIZE);
    assert!(offset_of!(FrameRaw, sample_index) == SAMPLE_INDEX_OFFSET);
    assert!(offset_of!(FrameRaw, channels) == CHANNEL_DATA_OFFSET);
    assert!(offset_of!(FrameRaw, aux) == AUX_DATA_OFFSET);
    assert!(offset_of!(FrameRaw, end) == END_BYTE_OFFSET);
};

/// One decoded sample from the board.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DecodedPacket {
    /// Device counter, wraps from 255 back to 0
    pub sample_index: u8,
    /// Raw ADC counts, channel 0 first
    pub channels: [i32; CHANNEL_COUNT],
    /// Auxiliary (accelerometer) counts, X/Y/Z
    pub aux: [i16; AUX_COUNT],
    /// Host wall-clock time when the frame was decoded.
    ///
    /// The board does not send timestamps, so this measures decode latency rather
    /// than acquisition time. Samples drained in one batch may carry near-identical
    /// timestamps even though the board produced them at its sample rate.
    pub timestamp: DateTime<Utc>,
}

impl DecodedPacket {
    /// Decode a frame already validated by the assembler.
    ///
    /// Callers must only pass windows that start with `START_BYTE` and end with
    /// `END_BYTE`; the markers are not re-checked in release builds.
    pub fn from_frame(frame: &[u8; FRAME_SIZE]) -> Self {
        let raw: FrameRaw = zerocopy::transmute!(*frame);
        debug_assert_eq!(raw.start, START_BYTE);
        debug_assert_eq!(raw.end, END_BYTE);
        Self::from_raw(&raw, Utc::now())
    }

    fn from_raw(raw: &FrameRaw, timestamp: DateTime<Utc>) -> Self {
        let mut channels = [0i32; CHANNEL_COUNT];
        for (value, bytes) in channels.iter_mut().zip(raw.channels.iter()) {
            *value = interpret_24bit_as_i32(*bytes);
        }

        DecodedPacket {
            sample_index: raw.sample_index,
            channels,
            aux: raw.aux.map(|v| v.get()),
            timestamp,
        }
    }

    /// Channel values converted to microvolts
    pub fn channel_microvolts(&self) -> [f64; CHANNEL_COUNT] {
        self.channels.map(|count| count as f64 * COUNT_TO_MICROVOLT)
    }
}

impl TryFrom<&[u8]> for DecodedPacket {
    type Error = BciError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        let frame: &[u8; FRAME_SIZE] = bytes.try_into().map_err(|_| {
            BciError::InvalidFrame(format!("expected {} bytes, got {}", FRAME_SIZE, bytes.len()))
        })?;
        if frame[0] != START_BYTE {
            return Err(BciError::InvalidFrame(format!("bad start marker {:#04x}", frame[0])));
        }
        if frame[FRAME_SIZE - 1] != END_BYTE {
            return Err(BciError::InvalidFrame(format!(
                "bad end marker {:#04x}",
                frame[FRAME_SIZE - 1]
            )));
        }
        Ok(Self::from_frame(frame))
    }
}

impl fmt::Display for DecodedPacket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:3}", self.sample_index)?;
        for uv in self.channel_microvolts() {
            write!(f, " {:>10.2}", uv)?;
        }
        write!(f, " | aux {:?}", self.aux)
    }
}

/// Sign-extend a big-endian 24-bit two's complement value.
pub fn interpret_24bit_as_i32(bytes: [u8; CHANNEL_VALUE_SIZE]) -> i32 {
    let value = i32::from_be_bytes([0, bytes[0], bytes[1], bytes[2]]);
    if value & 0x0080_0000 != 0 {
        value | !0x00FF_FFFF
    } else {
        value & 0x00FF_FFFF
    }
}
