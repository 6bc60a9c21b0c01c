//! Frame assembly over an arbitrarily chunked byte stream.
//!
//! Each call to [`FrameAssembler::push`] works on the window formed by the bytes
//! carried over from the previous call followed by the newly received bytes:
//!
//! 1. Scan backward for the last end marker. Nothing past it can complete a frame.
//! 2. Scan forward up to that end marker for start markers. A start marker whose
//!    end marker is not where it should be is skipped one byte at a time, so a real
//!    start marker right behind a corrupted one is still found.
//! 3. Carry over everything after the last end marker, or from the start marker of
//!    a frame that does not fit yet (its payload may contain `0xC0`). If the
//!    carry-over grows past the configured cap it is dropped, losing at most one
//!    partial frame in exchange for bounded memory.
//!
//! Work per call is proportional to the bytes received and nothing ever blocks.

use crate::constants::{END_BYTE, END_BYTE_OFFSET, FRAME_SIZE, MAX_LEFTOVER_BYTES, START_BYTE};
use crate::sample::DecodedPacket;
use bytes::BytesMut;
use tracing::{debug, trace, warn};

/// Counters for diagnosing link quality
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssemblerStats {
    pub bytes_received: u64,
    pub frames_decoded: u64,
    pub framing_errors: u64,
    pub leftover_overflows: u64,
}

pub struct FrameAssembler {
    /// Unresolved bytes carried into the next call
    leftover: BytesMut,
    /// Scratch window reused across calls
    window: BytesMut,
    max_leftover: usize,
    stats: AssemblerStats,
}

impl FrameAssembler {
    pub fn new() -> Self {
        Self::with_max_leftover(MAX_LEFTOVER_BYTES)
    }

    pub fn with_max_leftover(max_leftover: usize) -> Self {
        Self {
            leftover: BytesMut::with_capacity(max_leftover),
            window: BytesMut::with_capacity(max_leftover + 512),
            max_leftover,
            stats: AssemblerStats::default(),
        }
    }

    /// Feed newly received bytes and return every frame completed by them, oldest first.
    pub fn push(&mut self, raw: &[u8]) -> Vec<DecodedPacket> {
        self.stats.bytes_received += raw.len() as u64;

        self.window.clear();
        self.window.extend_from_slice(&self.leftover);
        self.window.extend_from_slice(raw);
        self.leftover.clear();

        let Some(last_end) = self.window.iter().rposition(|&b| b == END_BYTE) else {
            self.leftover.extend_from_slice(&self.window);
            self.enforce_leftover_cap();
            return Vec::new();
        };

        let mut packets = Vec::new();
        let mut carry_from = last_end + 1;
        let mut index = 0;
        while index < last_end {
            if self.window[index] != START_BYTE {
                index += 1;
                continue;
            }

            let Some(frame) = self.window[index..].first_chunk::<FRAME_SIZE>() else {
                // Payload bytes may equal the end marker, so the frame can straddle `last_end`.
                trace!(index, available = self.window.len() - index, "Incomplete frame at end of window");
                carry_from = index;
                break;
            };

            if frame[END_BYTE_OFFSET] != END_BYTE {
                self.stats.framing_errors += 1;
                debug!(
                    index,
                    got = frame[END_BYTE_OFFSET],
                    frame = hex::encode(frame),
                    "Framing error, resyncing one byte forward"
                );
                index += 1;
                continue;
            }

            packets.push(DecodedPacket::from_frame(frame));
            self.stats.frames_decoded += 1;
            index += FRAME_SIZE;
        }

        self.leftover.extend_from_slice(&self.window[carry_from..]);
        self.enforce_leftover_cap();

        packets
    }

    fn enforce_leftover_cap(&mut self) {
        if self.leftover.len() > self.max_leftover {
            warn!(
                dropped = self.leftover.len(),
                cap = self.max_leftover,
                "Leftover buffer overflow, discarding unresolved bytes"
            );
            self.leftover.clear();
            self.stats.leftover_overflows += 1;
        }
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        self.leftover.clear();
    }

    pub fn leftover_len(&self) -> usize {
        self.leftover.len()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.stats
    }
}

impl Default for FrameAssembler {
    fn default() -> Self {
        Self::new()
    }
}
