use crate::constants::DEFAULT_MAX_MISSED_CYCLES;
use crate::sample::DecodedPacket;
use std::collections::VecDeque;
use tracing::warn;

/// Raised once each time the empty-poll counter reaches its threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallEvent {
    /// Consecutive empty polls that triggered the event
    pub missed_cycles: u32,
}

/// Counts consecutive polls that produced no packets.
///
/// The monitor only reports; restarting the stream is up to the caller, since a
/// restart is pointless when the link itself is gone.
#[derive(Debug, Clone)]
pub struct LivenessMonitor {
    missed_cycles: u32,
    /// 0 disables stall detection
    threshold: u32,
}

impl LivenessMonitor {
    pub fn new(threshold: u32) -> Self {
        Self {
            missed_cycles: 0,
            threshold,
        }
    }

    /// Record the outcome of one poll. Returns an event on the poll that reaches the threshold.
    pub fn record_poll(&mut self, produced: usize) -> Option<StallEvent> {
        if produced > 0 {
            self.missed_cycles = 0;
            return None;
        }

        self.missed_cycles = self.missed_cycles.saturating_add(1);
        if self.threshold == 0 || self.missed_cycles < self.threshold {
            return None;
        }

        let event = StallEvent {
            missed_cycles: self.missed_cycles,
        };
        warn!(missed_cycles = self.missed_cycles, "No data from board, stream appears stalled");
        self.missed_cycles = 0;
        Some(event)
    }

    pub fn reset(&mut self) {
        self.missed_cycles = 0;
    }

    pub fn missed_cycles(&self) -> u32 {
        self.missed_cycles
    }
}

impl Default for LivenessMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MISSED_CYCLES)
    }
}

/// FIFO of decoded packets, drained in full by the consumer on every poll.
#[derive(Debug, Default)]
pub struct PacketQueue {
    packets: VecDeque<DecodedPacket>,
    liveness: LivenessMonitor,
    pending_stall: Option<StallEvent>,
}

impl PacketQueue {
    pub fn new(max_missed_cycles: u32) -> Self {
        Self {
            packets: VecDeque::new(),
            liveness: LivenessMonitor::new(max_missed_cycles),
            pending_stall: None,
        }
    }

    pub fn extend(&mut self, packets: impl IntoIterator<Item = DecodedPacket>) {
        self.packets.extend(packets);
    }

    /// Remove and return everything queued, oldest first. Never blocks.
    pub fn drain(&mut self) -> Vec<DecodedPacket> {
        let packets: Vec<DecodedPacket> = self.packets.drain(..).collect();
        if let Some(event) = self.liveness.record_poll(packets.len()) {
            self.pending_stall = Some(event);
        }
        packets
    }

    pub fn has_data(&self) -> bool {
        !self.packets.is_empty()
    }

    /// Take the pending stall signal, if any. Returns `Some` at most once per threshold crossing.
    pub fn take_stall(&mut self) -> Option<StallEvent> {
        self.pending_stall.take()
    }

    /// The caller restarted the stream: start counting empty polls from zero again.
    pub fn acknowledge_restart(&mut self) {
        self.liveness.reset();
        self.pending_stall = None;
    }

    pub fn missed_cycles(&self) -> u32 {
        self.liveness.missed_cycles()
    }
}
