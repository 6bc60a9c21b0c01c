use crate::command::DataMode;
use crate::constants::{DEFAULT_MAX_MISSED_CYCLES, MAX_LEFTOVER_BYTES};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Tunables for one board session
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecoderConfig {
    /// Cap on bytes carried between polls before they are discarded
    pub max_leftover_bytes: usize,
    /// Consecutive empty polls before a stall is reported (0 disables)
    pub max_missed_cycles: u32,
    /// Mode used by `start_streaming`
    pub data_mode: DataMode,
    /// Trace every received chunk as hex
    pub echo_bytes: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            max_leftover_bytes: MAX_LEFTOVER_BYTES,
            max_missed_cycles: DEFAULT_MAX_MISSED_CYCLES,
            data_mode: DataMode::default(),
            echo_bytes: false,
        }
    }
}
