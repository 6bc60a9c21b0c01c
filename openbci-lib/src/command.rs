use crate::constants::CHANNEL_COUNT;
use crate::error::BciError;
use num_enum::{IntoPrimitive, TryFromPrimitive};
use std::fmt;
use std::io::Write;
use strum_macros::Display;
use tracing::info;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub const CMD_STOP: u8 = b's';
pub const CMD_ENABLE_FILTERS: u8 = b'F';
pub const CMD_DISABLE_FILTERS: u8 = b'f';
pub const CMD_TEST_SIGNAL: u8 = b'+';
pub const CMD_QUERY_SETTINGS: u8 = b'?';
pub const CMD_SOFT_RESET: u8 = b'v';

/// Indexed by channel, 0-based
pub const CMD_ENABLE_CHANNEL: [u8; CHANNEL_COUNT] = *b"!@#$%^&*";
pub const CMD_DISABLE_CHANNEL: [u8; CHANNEL_COUNT] = *b"12345678";

/// Streaming format requested from the board. The discriminant is the start command byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, IntoPrimitive, TryFromPrimitive)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "kebab-case"))]
#[repr(u8)]
pub enum DataMode {
    #[strum(to_string = "text")]
    Text = 0x78, // 'x'
    #[strum(to_string = "binary")]
    Binary = 0x62, // 'b'
    #[strum(to_string = "binary+aux")]
    BinaryWithAux = 0x6E, // 'n'
}

// num_enum treats a `#[default]` variant as the catch-all for unknown bytes, so no derive here
impl Default for DataMode {
    fn default() -> Self {
        DataMode::Binary
    }
}

/// Single-byte commands understood by the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    StartStreaming(DataMode),
    StopStreaming,
    EnableChannel(usize),
    DisableChannel(usize),
    EnableFilters,
    DisableFilters,
    TriggerTestSignal,
    QuerySettings,
    SoftReset,
}

impl Command {
    /// Wire byte for this command. Fails only for an out-of-range channel.
    pub fn to_byte(self) -> Result<u8, BciError> {
        let byte = match self {
            Command::StartStreaming(mode) => mode.into(),
            Command::StopStreaming => CMD_STOP,
            Command::EnableChannel(channel) => *CMD_ENABLE_CHANNEL.get(channel).ok_or(
                BciError::InvalidChannel {
                    channel,
                    count: CHANNEL_COUNT,
                },
            )?,
            Command::DisableChannel(channel) => *CMD_DISABLE_CHANNEL.get(channel).ok_or(
                BciError::InvalidChannel {
                    channel,
                    count: CHANNEL_COUNT,
                },
            )?,
            Command::EnableFilters => CMD_ENABLE_FILTERS,
            Command::DisableFilters => CMD_DISABLE_FILTERS,
            Command::TriggerTestSignal => CMD_TEST_SIGNAL,
            Command::QuerySettings => CMD_QUERY_SETTINGS,
            Command::SoftReset => CMD_SOFT_RESET,
        };
        Ok(byte)
    }

    pub fn set_channel(channel: usize, enabled: bool) -> Self {
        if enabled {
            Command::EnableChannel(channel)
        } else {
            Command::DisableChannel(channel)
        }
    }

    pub fn set_filters(enabled: bool) -> Self {
        if enabled {
            Command::EnableFilters
        } else {
            Command::DisableFilters
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::StartStreaming(mode) => write!(f, "start streaming ({})", mode),
            Command::StopStreaming => write!(f, "stop streaming"),
            Command::EnableChannel(channel) => write!(f, "enable channel {}", channel),
            Command::DisableChannel(channel) => write!(f, "disable channel {}", channel),
            Command::EnableFilters => write!(f, "enable filters"),
            Command::DisableFilters => write!(f, "disable filters"),
            Command::TriggerTestSignal => write!(f, "trigger test signal"),
            Command::QuerySettings => write!(f, "query settings"),
            Command::SoftReset => write!(f, "soft reset"),
        }
    }
}

impl TryFrom<u8> for Command {
    type Error = BciError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        if let Ok(mode) = DataMode::try_from(byte) {
            return Ok(Command::StartStreaming(mode));
        }
        if let Some(channel) = CMD_ENABLE_CHANNEL.iter().position(|&b| b == byte) {
            return Ok(Command::EnableChannel(channel));
        }
        if let Some(channel) = CMD_DISABLE_CHANNEL.iter().position(|&b| b == byte) {
            return Ok(Command::DisableChannel(channel));
        }
        match byte {
            CMD_STOP => Ok(Command::StopStreaming),
            CMD_ENABLE_FILTERS => Ok(Command::EnableFilters),
            CMD_DISABLE_FILTERS => Ok(Command::DisableFilters),
            CMD_TEST_SIGNAL => Ok(Command::TriggerTestSignal),
            CMD_QUERY_SETTINGS => Ok(Command::QuerySettings),
            CMD_SOFT_RESET => Ok(Command::SoftReset),
            other => Err(BciError::UnknownCommand(other)),
        }
    }
}

/// Fire-and-forget command output. The board never acknowledges a command, so a
/// successful return only means the byte reached the sink.
pub trait CommandSink {
    fn send_command(&mut self, command: Command) -> Result<(), BciError>;
}

impl<W: Write + ?Sized> CommandSink for W {
    fn send_command(&mut self, command: Command) -> Result<(), BciError> {
        let byte = command.to_byte()?;
        self.write_all(&[byte])?;
        self.flush()?;
        info!(byte = %(byte as char), "Sent {}", command);
        Ok(())
    }
}
