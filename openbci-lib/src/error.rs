use std::io;
use thiserror::Error;

/// The primary error type for the `openbci-lib` library.
#[derive(Error, Debug)]
pub enum BciError {
    /// `update` was called before a byte source was attached. This is a caller bug,
    /// never a transient condition.
    #[error("No byte source attached to the decoder")]
    SourceNotAttached,

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Invalid frame: {0}")]
    InvalidFrame(String),

    #[error("Channel {channel} out of range (board has {count} channels)")]
    InvalidChannel { channel: usize, count: usize },

    #[error("Unknown command byte: {0:#04x}")]
    UnknownCommand(u8),

    #[error("Port {0} is already claimed by another session")]
    PortInUse(String),
}
