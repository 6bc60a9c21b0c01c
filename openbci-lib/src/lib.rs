pub mod assembler;
pub mod command;
pub mod config;
pub mod constants;
pub mod device;
pub mod error;
pub mod port;
pub mod queue;
pub mod sample;
pub mod source;


// Re-export the main types for easy access
pub use assembler::{AssemblerStats, FrameAssembler};
pub use command::{Command, CommandSink, DataMode};
pub use config::DecoderConfig;
pub use device::OpenBci;
pub use error::BciError;
pub use port::{PortClaim, PortRegistry};
pub use queue::{LivenessMonitor, PacketQueue, StallEvent};
pub use sample::DecodedPacket;
pub use source::{ByteSource, MemorySource};
