use crate::assembler::{AssemblerStats, FrameAssembler};
use crate::command::{Command, CommandSink, DataMode};
use crate::config::DecoderConfig;
use crate::constants::CHANNEL_COUNT;
use crate::error::BciError;
use crate::port::{PortClaim, PortRegistry};
use crate::queue::{PacketQueue, StallEvent};
use crate::sample::DecodedPacket;
use crate::source::ByteSource;
use std::io::Write;
use tracing::{info, trace};

/// Most bytes taken from the link in a single update; anything beyond waits for the next tick.
const MAX_READ_CHUNK: usize = 4096;

/// A session with one OpenBCI board.
///
/// The session is driven from the caller's loop: call [`OpenBci::update`] once per
/// tick to pull whatever the link has buffered, then [`OpenBci::drain`] to collect
/// the decoded packets. Nothing here blocks or spawns threads.
pub struct OpenBci<P> {
    link: Option<P>,
    claim: Option<PortClaim>,
    assembler: FrameAssembler,
    queue: PacketQueue,
    read_buf: Vec<u8>,
    config: DecoderConfig,
    filters_enabled: bool,
    enabled_channels: [bool; CHANNEL_COUNT],
    streaming: bool,
}

impl<P> OpenBci<P> {
    /// Create a session with no link attached
    pub fn new(config: DecoderConfig) -> Self {
        Self {
            link: None,
            claim: None,
            assembler: FrameAssembler::with_max_leftover(config.max_leftover_bytes),
            queue: PacketQueue::new(config.max_missed_cycles),
            read_buf: Vec::new(),
            config,
            filters_enabled: false,
            enabled_channels: [true; CHANNEL_COUNT],
            streaming: false,
        }
    }

    /// Attach a link that is not tracked in any registry
    pub fn attach(&mut self, link: P) {
        self.link = Some(link);
    }

    /// Claim `port_name` in `registry` and attach `link` for it.
    ///
    /// Fails with [`BciError::PortInUse`] if another session owns the port; the
    /// current link, if any, is left untouched in that case.
    pub fn attach_claimed(&mut self, registry: &PortRegistry, port_name: &str, link: P) -> Result<(), BciError> {
        let claim = registry.claim(port_name)?;
        self.detach();
        self.claim = Some(claim);
        self.link = Some(link);
        info!(port = port_name, "Board session attached");
        Ok(())
    }

    /// Detach the link, release its port claim and drop any partial frame.
    pub fn detach(&mut self) -> Option<P> {
        self.claim = None;
        self.streaming = false;
        self.assembler.reset();
        self.link.take()
    }

    pub fn is_attached(&self) -> bool {
        self.link.is_some()
    }

    pub fn port_name(&self) -> Option<&str> {
        self.claim.as_ref().map(PortClaim::port)
    }

    /// Direct access to the link, e.g. to inspect an in-memory source
    pub fn link_mut(&mut self) -> Option<&mut P> {
        self.link.as_mut()
    }

    /// Remove and return every decoded packet, oldest first. Never blocks.
    ///
    /// An empty result counts toward stall detection; see [`OpenBci::take_stall`].
    pub fn drain(&mut self) -> Vec<DecodedPacket> {
        self.queue.drain()
    }

    pub fn has_data(&self) -> bool {
        self.queue.has_data()
    }

    /// Returns the stall signal once per threshold crossing.
    pub fn take_stall(&mut self) -> Option<StallEvent> {
        self.queue.take_stall()
    }

    /// Tell the session the caller has restarted the stream after a stall
    pub fn acknowledge_restart(&mut self) {
        self.queue.acknowledge_restart();
    }

    pub fn missed_cycles(&self) -> u32 {
        self.queue.missed_cycles()
    }

    pub fn stats(&self) -> AssemblerStats {
        self.assembler.stats()
    }

    pub fn leftover_len(&self) -> usize {
        self.assembler.leftover_len()
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    pub fn data_mode(&self) -> DataMode {
        self.config.data_mode
    }

    /// Takes effect on the next `start_streaming`
    pub fn set_data_mode(&mut self, mode: DataMode) {
        self.config.data_mode = mode;
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn filters_enabled(&self) -> bool {
        self.filters_enabled
    }

    pub fn enabled_channels(&self) -> [bool; CHANNEL_COUNT] {
        self.enabled_channels
    }
}

impl<P: ByteSource> OpenBci<P> {
    /// Pull buffered bytes from the link and decode every completed frame.
    ///
    /// Returns the number of packets queued by this call. A link that is not ready
    /// yields `Ok(0)`; calling this with no link attached is a caller bug and
    /// yields [`BciError::SourceNotAttached`].
    pub fn update(&mut self) -> Result<usize, BciError> {
        let link = self.link.as_mut().ok_or(BciError::SourceNotAttached)?;
        let Some(available) = link.bytes_available()? else {
            return Ok(0);
        };
        if available == 0 {
            return Ok(0);
        }

        self.read_buf.resize(available.min(MAX_READ_CHUNK), 0);
        let n = link.read_bytes(&mut self.read_buf)?;
        let raw = &self.read_buf[..n];
        if self.config.echo_bytes {
            trace!(bytes = hex::encode(raw), "Serial read");
        }

        let packets = self.assembler.push(raw);
        let count = packets.len();
        self.queue.extend(packets);
        Ok(count)
    }
}

impl<P: Write> OpenBci<P> {
    /// Send a single command byte. No acknowledgment is read back.
    pub fn send(&mut self, command: Command) -> Result<(), BciError> {
        self.link
            .as_mut()
            .ok_or(BciError::SourceNotAttached)?
            .send_command(command)
    }

    /// Start streaming in the configured data mode
    pub fn start_streaming(&mut self) -> Result<(), BciError> {
        self.send(Command::StartStreaming(self.config.data_mode))?;
        self.streaming = true;
        self.queue.acknowledge_restart();
        Ok(())
    }

    pub fn stop_streaming(&mut self) -> Result<(), BciError> {
        self.send(Command::StopStreaming)?;
        self.streaming = false;
        self.assembler.reset();
        Ok(())
    }

    /// Enable or disable a channel, 0-based
    pub fn set_channel(&mut self, channel: usize, enabled: bool) -> Result<(), BciError> {
        self.send(Command::set_channel(channel, enabled))?;
        self.enabled_channels[channel] = enabled;
        Ok(())
    }

    pub fn set_filters(&mut self, enabled: bool) -> Result<(), BciError> {
        self.send(Command::set_filters(enabled))?;
        self.filters_enabled = enabled;
        Ok(())
    }

    pub fn trigger_test_signal(&mut self) -> Result<(), BciError> {
        self.send(Command::TriggerTestSignal)
    }
}
