//! Byte source contract and an in-memory implementation for replays and tests.

use bytes::{Buf, BytesMut};
use std::io::{self, Write};

/// Non-blocking provider of raw bytes from the board link.
pub trait ByteSource {
    /// Number of bytes that can be read right now without blocking.
    ///
    /// `Ok(None)` means the link is not ready yet. That is a normal condition,
    /// distinct from an I/O failure.
    fn bytes_available(&mut self) -> io::Result<Option<usize>>;

    /// Read up to `buf.len()` already-buffered bytes. Must not block.
    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn bytes_available(&mut self) -> io::Result<Option<usize>> {
        (**self).bytes_available()
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (**self).read_bytes(buf)
    }
}

/// In-memory link that hands out its pending bytes at most `chunk_size` at a time
/// and records every byte written to it.
#[derive(Debug)]
pub struct MemorySource {
    pending: BytesMut,
    chunk_size: Option<usize>,
    ready: bool,
    written: Vec<u8>,
}

impl MemorySource {
    pub fn new(data: &[u8]) -> Self {
        Self {
            pending: BytesMut::from(data),
            chunk_size: None,
            ready: true,
            written: Vec::new(),
        }
    }

    /// Limit how many bytes a single poll can see
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size.max(1));
        self
    }

    /// Append bytes as if they had just arrived on the link
    pub fn feed(&mut self, data: &[u8]) {
        self.pending.extend_from_slice(data);
    }

    /// While not ready, `bytes_available` reports `None`
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
    }

    pub fn is_exhausted(&self) -> bool {
        self.pending.is_empty()
    }

    /// Everything written to this link so far (command bytes)
    pub fn written(&self) -> &[u8] {
        &self.written
    }
}

impl ByteSource for MemorySource {
    fn bytes_available(&mut self) -> io::Result<Option<usize>> {
        if !self.ready {
            return Ok(None);
        }
        let available = match self.chunk_size {
            Some(chunk) => self.pending.len().min(chunk),
            None => self.pending.len(),
        };
        Ok(Some(available))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = buf.len().min(self.pending.len());
        self.pending.copy_to_slice(&mut buf[..n]);
        Ok(n)
    }
}

impl Write for MemorySource {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.written.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
