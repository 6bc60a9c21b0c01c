use openbci_lib::ByteSource;
use serialport::SerialPort;
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

/// Serial connection to the board, optionally mirroring every received byte to a file.
pub struct SerialLink {
    port: Box<dyn SerialPort>,
    recorder: Option<BufWriter<File>>,
}

impl SerialLink {
    pub fn open(path: &str, baud_rate: u32) -> io::Result<Self> {
        let port = serialport::new(path, baud_rate)
            .timeout(Duration::from_millis(10))
            .open()?;
        Ok(Self { port, recorder: None })
    }

    /// Append every received byte to `path` for later replay
    pub fn record_to(&mut self, path: &Path) -> io::Result<()> {
        self.recorder = Some(BufWriter::new(File::create(path)?));
        Ok(())
    }
}

impl ByteSource for SerialLink {
    fn bytes_available(&mut self) -> io::Result<Option<usize>> {
        Ok(Some(self.port.bytes_to_read()? as usize))
    }

    fn read_bytes(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.port.read(buf)?;
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.write_all(&buf[..n])?;
        }
        Ok(n)
    }
}

impl Write for SerialLink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.port.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        if let Some(recorder) = self.recorder.as_mut() {
            recorder.flush()?;
        }
        self.port.flush()
    }
}
