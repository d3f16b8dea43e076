//! Transport abstraction: any byte-oriented channel.
//!
//! Concrete implementations:
//! - USB/UART serial to the microcontroller ([`SerialTransport`](crate::adapters::serial::SerialTransport))
//! - In-memory loopback for tests ([`MemoryTransport`])
//!
//! [`SensorChannel`](crate::sensors::SensorChannel) and
//! [`ActuatorLink`](crate::drivers::relay::ActuatorLink) are generic over
//! `Transport`, so neither knows what device sits underneath.

use std::collections::VecDeque;

use crate::error::LinkError;

/// Byte-oriented transport channel.
pub trait Transport {
    /// Read up to `buf.len()` bytes into `buf`.
    /// Returns the number of bytes actually read.
    /// Returns 0 if no data is available (non-blocking).
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError>;

    /// Write `data` to the transport.
    /// Returns the number of bytes actually written.
    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError>;

    /// Flush any buffered output.
    fn flush(&mut self) -> Result<(), LinkError>;

    /// Check if data is available for reading.
    fn available(&self) -> bool;
}

/// In-memory transport: scripted inbound bytes, recorded outbound bytes.
///
/// Optionally fails every read/write to exercise the degraded paths.
#[derive(Debug, Default)]
pub struct MemoryTransport {
    rx: VecDeque<u8>,
    tx: Vec<u8>,
    fail_reads: bool,
    fail_writes: bool,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue bytes to be returned by subsequent reads.
    pub fn push_rx(&mut self, data: &[u8]) {
        self.rx.extend(data);
    }

    /// Everything written so far.
    pub fn written(&self) -> &[u8] {
        &self.tx
    }

    pub fn set_fail_reads(&mut self, fail: bool) {
        self.fail_reads = fail;
    }

    pub fn set_fail_writes(&mut self, fail: bool) {
        self.fail_writes = fail;
    }
}

impl Transport for MemoryTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        if self.fail_reads {
            return Err(LinkError::Io("device unplugged".into()));
        }
        let n = buf.len().min(self.rx.len());
        for (slot, byte) in buf.iter_mut().zip(self.rx.drain(..n)) {
            *slot = byte;
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        if self.fail_writes {
            return Err(LinkError::Io("write failed".into()));
        }
        self.tx.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        Ok(())
    }

    fn available(&self) -> bool {
        !self.rx.is_empty()
    }
}
