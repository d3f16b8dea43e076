//! Serial [`Transport`] over a USB/UART device.
//!
//! The microcontroller sends sensor lines and receives relay commands on
//! the same device.  [`SerialTransport::try_clone`] hands out a second
//! handle to the same OS port so the sensor reader and the relay writer
//! each own one.

use std::io::{ErrorKind, Read, Write};
use std::time::Duration;

use log::info;
use serialport::SerialPort;

use crate::error::LinkError;
use crate::link::transport::Transport;

pub struct SerialTransport {
    port: Box<dyn SerialPort>,
    path: String,
}

fn io_err(e: impl core::fmt::Display) -> LinkError {
    LinkError::Io(e.to_string())
}

impl SerialTransport {
    /// Open `path` at `baud`.  Failure here is fatal for the caller.
    pub fn open(path: &str, baud: u32, timeout: Duration) -> Result<Self, LinkError> {
        let port = serialport::new(path, baud)
            .timeout(timeout)
            .open()
            .map_err(|e| LinkError::Open {
                port: path.to_string(),
                reason: e.to_string(),
            })?;
        info!("Serial: opened {} at {} baud", path, baud);
        Ok(Self {
            port,
            path: path.to_string(),
        })
    }

    /// Second handle to the same device.
    pub fn try_clone(&self) -> Result<Self, LinkError> {
        let port = self.port.try_clone().map_err(|e| LinkError::Open {
            port: self.path.clone(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            port,
            path: self.path.clone(),
        })
    }

    pub fn path(&self) -> &str {
        &self.path
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, LinkError> {
        let ready = self.port.bytes_to_read().map_err(io_err)? as usize;
        if ready == 0 || buf.is_empty() {
            return Ok(0);
        }
        let len = ready.min(buf.len());
        match self.port.read(&mut buf[..len]) {
            Ok(n) => Ok(n),
            Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => Ok(0),
            Err(e) => Err(io_err(e)),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize, LinkError> {
        self.port.write(data).map_err(io_err)
    }

    fn flush(&mut self) -> Result<(), LinkError> {
        self.port.flush().map_err(io_err)
    }

    fn available(&self) -> bool {
        self.port.bytes_to_read().is_ok_and(|n| n > 0)
    }
}
