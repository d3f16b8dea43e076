//! Relay command link: the `ActuatorLink`.
//!
//! Sends newline-terminated ASCII commands to the microcontroller, which
//! drives the ignition relay.
//!
//! ## Safety contract
//!
//! This driver is a dumb actuator.  The rule that `RELAY_ON` only follows
//! a confirmed match is enforced by the application service before a
//! command ever reaches [`ActuatorLink::send`].

use log::{debug, info, warn};

use crate::app::ports::ActuatorPort;
use crate::error::LinkError;
use crate::link::codec::encode_line;
use crate::link::transport::Transport;

/// Commands understood by the microcontroller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActuatorCommand {
    /// Close the relay (`RELAY_ON`).
    RelayOn,
    /// Open the relay (`RELAY_OFF`).
    RelayOff,
    /// Enrollment succeeded (`MATCHED`).
    MatchAcknowledged,
}

impl ActuatorCommand {
    /// Wire text, without the terminator.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RelayOn => "RELAY_ON",
            Self::RelayOff => "RELAY_OFF",
            Self::MatchAcknowledged => "MATCHED",
        }
    }
}

impl core::fmt::Display for ActuatorCommand {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Longest encoded command plus terminator.
const CMD_BUF: usize = 16;

/// Write-only command channel over a [`Transport`].
pub struct ActuatorLink<T: Transport> {
    transport: Option<T>,
    sent: u64,
}

impl<T: Transport> ActuatorLink<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            sent: 0,
        }
    }

    /// Commands successfully written since startup.
    pub fn sent_count(&self) -> u64 {
        self.sent
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }

    /// Borrow the transport (e.g. to inspect a test double).
    pub fn transport(&self) -> Option<&T> {
        self.transport.as_ref()
    }

    fn write_all(transport: &mut T, mut data: &[u8]) -> Result<(), LinkError> {
        while !data.is_empty() {
            match transport.write(data)? {
                0 => return Err(LinkError::Io("write returned zero bytes".into())),
                n => data = &data[n..],
            }
        }
        transport.flush()
    }
}

impl<T: Transport> ActuatorPort for ActuatorLink<T> {
    fn send(&mut self, command: ActuatorCommand) -> Result<(), LinkError> {
        let Some(transport) = self.transport.as_mut() else {
            warn!("Relay: {} dropped, link closed", command);
            return Err(LinkError::Closed);
        };

        let mut buf = [0u8; CMD_BUF];
        let Some(len) = encode_line(command.as_str(), &mut buf) else {
            return Err(LinkError::Io("command does not fit the line buffer".into()));
        };

        match Self::write_all(transport, &buf[..len]) {
            Ok(()) => {
                self.sent += 1;
                debug!("Relay: sent {}", command);
                Ok(())
            }
            Err(e) => {
                warn!("Relay: {} not delivered ({}); not retrying", command, e);
                Err(e)
            }
        }
    }

    fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Relay link closed after {} commands", self.sent);
        }
    }
}
