//! Sobriety sensor input: the [`SensorChannel`].
//!
//! The microcontroller prints one text line per breath test.  Only the
//! exact literal `NO_ALCOHOL` is significant; everything else is echoed
//! for the operator and otherwise ignored.
//!
//! A flaky or unplugged link must not stop the control loop: decode
//! failures yield [`SensorEvent::None`], and a read error after startup
//! latches the channel into a degraded state that returns
//! [`SensorEvent::None`] forever.

use heapless::Deque;
use log::{debug, error, info, warn};

use crate::app::ports::SensorPort;
use crate::link::codec::{Decoded, LineDecoder};
use crate::link::transport::Transport;

/// The one line that starts an enrollment.
pub const SOBER_LINE: &str = "NO_ALCOHOL";

/// Bytes pulled from the transport per read.
const READ_CHUNK: usize = 64;

/// Decoded events waiting to be handed out by [`SensorChannel::poll`].
const PENDING_CAP: usize = 8;

/// One decoded sensor event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorEvent {
    /// No complete line available (or the line could not be decoded).
    None,
    /// The breath test passed.
    SoberDetected,
    /// A complete line that is not significant.
    Unrecognized,
}

impl SensorEvent {
    /// Map a decoded line to an event by exact match.
    pub fn classify(line: &str) -> Self {
        if line == SOBER_LINE {
            Self::SoberDetected
        } else {
            Self::Unrecognized
        }
    }

    /// Whether the event can drive a state transition.
    pub fn is_significant(self) -> bool {
        matches!(self, Self::SoberDetected)
    }
}

/// Line-oriented sensor reader over a [`Transport`].
pub struct SensorChannel<T: Transport> {
    transport: Option<T>,
    decoder: LineDecoder,
    pending: Deque<SensorEvent, PENDING_CAP>,
    degraded: bool,
}

impl<T: Transport> SensorChannel<T> {
    /// Wrap an already-open transport.  Opening is the caller's job and
    /// is fatal on failure.
    pub fn new(transport: T) -> Self {
        Self {
            transport: Some(transport),
            decoder: LineDecoder::new(),
            pending: Deque::new(),
            degraded: false,
        }
    }

    /// Drain whatever bytes the transport has right now into `pending`.
    fn fill(&mut self) {
        let Some(transport) = self.transport.as_mut() else {
            return;
        };
        if self.degraded {
            return;
        }

        let mut buf = [0u8; READ_CHUNK];
        loop {
            let n = match transport.read(&mut buf) {
                Ok(0) => return,
                Ok(n) => n,
                Err(e) => {
                    error!("Sensor link lost ({}); no further sensor events", e);
                    self.degraded = true;
                    self.decoder.reset();
                    return;
                }
            };

            for &byte in &buf[..n] {
                let event = match self.decoder.push(byte) {
                    None => continue,
                    Some(Decoded::Line(line)) => {
                        info!("Sensor message: '{}'", line);
                        SensorEvent::classify(line)
                    }
                    Some(Decoded::Malformed) => {
                        warn!("Sensor: undecodable line dropped");
                        continue;
                    }
                    Some(Decoded::Overflow) => {
                        warn!("Sensor: over-long line dropped");
                        continue;
                    }
                };
                if self.pending.push_back(event).is_err() {
                    debug!("Sensor: event queue full, dropping {:?}", event);
                }
            }

            if n < buf.len() {
                return;
            }
        }
    }

    /// Release the underlying transport.  Idempotent.
    pub fn close(&mut self) {
        if self.transport.take().is_some() {
            info!("Sensor link closed");
        }
        self.pending.clear();
    }

    pub fn is_closed(&self) -> bool {
        self.transport.is_none()
    }
}

impl<T: Transport> SensorPort for SensorChannel<T> {
    fn poll(&mut self) -> SensorEvent {
        if self.pending.is_empty() {
            self.fill();
        }
        self.pending.pop_front().unwrap_or(SensorEvent::None)
    }

    fn is_degraded(&self) -> bool {
        self.degraded
    }

    fn close(&mut self) {
        SensorChannel::close(self);
    }
}
