//! Outbound application events.
//!
//! The [`AppService`](super::service::AppService) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them; the binary logs one status line per
//! event.

use std::time::Duration;

use crate::drivers::relay::ActuatorCommand;
use crate::error::{CaptureError, EncoderError, LinkError};
use crate::fsm::StateId;
use crate::vision::MatchDecision;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The application service has started (carries initial state).
    Started(StateId),

    /// The FSM transitioned between states.
    StateChanged { from: StateId, to: StateId },

    /// `NO_ALCOHOL` arrived; `accepted` is false outside `Idle`.
    SoberDetected { state: StateId, accepted: bool },

    /// A sensor line that does not start anything.
    SensorUnrecognized,

    /// The sensor link failed after startup; no more sensor events.
    SensorDegraded,

    /// A capture gave up.
    CaptureFailed { camera: String, error: CaptureError },

    /// The encoder could not process a frame.
    EncoderFailed(EncoderError),

    /// A reference face was stored.
    FaceEnrolled { dimensions: usize, faces: usize },

    /// Outcome of checking one frame.
    Decision {
        decision: MatchDecision,
        distance: Option<f64>,
        threshold: Option<f64>,
    },

    /// A relay command was written to the link.
    CommandSent(ActuatorCommand),

    /// A relay command could not be written (not retried).
    CommandFailed {
        command: ActuatorCommand,
        error: LinkError,
    },

    /// A command was blocked by the relay safety rule.
    CommandSuppressed(ActuatorCommand),

    /// Periodic status snapshot.
    Telemetry(TelemetryData),

    /// All devices released.
    Stopped,
}

/// A point-in-time status snapshot suitable for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct TelemetryData {
    pub state: StateId,
    pub enrolled: bool,
    pub last_decision: Option<MatchDecision>,
    pub last_distance: Option<f64>,
    pub cycles_completed: u64,
    pub commands_sent: u64,
    pub sensor_degraded: bool,
    pub uptime: Duration,
}
