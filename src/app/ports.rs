//! Port traits: the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (serial link, cameras, face encoder, clock, event
//! sinks) implement these traits.  The [`AppService`](super::service::AppService)
//! consumes them via generics, so the domain core never touches a device
//! directly and every test can run against mocks.

use std::time::Duration;

use crate::config::SystemConfig;
use crate::drivers::camera::Frame;
use crate::drivers::relay::ActuatorCommand;
use crate::error::{CaptureError, ConfigError, EncoderError, LinkError};
use crate::scheduler::TimerId;
use crate::sensors::SensorEvent;
use crate::vision::EncodedFace;

// ───────────────────────────────────────────────────────────────
// Sensor port (driven adapter: microcontroller → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the sobriety sensor.
pub trait SensorPort {
    /// Next decoded event, or [`SensorEvent::None`] immediately if no
    /// complete line is available.  Never blocks, never fails.
    fn poll(&mut self) -> SensorEvent;

    /// True once the link has failed after startup.
    fn is_degraded(&self) -> bool;

    /// Release the connection.  Idempotent.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Camera port (driven adapter: video device → domain)
// ───────────────────────────────────────────────────────────────

/// An opened camera.  Opening happens in the adapter's constructor.
pub trait CameraPort {
    /// Human-readable identity for status messages.
    fn label(&self) -> &str;

    /// Grab a single frame.
    ///
    /// [`CaptureError::NoFrame`] is the transient condition that
    /// [`capture_with_retry`](crate::drivers::camera::capture_with_retry)
    /// retries; any other error ends the capture at once.
    fn grab(&mut self) -> Result<Frame, CaptureError>;

    /// Release the device.  Idempotent.
    fn release(&mut self);

    fn is_released(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Face encoder port (driven adapter: embedding function → domain)
// ───────────────────────────────────────────────────────────────

/// The black-box detector/encoder.
pub trait FaceEncoderPort {
    /// Detect faces in `frame` and encode each one, in detector order.
    /// An empty list means no face was found.
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedFace>, EncoderError>;
}

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → microcontroller)
// ───────────────────────────────────────────────────────────────

/// Write-side port for relay commands.  Fire-and-forget: a failed send
/// is reported to the caller but never retried.
pub trait ActuatorPort {
    fn send(&mut self, command: ActuatorCommand) -> Result<(), LinkError>;

    /// Release the connection.  Idempotent.
    fn close(&mut self);
}

// ───────────────────────────────────────────────────────────────
// Clock port (driven adapter: time and cancellable waiting)
// ───────────────────────────────────────────────────────────────

/// Monotonic time plus the only place the domain is allowed to wait.
pub trait ClockPort {
    /// Time since the clock was created.
    fn now(&self) -> Duration;

    /// Wait for `duration`.  Returns `false` if a shutdown was requested
    /// before or during the wait.
    fn pause(&mut self, duration: Duration) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → operator / logging)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go.
pub trait EventSink {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// Configuration port
// ───────────────────────────────────────────────────────────────

/// Loads the startup configuration.
///
/// Implementations MUST validate before returning; invalid ranges are
/// rejected with [`ConfigError::ValidationFailed`], not clamped.
pub trait ConfigPort {
    fn load(&self) -> Result<SystemConfig, ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Scheduler delegate (decouples scheduler from the control loop)
// ───────────────────────────────────────────────────────────────

/// Callback trait that the scheduler invokes when a timer fires.
pub trait SchedulerDelegate {
    fn on_timer_fired(&mut self, timer: TimerId);
}
