//! Inbound commands to the application service.
//!
//! These represent things that happened outside the core (a sensor line,
//! a timer, the operator) that the [`AppService`](super::service::AppService)
//! interprets and acts upon.

use crate::sensors::SensorEvent;

/// Commands that the runtime sends into the application core.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppCommand {
    /// A decoded sensor event.
    Sensor(SensorEvent),

    /// The verification interval elapsed.
    VerifyTick,

    /// The operator asked to stop.
    Quit,
}
