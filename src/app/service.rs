//! Application service: the hexagonal core.
//!
//! [`AppService`] owns the FSM, its shared context and every device the
//! control loop talks to.  Devices are injected at construction as port
//! implementations; the clock and the event sink are passed at call
//! sites.  Nothing else holds a device handle, so all state changes are
//! serialized through this one owner.
//!
//! ```text
//!  SensorPort ──▶ ┌──────────────────────────┐ ──▶ EventSink
//!  CameraPort ──▶ │        AppService        │
//!  FaceEncoder ─▶ │  FSM · capture · relay   │ ──▶ ActuatorPort
//!                 └──────────────────────────┘
//! ```

use std::time::Duration;

use log::{debug, error, info};

use crate::config::SystemConfig;
use crate::drivers::camera::{RetryPolicy, capture_with_retry};
use crate::drivers::relay::ActuatorCommand;
use crate::fsm::context::{FsmContext, Observation, Stimulus};
use crate::fsm::states::build_state_table;
use crate::fsm::{Fsm, StateId};
use crate::sensors::SensorEvent;
use crate::vision::{FaceMatcher, MatchDecision};

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, CameraPort, ClockPort, EventSink, FaceEncoderPort, SensorPort};

/// Every device the service drives, already opened.
pub struct Devices<S, C, F, A> {
    pub sensor: S,
    pub enroll_camera: C,
    pub verify_camera: C,
    pub encoder: F,
    pub actuator: A,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CameraRole {
    Enrollment,
    Verification,
}

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService<S, C, F, A>
where
    S: SensorPort,
    C: CameraPort,
    F: FaceEncoderPort,
    A: ActuatorPort,
{
    fsm: Fsm,
    ctx: FsmContext,
    sensor: S,
    enroll_camera: C,
    verify_camera: C,
    matcher: FaceMatcher<F>,
    actuator: A,
    retry: RetryPolicy,
    commands_sent: u64,
    degraded_reported: bool,
    stopped: bool,
}

impl<S, C, F, A> AppService<S, C, F, A>
where
    S: SensorPort,
    C: CameraPort,
    F: FaceEncoderPort,
    A: ActuatorPort,
{
    /// Construct the service from configuration and opened devices.
    ///
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: SystemConfig, devices: Devices<S, C, F, A>) -> Self {
        let retry = RetryPolicy::from_config(&config);
        let ctx = FsmContext::new(config);
        let fsm = Fsm::new(build_state_table(), StateId::Idle);

        Self {
            fsm,
            ctx,
            sensor: devices.sensor,
            enroll_camera: devices.enroll_camera,
            verify_camera: devices.verify_camera,
            matcher: FaceMatcher::new(devices.encoder),
            actuator: devices.actuator,
            retry,
            commands_sent: 0,
            degraded_reported: false,
            stopped: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    /// Start the FSM in its initial state (Idle).
    pub fn start(&mut self, sink: &mut impl EventSink) {
        self.fsm.start(&mut self.ctx);
        sink.emit(&AppEvent::Started(self.fsm.current_state()));
        info!("AppService started in {:?}", self.fsm.current_state());
    }

    /// End the current cycle and release every device.  Idempotent.
    pub fn shutdown(&mut self, sink: &mut impl EventSink) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        let prev = self.fsm.current_state();
        self.fsm.force_transition(StateId::Idle, &mut self.ctx);
        self.ctx.pending = None;
        if prev != StateId::Idle {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: StateId::Idle,
            });
        }

        self.enroll_camera.release();
        self.verify_camera.release();
        self.sensor.close();
        self.actuator.close();

        info!("AppService stopped after {} commands", self.commands_sent);
        sink.emit(&AppEvent::Stopped);
    }

    // ── Inputs ────────────────────────────────────────────────

    /// Read at most one sensor event and act on it.
    pub fn poll_sensor(&mut self, clock: &mut impl ClockPort, sink: &mut impl EventSink) {
        if self.stopped {
            return;
        }
        let event = self.sensor.poll();

        if self.sensor.is_degraded() && !self.degraded_reported {
            self.degraded_reported = true;
            sink.emit(&AppEvent::SensorDegraded);
        }

        if event != SensorEvent::None {
            self.handle_command(AppCommand::Sensor(event), clock, sink);
        }
    }

    /// Process a command from the runtime.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        if self.stopped {
            return;
        }
        match cmd {
            AppCommand::Sensor(event) => self.on_sensor_event(event, clock, sink),
            AppCommand::VerifyTick => {
                if self.fsm.current_state() == StateId::Verifying {
                    let observation = self.observe(CameraRole::Verification, clock, sink);
                    self.step(Stimulus::Verification(observation), sink);
                } else {
                    debug!("Verify tick outside Verifying ignored");
                }
            }
            AppCommand::Quit => self.shutdown(sink),
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a status snapshot from the current context.
    pub fn build_telemetry(&self, uptime: Duration) -> TelemetryData {
        TelemetryData {
            state: self.fsm.current_state(),
            enrolled: self.ctx.is_enrolled(),
            last_decision: self.ctx.last_decision,
            last_distance: self.ctx.last_distance,
            cycles_completed: self.ctx.cycles_completed,
            commands_sent: self.commands_sent,
            sensor_degraded: self.sensor.is_degraded(),
            uptime,
        }
    }

    /// Current FSM state.
    pub fn state(&self) -> StateId {
        self.fsm.current_state()
    }

    pub fn is_enrolled(&self) -> bool {
        self.ctx.is_enrolled()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Relay commands successfully written since startup.
    pub fn commands_sent(&self) -> u64 {
        self.commands_sent
    }

    pub fn config(&self) -> &SystemConfig {
        &self.ctx.config
    }

    pub fn sensor(&self) -> &S {
        &self.sensor
    }

    pub fn actuator(&self) -> &A {
        &self.actuator
    }

    pub fn enroll_camera(&self) -> &C {
        &self.enroll_camera
    }

    pub fn verify_camera(&self) -> &C {
        &self.verify_camera
    }

    // ── Internal ──────────────────────────────────────────────

    fn on_sensor_event(
        &mut self,
        event: SensorEvent,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) {
        match event {
            SensorEvent::None => {}
            SensorEvent::Unrecognized => {
                debug!("Alcohol detected or no blow detected; waiting");
                sink.emit(&AppEvent::SensorUnrecognized);
            }
            SensorEvent::SoberDetected => {
                let state = self.fsm.current_state();
                let accepted = state == StateId::Idle;
                sink.emit(&AppEvent::SoberDetected { state, accepted });
                if !accepted {
                    return;
                }

                self.step(Stimulus::SoberDetected, sink);
                if self.fsm.current_state() == StateId::Enrolling {
                    let observation = self.observe(CameraRole::Enrollment, clock, sink);
                    self.step(Stimulus::Enrollment(observation), sink);
                }
            }
        }
    }

    /// Capture from one camera and encode the frame.
    fn observe(
        &mut self,
        role: CameraRole,
        clock: &mut impl ClockPort,
        sink: &mut impl EventSink,
    ) -> Observation {
        let camera = match role {
            CameraRole::Enrollment => &mut self.enroll_camera,
            CameraRole::Verification => &mut self.verify_camera,
        };

        let frame = match capture_with_retry(camera, self.retry, clock) {
            Ok(frame) => frame,
            Err(error) => {
                sink.emit(&AppEvent::CaptureFailed {
                    camera: camera.label().to_string(),
                    error,
                });
                return Observation::Unavailable;
            }
        };

        match self.matcher.detect_and_encode(&frame) {
            Ok(Some(embedding)) => Observation::Face(embedding),
            Ok(None) => Observation::NoFace,
            Err(e) => {
                sink.emit(&AppEvent::EncoderFailed(e));
                Observation::Unavailable
            }
        }
    }

    /// Feed one stimulus to the FSM and act on the result.
    fn step(&mut self, stimulus: Stimulus, sink: &mut impl EventSink) {
        let prev = self.fsm.current_state();
        let decisions = self.ctx.decisions;

        self.ctx.stimulus = Some(stimulus);
        self.fsm.tick(&mut self.ctx);
        let next = self.fsm.current_state();

        if prev == StateId::Enrolling && next == StateId::Verifying {
            if let Some(enrolled) = &self.ctx.enrolled {
                sink.emit(&AppEvent::FaceEnrolled {
                    dimensions: enrolled.dimensions(),
                    faces: enrolled.boxes.len(),
                });
            }
        }
        if self.ctx.decisions != decisions {
            if let Some(decision) = self.ctx.last_decision {
                sink.emit(&AppEvent::Decision {
                    decision,
                    distance: self.ctx.last_distance,
                    threshold: self.ctx.last_threshold,
                });
            }
        }

        self.apply_actuators(sink);

        if next != prev {
            sink.emit(&AppEvent::StateChanged {
                from: prev,
                to: next,
            });
        }
    }

    /// Send the command the FSM queued, if the relay safety rule allows it.
    ///
    /// `RELAY_ON` requires an enrolled identity and a `Match` as the most
    /// recent decision.
    fn apply_actuators(&mut self, sink: &mut impl EventSink) {
        let Some(command) = self.ctx.take_command() else {
            return;
        };

        if command == ActuatorCommand::RelayOn
            && !(self.ctx.is_enrolled() && self.ctx.last_decision == Some(MatchDecision::Match))
        {
            error!("Refusing {}: no confirmed match", command);
            sink.emit(&AppEvent::CommandSuppressed(command));
            return;
        }

        match self.actuator.send(command) {
            Ok(()) => {
                self.commands_sent += 1;
                sink.emit(&AppEvent::CommandSent(command));
            }
            Err(error) => sink.emit(&AppEvent::CommandFailed { command, error }),
        }
    }
}
