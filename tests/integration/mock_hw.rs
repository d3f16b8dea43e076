//! Mock devices for integration tests.
//!
//! Every mock is a cheap clone around shared state, so a test can hand
//! one copy to the `AppService` and keep another to script outcomes and
//! inspect what happened (commands sent, grabs, releases).

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::Duration;

use soberguard::app::events::AppEvent;
use soberguard::app::ports::{
    ActuatorPort, CameraPort, ClockPort, EventSink, FaceEncoderPort, SensorPort,
};
use soberguard::app::service::{AppService, Devices};
use soberguard::config::SystemConfig;
use soberguard::drivers::camera::{Frame, FrameFormat};
use soberguard::drivers::relay::ActuatorCommand;
use soberguard::error::{CaptureError, EncoderError, LinkError};
use soberguard::sensors::SensorEvent;
use soberguard::shutdown::ShutdownSignal;
use soberguard::vision::{BoundingBox, EncodedFace};

// ── Sensor ────────────────────────────────────────────────────

#[derive(Default)]
pub struct SensorState {
    pub events: VecDeque<SensorEvent>,
    pub degraded: bool,
    pub closes: u32,
}

#[derive(Clone, Default)]
pub struct MockSensor(pub Rc<RefCell<SensorState>>);

impl MockSensor {
    pub fn push(&self, event: SensorEvent) {
        self.0.borrow_mut().events.push_back(event);
    }

    pub fn degrade(&self) {
        self.0.borrow_mut().degraded = true;
    }

    pub fn closes(&self) -> u32 {
        self.0.borrow().closes
    }
}

impl SensorPort for MockSensor {
    fn poll(&mut self) -> SensorEvent {
        let mut s = self.0.borrow_mut();
        if s.degraded {
            return SensorEvent::None;
        }
        s.events.pop_front().unwrap_or(SensorEvent::None)
    }

    fn is_degraded(&self) -> bool {
        self.0.borrow().degraded
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }
}

// ── Camera ────────────────────────────────────────────────────

#[derive(Default)]
pub struct CameraState {
    /// Scripted grabs; an empty script yields `NoFrame`.
    pub script: VecDeque<Result<Frame, CaptureError>>,
    pub grabs: u32,
    pub releases: u32,
    pub released: bool,
}

#[derive(Clone)]
pub struct MockCamera {
    label: String,
    pub state: Rc<RefCell<CameraState>>,
}

impl MockCamera {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            state: Rc::default(),
        }
    }

    pub fn push_frame(&self) {
        self.state.borrow_mut().script.push_back(Ok(frame()));
    }

    pub fn push_miss(&self) {
        self.state.borrow_mut().script.push_back(Err(CaptureError::NoFrame));
    }

    pub fn grabs(&self) -> u32 {
        self.state.borrow().grabs
    }

    pub fn releases(&self) -> u32 {
        self.state.borrow().releases
    }
}

impl CameraPort for MockCamera {
    fn label(&self) -> &str {
        &self.label
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        let mut s = self.state.borrow_mut();
        if s.released {
            return Err(CaptureError::Released);
        }
        s.grabs += 1;
        s.script.pop_front().unwrap_or(Err(CaptureError::NoFrame))
    }

    fn release(&mut self) {
        let mut s = self.state.borrow_mut();
        if !s.released {
            s.released = true;
            s.releases += 1;
        }
    }

    fn is_released(&self) -> bool {
        self.state.borrow().released
    }
}

// ── Encoder ───────────────────────────────────────────────────

#[derive(Default)]
pub struct EncoderState {
    /// Scripted replies; an empty script means "no face".
    pub script: VecDeque<Result<Vec<EncodedFace>, EncoderError>>,
    pub calls: u32,
}

#[derive(Clone, Default)]
pub struct MockEncoder(pub Rc<RefCell<EncoderState>>);

impl MockEncoder {
    pub fn push_face(&self, embedding: &[f64]) {
        self.0.borrow_mut().script.push_back(Ok(vec![face(embedding)]));
    }

    pub fn push_no_face(&self) {
        self.0.borrow_mut().script.push_back(Ok(Vec::new()));
    }

    pub fn push_error(&self, error: EncoderError) {
        self.0.borrow_mut().script.push_back(Err(error));
    }

    pub fn calls(&self) -> u32 {
        self.0.borrow().calls
    }
}

impl FaceEncoderPort for MockEncoder {
    fn encode(&mut self, _frame: &Frame) -> Result<Vec<EncodedFace>, EncoderError> {
        let mut s = self.0.borrow_mut();
        s.calls += 1;
        s.script.pop_front().unwrap_or(Ok(Vec::new()))
    }
}

// ── Actuator ──────────────────────────────────────────────────

#[derive(Default)]
pub struct ActuatorState {
    pub sent: Vec<ActuatorCommand>,
    pub fail: bool,
    pub closes: u32,
}

#[derive(Clone, Default)]
pub struct MockActuator(pub Rc<RefCell<ActuatorState>>);

impl MockActuator {
    pub fn sent(&self) -> Vec<ActuatorCommand> {
        self.0.borrow().sent.clone()
    }

    pub fn set_fail(&self, fail: bool) {
        self.0.borrow_mut().fail = fail;
    }

    pub fn closes(&self) -> u32 {
        self.0.borrow().closes
    }
}

impl ActuatorPort for MockActuator {
    fn send(&mut self, command: ActuatorCommand) -> Result<(), LinkError> {
        let mut s = self.0.borrow_mut();
        if s.fail {
            return Err(LinkError::Io("mock write failure".into()));
        }
        s.sent.push(command);
        Ok(())
    }

    fn close(&mut self) {
        self.0.borrow_mut().closes += 1;
    }
}

// ── Clock ─────────────────────────────────────────────────────

/// Virtual time: `pause` advances instantly.  Requests shutdown once
/// `quit_at` is reached.
pub struct MockClock {
    pub now: Duration,
    pub pauses: Vec<Duration>,
    pub quit_at: Option<Duration>,
    pub signal: ShutdownSignal,
}

impl MockClock {
    pub fn new() -> Self {
        Self {
            now: Duration::ZERO,
            pauses: Vec::new(),
            quit_at: None,
            signal: ShutdownSignal::new(),
        }
    }

    pub fn quitting_at(quit_at: Duration) -> Self {
        Self {
            quit_at: Some(quit_at),
            ..Self::new()
        }
    }
}

impl ClockPort for MockClock {
    fn now(&self) -> Duration {
        self.now
    }

    fn pause(&mut self, duration: Duration) -> bool {
        if self.signal.is_requested() {
            return false;
        }
        self.now += duration;
        self.pauses.push(duration);
        if self.quit_at.is_some_and(|q| self.now >= q) {
            self.signal.request();
            return false;
        }
        true
    }
}

// ── Event sink ────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<AppEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

// ── Fixtures ──────────────────────────────────────────────────

pub fn frame() -> Frame {
    Frame {
        data: vec![0u8; 12],
        width: 2,
        height: 2,
        format: FrameFormat::Bgr8,
    }
}

pub fn face(embedding: &[f64]) -> EncodedFace {
    EncodedFace {
        embedding: embedding.to_vec(),
        bounding_box: BoundingBox {
            top: 10,
            right: 110,
            bottom: 110,
            left: 10,
        },
    }
}

/// The reference embedding every scenario enrolls.
pub const REFERENCE: [f64; 4] = [0.0, 0.0, 0.0, 0.0];

/// An embedding exactly `distance` away from [`REFERENCE`].
pub fn at_distance(distance: f64) -> [f64; 4] {
    [distance, 0.0, 0.0, 0.0]
}

pub type MockApp = AppService<MockSensor, MockCamera, MockEncoder, MockActuator>;

/// A started service plus handles to all its mocks.
pub struct Rig {
    pub app: MockApp,
    pub sensor: MockSensor,
    pub enroll_camera: MockCamera,
    pub verify_camera: MockCamera,
    pub encoder: MockEncoder,
    pub actuator: MockActuator,
    pub clock: MockClock,
    pub sink: RecordingSink,
}

impl Rig {
    pub fn new() -> Self {
        Self::with_config(SystemConfig::default())
    }

    pub fn with_config(config: SystemConfig) -> Self {
        let sensor = MockSensor::default();
        let enroll_camera = MockCamera::new("enroll");
        let verify_camera = MockCamera::new("verify");
        let encoder = MockEncoder::default();
        let actuator = MockActuator::default();

        let app = AppService::new(
            config,
            Devices {
                sensor: sensor.clone(),
                enroll_camera: enroll_camera.clone(),
                verify_camera: verify_camera.clone(),
                encoder: encoder.clone(),
                actuator: actuator.clone(),
            },
        );

        Self {
            app,
            sensor,
            enroll_camera,
            verify_camera,
            encoder,
            actuator,
            clock: MockClock::new(),
            sink: RecordingSink::new(),
        }
    }

    pub fn start(mut self) -> Self {
        self.app.start(&mut self.sink);
        self
    }

    pub fn command(&mut self, cmd: soberguard::app::commands::AppCommand) {
        self.app.handle_command(cmd, &mut self.clock, &mut self.sink);
    }

    /// Drive Idle → Enrolling → Verifying with [`REFERENCE`] enrolled.
    pub fn enroll(&mut self) {
        self.enroll_camera.push_frame();
        self.encoder.push_face(&REFERENCE);
        self.command(soberguard::app::commands::AppCommand::Sensor(
            SensorEvent::SoberDetected,
        ));
    }
}
