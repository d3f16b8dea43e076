//! Integration tests for the AppService → FSM → relay pipeline.
//!
//! These run on the host and verify the full chain from a sensor event
//! or verification tick down to the command written to the relay link.

use std::time::Duration;

use soberguard::app::commands::AppCommand;
use soberguard::app::events::AppEvent;
use soberguard::app::service::{AppService, Devices};
use soberguard::config::SystemConfig;
use soberguard::drivers::relay::{ActuatorCommand, ActuatorLink};
use soberguard::error::{CaptureError, EncoderError};
use soberguard::fsm::StateId;
use soberguard::link::transport::MemoryTransport;
use soberguard::sensors::{SensorChannel, SensorEvent};
use soberguard::vision::MatchDecision;

use super::mock_hw::{
    MockCamera, MockClock, MockEncoder, RecordingSink, Rig, REFERENCE, at_distance,
};

use soberguard::drivers::relay::ActuatorCommand::{MatchAcknowledged, RelayOff, RelayOn};

// ── Wire-level rig: real SensorChannel and ActuatorLink ───────

type WireApp = AppService<
    SensorChannel<MemoryTransport>,
    MockCamera,
    MockEncoder,
    ActuatorLink<MemoryTransport>,
>;

fn wire_app(sensor_bytes: &[u8]) -> (WireApp, MockCamera, MockEncoder) {
    let mut rx = MemoryTransport::new();
    rx.push_rx(sensor_bytes);
    let enroll = MockCamera::new("enroll");
    let encoder = MockEncoder::default();
    let app = AppService::new(
        SystemConfig::default(),
        Devices {
            sensor: SensorChannel::new(rx),
            enroll_camera: enroll.clone(),
            verify_camera: MockCamera::new("verify"),
            encoder: encoder.clone(),
            actuator: ActuatorLink::new(MemoryTransport::new()),
        },
    );
    (app, enroll, encoder)
}

fn written(app: &WireApp) -> Vec<u8> {
    app.actuator()
        .transport()
        .map(|t| t.written().to_vec())
        .unwrap_or_default()
}

// ── Scenario A: sobriety pass + one face → MATCHED, Verifying ─

#[test]
fn scenario_a_sober_then_face_enrolls() {
    let (mut app, enroll, encoder) = wire_app(b"NO_ALCOHOL\r\n");
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);

    enroll.push_frame();
    encoder.push_face(&REFERENCE);
    app.poll_sensor(&mut clock, &mut sink);

    assert_eq!(app.state(), StateId::Verifying);
    assert!(app.is_enrolled());
    assert_eq!(written(&app), b"MATCHED\n");
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::FaceEnrolled { dimensions: 4, faces: 1 })),
        1
    );
}

// ── Scenario B: Verifying + empty frame → RELAY_OFF, Idle ─────

#[test]
fn scenario_b_no_face_ends_cycle() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.verify_camera.push_frame();
    rig.encoder.push_no_face();
    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.is_enrolled());
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged, RelayOff]);
}

// ── Scenario C: distance 0.3 vs 0.5 → RELAY_ON, stays ─────────

#[test]
fn scenario_c_close_face_turns_relay_on() {
    let mut rig = Rig::new().start();
    rig.enroll();

    for _ in 0..2 {
        rig.verify_camera.push_frame();
        rig.encoder.push_face(&at_distance(0.3));
        rig.command(AppCommand::VerifyTick);
    }

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged, RelayOn, RelayOn]);

    let decisions: Vec<_> = rig
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Decision {
                decision,
                distance,
                threshold,
            } => Some((*decision, *distance, *threshold)),
            _ => None,
        })
        .collect();
    assert_eq!(decisions.len(), 2);
    for (decision, distance, threshold) in decisions {
        assert_eq!(decision, MatchDecision::Match);
        assert!((distance.unwrap() - 0.3).abs() < 1e-9);
        assert_eq!(threshold, Some(0.5));
    }
}

// ── Scenario D: unrelated line while Idle → nothing ───────────

#[test]
fn scenario_d_unrelated_line_is_ignored() {
    let (mut app, enroll, encoder) = wire_app(b"ALCOHOL_DETECTED\n");
    let mut clock = MockClock::new();
    let mut sink = RecordingSink::new();
    app.start(&mut sink);

    app.poll_sensor(&mut clock, &mut sink);
    app.poll_sensor(&mut clock, &mut sink);

    assert_eq!(app.state(), StateId::Idle);
    assert!(written(&app).is_empty());
    assert_eq!(enroll.grabs(), 0);
    assert_eq!(encoder.calls(), 0);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::SensorUnrecognized)), 1);
    assert_eq!(sink.count(|e| matches!(e, AppEvent::StateChanged { .. })), 0);
}

// ── Enrollment outcomes ───────────────────────────────────────

#[test]
fn enrollment_without_frame_sends_nothing() {
    let mut rig = Rig::new().start();
    rig.command(AppCommand::Sensor(SensorEvent::SoberDetected));

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.actuator.sent().is_empty());
    assert_eq!(rig.enroll_camera.grabs(), 3);
    assert_eq!(rig.clock.pauses, vec![Duration::from_secs(1); 2]);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::CaptureFailed {
                error: CaptureError::Exhausted { attempts: 3 },
                ..
            }
        )),
        1
    );
}

#[test]
fn enrollment_frame_on_last_attempt_succeeds() {
    let mut rig = Rig::new().start();
    rig.enroll_camera.push_miss();
    rig.enroll_camera.push_miss();
    rig.enroll();

    assert_eq!(rig.enroll_camera.grabs(), 3);
    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged]);
}

#[test]
fn enrollment_without_face_turns_relay_off() {
    let mut rig = Rig::new().start();
    rig.enroll_camera.push_frame();
    rig.encoder.push_no_face();
    rig.command(AppCommand::Sensor(SensorEvent::SoberDetected));

    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.actuator.sent(), vec![RelayOff]);
    assert!(!rig.app.is_enrolled());
}

#[test]
fn enrollment_encoder_failure_is_not_no_face() {
    let mut rig = Rig::new().start();
    rig.enroll_camera.push_frame();
    rig.encoder.push_error(EncoderError::Exit(Some(1)));
    rig.command(AppCommand::Sensor(SensorEvent::SoberDetected));

    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.actuator.sent().is_empty());
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::EncoderFailed(_))), 1);
}

// ── Verification outcomes ─────────────────────────────────────

#[test]
fn wrong_face_turns_relay_off_and_keeps_watching() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.verify_camera.push_frame();
    rig.encoder.push_face(&at_distance(0.9));
    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert!(rig.app.is_enrolled());
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged, RelayOff]);
}

#[test]
fn first_check_uses_verification_threshold() {
    let mut rig = Rig::new().start();
    rig.enroll();

    // 0.55: inside 0.6, outside 0.5.
    rig.verify_camera.push_frame();
    rig.encoder.push_face(&at_distance(0.55));
    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged, RelayOff]);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::Decision {
                decision: MatchDecision::NoMatch,
                threshold: Some(t),
                ..
            } if *t == 0.5
        )),
        1
    );
}

#[test]
fn verification_capture_miss_is_soft() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.verify_camera.grabs(), 3);
    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged]);
}

#[test]
fn verification_encoder_failure_is_soft() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.verify_camera.push_frame();
    rig.encoder.push_error(EncoderError::Malformed("bad".into()));
    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged]);
}

#[test]
fn hung_encoder_during_verification_is_soft() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.verify_camera.push_frame();
    rig.encoder
        .push_error(EncoderError::TimedOut { after_ms: 10_000 });
    rig.command(AppCommand::VerifyTick);

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert!(rig.app.is_enrolled());
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged]);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::EncoderFailed(EncoderError::TimedOut { .. })
        )),
        1
    );

    // The next round proceeds normally.
    rig.verify_camera.push_frame();
    rig.encoder.push_face(&REFERENCE);
    rig.command(AppCommand::VerifyTick);
    assert_eq!(rig.actuator.sent(), vec![MatchAcknowledged, RelayOn]);
}

#[test]
fn verify_tick_outside_verifying_does_nothing() {
    let mut rig = Rig::new().start();
    rig.command(AppCommand::VerifyTick);
    assert_eq!(rig.verify_camera.grabs(), 0);
    assert!(rig.actuator.sent().is_empty());
}

#[test]
fn sober_pass_while_verifying_is_ignored() {
    let mut rig = Rig::new().start();
    rig.enroll();
    let grabs = rig.enroll_camera.grabs();

    rig.command(AppCommand::Sensor(SensorEvent::SoberDetected));

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.enroll_camera.grabs(), grabs);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::SoberDetected {
                state: StateId::Verifying,
                accepted: false
            }
        )),
        1
    );
}

#[test]
fn new_cycle_after_subject_leaves() {
    let mut rig = Rig::new().start();
    rig.enroll();
    rig.verify_camera.push_frame();
    rig.encoder.push_no_face();
    rig.command(AppCommand::VerifyTick);
    assert_eq!(rig.app.state(), StateId::Idle);

    rig.enroll();
    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(
        rig.actuator.sent(),
        vec![MatchAcknowledged, RelayOff, MatchAcknowledged]
    );
    assert_eq!(rig.app.build_telemetry(Duration::ZERO).cycles_completed, 1);
}

// ── Link failures ─────────────────────────────────────────────

#[test]
fn failed_send_is_reported_and_loop_continues() {
    let mut rig = Rig::new().start();
    rig.actuator.set_fail(true);
    rig.enroll();

    assert_eq!(rig.app.state(), StateId::Verifying);
    assert_eq!(rig.app.commands_sent(), 0);
    assert_eq!(
        rig.sink.count(|e| matches!(
            e,
            AppEvent::CommandFailed {
                command: MatchAcknowledged,
                ..
            }
        )),
        1
    );

    rig.actuator.set_fail(false);
    rig.verify_camera.push_frame();
    rig.encoder.push_face(&REFERENCE);
    rig.command(AppCommand::VerifyTick);
    assert_eq!(rig.actuator.sent(), vec![RelayOn]);
}

#[test]
fn sensor_degradation_reported_once() {
    let mut rig = Rig::new().start();
    rig.sensor.degrade();
    for _ in 0..5 {
        rig.app.poll_sensor(&mut rig.clock, &mut rig.sink);
    }
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::SensorDegraded)), 1);
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(rig.app.build_telemetry(Duration::ZERO).sensor_degraded);
}

// ── Shutdown ──────────────────────────────────────────────────

#[test]
fn quit_releases_everything_once() {
    let mut rig = Rig::new().start();
    rig.enroll();

    rig.command(AppCommand::Quit);
    rig.app.shutdown(&mut rig.sink);

    assert!(rig.app.is_stopped());
    assert_eq!(rig.app.state(), StateId::Idle);
    assert!(!rig.app.is_enrolled());
    assert_eq!(rig.enroll_camera.releases(), 1);
    assert_eq!(rig.verify_camera.releases(), 1);
    assert_eq!(rig.sensor.closes(), 1);
    assert_eq!(rig.actuator.closes(), 1);
    assert_eq!(rig.sink.count(|e| matches!(e, AppEvent::Stopped)), 1);
}

#[test]
fn stopped_service_ignores_input() {
    let mut rig = Rig::new().start();
    rig.command(AppCommand::Quit);
    rig.enroll();
    assert_eq!(rig.app.state(), StateId::Idle);
    assert_eq!(rig.enroll_camera.grabs(), 0);
    assert!(rig.actuator.sent().is_empty());
}

#[test]
fn wire_level_shutdown_closes_link() {
    let (mut app, _enroll, _encoder) = wire_app(b"");
    let mut sink = RecordingSink::new();
    app.start(&mut sink);
    app.shutdown(&mut sink);
    app.shutdown(&mut sink);
    assert!(app.actuator().is_closed());
    assert!(app.sensor().is_closed());
}

// ── Telemetry ─────────────────────────────────────────────────

#[test]
fn telemetry_reflects_cycle() {
    let mut rig = Rig::new().start();
    rig.enroll();
    rig.verify_camera.push_frame();
    rig.encoder.push_face(&at_distance(0.25));
    rig.command(AppCommand::VerifyTick);

    let t = rig.app.build_telemetry(Duration::from_secs(42));
    assert_eq!(t.state, StateId::Verifying);
    assert!(t.enrolled);
    assert_eq!(t.last_decision, Some(MatchDecision::Match));
    assert!((t.last_distance.unwrap() - 0.25).abs() < 1e-9);
    assert_eq!(t.commands_sent, 2);
    assert!(!t.sensor_degraded);
    assert_eq!(t.uptime, Duration::from_secs(42));
}
