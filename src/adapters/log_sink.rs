//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing one tagged status line per
//! application event through the `log` facade.

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn opt_f64(v: Option<f64>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started(state) => {
                info!("START | initial_state={}", state);
            }
            AppEvent::StateChanged { from, to } => {
                info!("STATE | {} -> {}", from, to);
            }
            AppEvent::SoberDetected { state, accepted } => {
                if *accepted {
                    info!("SENSOR | sobriety confirmed, enrolling");
                } else {
                    info!("SENSOR | sobriety pass ignored while {}", state);
                }
            }
            AppEvent::SensorUnrecognized => {
                info!("SENSOR | alcohol detected or no blow detected; waiting");
            }
            AppEvent::SensorDegraded => {
                warn!("SENSOR | link lost, sensor input disabled until restart");
            }
            AppEvent::CaptureFailed { camera, error } => {
                warn!("CAPTURE | {} failed: {}", camera, error);
            }
            AppEvent::EncoderFailed(error) => {
                warn!("CAPTURE | encoder failed: {}", error);
            }
            AppEvent::FaceEnrolled { dimensions, faces } => {
                info!(
                    "ENROLL | face enrolled (embedding={} faces_in_frame={})",
                    dimensions, faces
                );
            }
            AppEvent::Decision {
                decision,
                distance,
                threshold,
            } => {
                info!(
                    "DECISION | {:?} distance={} threshold={}",
                    decision,
                    opt_f64(*distance),
                    opt_f64(*threshold)
                );
            }
            AppEvent::CommandSent(command) => {
                info!("RELAY | sent {}", command);
            }
            AppEvent::CommandFailed { command, error } => {
                warn!("LINK | {} not delivered: {}", command, error);
            }
            AppEvent::CommandSuppressed(command) => {
                warn!("RELAY | {} suppressed: no confirmed match", command);
            }
            AppEvent::Telemetry(t) => {
                info!(
                    "STATUS | state={} | enrolled={} | last={:?} distance={} | \
                     cycles={} | commands={} | sensor={} | uptime={}s",
                    t.state,
                    t.enrolled,
                    t.last_decision,
                    opt_f64(t.last_distance),
                    t.cycles_completed,
                    t.commands_sent,
                    if t.sensor_degraded { "LOST" } else { "OK" },
                    t.uptime.as_secs(),
                );
            }
            AppEvent::Stopped => {
                info!("STOP | all devices released");
            }
        }
    }
}
