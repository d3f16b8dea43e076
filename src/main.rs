//! SoberGuard: main entry point.
//!
//! Hexagonal architecture around a single control loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  SerialTransport    Camera ×2       ProcessEncoder             │
//! │  (Sensor+Actuator)  (CameraPort)    (FaceEncoderPort)          │
//! │  SystemClock        LogEventSink    JsonConfigFile             │
//! │  (ClockPort)        (EventSink)     (ConfigPort)               │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (domain core)                  │    │
//! │  │  FSM · capture retry · face matching · relay rule      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  Scheduler (delegate-driven) · ShutdownSignal (q / Ctrl+C)     │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `soberguard [config.json]`

use std::path::PathBuf;

use anyhow::{Context, Result};
use log::{info, warn};

use soberguard::adapters::camera::Camera;
use soberguard::adapters::config_file::JsonConfigFile;
use soberguard::adapters::encoder_process::ProcessEncoder;
use soberguard::adapters::log_sink::LogEventSink;
use soberguard::adapters::serial::SerialTransport;
use soberguard::adapters::time::SystemClock;
use soberguard::app::ports::{ClockPort, ConfigPort};
use soberguard::app::service::{AppService, Devices};
use soberguard::config::SystemConfig;
use soberguard::drivers::relay::ActuatorLink;
use soberguard::runtime;
use soberguard::sensors::SensorChannel;
use soberguard::shutdown::ShutdownSignal;

type HostDevices = Devices<
    SensorChannel<SerialTransport>,
    Camera,
    ProcessEncoder,
    ActuatorLink<SerialTransport>,
>;

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Open every required device, in order: serial link, settle, relay
/// writer, cameras, encoder.
///
/// Returns `Ok(None)` if the operator quit while the link was settling.
/// Anything opened before a failure is dropped (and released) on return.
fn open_devices(
    config: &SystemConfig,
    clock: &mut impl ClockPort,
    shutdown: &ShutdownSignal,
) -> soberguard::error::Result<Option<HostDevices>> {
    let reader = SerialTransport::open(&config.sensor_port, config.baud_rate, config.serial_timeout())?;

    info!("Waiting {:?} for the microcontroller to reset", config.link_settle());
    if !clock.pause(config.link_settle()) {
        return Ok(None);
    }

    let writer = match &config.actuator_port {
        None => reader.try_clone()?,
        Some(port) => SerialTransport::open(port, config.baud_rate, config.serial_timeout())?,
    };
    info!("Relay commands go to {}", config.actuator_port());

    let enroll_camera = Camera::open(&config.enrollment_camera)?;
    let verify_camera = Camera::open(&config.verification_camera)?;
    let encoder = ProcessEncoder::new(&config.encoder_command)?
        .with_timeout(config.encoder_timeout())
        .with_shutdown(shutdown.clone());

    Ok(Some(Devices {
        sensor: SensorChannel::new(reader),
        enroll_camera,
        verify_camera,
        encoder,
        actuator: ActuatorLink::new(writer),
    }))
}

fn main() -> Result<()> {
    // ── 1. Logging ────────────────────────────────────────────
    init_logging();
    info!("SoberGuard v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Configuration ──────────────────────────────────────
    let config_path = std::env::args_os().nth(1).map(PathBuf::from);
    let config = JsonConfigFile::new(config_path)
        .load()
        .context("invalid configuration")?;
    info!(
        "Cameras: enrollment={} verification={}",
        config.enrollment_camera, config.verification_camera
    );

    // ── 3. Quit signal ────────────────────────────────────────
    let shutdown = ShutdownSignal::new();
    if let Err(e) = shutdown.install_ctrlc() {
        warn!("Failed to install Ctrl+C handler: {e}");
    }
    if let Err(e) = shutdown.spawn_key_watcher() {
        warn!("Failed to watch stdin for quit: {e}");
    }
    let mut clock = SystemClock::new(shutdown.clone());

    // ── 4. Devices ────────────────────────────────────────────
    let Some(devices) = open_devices(&config, &mut clock, &shutdown).context("device startup failed")?
    else {
        info!("Quit during startup");
        return Ok(());
    };

    // ── 5. Control loop ───────────────────────────────────────
    let mut app = AppService::new(config, devices);
    let mut sink = LogEventSink::new();
    runtime::run(&mut app, &mut clock, &mut sink, &shutdown);

    info!("Exiting");
    Ok(())
}
