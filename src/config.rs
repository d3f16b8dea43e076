//! System configuration parameters
//!
//! Every tunable of the interlock, fixed at process start.  Missing
//! fields in a config file fall back to [`SystemConfig::default()`].

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Where a camera's frames come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CameraSpec {
    /// A video device opened by index (needs the `opencv` feature).
    Device { index: i32 },
    /// An encoded image file re-read on every capture (bench testing).
    Still { path: PathBuf },
}

impl core::fmt::Display for CameraSpec {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Device { index } => write!(f, "device #{index}"),
            Self::Still { path } => write!(f, "still {}", path.display()),
        }
    }
}

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    // --- Serial link ---
    /// Serial device of the sensor microcontroller.
    pub sensor_port: String,
    /// Separate device for relay commands; `None` shares `sensor_port`.
    pub actuator_port: Option<String>,
    /// Serial baud rate.
    pub baud_rate: u32,
    /// Per-operation serial timeout (milliseconds).
    pub serial_timeout_ms: u32,
    /// Wait after opening the link while the microcontroller resets (milliseconds).
    pub link_settle_ms: u32,

    // --- Cameras ---
    pub enrollment_camera: CameraSpec,
    pub verification_camera: CameraSpec,
    /// Capture attempts before a capture is reported as failed.
    pub capture_max_attempts: u32,
    /// Fixed delay between capture attempts (milliseconds).
    pub capture_retry_delay_ms: u32,

    // --- Face matching ---
    /// Encoder program followed by its arguments.
    pub encoder_command: Vec<String>,
    /// Longest wait for one encoder reply before the process is killed (milliseconds).
    pub encoder_timeout_ms: u32,
    /// The encoder's looser match tolerance.  Verification never compares
    /// against it; it bounds `verification_threshold` from above.
    pub enrollment_threshold: f64,
    /// Distance below which a re-verification counts as a match.
    pub verification_threshold: f64,

    // --- Timing ---
    /// Sensor poll interval; also the control loop's base tick (milliseconds).
    pub sensor_poll_interval_ms: u32,
    /// Interval between verification captures (seconds).
    pub verify_interval_secs: u32,
    /// Status heartbeat interval (seconds).
    pub status_interval_secs: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Serial link
            sensor_port: "/dev/ttyACM0".to_string(),
            actuator_port: None,
            baud_rate: 9600,
            serial_timeout_ms: 1000,
            link_settle_ms: 2000,

            // Cameras
            enrollment_camera: CameraSpec::Device { index: 0 },
            verification_camera: CameraSpec::Device { index: 1 },
            capture_max_attempts: 3,
            capture_retry_delay_ms: 1000,

            // Face matching
            encoder_command: vec!["face-encoder".to_string()],
            encoder_timeout_ms: 10_000,
            enrollment_threshold: 0.6,
            verification_threshold: 0.5,

            // Timing
            sensor_poll_interval_ms: 100, // 10 Hz
            verify_interval_secs: 10,
            status_interval_secs: 60,
        }
    }
}

impl SystemConfig {
    /// Reject values the control loop cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sensor_port.trim().is_empty() {
            return Err(ConfigError::ValidationFailed("sensor_port is empty"));
        }
        if self.actuator_port.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed("actuator_port is empty"));
        }
        if self.baud_rate == 0 {
            return Err(ConfigError::ValidationFailed("baud_rate must be positive"));
        }
        for threshold in [self.enrollment_threshold, self.verification_threshold] {
            if !threshold.is_finite() || threshold <= 0.0 {
                return Err(ConfigError::ValidationFailed(
                    "thresholds must be finite and positive",
                ));
            }
        }
        if self.verification_threshold > self.enrollment_threshold {
            return Err(ConfigError::ValidationFailed(
                "verification_threshold must not exceed enrollment_threshold",
            ));
        }
        if self.capture_max_attempts == 0 {
            return Err(ConfigError::ValidationFailed(
                "capture_max_attempts must be at least 1",
            ));
        }
        if self.sensor_poll_interval_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "sensor_poll_interval_ms must be positive",
            ));
        }
        if self.verify_interval_secs == 0 || self.status_interval_secs == 0 {
            return Err(ConfigError::ValidationFailed("intervals must be positive"));
        }
        if u64::from(self.verify_interval_secs) * 1000 < u64::from(self.sensor_poll_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "verify interval must not be shorter than the sensor poll interval",
            ));
        }
        if self.encoder_command.first().is_none_or(|p| p.trim().is_empty()) {
            return Err(ConfigError::ValidationFailed("encoder_command is empty"));
        }
        if self.encoder_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed(
                "encoder_timeout_ms must be positive",
            ));
        }
        Ok(())
    }

    pub fn sensor_poll_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.sensor_poll_interval_ms))
    }

    pub fn verify_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.verify_interval_secs))
    }

    pub fn status_interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.status_interval_secs))
    }

    pub fn capture_retry_delay(&self) -> Duration {
        Duration::from_millis(u64::from(self.capture_retry_delay_ms))
    }

    pub fn serial_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.serial_timeout_ms))
    }

    pub fn encoder_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.encoder_timeout_ms))
    }

    pub fn link_settle(&self) -> Duration {
        Duration::from_millis(u64::from(self.link_settle_ms))
    }

    /// Device that receives relay commands.
    pub fn actuator_port(&self) -> &str {
        self.actuator_port.as_deref().unwrap_or(&self.sensor_port)
    }
}
