//! Camera frames and the bounded capture retry: the `FrameSource` contract.
//!
//! Opening and releasing a device belong to the concrete adapters
//! (see [`crate::adapters::camera`]); this module owns what every camera
//! shares: the frame type and the retry policy applied to a single
//! capture request.
//!
//! ## Retry semantics
//!
//! Only [`CaptureError::NoFrame`] is retried, with a fixed delay between
//! attempts.  The first successful grab short-circuits the loop.  After
//! `max_attempts` empty grabs the capture fails with
//! [`CaptureError::Exhausted`]; the caller decides what happens next.

use std::time::Duration;

use log::{info, warn};

use crate::app::ports::{CameraPort, ClockPort};
use crate::error::CaptureError;

/// Pixel layout of [`Frame::data`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameFormat {
    /// Packed 8-bit BGR rows, `width * height * 3` bytes.
    Bgr8,
    /// An encoded image file (JPEG, PNG, …) as read from disk.
    Encoded,
}

impl FrameFormat {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Bgr8 => "bgr8",
            Self::Encoded => "encoded",
        }
    }
}

/// One captured image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub data: Vec<u8>,
    /// Pixel width (0 when unknown, e.g. for encoded stills).
    pub width: u32,
    /// Pixel height (0 when unknown).
    pub height: u32,
    pub format: FrameFormat,
}

/// How hard to try for a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    /// Fixed delay between consecutive attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &crate::config::SystemConfig) -> Self {
        Self {
            max_attempts: config.capture_max_attempts,
            delay: config.capture_retry_delay(),
        }
    }
}

/// Capture one frame, retrying transient empty grabs.
///
/// Waits happen through `clock`, so a shutdown request aborts the wait
/// with [`CaptureError::Cancelled`].  No wait follows the final attempt.
pub fn capture_with_retry(
    camera: &mut impl CameraPort,
    policy: RetryPolicy,
    clock: &mut impl ClockPort,
) -> Result<Frame, CaptureError> {
    let attempts = policy.max_attempts.max(1);

    for attempt in 1..=attempts {
        match camera.grab() {
            Ok(frame) => {
                info!(
                    "Capture[{}]: frame captured (attempt {}/{})",
                    camera.label(),
                    attempt,
                    attempts
                );
                return Ok(frame);
            }
            Err(CaptureError::NoFrame) => {
                warn!(
                    "Capture[{}]: no frame (attempt {}/{})",
                    camera.label(),
                    attempt,
                    attempts
                );
            }
            Err(e) => {
                warn!("Capture[{}]: {}", camera.label(), e);
                return Err(e);
            }
        }

        if attempt < attempts && !clock.pause(policy.delay) {
            return Err(CaptureError::Cancelled);
        }
    }

    Err(CaptureError::Exhausted { attempts })
}
