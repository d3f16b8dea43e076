//! Camera adapters implementing [`CameraPort`].
//!
//! | Source   | Spec                        | Frames                     |
//! |----------|-----------------------------|----------------------------|
//! | `Still`  | `{"still":{"path":...}}`    | the file, re-read per grab |
//! | `Device` | `{"device":{"index":N}}`    | OpenCV `VideoCapture` (BGR)|
//!
//! The device source needs the `opencv` cargo feature; without it,
//! opening a device spec fails like a missing camera.

use std::path::{Path, PathBuf};

use log::info;

use crate::app::ports::CameraPort;
use crate::config::CameraSpec;
use crate::drivers::camera::{Frame, FrameFormat};
use crate::error::CaptureError;

#[cfg(feature = "opencv")]
use super::opencv_camera::OpenCvCamera;

// ───────────────────────────────────────────────────────────────
// Still-image camera
// ───────────────────────────────────────────────────────────────

/// Serves an encoded image file as every frame.
pub struct StillCamera {
    path: PathBuf,
    label: String,
    released: bool,
}

impl StillCamera {
    /// The file must exist now; later it may disappear (transient miss).
    pub fn open(path: &Path) -> Result<Self, CaptureError> {
        if !path.is_file() {
            return Err(CaptureError::Open {
                device: path.display().to_string(),
                reason: "no such image file".into(),
            });
        }
        info!("Camera: still image {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            label: format!("still:{}", path.display()),
            released: false,
        })
    }
}

impl CameraPort for StillCamera {
    fn label(&self) -> &str {
        &self.label
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        match std::fs::read(&self.path) {
            Ok(data) if !data.is_empty() => Ok(Frame {
                data,
                width: 0,
                height: 0,
                format: FrameFormat::Encoded,
            }),
            Ok(_) => Err(CaptureError::NoFrame),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(CaptureError::NoFrame),
            Err(e) => Err(CaptureError::Device(e.to_string())),
        }
    }

    fn release(&mut self) {
        if !self.released {
            self.released = true;
            info!("Camera[{}]: released", self.label);
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

// ───────────────────────────────────────────────────────────────
// Camera selected from configuration
// ───────────────────────────────────────────────────────────────

/// Any camera the binary can open.
pub enum Camera {
    Still(StillCamera),
    #[cfg(feature = "opencv")]
    Device(OpenCvCamera),
}

impl Camera {
    pub fn open(spec: &CameraSpec) -> Result<Self, CaptureError> {
        match spec {
            CameraSpec::Still { path } => StillCamera::open(path).map(Self::Still),
            #[cfg(feature = "opencv")]
            CameraSpec::Device { index } => OpenCvCamera::open(*index).map(Self::Device),
            #[cfg(not(feature = "opencv"))]
            CameraSpec::Device { index } => Err(CaptureError::Open {
                device: format!("#{index}"),
                reason: "built without the `opencv` feature".into(),
            }),
        }
    }
}

impl CameraPort for Camera {
    fn label(&self) -> &str {
        match self {
            Self::Still(c) => c.label(),
            #[cfg(feature = "opencv")]
            Self::Device(c) => c.label(),
        }
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        match self {
            Self::Still(c) => c.grab(),
            #[cfg(feature = "opencv")]
            Self::Device(c) => c.grab(),
        }
    }

    fn release(&mut self) {
        match self {
            Self::Still(c) => c.release(),
            #[cfg(feature = "opencv")]
            Self::Device(c) => c.release(),
        }
    }

    fn is_released(&self) -> bool {
        match self {
            Self::Still(c) => c.is_released(),
            #[cfg(feature = "opencv")]
            Self::Device(c) => c.is_released(),
        }
    }
}
