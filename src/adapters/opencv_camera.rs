//! Video device camera through OpenCV's `VideoCapture`.

use log::{info, warn};
use opencv::{
    core::{Mat, MatTraitConst, MatTraitConstManual},
    videoio::{self, VideoCapture, VideoCaptureTrait, VideoCaptureTraitConst},
};

use crate::app::ports::CameraPort;
use crate::drivers::camera::{Frame, FrameFormat};
use crate::error::CaptureError;

pub struct OpenCvCamera {
    cap: VideoCapture,
    frame: Mat,
    label: String,
    released: bool,
}

fn device_err(e: opencv::Error) -> CaptureError {
    CaptureError::Device(e.to_string())
}

impl OpenCvCamera {
    pub fn open(index: i32) -> Result<Self, CaptureError> {
        let open_err = |reason: String| CaptureError::Open {
            device: format!("#{index}"),
            reason,
        };
        let cap = VideoCapture::new(index, videoio::CAP_ANY).map_err(|e| open_err(e.to_string()))?;
        if !cap.is_opened().map_err(|e| open_err(e.to_string()))? {
            return Err(open_err("device did not open".into()));
        }
        info!("Camera: device #{} opened", index);
        Ok(Self {
            cap,
            frame: Mat::default(),
            label: format!("device:{index}"),
            released: false,
        })
    }
}

impl CameraPort for OpenCvCamera {
    fn label(&self) -> &str {
        &self.label
    }

    fn grab(&mut self) -> Result<Frame, CaptureError> {
        if self.released {
            return Err(CaptureError::Released);
        }
        if !self.cap.read(&mut self.frame).map_err(device_err)? {
            return Err(CaptureError::NoFrame);
        }
        let size = self.frame.size().map_err(device_err)?;
        if size.width <= 0 || size.height <= 0 {
            return Err(CaptureError::NoFrame);
        }
        let data = self.frame.data_bytes().map_err(device_err)?.to_vec();
        Ok(Frame {
            data,
            width: size.width as u32,
            height: size.height as u32,
            format: FrameFormat::Bgr8,
        })
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        if let Err(e) = self.cap.release() {
            warn!("Camera[{}]: release failed: {}", self.label, e);
        } else {
            info!("Camera[{}]: released", self.label);
        }
    }

    fn is_released(&self) -> bool {
        self.released
    }
}

impl Drop for OpenCvCamera {
    fn drop(&mut self) {
        self.release();
    }
}
