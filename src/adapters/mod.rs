//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter           | Implements       | Connects to                    |
//! |-------------------|------------------|--------------------------------|
//! | `serial`          | Transport        | USB/UART microcontroller link  |
//! | `camera`          | CameraPort       | still image / video device     |
//! | `opencv_camera`   | CameraPort       | OpenCV `VideoCapture`          |
//! | `encoder_process` | FaceEncoderPort  | external face encoder program  |
//! | `time`            | ClockPort        | `std::time::Instant`, sleep    |
//! | `log_sink`        | EventSink        | `log` facade                   |
//! | `config_file`     | ConfigPort       | JSON file on disk              |

pub mod camera;
pub mod config_file;
pub mod encoder_process;
pub mod log_sink;
#[cfg(feature = "opencv")]
pub mod opencv_camera;
pub mod serial;
pub mod time;
