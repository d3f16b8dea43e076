//! Unified error types for SoberGuard.
//!
//! One typed enum per external collaborator, plus a top-level [`Error`]
//! every subsystem converts into.  Only startup code lets these escape;
//! once the control loop is running, every failure path is logged and
//! mapped onto a fallback transition or a no-op.

use core::fmt;

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

/// Every fallible startup operation funnels into this type.
#[derive(Debug)]
pub enum Error {
    /// The serial link to the microcontroller failed.
    Link(LinkError),
    /// A camera could not be opened or read.
    Capture(CaptureError),
    /// The external face encoder failed.
    Encoder(EncoderError),
    /// Configuration is invalid or could not be loaded.
    Config(ConfigError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Link(e) => write!(f, "link: {e}"),
            Self::Capture(e) => write!(f, "capture: {e}"),
            Self::Encoder(e) => write!(f, "encoder: {e}"),
            Self::Config(e) => write!(f, "config: {e}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Serial link errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkError {
    /// The device could not be opened at startup.
    Open { port: String, reason: String },
    /// A read or write on an open device failed.
    Io(String),
    /// The handle has already been closed.
    Closed,
}

impl fmt::Display for LinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { port, reason } => write!(f, "cannot open {port}: {reason}"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Closed => write!(f, "link closed"),
        }
    }
}

impl std::error::Error for LinkError {}

impl From<LinkError> for Error {
    fn from(e: LinkError) -> Self {
        Self::Link(e)
    }
}

// ---------------------------------------------------------------------------
// Camera errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The device could not be opened at startup.
    Open { device: String, reason: String },
    /// The device answered but returned no frame (transient, retried).
    NoFrame,
    /// The device failed outright (not retried).
    Device(String),
    /// The handle was released before the capture.
    Released,
    /// Every attempt of a retried capture came back empty.
    Exhausted { attempts: u32 },
    /// The operator quit while waiting between attempts.
    Cancelled,
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Open { device, reason } => write!(f, "cannot open camera {device}: {reason}"),
            Self::NoFrame => write!(f, "no frame returned"),
            Self::Device(msg) => write!(f, "device error: {msg}"),
            Self::Released => write!(f, "camera released"),
            Self::Exhausted { attempts } => write!(f, "no frame after {attempts} attempts"),
            Self::Cancelled => write!(f, "capture cancelled by shutdown"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Self::Capture(e)
    }
}

// ---------------------------------------------------------------------------
// Encoder errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    /// The encoder program could not be started.
    Spawn(String),
    /// Writing the frame or reading the reply failed.
    Io(String),
    /// The encoder exited unsuccessfully (`None` = killed by a signal).
    Exit(Option<i32>),
    /// The reply was not a valid face list.
    Malformed(String),
    /// No reply within the configured time; the process was killed.
    TimedOut { after_ms: u64 },
    /// Shutdown was requested while waiting; the process was killed.
    Cancelled,
}

impl fmt::Display for EncoderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Spawn(msg) => write!(f, "cannot start encoder: {msg}"),
            Self::Io(msg) => write!(f, "encoder I/O: {msg}"),
            Self::Exit(Some(code)) => write!(f, "encoder exited with status {code}"),
            Self::Exit(None) => write!(f, "encoder terminated by signal"),
            Self::Malformed(msg) => write!(f, "malformed encoder reply: {msg}"),
            Self::TimedOut { after_ms } => write!(f, "encoder gave no reply within {after_ms} ms"),
            Self::Cancelled => write!(f, "encoder cancelled by shutdown"),
        }
    }
}

impl std::error::Error for EncoderError {}

impl From<EncoderError> for Error {
    fn from(e: EncoderError) -> Self {
        Self::Encoder(e)
    }
}

// ---------------------------------------------------------------------------
// Configuration errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// The config file does not exist.
    NotFound(String),
    /// The file exists but could not be read.
    Io(String),
    /// The file is not valid JSON for [`SystemConfig`](crate::config::SystemConfig).
    Parse(String),
    /// A field failed range validation.
    ValidationFailed(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(path) => write!(f, "config file {path} not found"),
            Self::Io(msg) => write!(f, "I/O error: {msg}"),
            Self::Parse(msg) => write!(f, "parse error: {msg}"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<ConfigError> for Error {
    fn from(e: ConfigError) -> Self {
        Self::Config(e)
    }
}

/// Crate-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
