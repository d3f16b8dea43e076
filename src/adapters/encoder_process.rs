//! External face encoder process implementing [`FaceEncoderPort`].
//!
//! The configured program runs once per frame:
//!
//! - stdin: the frame bytes
//! - env: `FACE_FRAME_FORMAT` (`bgr8` | `encoded`), `FACE_FRAME_WIDTH`,
//!   `FACE_FRAME_HEIGHT`
//! - stdout: `{"faces":[{"embedding":[...],"box":[top,right,bottom,left]}]}`
//!
//! Faces are reported in detector order.  A spawn failure, non-zero exit
//! or unparseable reply is an [`EncoderError`]; it never reads as "no face".

use std::io::{ErrorKind, Read, Write};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Deserialize;

use crate::app::ports::FaceEncoderPort;
use crate::drivers::camera::Frame;
use crate::error::EncoderError;
use crate::shutdown::ShutdownSignal;
use crate::vision::{BoundingBox, EncodedFace};

/// Default wait for one encoder reply.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// How often a running encoder is checked for exit, timeout and shutdown.
const WAIT_SLICE: Duration = Duration::from_millis(20);

#[derive(Debug, Deserialize)]
struct EncoderReply {
    faces: Vec<WireFace>,
}

#[derive(Debug, Deserialize)]
struct WireFace {
    embedding: Vec<f64>,
    #[serde(rename = "box")]
    bbox: [i32; 4],
}

/// Parse the encoder's stdout.
pub fn parse_reply(stdout: &[u8]) -> Result<Vec<EncodedFace>, EncoderError> {
    let reply: EncoderReply =
        serde_json::from_slice(stdout).map_err(|e| EncoderError::Malformed(e.to_string()))?;
    Ok(reply
        .faces
        .into_iter()
        .map(|f| EncodedFace {
            embedding: f.embedding,
            bounding_box: BoundingBox::from(f.bbox),
        })
        .collect())
}

pub struct ProcessEncoder {
    program: String,
    args: Vec<String>,
    timeout: Duration,
    shutdown: Option<ShutdownSignal>,
}

impl ProcessEncoder {
    /// `command` is the program followed by its arguments.
    pub fn new(command: &[String]) -> Result<Self, EncoderError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| EncoderError::Spawn("empty encoder command".into()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout: DEFAULT_TIMEOUT,
            shutdown: None,
        })
    }

    /// Kill the encoder if it has not exited after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Abandon a running encoder as soon as `shutdown` is requested.
    pub fn with_shutdown(mut self, shutdown: ShutdownSignal) -> Self {
        self.shutdown = Some(shutdown);
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Wait for `child` to exit, killing it on timeout or shutdown.
    fn wait_bounded(&self, child: &mut Child) -> Result<ExitStatus, EncoderError> {
        let deadline = Instant::now() + self.timeout;
        loop {
            match child.try_wait() {
                Ok(Some(status)) => return Ok(status),
                Ok(None) => {}
                Err(e) => {
                    kill(child);
                    return Err(EncoderError::Io(e.to_string()));
                }
            }

            if self.shutdown.as_ref().is_some_and(ShutdownSignal::is_requested) {
                kill(child);
                return Err(EncoderError::Cancelled);
            }
            let now = Instant::now();
            if now >= deadline {
                warn!("Encoder: no reply after {:?}, killing it", self.timeout);
                kill(child);
                return Err(EncoderError::TimedOut {
                    after_ms: self.timeout.as_millis() as u64,
                });
            }
            thread::sleep(WAIT_SLICE.min(deadline - now));
        }
    }
}

fn kill(child: &mut Child) {
    if let Err(e) = child.kill() {
        debug!("Encoder: kill failed ({})", e);
    }
    // Reap it so no zombie is left behind.
    let _ = child.wait();
}

impl FaceEncoderPort for ProcessEncoder {
    fn encode(&mut self, frame: &Frame) -> Result<Vec<EncodedFace>, EncoderError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .env("FACE_FRAME_FORMAT", frame.format.as_str())
            .env("FACE_FRAME_WIDTH", frame.width.to_string())
            .env("FACE_FRAME_HEIGHT", frame.height.to_string())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| EncoderError::Spawn(format!("{}: {}", self.program, e)))?;

        // Stdin and stdout are pumped on their own threads so neither pipe
        // can fill up while the other is blocked.  Both threads end once
        // the child exits or is killed.
        let writer = child.stdin.take().map(|mut stdin| {
            let data = frame.data.clone();
            // Dropping stdin at the end closes the pipe (end of input).
            thread::spawn(move || stdin.write_all(&data))
        });
        let reader = child.stdout.take().map(|mut stdout| {
            thread::spawn(move || {
                let mut reply = Vec::new();
                stdout.read_to_end(&mut reply).map(|_| reply)
            })
        });

        let status = self.wait_bounded(&mut child)?;
        if !status.success() {
            warn!("Encoder exited with {}", status);
            return Err(EncoderError::Exit(status.code()));
        }

        if let Some(writer) = writer {
            match writer.join() {
                Ok(Ok(())) => {}
                // The encoder answered without reading the whole frame.
                Ok(Err(e)) if e.kind() == ErrorKind::BrokenPipe => {
                    debug!("Encoder: closed stdin early");
                }
                Ok(Err(e)) => return Err(EncoderError::Io(e.to_string())),
                Err(_) => return Err(EncoderError::Io("stdin writer panicked".into())),
            }
        }
        let stdout = match reader {
            Some(reader) => reader
                .join()
                .map_err(|_| EncoderError::Io("stdout reader panicked".into()))?
                .map_err(|e| EncoderError::Io(e.to_string()))?,
            None => Vec::new(),
        };

        let faces = parse_reply(&stdout)?;
        debug!("Encoder: {} faces in {} bytes", faces.len(), frame.data.len());
        Ok(faces)
    }
}
