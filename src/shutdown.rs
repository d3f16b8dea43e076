//! Operator quit signal.
//!
//! One shared flag, set from any of three places: Ctrl+C, SIGTERM (both
//! through `ctrlc`), or a `q` line on stdin.  The control loop and the
//! clock's cancellable pause both watch it.

use std::io::BufRead;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread::JoinHandle;

use log::{info, warn};

/// Cloneable handle to the process-wide quit flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal(Arc<AtomicBool>);

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        if !self.0.swap(true, Ordering::SeqCst) {
            info!("Shutdown requested");
        }
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    /// Route Ctrl+C and SIGTERM to this signal.  Can only be installed
    /// once per process.
    pub fn install_ctrlc(&self) -> Result<(), ctrlc::Error> {
        let signal = self.clone();
        ctrlc::set_handler(move || signal.request())
    }

    /// Watch stdin for `q` / `quit` on a background thread.
    ///
    /// End of input does not quit; a detached or closed stdin simply
    /// leaves Ctrl+C as the only way out.
    pub fn spawn_key_watcher(&self) -> std::io::Result<JoinHandle<()>> {
        let signal = self.clone();
        std::thread::Builder::new()
            .name("quit-key".into())
            .spawn(move || watch_keys(std::io::stdin().lock(), &signal))
    }
}

/// Whether an operator input line asks to quit.
pub fn is_quit_line(line: &str) -> bool {
    let line = line.trim();
    line.eq_ignore_ascii_case("q") || line.eq_ignore_ascii_case("quit")
}

/// Read lines until a quit line, end of input, or a read error.
pub fn watch_keys(reader: impl BufRead, signal: &ShutdownSignal) {
    for line in reader.lines() {
        match line {
            Ok(line) if is_quit_line(&line) => {
                info!("Quit key received");
                signal.request();
                return;
            }
            Ok(_) => {}
            Err(e) => {
                warn!("Stopped watching stdin: {}", e);
                return;
            }
        }
        if signal.is_requested() {
            return;
        }
    }
}
