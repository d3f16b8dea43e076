//! System clock adapter.
//!
//! Monotonic time from `std::time::Instant`, and the only place the
//! process sleeps.  Sleeps are sliced so a shutdown request is noticed
//! within [`PAUSE_SLICE`].

use std::time::{Duration, Instant};

use crate::app::ports::ClockPort;
use crate::shutdown::ShutdownSignal;

/// Longest uninterrupted sleep.
pub const PAUSE_SLICE: Duration = Duration::from_millis(50);

pub struct SystemClock {
    start: Instant,
    shutdown: ShutdownSignal,
}

impl SystemClock {
    pub fn new(shutdown: ShutdownSignal) -> Self {
        Self {
            start: Instant::now(),
            shutdown,
        }
    }
}

impl ClockPort for SystemClock {
    fn now(&self) -> Duration {
        self.start.elapsed()
    }

    fn pause(&mut self, duration: Duration) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            if self.shutdown.is_requested() {
                return false;
            }
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            std::thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }
}
