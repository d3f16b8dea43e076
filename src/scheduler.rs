//! Timer/scheduler engine.
//!
//! Replaces sleep-driven polling with explicit periodic timers.  The
//! scheduler is advanced by measured elapsed time and notifies a
//! [`SchedulerDelegate`] when timers fire; the runtime implements the
//! delegate and turns each fire into an [`AppCommand`](crate::app::commands::AppCommand).
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                        Timers                                │
//! │                                                              │
//! │  ┌─────────────┐   ┌──────────────┐   ┌─────────────────┐    │
//! │  │ SensorPoll  │   │ Verify       │   │ Status          │    │
//! │  │ (100 ms)    │   │ (10 s)       │   │ (60 s)          │    │
//! │  └──────┬──────┘   └──────┬───────┘   └────────┬────────┘    │
//! │         ▼                 ▼                    ▼             │
//! │  ┌────────────────────────────────────────────────────────┐  │
//! │  │              SchedulerDelegate (runtime)               │  │
//! │  └───────────────────────┬────────────────────────────────┘  │
//! │                          ▼                                   │
//! │         AppService.poll_sensor() / handle_command()          │
//! └──────────────────────────────────────────────────────────────┘
//! ```

use std::time::Duration;

use crate::app::ports::SchedulerDelegate;
use log::{debug, info};

// ═══════════════════════════════════════════════════════════════
//  Schedule types
// ═══════════════════════════════════════════════════════════════

/// Identity of each timer the control loop runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Read the sensor channel.
    SensorPoll,
    /// Capture and re-check the subject (only while verifying).
    Verify,
    /// Status heartbeat.
    Status,
}

/// A single periodic schedule.
#[derive(Debug, Clone)]
pub struct Schedule {
    pub timer: TimerId,
    /// Human-readable label for logs.
    pub label: &'static str,
    pub interval: Duration,
    pub enabled: bool,
}

// ═══════════════════════════════════════════════════════════════
//  Scheduler engine
// ═══════════════════════════════════════════════════════════════

/// Maximum number of concurrent schedules (stack-allocated).
const MAX_SCHEDULES: usize = 4;

/// The scheduler engine.
///
/// Decoupled from the control loop: when a schedule fires it invokes the
/// [`SchedulerDelegate`] callback, so the scheduler is testable without
/// any devices.
pub struct Scheduler {
    schedules: [Option<ScheduleEntry>; MAX_SCHEDULES],
}

#[derive(Debug, Clone)]
struct ScheduleEntry {
    schedule: Schedule,
    /// Time accumulated since the last fire (or since enabling).
    elapsed: Duration,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    pub fn new() -> Self {
        Self {
            schedules: [None, None, None, None],
        }
    }

    /// Add a schedule.  Returns the slot index, or `None` if full.
    pub fn add(&mut self, schedule: Schedule) -> Option<usize> {
        for (i, slot) in self.schedules.iter_mut().enumerate() {
            if slot.is_none() {
                info!(
                    "Scheduler: added '{}' every {:?} at slot {}",
                    schedule.label, schedule.interval, i
                );
                *slot = Some(ScheduleEntry {
                    schedule,
                    elapsed: Duration::ZERO,
                });
                return Some(i);
            }
        }
        None
    }

    /// Enable or disable a timer.  Either way its elapsed time restarts,
    /// so an enabled timer first fires one full interval later.
    pub fn set_enabled(&mut self, timer: TimerId, enabled: bool) {
        if let Some(entry) = self.entry_mut(timer) {
            if entry.schedule.enabled != enabled {
                debug!(
                    "Scheduler: '{}' {}",
                    entry.schedule.label,
                    if enabled { "armed" } else { "disarmed" }
                );
            }
            entry.schedule.enabled = enabled;
            entry.elapsed = Duration::ZERO;
        }
    }

    pub fn is_enabled(&self, timer: TimerId) -> bool {
        self.schedules
            .iter()
            .flatten()
            .any(|e| e.schedule.timer == timer && e.schedule.enabled)
    }

    /// Advance every enabled timer by `elapsed`.
    ///
    /// A timer fires at most once per call, however far it overran; its
    /// elapsed time then restarts from zero.
    pub fn tick(&mut self, elapsed: Duration, delegate: &mut dyn SchedulerDelegate) {
        for slot in self.schedules.iter_mut() {
            let entry = match slot {
                Some(e) if e.schedule.enabled => e,
                _ => continue,
            };

            entry.elapsed += elapsed;
            if entry.elapsed >= entry.schedule.interval {
                entry.elapsed = Duration::ZERO;
                delegate.on_timer_fired(entry.schedule.timer);
            }
        }
    }

    /// Number of active (enabled) schedules.
    pub fn active_count(&self) -> usize {
        self.schedules
            .iter()
            .flatten()
            .filter(|e| e.schedule.enabled)
            .count()
    }

    fn entry_mut(&mut self, timer: TimerId) -> Option<&mut ScheduleEntry> {
        self.schedules
            .iter_mut()
            .flatten()
            .find(|e| e.schedule.timer == timer)
    }
}

// ═══════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════
