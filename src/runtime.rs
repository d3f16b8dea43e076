//! The control loop.
//!
//! A single cancellable event loop owns the [`AppService`] and a
//! [`Scheduler`].  Each iteration pauses one sensor poll interval through
//! the clock port (which returns early on shutdown), advances the
//! scheduler by the measured elapsed time, then dispatches the timers
//! that fired:
//!
//! | Timer        | Action                                   |
//! |--------------|------------------------------------------|
//! | `SensorPoll` | [`AppService::poll_sensor`]              |
//! | `Verify`     | [`AppCommand::VerifyTick`]               |
//! | `Status`     | [`AppEvent::Telemetry`] snapshot         |
//!
//! The verification timer is armed only while the FSM is in `Verifying`,
//! and re-armed on every entry, so the first re-check happens one full
//! interval after enrollment.  Time spent inside a dispatch (captures,
//! retry delays) is not charged to the timers.

use log::info;

use crate::app::commands::AppCommand;
use crate::app::events::AppEvent;
use crate::app::ports::{
    ActuatorPort, CameraPort, ClockPort, EventSink, FaceEncoderPort, SchedulerDelegate, SensorPort,
};
use crate::app::service::AppService;
use crate::config::SystemConfig;
use crate::fsm::StateId;
use crate::scheduler::{Schedule, Scheduler, TimerId};
use crate::shutdown::ShutdownSignal;

/// Collects the timers fired during one scheduler tick.
#[derive(Default)]
struct FiredTimers(heapless::Vec<TimerId, 4>);

impl SchedulerDelegate for FiredTimers {
    fn on_timer_fired(&mut self, timer: TimerId) {
        // Capacity matches the scheduler's slot count.
        let _ = self.0.push(timer);
    }
}

/// Build the loop's timers from configuration.
pub fn build_scheduler(config: &SystemConfig) -> Scheduler {
    let mut sched = Scheduler::new();
    for schedule in [
        Schedule {
            timer: TimerId::SensorPoll,
            label: "sensor-poll",
            interval: config.sensor_poll_interval(),
            enabled: true,
        },
        Schedule {
            timer: TimerId::Verify,
            label: "verify",
            interval: config.verify_interval(),
            enabled: false,
        },
        Schedule {
            timer: TimerId::Status,
            label: "status",
            interval: config.status_interval(),
            enabled: true,
        },
    ] {
        let _ = sched.add(schedule);
    }
    sched
}

/// Run the control loop until `shutdown` is requested, then release
/// every device.
pub fn run<S, C, F, A>(
    app: &mut AppService<S, C, F, A>,
    clock: &mut impl ClockPort,
    sink: &mut impl EventSink,
    shutdown: &ShutdownSignal,
) where
    S: SensorPort,
    C: CameraPort,
    F: FaceEncoderPort,
    A: ActuatorPort,
{
    let poll_interval = app.config().sensor_poll_interval();
    let mut sched = build_scheduler(app.config());

    app.start(sink);
    info!("Control loop running; press q then Enter, or Ctrl+C, to quit");

    let mut verifying = false;
    let mut last = clock.now();

    while !shutdown.is_requested() && !app.is_stopped() {
        if !clock.pause(poll_interval) {
            break;
        }
        let elapsed = clock.now().saturating_sub(last);

        let mut fired = FiredTimers::default();
        sched.tick(elapsed, &mut fired);

        for timer in fired.0 {
            if shutdown.is_requested() {
                break;
            }
            match timer {
                TimerId::SensorPoll => app.poll_sensor(clock, sink),
                TimerId::Verify => app.handle_command(AppCommand::VerifyTick, clock, sink),
                TimerId::Status => {
                    sink.emit(&AppEvent::Telemetry(app.build_telemetry(clock.now())));
                }
            }

            let now_verifying = app.state() == StateId::Verifying;
            if now_verifying != verifying {
                sched.set_enabled(TimerId::Verify, now_verifying);
                verifying = now_verifying;
            }
        }

        last = clock.now();
    }

    app.handle_command(AppCommand::Quit, clock, sink);
}
