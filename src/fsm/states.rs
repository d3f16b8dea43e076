//! Concrete state handler functions and table builder.
//!
//! Each state is defined by plain `fn` pointers: no closures, no dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[SoberDetected]──▶ ENROLLING
//!    ▲                          │
//!    │  [no frame]              │ [face]  MATCHED
//!    ├──────────────────────────┤
//!    │  [no face]  RELAY_OFF    ▼
//!    │                      VERIFYING ◀──┐
//!    │                          │        │ [match] RELAY_ON
//!    │                          │        │ [no match] RELAY_OFF
//!    │                          ├────────┘ [no frame] -
//!    └─────[no face] RELAY_OFF──┘
//! ```
//!
//! An empty frame means the subject left and ends the cycle.  A wrong face
//! keeps being monitored (and denied).

use super::context::{FsmContext, Observation, Stimulus};
use super::{StateDescriptor, StateId};
use crate::drivers::relay::ActuatorCommand;
use crate::vision::{self, MatchDecision};
use log::{info, warn};

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

/// Build the static state table.  Called once at startup.
pub fn build_state_table() -> [StateDescriptor; StateId::COUNT] {
    [
        // Index 0: Idle
        StateDescriptor {
            id: StateId::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_update: idle_update,
        },
        // Index 1: Enrolling
        StateDescriptor {
            id: StateId::Enrolling,
            name: "Enrolling",
            on_enter: Some(enrolling_enter),
            on_exit: None,
            on_update: enrolling_update,
        },
        // Index 2: Verifying
        StateDescriptor {
            id: StateId::Verifying,
            name: "Verifying",
            on_enter: Some(verifying_enter),
            on_exit: Some(verifying_exit),
            on_update: verifying_update,
        },
    ]
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE state
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut FsmContext) {
    ctx.clear_cycle();
    info!("IDLE: waiting for sobriety test");
}

fn idle_update(ctx: &mut FsmContext) -> Option<StateId> {
    match ctx.stimulus {
        Some(Stimulus::SoberDetected) => {
            info!("IDLE: sobriety confirmed, starting enrollment");
            Some(StateId::Enrolling)
        }
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  ENROLLING state: one capture, one outcome
// ═══════════════════════════════════════════════════════════════════════════

fn enrolling_enter(ctx: &mut FsmContext) {
    ctx.clear_cycle();
    ctx.last_decision = None;
    ctx.last_distance = None;
    ctx.last_threshold = None;
}

fn enrolling_update(ctx: &mut FsmContext) -> Option<StateId> {
    let Some(Stimulus::Enrollment(observation)) = ctx.stimulus.take() else {
        return None;
    };

    match observation {
        Observation::Unavailable => {
            warn!("ENROLLING: no frame from enrollment camera, back to idle");
            Some(StateId::Idle)
        }
        Observation::NoFace => {
            info!("ENROLLING: no face in enrollment frame");
            ctx.record_decision(MatchDecision::NoFaceDetected, None, None);
            ctx.command(ActuatorCommand::RelayOff);
            Some(StateId::Idle)
        }
        Observation::Face(embedding) => {
            info!(
                "ENROLLING: face enrolled ({} dimensions, {} boxes)",
                embedding.dimensions(),
                embedding.boxes.len()
            );
            ctx.enrolled = Some(embedding);
            ctx.command(ActuatorCommand::MatchAcknowledged);
            Some(StateId::Verifying)
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  VERIFYING state: periodic re-check against the enrolled face
// ═══════════════════════════════════════════════════════════════════════════

fn verifying_enter(ctx: &mut FsmContext) {
    ctx.verifications_in_cycle = 0;
    info!(
        "VERIFYING: re-checking every {}s",
        ctx.config.verify_interval_secs
    );
}

fn verifying_exit(ctx: &mut FsmContext) {
    ctx.cycles_completed += 1;
    info!(
        "VERIFYING: cycle ended after {} checks",
        ctx.verifications_in_cycle
    );
}

fn verifying_update(ctx: &mut FsmContext) -> Option<StateId> {
    let Some(Stimulus::Verification(observation)) = ctx.stimulus.take() else {
        return None;
    };

    match observation {
        Observation::Unavailable => {
            warn!("VERIFYING: no frame this round, will retry");
            None
        }
        Observation::NoFace => {
            info!("VERIFYING: subject left the frame");
            ctx.record_decision(MatchDecision::NoFaceDetected, None, None);
            ctx.command(ActuatorCommand::RelayOff);
            Some(StateId::Idle)
        }
        Observation::Face(candidate) => {
            let Some(reference) = ctx.enrolled.as_ref() else {
                // Unreachable through the table; fail closed.
                warn!("VERIFYING: no enrolled identity");
                ctx.command(ActuatorCommand::RelayOff);
                return Some(StateId::Idle);
            };
            let threshold = ctx.verification_threshold();
            let (decision, distance) = vision::compare(reference, &candidate, threshold);
            ctx.verifications_in_cycle += 1;
            ctx.record_decision(decision, distance, Some(threshold));

            match decision {
                MatchDecision::Match => ctx.command(ActuatorCommand::RelayOn),
                _ => ctx.command(ActuatorCommand::RelayOff),
            }
            None
        }
    }
}
