//! Shared mutable context threaded through every FSM handler.
//!
//! `FsmContext` is the single struct that state handlers read from and
//! write to: the stimulus for this tick, the enrolled identity, the last
//! decision, the command to send, configuration and timing.  Think of it
//! as the "blackboard" in a blackboard architecture.  Only the FSM
//! handlers write the identity; the application service only reads it.

use crate::config::SystemConfig;
use crate::drivers::relay::ActuatorCommand;
use crate::vision::{FaceEmbedding, MatchDecision};

// ---------------------------------------------------------------------------
// Inputs (written by the application service before a tick)
// ---------------------------------------------------------------------------

/// What one capture + encode attempt produced.
#[derive(Debug, Clone, PartialEq)]
pub enum Observation {
    /// No frame, or the encoder failed.  Transient.
    Unavailable,
    /// A frame was captured and holds no face.
    NoFace,
    /// The primary face of the frame.
    Face(FaceEmbedding),
}

/// The input a single tick reacts to.
#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    SoberDetected,
    /// Result of the enrollment camera capture.
    Enrollment(Observation),
    /// Result of a verification camera capture.
    Verification(Observation),
}

// ---------------------------------------------------------------------------
// FsmContext
// ---------------------------------------------------------------------------

/// The shared context passed to every state handler function.
pub struct FsmContext {
    // -- Timing --
    /// Ticks elapsed since the current state was entered.
    pub ticks_in_state: u64,
    /// Monotonic total tick count.
    pub total_ticks: u64,

    // -- Input --
    /// Consumed by the handler; cleared by the engine after every tick.
    pub stimulus: Option<Stimulus>,

    // -- Cycle state --
    /// Reference face for the current cycle.  At most one per cycle.
    pub enrolled: Option<FaceEmbedding>,
    pub last_decision: Option<MatchDecision>,
    /// Distance of the last comparison, if one was computed.
    pub last_distance: Option<f64>,
    /// Threshold used by the last comparison.
    pub last_threshold: Option<f64>,
    /// Decisions recorded since startup.
    pub decisions: u64,
    /// Comparisons made since enrollment.
    pub verifications_in_cycle: u32,
    /// Verification cycles that ended since startup.
    pub cycles_completed: u64,

    // -- Output --
    /// Command to send after this tick.  At most one per decision.
    pub pending: Option<ActuatorCommand>,

    // -- Configuration --
    pub config: SystemConfig,
}

impl FsmContext {
    /// Create a new context with the given configuration.
    pub fn new(config: SystemConfig) -> Self {
        Self {
            ticks_in_state: 0,
            total_ticks: 0,
            stimulus: None,
            enrolled: None,
            last_decision: None,
            last_distance: None,
            last_threshold: None,
            decisions: 0,
            verifications_in_cycle: 0,
            cycles_completed: 0,
            pending: None,
            config,
        }
    }

    /// Queue the command for this decision.
    pub fn command(&mut self, command: ActuatorCommand) {
        debug_assert!(self.pending.is_none(), "second command for one decision");
        self.pending = Some(command);
    }

    /// Hand the queued command to the caller, leaving none behind.
    pub fn take_command(&mut self) -> Option<ActuatorCommand> {
        self.pending.take()
    }

    /// Threshold for every comparison in the Verifying loop.
    pub fn verification_threshold(&self) -> f64 {
        self.config.verification_threshold
    }

    /// Record the outcome of one frame.
    pub fn record_decision(
        &mut self,
        decision: MatchDecision,
        distance: Option<f64>,
        threshold: Option<f64>,
    ) {
        self.last_decision = Some(decision);
        self.last_distance = distance;
        self.last_threshold = threshold;
        self.decisions += 1;
    }

    /// Forget everything tied to the current cycle.
    pub fn clear_cycle(&mut self) {
        self.enrolled = None;
        self.verifications_in_cycle = 0;
    }

    pub fn is_enrolled(&self) -> bool {
        self.enrolled.is_some()
    }
}
