//! One-shot advisory gate.
//!
//! An alert episode is the contiguous span during which the aggregate
//! highest tier is [`SeverityTier::Critical`]. The controller allows exactly
//! one advisory dispatch per episode and re-arms only when the aggregate
//! drops below `Critical`. A single sensor leaving `Critical` while another
//! stays there does not end the episode.
//!
//! The controller is evaluated by the ingestion pipeline only. Advisory
//! results, whether they succeed, fail, or arrive after the episode ended,
//! never feed back into it.

use crate::model::SeverityTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// No advisory in flight or owed for the current episode.
    Idle,
    /// An advisory was dispatched for the current episode.
    Pending,
}

/// What the pipeline must do after evaluating a new summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// An episode just started: announce it and dispatch one advisory.
    Dispatch,
    /// The episode ended; the gate is open again.
    Reset,
    None,
}

#[derive(Debug)]
pub struct EscalationController {
    state: GateState,
    dispatches: u64,
    resets: u64,
}

impl Default for EscalationController {
    fn default() -> Self {
        Self::new()
    }
}

impl EscalationController {
    pub fn new() -> Self {
        Self {
            state: GateState::Idle,
            dispatches: 0,
            resets: 0,
        }
    }

    /// Advances the gate given the aggregate highest tier.
    pub fn evaluate(&mut self, highest: SeverityTier) -> Escalation {
        match (self.state, highest) {
            (GateState::Idle, SeverityTier::Critical) => {
                self.state = GateState::Pending;
                self.dispatches += 1;
                Escalation::Dispatch
            }
            (GateState::Pending, SeverityTier::Safe | SeverityTier::Watch) => {
                self.state = GateState::Idle;
                self.resets += 1;
                Escalation::Reset
            }
            _ => Escalation::None,
        }
    }

    pub fn state(&self) -> GateState {
        self.state
    }

    /// Total advisories dispatched since start.
    pub fn dispatches(&self) -> u64 {
        self.dispatches
    }

    /// Total episode resets since start.
    pub fn resets(&self) -> u64 {
        self.resets
    }
}
