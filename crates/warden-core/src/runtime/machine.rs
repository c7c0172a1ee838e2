// crates/warden-core/src/runtime/machine.rs
// ============================================================================
// Module: Warden State Machine
// Description: Validates phase transitions and tool eligibility for a run.
// Purpose: Keep transition rules and eligibility checks in one testable unit.
// Dependencies: crate::core, crate::runtime::{errors, policy}
// ============================================================================

//! ## Overview
//! The state machine is a pure interpreter over the policy set: it validates
//! transitions against the configured graph and answers eligibility questions
//! for the run's *current* phase. Successful transitions are expressed as
//! events so the engine persists them through the same path replay reads.
//! The graph and eligibility map are supplied by the caller, never hardcoded.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::event::Event;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::core::run::Run;
use crate::runtime::errors::EngineError;
use crate::runtime::policy::PhaseTransitions;
use crate::runtime::policy::ToolEligibility;

// ============================================================================
// SECTION: State Machine
// ============================================================================

/// Interpreter over the transition graph and eligibility policy.
#[derive(Clone)]
pub struct StateMachine {
    /// Allowed phase transitions.
    transitions: Arc<PhaseTransitions>,
    /// Per-phase tool allow-list.
    eligibility: Arc<ToolEligibility>,
}

impl StateMachine {
    /// Creates a state machine over the supplied policies.
    #[must_use]
    pub fn new(transitions: Arc<PhaseTransitions>, eligibility: Arc<ToolEligibility>) -> Self {
        Self { transitions, eligibility }
    }

    /// Returns true when the run may transition to the target phase.
    #[must_use]
    pub fn can_transition(&self, run: &Run, to: Phase) -> bool {
        self.transitions.can_transition(run.phase, to)
    }

    /// Validates a transition and returns the event that performs it.
    ///
    /// The caller persists the event and applies it through the reducer, so
    /// live mutation and replay share one code path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::TransitionNotAllowed`] when the edge is not in
    /// the configured graph.
    pub fn transition(
        &self,
        run: &Run,
        to: Phase,
        reason: &str,
    ) -> Result<Event, EngineError> {
        if !self.transitions.can_transition(run.phase, to) {
            return Err(EngineError::TransitionNotAllowed { from: run.phase, to });
        }
        Ok(Event::StateTransitioned { from: run.phase, to, reason: reason.to_owned() })
    }

    /// Returns true when the tool is allowed in the run's current phase.
    #[must_use]
    pub fn is_tool_allowed(&self, run: &Run, tool: &ToolName) -> bool {
        self.eligibility.is_allowed(run.phase, tool)
    }

    /// Returns the tools allowed in the run's current phase, in sorted order.
    #[must_use]
    pub fn allowed_tools(&self, run: &Run) -> Vec<ToolName> {
        self.eligibility.allowed_tools(run.phase)
    }

    /// Returns true when the run's current phase is terminal.
    #[must_use]
    pub fn is_terminal(&self, run: &Run) -> bool {
        run.phase.is_terminal()
    }
}
