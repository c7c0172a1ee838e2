// crates/warden-core/src/runtime/planner.rs
// ============================================================================
// Module: Warden Scripted Planner
// Description: Deterministic planner replaying a fixed decision script.
// Purpose: Drive the engine predictably in tests and embedded workflows.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The scripted planner returns a predetermined sequence of decisions, one per
//! `decide` call, regardless of run state. It exists so engine behavior can be
//! exercised without a model in the loop; production hosts supply their own
//! [`Planner`] implementations.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::VecDeque;

use crate::core::decision::Decision;
use crate::core::run::Run;
use crate::interfaces::Planner;
use crate::interfaces::PlannerError;

// ============================================================================
// SECTION: Scripted Planner
// ============================================================================

/// Planner that pops decisions from a fixed script.
///
/// # Invariants
/// - Decisions are returned in script order, exactly once each.
#[derive(Debug, Default)]
pub struct ScriptedPlanner {
    /// Remaining scripted decisions in order.
    script: VecDeque<Decision>,
}

impl ScriptedPlanner {
    /// Creates a planner over a decision script.
    #[must_use]
    pub fn new(decisions: Vec<Decision>) -> Self {
        Self { script: decisions.into() }
    }

    /// Appends a decision to the end of the script.
    pub fn push(&mut self, decision: Decision) {
        self.script.push_back(decision);
    }

    /// Returns the number of decisions left in the script.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl Planner for ScriptedPlanner {
    fn decide(&mut self, _run: &Run) -> Result<Decision, PlannerError> {
        self.script
            .pop_front()
            .ok_or_else(|| PlannerError::Exhausted("decision script is empty".to_owned()))
    }
}
