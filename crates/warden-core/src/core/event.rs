// crates/warden-core/src/core/event.rs
// ============================================================================
// Module: Warden Events
// Description: Persisted, ordered events that fully reconstruct a run.
// Purpose: Serve as the single source of truth for replay.
// Dependencies: crate::core::{evidence, identifiers, run, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Events are the durability boundary of the engine: everything the reducer
//! needs to rebuild a [`crate::core::run::Run`] field-for-field is embedded
//! in the event payloads, including timestamps. The ledger is an audit
//! convenience derived from the same execution; it is never consulted by
//! replay.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::evidence::Evidence;
use crate::core::identifiers::EventSeq;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Event
// ============================================================================

/// Persisted event describing one state-changing fact about a run.
///
/// # Invariants
/// - Each variant has exactly one defined reducer effect; see
///   [`crate::runtime::replay::apply_event`].
/// - Variants are stable for serialization; replay depends on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Event {
    /// Run was created with a goal.
    RunStarted {
        /// Free-text goal supplied at run start.
        goal: String,
    },
    /// Run moved to another lifecycle phase.
    StateTransitioned {
        /// Phase before the transition.
        from: Phase,
        /// Phase after the transition.
        to: Phase,
        /// Stated reason for the transition.
        reason: String,
    },
    /// Tool invocation was dispatched into the pipeline.
    ToolCalled {
        /// Tool being invoked.
        tool: ToolName,
    },
    /// Tool invocation succeeded.
    ToolSucceeded {
        /// Tool that succeeded.
        tool: ToolName,
    },
    /// Tool invocation failed with an execution error.
    ToolFailed {
        /// Tool that failed.
        tool: ToolName,
        /// Error text surfaced from the tool.
        error: String,
    },
    /// Run variable was set.
    VariableSet {
        /// Variable key.
        key: String,
        /// Variable value.
        value: Value,
    },
    /// Evidence was appended to the run.
    EvidenceAdded {
        /// The appended evidence.
        evidence: Evidence,
    },
    /// Run paused awaiting human input.
    HumanInputRequested {
        /// Question text posed to the human.
        question: String,
        /// Permitted answers; empty means free-form input.
        options: Vec<String>,
    },
    /// Run resumed with a human answer.
    HumanInputProvided {
        /// Answer supplied on resume.
        answer: String,
    },
    /// Run completed successfully.
    RunCompleted {
        /// Human-readable summary of the outcome.
        summary: String,
        /// Terminal result payload.
        result: Value,
    },
    /// Run failed.
    RunFailed {
        /// Terminal failure reason.
        reason: String,
    },
}

impl Event {
    /// Returns a stable label for the event kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RunStarted { .. } => "run_started",
            Self::StateTransitioned { .. } => "state_transitioned",
            Self::ToolCalled { .. } => "tool_called",
            Self::ToolSucceeded { .. } => "tool_succeeded",
            Self::ToolFailed { .. } => "tool_failed",
            Self::VariableSet { .. } => "variable_set",
            Self::EvidenceAdded { .. } => "evidence_added",
            Self::HumanInputRequested { .. } => "human_input_requested",
            Self::HumanInputProvided { .. } => "human_input_provided",
            Self::RunCompleted { .. } => "run_completed",
            Self::RunFailed { .. } => "run_failed",
        }
    }
}

// ============================================================================
// SECTION: Event Record
// ============================================================================

/// Event with the storage envelope assigned on append.
///
/// # Invariants
/// - `seq` is strictly increasing within one run's log, starting at 0.
/// - `timestamp` is non-decreasing within one run's log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Run the event belongs to.
    pub run_id: RunId,
    /// Position within the run's event log.
    pub seq: EventSeq,
    /// Time the event was appended.
    pub timestamp: Timestamp,
    /// The event payload.
    pub event: Event,
}
