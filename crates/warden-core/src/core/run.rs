// crates/warden-core/src/core/run.rs
// ============================================================================
// Module: Warden Run Model
// Description: The run aggregate, lifecycle phases, and status machine.
// Purpose: Capture deterministic run evolution for replay and audit.
// Dependencies: crate::core::{evidence, identifiers}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Run`] is the aggregate root of one end-to-end execution. It is mutated
//! exclusively by the engine applying events, which is the same reducer the
//! replay subsystem uses; live state and reconstructed state therefore share
//! one mutation path. Once [`RunStatus`] reaches a terminal value the engine
//! stops mutating the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::evidence::Evidence;
use crate::core::identifiers::RunId;

// ============================================================================
// SECTION: Lifecycle Phase
// ============================================================================

/// Structural phase of a run's lifecycle.
///
/// # Invariants
/// - Phases carry no data; all mutable data lives on [`Run`].
/// - Variants are stable for serialization and config matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Initial phase; goal intake.
    Intake,
    /// Information gathering.
    Explore,
    /// Choosing a course of action.
    Decide,
    /// Performing side effects.
    Act,
    /// Checking the outcome of actions.
    Validate,
    /// Terminal success phase.
    Done,
    /// Terminal failure phase.
    Failed,
}

impl Phase {
    /// Returns true for terminal phases.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Failed)
    }

    /// Returns true for the only phase in which side effects are permitted.
    #[must_use]
    pub const fn allows_side_effects(self) -> bool {
        matches!(self, Self::Act)
    }

    /// Returns a stable label for the phase.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Intake => "intake",
            Self::Explore => "explore",
            Self::Decide => "decide",
            Self::Act => "act",
            Self::Validate => "validate",
            Self::Done => "done",
            Self::Failed => "failed",
        }
    }

    /// Returns every phase in declaration order.
    #[must_use]
    pub const fn all() -> [Self; 7] {
        [
            Self::Intake,
            Self::Explore,
            Self::Decide,
            Self::Act,
            Self::Validate,
            Self::Done,
            Self::Failed,
        ]
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a phase from a string label.
#[derive(Debug, Error)]
#[error("unknown phase: {0}")]
pub struct ParsePhaseError(String);

impl FromStr for Phase {
    type Err = ParsePhaseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "intake" => Ok(Self::Intake),
            "explore" => Ok(Self::Explore),
            "decide" => Ok(Self::Decide),
            "act" => Ok(Self::Act),
            "validate" => Ok(Self::Validate),
            "done" => Ok(Self::Done),
            "failed" => Ok(Self::Failed),
            other => Err(ParsePhaseError(other.to_owned())),
        }
    }
}

// ============================================================================
// SECTION: Run Status
// ============================================================================

/// Run lifecycle status.
///
/// # Invariants
/// - `Completed` and `Failed` are terminal; the engine never mutates a run
///   after reaching them.
/// - `Paused` is the only non-terminal status requiring external input to
///   make forward progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    /// Run created but not yet stepped.
    Pending,
    /// Run is actively being driven by the engine.
    Running,
    /// Run is suspended awaiting human input.
    Paused,
    /// Run finished successfully.
    Completed,
    /// Run finished unsuccessfully.
    Failed,
}

impl RunStatus {
    /// Returns true for terminal statuses.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

// ============================================================================
// SECTION: Pending Question
// ============================================================================

/// Question recorded on a paused run awaiting human input.
///
/// # Invariants
/// - Present iff the run status is [`RunStatus::Paused`].
/// - When `options` is non-empty, a resume answer must match one option.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingQuestion {
    /// Question text posed to the human.
    pub question: String,
    /// Permitted answers; empty means free-form input.
    pub options: Vec<String>,
}

// ============================================================================
// SECTION: Run Aggregate
// ============================================================================

/// Aggregate root of one governed execution.
///
/// # Invariants
/// - `evidence` is append-only and timestamp-ordered; entries are never
///   mutated or removed.
/// - Mutation happens only through the event reducer; see
///   [`crate::runtime::replay::apply_event`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    /// Immutable run identifier.
    pub id: RunId,
    /// Free-text goal supplied at run start.
    pub goal: String,
    /// Current lifecycle phase.
    pub phase: Phase,
    /// Current lifecycle status.
    pub status: RunStatus,
    /// Ordered, append-only observations.
    pub evidence: Vec<Evidence>,
    /// Terminal result payload when completed.
    pub result: Option<Value>,
    /// Terminal error text when failed.
    pub error: Option<String>,
    /// Key-value variables set during the run.
    pub vars: BTreeMap<String, Value>,
    /// Pending question when paused awaiting human input.
    pub pending_question: Option<PendingQuestion>,
}

impl Run {
    /// Creates a new pending run at the intake phase.
    #[must_use]
    pub fn new(id: RunId, goal: impl Into<String>) -> Self {
        Self {
            id,
            goal: goal.into(),
            phase: Phase::Intake,
            status: RunStatus::Pending,
            evidence: Vec::new(),
            result: None,
            error: None,
            vars: BTreeMap::new(),
            pending_question: None,
        }
    }

    /// Returns true when the run has reached a terminal status.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}
