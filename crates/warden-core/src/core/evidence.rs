// crates/warden-core/src/core/evidence.rs
// ============================================================================
// Module: Warden Evidence
// Description: Immutable, timestamped observations appended to a run.
// Purpose: Preserve what actually happened for audit and planner input.
// Dependencies: crate::core::{identifiers, time}, serde
// ============================================================================

//! ## Overview
//! Evidence is the run's observational history: tool outcomes and human
//! answers. Entries are append-only and timestamp-ordered; a failed tool call
//! is evidence too, so the planner can decide whether to retry, compensate,
//! or fail.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::ToolName;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Evidence
// ============================================================================

/// Immutable observation appended to a run's history.
///
/// # Invariants
/// - Never mutated or removed once appended.
/// - Timestamps are non-decreasing in append order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Evidence {
    /// Successful tool invocation output.
    ToolResult {
        /// Tool that produced the output.
        tool: ToolName,
        /// Opaque output payload.
        output: Vec<u8>,
        /// Time the result was observed.
        timestamp: Timestamp,
    },
    /// Failed tool invocation.
    ToolFailure {
        /// Tool that failed.
        tool: ToolName,
        /// Error text surfaced from the tool.
        error: String,
        /// Time the failure was observed.
        timestamp: Timestamp,
    },
    /// Human answer to a pending question.
    HumanInput {
        /// Question that was posed.
        question: String,
        /// Answer supplied on resume.
        answer: String,
        /// Time the answer was recorded.
        timestamp: Timestamp,
    },
}

impl Evidence {
    /// Returns the observation timestamp.
    #[must_use]
    pub const fn timestamp(&self) -> Timestamp {
        match self {
            Self::ToolResult { timestamp, .. }
            | Self::ToolFailure { timestamp, .. }
            | Self::HumanInput { timestamp, .. } => *timestamp,
        }
    }

    /// Returns a stable label for the evidence kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ToolResult { .. } => "tool_result",
            Self::ToolFailure { .. } => "tool_failure",
            Self::HumanInput { .. } => "human_input",
        }
    }
}
