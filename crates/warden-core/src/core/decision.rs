// crates/warden-core/src/core/decision.rs
// ============================================================================
// Module: Warden Decisions
// Description: The planner's chosen next action for one engine step.
// Purpose: Express planner intent as data; the engine dispatches exhaustively.
// Dependencies: crate::core::{identifiers, run}, serde, serde_json
// ============================================================================

//! ## Overview
//! A [`Decision`] is pure intent with no execution. The planner produces
//! exactly one per step; the engine matches exhaustively, so adding a variant
//! is a compile-time-checked change at every dispatch site.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::ToolName;
use crate::core::run::Phase;

// ============================================================================
// SECTION: Decision
// ============================================================================

/// Planner decision for one engine step.
///
/// # Invariants
/// - Exactly one variant per step; the engine never synthesizes decisions.
/// - Variants are stable for serialization and ledger details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Decision {
    /// Invoke a registered tool through the middleware pipeline.
    CallTool {
        /// Tool to invoke.
        tool: ToolName,
        /// Opaque input payload handed to the tool unmodified.
        input: Vec<u8>,
        /// Planner's stated reason for the call.
        reason: String,
    },
    /// Transition the run to another lifecycle phase.
    Transition {
        /// Target phase.
        to: Phase,
        /// Planner's stated reason for the transition.
        reason: String,
    },
    /// Complete the run successfully.
    Finish {
        /// Human-readable summary of the outcome.
        summary: String,
        /// Terminal result payload.
        result: Value,
    },
    /// Fail the run deliberately.
    Fail {
        /// Human-readable failure reason.
        reason: String,
        /// Optional underlying error text.
        error: Option<String>,
    },
    /// Pause the run and ask a human for input.
    AskHuman {
        /// Question text posed to the human.
        question: String,
        /// Permitted answers; empty means free-form input.
        options: Vec<String>,
    },
}

impl Decision {
    /// Returns a stable label for the decision kind.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::CallTool { .. } => "call_tool",
            Self::Transition { .. } => "transition",
            Self::Finish { .. } => "finish",
            Self::Fail { .. } => "fail",
            Self::AskHuman { .. } => "ask_human",
        }
    }
}
