// crates/warden-core/src/core/ledger.rs
// ============================================================================
// Module: Warden Ledger Records
// Description: Immutable audit entries recorded for every run operation.
// Purpose: Provide a human-auditable trail distinct from the replay event log.
// Dependencies: crate::core::{identifiers, time}, serde, serde_json
// ============================================================================

//! ## Overview
//! Ledger entries are the audit face of the engine: one entry per observable
//! operation, never edited or deleted. `details` is an opaque JSON payload
//! whose shape is owned by the recording site; queries must not assume more
//! than the entry kind.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;

use crate::core::identifiers::EntryId;
use crate::core::identifiers::RunId;
use crate::core::time::Timestamp;

// ============================================================================
// SECTION: Entry Kind
// ============================================================================

/// Classification of a ledger entry.
///
/// # Invariants
/// - Variants are stable for serialization and audit queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerEntryKind {
    /// Run was created.
    RunStarted,
    /// Run moved to another lifecycle phase.
    StateTransition,
    /// Planner produced a decision.
    Decision,
    /// Tool invocation was dispatched.
    ToolCall,
    /// Tool invocation succeeded.
    ToolResult,
    /// Tool invocation failed.
    ToolError,
    /// Approval was requested for a gated tool.
    ApprovalRequest,
    /// Approver returned a verdict.
    ApprovalResult,
    /// Budget was consumed.
    BudgetConsumed,
    /// Budget consumption was rejected at the limit.
    BudgetExhausted,
    /// Run paused to ask a human for input.
    HumanInputRequest,
    /// Human input was provided on resume.
    HumanInputResponse,
    /// Run completed successfully.
    RunCompleted,
    /// Run failed.
    RunFailed,
}

impl LedgerEntryKind {
    /// Returns a stable label for the entry kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::RunStarted => "run_started",
            Self::StateTransition => "state_transition",
            Self::Decision => "decision",
            Self::ToolCall => "tool_call",
            Self::ToolResult => "tool_result",
            Self::ToolError => "tool_error",
            Self::ApprovalRequest => "approval_request",
            Self::ApprovalResult => "approval_result",
            Self::BudgetConsumed => "budget_consumed",
            Self::BudgetExhausted => "budget_exhausted",
            Self::HumanInputRequest => "human_input_request",
            Self::HumanInputResponse => "human_input_response",
            Self::RunCompleted => "run_completed",
            Self::RunFailed => "run_failed",
        }
    }
}

// ============================================================================
// SECTION: Ledger Entry
// ============================================================================

/// Immutable audit record for one run operation.
///
/// # Invariants
/// - `id` and `timestamp` never change after creation.
/// - Entries are returned to callers as defensive copies only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// Entry identifier assigned by the ledger on append.
    pub id: EntryId,
    /// Run the entry belongs to.
    pub run_id: RunId,
    /// Entry classification.
    pub kind: LedgerEntryKind,
    /// Time the entry was appended.
    pub timestamp: Timestamp,
    /// Opaque details payload owned by the recording site.
    pub details: Value,
}
