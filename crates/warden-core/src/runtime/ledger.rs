// crates/warden-core/src/runtime/ledger.rs
// ============================================================================
// Module: Warden Ledger
// Description: Append-only, thread-safe audit log shared across runs.
// Purpose: Record every observable operation with a stable identity and time.
// Dependencies: crate::core, serde_json
// ============================================================================

//! ## Overview
//! The ledger is the audit convenience derived from live execution; replay
//! never reads it. The `record_*` methods are the only write path and are
//! safe for concurrent invocation from many runs. Read accessors return
//! defensive copies so callers cannot mutate ledger history. Entry
//! identifiers increase strictly; timestamps are clamped to be non-decreasing.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde_json::Value;
use serde_json::json;

use crate::core::decision::Decision;
use crate::core::identifiers::BudgetName;
use crate::core::identifiers::EntryId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::ledger::LedgerEntry;
use crate::core::ledger::LedgerEntryKind;
use crate::core::run::Phase;
use crate::core::time::Clock;
use crate::core::time::Timestamp;
use crate::interfaces::ApprovalOutcome;

// ============================================================================
// SECTION: Ledger State
// ============================================================================

/// Interior ledger state guarded by one lock.
#[derive(Debug, Default)]
struct LedgerInner {
    /// All entries in append order.
    entries: Vec<LedgerEntry>,
    /// Next entry identifier to assign.
    next_id: u64,
    /// Last issued timestamp, for the non-decreasing clamp.
    last_timestamp: Option<Timestamp>,
}

/// Append-only audit log shared across concurrently executing runs.
///
/// # Invariants
/// - `count()` only increases; no entry's id or timestamp ever changes.
/// - Timestamps are non-decreasing in append order.
pub struct Ledger {
    /// Entry log and sequencing state.
    inner: Mutex<LedgerInner>,
    /// Timestamp source.
    clock: Arc<dyn Clock>,
}

impl Ledger {
    /// Creates an empty ledger over a timestamp source.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { inner: Mutex::new(LedgerInner::default()), clock }
    }

    /// Appends an entry, assigning its identity and clamped timestamp.
    fn append(&self, run_id: &RunId, kind: LedgerEntryKind, details: Value) -> EntryId {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        let timestamp = inner.last_timestamp.map_or(now, |last| last.max(now));
        let id = EntryId::new(inner.next_id);
        inner.next_id += 1;
        inner.last_timestamp = Some(timestamp);
        inner.entries.push(LedgerEntry { id, run_id: run_id.clone(), kind, timestamp, details });
        id
    }

    // ------------------------------------------------------------------
    // Write path: one method per entry kind.
    // ------------------------------------------------------------------

    /// Records that a run was created.
    pub fn record_run_started(&self, run_id: &RunId, goal: &str) -> EntryId {
        self.append(run_id, LedgerEntryKind::RunStarted, json!({ "goal": goal }))
    }

    /// Records a phase transition.
    pub fn record_state_transition(
        &self,
        run_id: &RunId,
        from: Phase,
        to: Phase,
        reason: &str,
    ) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::StateTransition,
            json!({ "from": from.as_str(), "to": to.as_str(), "reason": reason }),
        )
    }

    /// Records a planner decision.
    pub fn record_decision(&self, run_id: &RunId, decision: &Decision) -> EntryId {
        let details = serde_json::to_value(decision)
            .unwrap_or_else(|_| json!({ "kind": decision.kind() }));
        self.append(run_id, LedgerEntryKind::Decision, details)
    }

    /// Records a tool invocation dispatch.
    pub fn record_tool_call(&self, run_id: &RunId, tool: &ToolName, input: &[u8]) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::ToolCall,
            json!({ "tool": tool.as_str(), "input_bytes": input.len() }),
        )
    }

    /// Records a successful tool result.
    pub fn record_tool_result(&self, run_id: &RunId, tool: &ToolName, output: &[u8]) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::ToolResult,
            json!({ "tool": tool.as_str(), "output_bytes": output.len() }),
        )
    }

    /// Records a failed tool invocation.
    pub fn record_tool_error(&self, run_id: &RunId, tool: &ToolName, error: &str) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::ToolError,
            json!({ "tool": tool.as_str(), "error": error }),
        )
    }

    /// Records that approval was requested for a gated tool.
    pub fn record_approval_request(&self, run_id: &RunId, tool: &ToolName) -> EntryId {
        self.append(run_id, LedgerEntryKind::ApprovalRequest, json!({ "tool": tool.as_str() }))
    }

    /// Records an approval verdict.
    pub fn record_approval_result(
        &self,
        run_id: &RunId,
        tool: &ToolName,
        outcome: &ApprovalOutcome,
    ) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::ApprovalResult,
            json!({
                "tool": tool.as_str(),
                "approved": outcome.approved,
                "reason": outcome.reason,
                "approver": outcome.approver.as_str(),
            }),
        )
    }

    /// Records a successful budget consumption.
    pub fn record_budget_consumed(
        &self,
        run_id: &RunId,
        name: &BudgetName,
        amount: u64,
        remaining: Option<u64>,
    ) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::BudgetConsumed,
            json!({ "budget": name.as_str(), "amount": amount, "remaining": remaining }),
        )
    }

    /// Records a budget consumption rejected at the limit.
    pub fn record_budget_exhausted(
        &self,
        run_id: &RunId,
        name: &BudgetName,
        limit: u64,
    ) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::BudgetExhausted,
            json!({ "budget": name.as_str(), "limit": limit }),
        )
    }

    /// Records that the run paused to ask a human for input.
    pub fn record_human_input_request(
        &self,
        run_id: &RunId,
        question: &str,
        options: &[String],
    ) -> EntryId {
        self.append(
            run_id,
            LedgerEntryKind::HumanInputRequest,
            json!({ "question": question, "options": options }),
        )
    }

    /// Records a human answer supplied on resume.
    pub fn record_human_input_response(&self, run_id: &RunId, answer: &str) -> EntryId {
        self.append(run_id, LedgerEntryKind::HumanInputResponse, json!({ "answer": answer }))
    }

    /// Records that the run completed successfully.
    pub fn record_run_completed(&self, run_id: &RunId, summary: &str) -> EntryId {
        self.append(run_id, LedgerEntryKind::RunCompleted, json!({ "summary": summary }))
    }

    /// Records that the run failed.
    pub fn record_run_failed(&self, run_id: &RunId, reason: &str) -> EntryId {
        self.append(run_id, LedgerEntryKind::RunFailed, json!({ "reason": reason }))
    }

    // ------------------------------------------------------------------
    // Read path: defensive copies only.
    // ------------------------------------------------------------------

    /// Returns copies of all entries in append order.
    #[must_use]
    pub fn entries(&self) -> Vec<LedgerEntry> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clone()
    }

    /// Returns copies of a run's entries in append order.
    #[must_use]
    pub fn entries_for_run(&self, run_id: &RunId) -> Vec<LedgerEntry> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.iter().filter(|entry| &entry.run_id == run_id).cloned().collect()
    }

    /// Returns copies of all entries of one kind in append order.
    #[must_use]
    pub fn entries_by_kind(&self, kind: LedgerEntryKind) -> Vec<LedgerEntry> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.iter().filter(|entry| entry.kind == kind).cloned().collect()
    }

    /// Returns a copy of the most recent entry, when any exists.
    #[must_use]
    pub fn last_entry(&self) -> Option<LedgerEntry> {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.last().cloned()
    }

    /// Returns the total number of entries.
    #[must_use]
    pub fn count(&self) -> usize {
        let inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.len()
    }
}
