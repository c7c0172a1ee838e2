// crates/warden-core/src/runtime/approval.rs
// ============================================================================
// Module: Warden Built-in Approvers
// Description: Auto-approve, auto-deny, and callback approval strategies.
// Purpose: Provide stateless approver implementations for common policies.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! Approvers are pure policy objects: given an [`ApprovalRequest`] they
//! return a verdict with a reason, an approver identity, and a timestamp.
//! [`CallbackApprover`] adapts an arbitrary function for human-in-the-loop
//! integration; the middleware layer decides *when* approval is needed, the
//! approver only decides the verdict.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use crate::core::identifiers::ApproverId;
use crate::core::time::Clock;
use crate::interfaces::ApprovalError;
use crate::interfaces::ApprovalOutcome;
use crate::interfaces::ApprovalRequest;
use crate::interfaces::Approver;

// ============================================================================
// SECTION: Auto Approve
// ============================================================================

/// Approver that approves every request.
pub struct AutoApprove {
    /// Timestamp source for verdicts.
    clock: Arc<dyn Clock>,
}

impl AutoApprove {
    /// Creates an auto-approve policy.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Approver for AutoApprove {
    fn approve(&self, _request: &ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> {
        Ok(ApprovalOutcome {
            approved: true,
            reason: "auto-approved by policy".to_owned(),
            approver: ApproverId::new("auto-approve"),
            timestamp: self.clock.now(),
        })
    }
}

// ============================================================================
// SECTION: Auto Deny
// ============================================================================

/// Approver that denies every request.
pub struct AutoDeny {
    /// Timestamp source for verdicts.
    clock: Arc<dyn Clock>,
}

impl AutoDeny {
    /// Creates an auto-deny policy.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self { clock }
    }
}

impl Approver for AutoDeny {
    fn approve(&self, _request: &ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> {
        Ok(ApprovalOutcome {
            approved: false,
            reason: "auto-denied by policy".to_owned(),
            approver: ApproverId::new("auto-deny"),
            timestamp: self.clock.now(),
        })
    }
}

// ============================================================================
// SECTION: Callback Approver
// ============================================================================

/// Verdict function used by [`CallbackApprover`].
type ApprovalFn = dyn Fn(&ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> + Send + Sync;

/// Approver that delegates the verdict to an arbitrary callback.
///
/// The callback owns the full outcome, including the approver identity and
/// timestamp, so human-in-the-loop integrations can attach their own.
pub struct CallbackApprover {
    /// Verdict callback.
    callback: Box<ApprovalFn>,
}

impl CallbackApprover {
    /// Creates an approver from a verdict callback.
    #[must_use]
    pub fn new(
        callback: impl Fn(&ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        Self { callback: Box::new(callback) }
    }
}

impl Approver for CallbackApprover {
    fn approve(&self, request: &ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError> {
        (self.callback)(request)
    }
}
