// crates/warden-core/src/runtime/errors.rs
// ============================================================================
// Module: Warden Engine Errors
// Description: The typed error taxonomy for policy and engine failures.
// Purpose: Let callers match failures by identity instead of string parsing.
// Dependencies: crate::core, crate::interfaces, crate::runtime::registry, thiserror
// ============================================================================

//! ## Overview
//! Every policy violation and engine fault surfaces as one [`EngineError`]
//! variant. Policy violations are detected before the tool executes and never
//! partially apply; tool-execution failures surface as [`EngineError::Tool`]
//! and are converted into evidence rather than failing the run.

// ============================================================================
// SECTION: Imports
// ============================================================================

use thiserror::Error;

use crate::core::identifiers::BudgetName;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::interfaces::CacheError;
use crate::interfaces::EventStoreError;
use crate::runtime::registry::RegistryError;

// ============================================================================
// SECTION: Engine Error
// ============================================================================

/// Typed failure produced by the policy layer or the run engine.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Tool is not eligible in the current phase.
    #[error("tool not allowed in phase {phase}: {tool}")]
    ToolNotAllowed {
        /// Phase the run was in.
        phase: Phase,
        /// Tool that was rejected.
        tool: ToolName,
    },
    /// Phase transition is not in the allowed graph.
    #[error("transition not allowed: {from} -> {to}")]
    TransitionNotAllowed {
        /// Phase the run was in.
        from: Phase,
        /// Requested target phase.
        to: Phase,
    },
    /// Gated tool was invoked with no approver configured.
    #[error("approval required for tool: {tool}")]
    ApprovalRequired {
        /// Tool that required approval.
        tool: ToolName,
    },
    /// Approver explicitly rejected the invocation.
    #[error("approval denied for tool {tool}: {reason}")]
    ApprovalDenied {
        /// Tool that was denied.
        tool: ToolName,
        /// Approver's stated reason.
        reason: String,
    },
    /// Budget consumption would exceed the configured limit.
    #[error("budget exceeded: {name} (limit {limit})")]
    BudgetExceeded {
        /// Budget counter that was exhausted.
        name: BudgetName,
        /// Configured limit for the counter.
        limit: u64,
    },
    /// Tool name is already registered.
    #[error("tool already registered: {0}")]
    ToolExists(ToolName),
    /// Tool name is not registered.
    #[error("tool not found: {0}")]
    ToolNotFound(ToolName),
    /// Run identifier already has an event history.
    #[error("run already started: {0}")]
    RunExists(RunId),
    /// Run is paused and must be resumed with input before driving.
    #[error("run is awaiting human input")]
    AwaitingHumanInput,
    /// Resume was attempted on a run with no pending question.
    #[error("run has no pending question")]
    NoPendingQuestion,
    /// Resume answer did not match the recorded options.
    #[error("invalid human input: {answer}")]
    InvalidHumanInput {
        /// Answer that was rejected.
        answer: String,
    },
    /// Engine step limit was exceeded.
    #[error("max steps exceeded: {limit}")]
    MaxStepsExceeded {
        /// Configured step limit.
        limit: u32,
    },
    /// Caller cancelled the run.
    #[error("run cancelled")]
    Cancelled,
    /// Planner failed to produce a decision.
    #[error("planner error: {0}")]
    Planner(String),
    /// Tool execution failed; surfaced to the planner as evidence.
    #[error("tool {tool} failed: {message}")]
    Tool {
        /// Tool that failed.
        tool: ToolName,
        /// Error text surfaced from the tool.
        message: String,
    },
    /// Approver failed to produce a verdict.
    #[error("approver error: {0}")]
    Approver(String),
    /// Event store failure.
    #[error(transparent)]
    Events(#[from] EventStoreError),
    /// Cache failure.
    #[error(transparent)]
    Cache(#[from] CacheError),
}

impl From<RegistryError> for EngineError {
    fn from(error: RegistryError) -> Self {
        match error {
            RegistryError::ToolExists(name) => Self::ToolExists(name),
            RegistryError::ToolNotFound(name) => Self::ToolNotFound(name),
        }
    }
}
