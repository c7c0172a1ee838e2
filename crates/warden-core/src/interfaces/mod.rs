// crates/warden-core/src/interfaces/mod.rs
// ============================================================================
// Module: Warden Interfaces
// Description: Backend-agnostic contracts for tools, planners, and stores.
// Purpose: Define the collaborator surfaces consumed by the run engine.
// Dependencies: crate::core, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Interfaces define how the engine integrates with external collaborators
//! without embedding backend-specific details. Implementations must be
//! deterministic where the contract says so and fail closed on missing or
//! invalid data. Tool payloads are opaque JSON-compatible byte sequences;
//! the core never interprets their contents.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::core::decision::Decision;
use crate::core::event::Event;
use crate::core::event::EventRecord;
use crate::core::identifiers::ApproverId;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::run::Run;
use crate::core::time::Timestamp;
use crate::core::tool::RiskLevel;
use crate::core::tool::ToolAnnotations;

// ============================================================================
// SECTION: Cancellation
// ============================================================================

/// Cooperative cancellation signal shared between the caller, the engine,
/// and in-flight tool executions.
///
/// # Invariants
/// - Cancellation is one-way; a cancelled token never becomes uncancelled.
/// - Clones observe the same underlying flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    /// Shared cancellation flag.
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new, uncancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Returns true when cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// SECTION: Tool Contract
// ============================================================================

/// Execution context handed to a tool.
///
/// # Invariants
/// - Tools must honor the cancellation token and fail fast when it fires.
#[derive(Debug, Clone)]
pub struct ToolContext {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Cooperative cancellation signal.
    pub cancel: CancellationToken,
}

/// Tool execution errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool rejected its input payload.
    #[error("tool rejected input: {0}")]
    InvalidInput(String),
    /// Tool execution was cancelled mid-flight.
    #[error("tool execution cancelled")]
    Cancelled,
    /// Tool execution failed.
    #[error("tool execution failed: {0}")]
    Failed(String),
}

/// A named capability invoked by the engine through the middleware pipeline.
///
/// Input and output are opaque JSON-compatible byte sequences; the engine
/// records them but never interprets them.
pub trait Tool: std::fmt::Debug + Send + Sync {
    /// Returns the unique tool name.
    fn name(&self) -> ToolName;

    /// Returns a human-readable description of the tool.
    fn description(&self) -> String;

    /// Returns the tool's behavioral annotations.
    fn annotations(&self) -> ToolAnnotations;

    /// Returns a structural description of the expected input payload.
    fn input_schema(&self) -> Value {
        Value::Null
    }

    /// Returns a structural description of the produced output payload.
    fn output_schema(&self) -> Value {
        Value::Null
    }

    /// Executes the tool against an opaque input payload.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError`] when execution fails; the engine records the
    /// failure as evidence rather than failing the run.
    fn execute(&self, ctx: &ToolContext, input: &[u8]) -> Result<Vec<u8>, ToolError>;
}

// ============================================================================
// SECTION: Planner Contract
// ============================================================================

/// Planner errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Planner has no further decisions to offer.
    #[error("planner exhausted: {0}")]
    Exhausted(String),
    /// Planner failed to produce a decision.
    #[error("planner error: {0}")]
    Failed(String),
}

/// Decision-making collaborator driven by the engine.
///
/// The engine constrains only the shape of the planner's output, not how
/// the planner arrives at it.
pub trait Planner {
    /// Produces exactly one decision for the current run state.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError`] when no decision can be produced; the engine
    /// fails the run.
    fn decide(&mut self, run: &Run) -> Result<Decision, PlannerError>;
}

// ============================================================================
// SECTION: Approver Contract
// ============================================================================

/// Approval request presented to an approver.
///
/// # Invariants
/// - Describes the gated invocation without exposing mutable engine state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalRequest {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Tool awaiting approval.
    pub tool: ToolName,
    /// Declared risk level of the tool.
    pub risk: RiskLevel,
    /// True when the tool is declared destructive.
    pub destructive: bool,
}

/// Verdict returned by an approver.
///
/// # Invariants
/// - A denied outcome must carry a reason for the audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApprovalOutcome {
    /// True when the invocation may proceed.
    pub approved: bool,
    /// Stated reason for the verdict.
    pub reason: String,
    /// Identity of the approver that decided.
    pub approver: ApproverId,
    /// Time the verdict was produced.
    pub timestamp: Timestamp,
}

/// Approval errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ApprovalError {
    /// Approver failed to produce a verdict.
    #[error("approver error: {0}")]
    Failed(String),
}

/// Stateless policy component gating destructive or high-risk tools.
pub trait Approver: Send + Sync {
    /// Decides whether a gated invocation may proceed.
    ///
    /// # Errors
    ///
    /// Returns [`ApprovalError`] when no verdict can be produced; the engine
    /// treats this as a denial.
    fn approve(&self, request: &ApprovalRequest) -> Result<ApprovalOutcome, ApprovalError>;
}

// ============================================================================
// SECTION: Event Store
// ============================================================================

/// Event store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum EventStoreError {
    /// Store I/O error.
    #[error("event store io error: {0}")]
    Io(String),
    /// Store reported an error.
    #[error("event store error: {0}")]
    Store(String),
}

/// Durable, ordered, append-only event log keyed by run.
///
/// Events are the unit recoverable after a crash and the only source of
/// truth for replay.
pub trait EventStore: Send + Sync {
    /// Appends events for a run in the order given.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] when persistence fails.
    fn append(
        &self,
        run_id: &RunId,
        events: Vec<(Timestamp, Event)>,
    ) -> Result<(), EventStoreError>;

    /// Returns the ordered event records for a run.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] when the log cannot be read.
    fn events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, EventStoreError>;

    /// Returns the identifiers of all runs with at least one event.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError`] when the log cannot be read.
    fn run_ids(&self) -> Result<Vec<RunId>, EventStoreError>;
}

// ============================================================================
// SECTION: Cache Store
// ============================================================================

/// Cache errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum CacheError {
    /// Cache backend reported an error.
    #[error("cache error: {0}")]
    Backend(String),
}

/// Key-addressed cache with TTL expiry and copy-on-read semantics.
pub trait CacheStore: Send + Sync {
    /// Returns an independent copy of the cached value when present and
    /// unexpired.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError>;

    /// Stores a value under a key, optionally bounded by a TTL.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError`] when the backend fails.
    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError>;
}

// ============================================================================
// SECTION: Artifact Store
// ============================================================================

/// Metadata sidecar stored alongside artifact content.
///
/// # Invariants
/// - Preserved exactly as supplied; `size` is filled in by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ArtifactMetadata {
    /// Display name for the artifact.
    pub name: String,
    /// Content type label.
    pub content_type: Option<String>,
    /// Content size in bytes.
    pub size: u64,
    /// Custom key-value pairs.
    pub custom: BTreeMap<String, String>,
}

/// Content-addressed artifact reference.
///
/// # Invariants
/// - Identical content yields identical references; the digest is the
///   lowercase hex SHA-256 of the content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArtifactRef {
    /// Lowercase hex SHA-256 digest of the content.
    pub digest: String,
}

/// Artifact store errors.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// No artifact exists for the reference.
    #[error("artifact not found: {0}")]
    NotFound(String),
    /// Store reported an error.
    #[error("artifact store error: {0}")]
    Store(String),
}

/// Content-addressed artifact store with a metadata sidecar.
pub trait ArtifactStore: Send + Sync {
    /// Stores content and returns its content-addressed reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when persistence fails.
    fn store(
        &self,
        content: &[u8],
        metadata: ArtifactMetadata,
    ) -> Result<ArtifactRef, ArtifactError>;

    /// Retrieves artifact content by reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NotFound`] when no artifact exists for the
    /// reference.
    fn retrieve(&self, artifact: &ArtifactRef) -> Result<Vec<u8>, ArtifactError>;

    /// Returns true when an artifact exists for the reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError`] when the store cannot be read.
    fn exists(&self, artifact: &ArtifactRef) -> Result<bool, ArtifactError>;

    /// Deletes the artifact for the reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NotFound`] when no artifact exists for the
    /// reference.
    fn delete(&self, artifact: &ArtifactRef) -> Result<(), ArtifactError>;

    /// Returns the metadata sidecar for the reference.
    ///
    /// # Errors
    ///
    /// Returns [`ArtifactError::NotFound`] when no artifact exists for the
    /// reference.
    fn metadata(&self, artifact: &ArtifactRef) -> Result<ArtifactMetadata, ArtifactError>;
}
