// crates/warden-core/src/lib.rs
// ============================================================================
// Module: Warden Core
// Description: Governed execution runtime for autonomous agent workflows.
// Purpose: Expose the run data model, collaborator interfaces, and run engine.
// Dependencies: serde, serde_json, sha2, thiserror, time
// ============================================================================

//! ## Overview
//! Warden Core is a governed execution runtime: a planner proposes decisions,
//! the engine constrains them against declarative policies (eligibility,
//! transitions, budgets, approval), executes tool invocations through a
//! composable middleware pipeline, and records every step in an append-only
//! ledger plus an event log from which any run can be deterministically
//! reconstructed.
//!
//! The crate is organized like its storage-agnostic siblings:
//! - [`core`] holds the pure data model (runs, decisions, evidence, events).
//! - [`interfaces`] holds backend-agnostic collaborator contracts.
//! - [`runtime`] holds the engine, policies, middleware, and reference stores.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod core;
pub mod interfaces;
pub mod runtime;

// ============================================================================
// SECTION: Re-exports
// ============================================================================

pub use core::decision::Decision;
pub use core::event::Event;
pub use core::event::EventRecord;
pub use core::evidence::Evidence;
pub use core::identifiers::ApproverId;
pub use core::identifiers::BudgetName;
pub use core::identifiers::EntryId;
pub use core::identifiers::EventSeq;
pub use core::identifiers::RunId;
pub use core::identifiers::ToolName;
pub use core::ledger::LedgerEntry;
pub use core::ledger::LedgerEntryKind;
pub use core::run::PendingQuestion;
pub use core::run::Phase;
pub use core::run::Run;
pub use core::run::RunStatus;
pub use core::time::Clock;
pub use core::time::LogicalClock;
pub use core::time::SystemClock;
pub use core::time::Timestamp;
pub use core::tool::RiskLevel;
pub use core::tool::ToolAnnotations;
pub use interfaces::ApprovalError;
pub use interfaces::ApprovalOutcome;
pub use interfaces::ApprovalRequest;
pub use interfaces::Approver;
pub use interfaces::ArtifactError;
pub use interfaces::ArtifactMetadata;
pub use interfaces::ArtifactRef;
pub use interfaces::ArtifactStore;
pub use interfaces::CacheError;
pub use interfaces::CacheStore;
pub use interfaces::CancellationToken;
pub use interfaces::EventStore;
pub use interfaces::EventStoreError;
pub use interfaces::Planner;
pub use interfaces::PlannerError;
pub use interfaces::Tool;
pub use interfaces::ToolContext;
pub use interfaces::ToolError;
pub use runtime::approval::AutoApprove;
pub use runtime::approval::AutoDeny;
pub use runtime::approval::CallbackApprover;
pub use runtime::artifacts::InMemoryArtifactStore;
pub use runtime::cache::InMemoryCache;
pub use runtime::engine::EngineConfig;
pub use runtime::engine::PolicySet;
pub use runtime::engine::RetryPolicy;
pub use runtime::engine::RunEngine;
pub use runtime::errors::EngineError;
pub use runtime::events::InMemoryEventStore;
pub use runtime::ledger::Ledger;
pub use runtime::machine::StateMachine;
pub use runtime::middleware::ExecutionContext;
pub use runtime::middleware::ExecutionObserver;
pub use runtime::middleware::Handler;
pub use runtime::middleware::Middleware;
pub use runtime::middleware::NoopObserver;
pub use runtime::middleware::chain;
pub use runtime::planner::ScriptedPlanner;
pub use runtime::policy::Budget;
pub use runtime::policy::BudgetView;
pub use runtime::policy::PhaseTransitions;
pub use runtime::policy::ToolEligibility;
pub use runtime::registry::RegistryError;
pub use runtime::registry::ToolRegistry;
pub use runtime::replay::Replay;
pub use runtime::replay::ReplayError;
pub use runtime::replay::TimelineStep;
