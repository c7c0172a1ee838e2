// crates/warden-core/src/runtime/mod.rs
// ============================================================================
// Module: Warden Runtime
// Description: The run engine, policies, middleware, and reference stores.
// Purpose: Group everything that executes, gates, and records runs.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The runtime turns the pure data model into a governed execution loop:
//! policies constrain what a planner may do, middleware wraps every tool
//! invocation, the ledger and event store record what actually happened, and
//! replay reconstructs runs from the event log alone.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod approval;
pub mod artifacts;
pub mod cache;
pub mod engine;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod machine;
pub mod middleware;
pub mod planner;
pub mod policy;
pub mod registry;
pub mod replay;
