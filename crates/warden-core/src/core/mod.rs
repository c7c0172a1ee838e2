// crates/warden-core/src/core/mod.rs
// ============================================================================
// Module: Warden Core Data Model
// Description: Pure data types shared across the run engine.
// Purpose: Group identifiers, runs, decisions, evidence, events, and records.
// Dependencies: crate submodules
// ============================================================================

//! ## Overview
//! The data model is deliberately free of runtime machinery: no locks, no
//! clocks, no I/O. Everything here is serializable and comparable so that
//! replayed runs can be checked field-for-field against live runs.

// ============================================================================
// SECTION: Submodules
// ============================================================================

pub mod decision;
pub mod event;
pub mod evidence;
pub mod identifiers;
pub mod ledger;
pub mod run;
pub mod time;
pub mod tool;
