// crates/warden-config/src/lib.rs
// ============================================================================
// Module: Warden Config Library
// Description: Canonical config model and validation for Warden.
// Purpose: Single source of truth for warden.toml semantics.
// Dependencies: warden-core, serde, toml
// ============================================================================

//! ## Overview
//! `warden-config` defines the canonical configuration model for Warden.
//! It provides strict, fail-closed validation and conversions into the
//! runtime policy and engine types, so a host assembles a governed engine
//! from one TOML file.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;
pub mod examples;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
pub use examples::config_toml_example;
