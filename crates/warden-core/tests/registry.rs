// crates/warden-core/tests/registry.rs
// ============================================================================
// Module: Tool Registry Tests
// Description: Unique registration, lookup, and deregistration.
// ============================================================================
//! ## Overview
//! Validates registry uniqueness and that lookups hand out shared references
//! without disturbing registered tools.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

mod common;

use std::sync::Arc;

use warden_core::RegistryError;
use warden_core::ToolName;
use warden_core::ToolRegistry;

use common::EchoTool;

#[test]
fn test_registration_is_unique_per_name() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::read_only("echo"))).unwrap();

    let err = registry.register(Arc::new(EchoTool::read_only("echo"))).unwrap_err();
    assert!(matches!(err, RegistryError::ToolExists(name) if name.as_str() == "echo"));
    assert_eq!(registry.len(), 1);
}

#[test]
fn test_lookup_and_names_are_sorted() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::read_only("zeta"))).unwrap();
    registry.register(Arc::new(EchoTool::read_only("alpha"))).unwrap();

    let tool = registry.get(&ToolName::new("alpha")).unwrap();
    assert_eq!(tool.name(), ToolName::new("alpha"));
    assert_eq!(registry.names(), vec![ToolName::new("alpha"), ToolName::new("zeta")]);
    assert!(registry.contains(&ToolName::new("zeta")));
}

#[test]
fn test_unknown_lookup_is_rejected() {
    let registry = ToolRegistry::new();
    let err = registry.get(&ToolName::new("ghost")).unwrap_err();
    assert!(matches!(err, RegistryError::ToolNotFound(_)));
}

#[test]
fn test_deregister_frees_the_name() {
    let registry = ToolRegistry::new();
    registry.register(Arc::new(EchoTool::read_only("echo"))).unwrap();

    registry.deregister(&ToolName::new("echo")).unwrap();
    assert!(registry.is_empty());

    // The name is reusable after deregistration.
    registry.register(Arc::new(EchoTool::read_only("echo"))).unwrap();
    assert_eq!(registry.len(), 1);

    let err = registry.deregister(&ToolName::new("ghost")).unwrap_err();
    assert!(matches!(err, RegistryError::ToolNotFound(_)));
}
