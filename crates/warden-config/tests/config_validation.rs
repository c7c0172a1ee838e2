// crates/warden-config/tests/config_validation.rs
// ============================================================================
// Module: Config Validation Tests
// Description: Parsing, validation limits, and policy conversions.
// ============================================================================
//! ## Overview
//! Validates strict TOML parsing (unknown fields rejected), hard limits, and
//! the conversions from the config model into runtime policy types.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    missing_docs,
    reason = "Test-only panic-based assertions are permitted."
)]

use std::time::Duration;

use warden_config::ConfigError;
use warden_config::WardenConfig;
use warden_config::config_toml_example;
use warden_core::BudgetName;
use warden_core::Phase;
use warden_core::RiskLevel;
use warden_core::ToolName;

// ============================================================================
// SECTION: Parsing
// ============================================================================

#[test]
fn test_empty_config_takes_defaults() {
    let config = WardenConfig::from_toml("").unwrap();

    assert_eq!(config.engine.max_steps, 64);
    assert_eq!(config.engine.risk_threshold, "high");
    assert!(config.engine.retry.is_none());
    assert!(config.policy.default_transitions);
    assert!(config.policy.eligibility.is_empty());
}

#[test]
fn test_unknown_fields_are_rejected() {
    let err = WardenConfig::from_toml("[engine]\nmax_stepz = 10\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));

    let err = WardenConfig::from_toml("[surprise]\nvalue = 1\n").unwrap_err();
    assert!(matches!(err, ConfigError::Parse(_)));
}

#[test]
fn test_example_config_parses_through_the_loader() {
    let config = WardenConfig::from_toml(&config_toml_example()).unwrap();

    assert_eq!(config.engine.tool_call_budget.as_deref(), Some("tool_calls"));
    assert_eq!(config.engine.cache_ttl_ms, Some(60_000));
    assert_eq!(config.policy.budgets.get("tool_calls"), Some(&32));

    let eligibility = config.eligibility().unwrap();
    assert!(eligibility.is_allowed(Phase::Explore, &ToolName::new("search")));
    assert!(eligibility.is_allowed(Phase::Act, &ToolName::new("write_report")));
    assert!(!eligibility.is_allowed(Phase::Act, &ToolName::new("search")));

    let transitions = config.transitions().unwrap();
    assert!(transitions.can_transition(Phase::Intake, Phase::Explore));
    assert!(transitions.can_transition(Phase::Explore, Phase::Act));
}

// ============================================================================
// SECTION: Validation Limits
// ============================================================================

#[test]
fn test_zero_max_steps_is_rejected() {
    let err = WardenConfig::from_toml("[engine]\nmax_steps = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_risk_threshold_is_rejected() {
    let err = WardenConfig::from_toml("[engine]\nrisk_threshold = \"extreme\"\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_zero_retry_attempts_is_rejected() {
    let toml = "[engine.retry]\nmax_attempts = 0\nbackoff_ms = 10\n";
    let err = WardenConfig::from_toml(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_unknown_phase_name_is_rejected() {
    let toml = "[policy.eligibility]\nwarp = [\"search\"]\n";
    let err = WardenConfig::from_toml(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));

    let toml = "[[policy.transitions]]\nfrom = \"intake\"\nto = \"warp\"\n";
    let err = WardenConfig::from_toml(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_empty_tool_name_is_rejected() {
    let toml = "[policy.eligibility]\nexplore = [\"\"]\n";
    let err = WardenConfig::from_toml(toml).unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

#[test]
fn test_zero_cache_ttl_is_rejected() {
    let err = WardenConfig::from_toml("[engine]\ncache_ttl_ms = 0\n").unwrap_err();
    assert!(matches!(err, ConfigError::Invalid(_)));
}

// ============================================================================
// SECTION: Conversions
// ============================================================================

#[test]
fn test_engine_config_conversion() {
    let toml = r#"
[engine]
max_steps = 10
risk_threshold = "medium"
tool_call_budget = "calls"
cache_ttl_ms = 500

[engine.retry]
max_attempts = 2
backoff_ms = 50
"#;
    let config = WardenConfig::from_toml(toml).unwrap();
    let engine = config.engine_config().unwrap();

    assert_eq!(engine.max_steps, 10);
    assert_eq!(engine.risk_threshold, RiskLevel::Medium);
    assert_eq!(engine.tool_call_budget, Some(BudgetName::new("calls")));
    assert_eq!(engine.cache_ttl, Some(Duration::from_millis(500)));
    let retry = engine.retry.unwrap();
    assert_eq!(retry.max_attempts, 2);
    assert_eq!(retry.backoff, Duration::from_millis(50));
}

#[test]
fn test_budget_conversion_enforces_limits() {
    let toml = "[policy.budgets]\ncalls = 2\n";
    let config = WardenConfig::from_toml(toml).unwrap();
    let budget = config.budget();
    let name = BudgetName::new("calls");

    assert!(budget.consume(&name, 2).is_ok());
    assert!(budget.consume(&name, 1).is_err());
}

#[test]
fn test_disabling_default_transitions_yields_only_declared_edges() {
    let toml = r#"
[policy]
default_transitions = false

[[policy.transitions]]
from = "intake"
to = "done"
"#;
    let config = WardenConfig::from_toml(toml).unwrap();
    let transitions = config.transitions().unwrap();

    assert!(transitions.can_transition(Phase::Intake, Phase::Done));
    assert!(!transitions.can_transition(Phase::Intake, Phase::Explore));
}
