// crates/warden-config/src/examples.rs
// ============================================================================
// Module: Config Examples
// Description: Canonical example configuration payloads.
// Purpose: Deterministic examples for docs and tooling.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example for Warden configuration. Output is deterministic and
//! kept in sync with the config model; the self-consistency test parses it
//! through the real loader.

/// Returns a canonical example `warden.toml` configuration.
#[must_use]
pub fn config_toml_example() -> String {
    String::from(
        r#"[engine]
max_steps = 64
risk_threshold = "high"
tool_call_budget = "tool_calls"
cache_ttl_ms = 60000

[engine.retry]
max_attempts = 3
backoff_ms = 100

[policy]
default_transitions = true

[[policy.transitions]]
from = "explore"
to = "act"

[policy.eligibility]
explore = ["search", "fetch"]
act = ["write_report"]
validate = ["search"]

[policy.budgets]
tool_calls = 32
"#,
    )
}
