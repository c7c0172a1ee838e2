// crates/warden-config/src/config.rs
// ============================================================================
// Module: Warden Configuration
// Description: Configuration loading and validation for Warden.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: warden-core, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! Unknown fields, oversized files, and unparseable phase or risk names fail
//! closed. The parsed model converts into the runtime policy types so hosts
//! assemble an engine from one file.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use warden_core::BudgetName;
use warden_core::EngineConfig;
use warden_core::Phase;
use warden_core::PhaseTransitions;
use warden_core::RiskLevel;
use warden_core::ToolEligibility;
use warden_core::ToolName;
use warden_core::runtime::engine::RetryPolicy;
use warden_core::runtime::policy::Budget;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "warden.toml";
/// Environment variable used to override the config path.
pub(crate) const CONFIG_ENV_VAR: &str = "WARDEN_CONFIG";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum engine step limit accepted from configuration.
pub(crate) const MAX_ENGINE_STEPS: u32 = 100_000;
/// Maximum retry attempts accepted from configuration.
pub(crate) const MAX_RETRY_ATTEMPTS: u32 = 16;
/// Maximum retry backoff in milliseconds accepted from configuration.
pub(crate) const MAX_RETRY_BACKOFF_MS: u64 = 60_000;
/// Maximum cache TTL in milliseconds accepted from configuration.
pub(crate) const MAX_CACHE_TTL_MS: u64 = 86_400_000;
/// Maximum number of eligibility rules accepted from configuration.
pub(crate) const MAX_ELIGIBILITY_RULES: usize = 1024;
/// Maximum number of transition edges accepted from configuration.
pub(crate) const MAX_TRANSITION_EDGES: usize = 256;
/// Maximum number of budget counters accepted from configuration.
pub(crate) const MAX_BUDGET_COUNTERS: usize = 128;

// ============================================================================
// SECTION: Configuration Model
// ============================================================================

/// Root Warden configuration loaded from TOML.
///
/// # Invariants
/// - Unknown fields are rejected; absent sections take defaults.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WardenConfig {
    /// Engine tuning.
    #[serde(default)]
    pub engine: EngineSection,
    /// Declarative policy rules.
    #[serde(default)]
    pub policy: PolicySection,
}

/// Engine tuning section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct EngineSection {
    /// Maximum planner decisions per drive call.
    #[serde(default = "default_max_steps")]
    pub max_steps: u32,
    /// Risk level at or above which tools require approval.
    #[serde(default = "default_risk_threshold")]
    pub risk_threshold: String,
    /// Budget counter consumed once per tool invocation.
    #[serde(default)]
    pub tool_call_budget: Option<String>,
    /// TTL for cached tool results, in milliseconds.
    #[serde(default)]
    pub cache_ttl_ms: Option<u64>,
    /// Retry behavior for failed tool executions.
    #[serde(default)]
    pub retry: Option<RetrySection>,
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            max_steps: default_max_steps(),
            risk_threshold: default_risk_threshold(),
            tool_call_budget: None,
            cache_ttl_ms: None,
            retry: None,
        }
    }
}

/// Retry tuning for failed tool executions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RetrySection {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts, in milliseconds.
    #[serde(default)]
    pub backoff_ms: u64,
}

/// Declarative policy section.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PolicySection {
    /// Start from the default lifecycle transition graph.
    #[serde(default = "default_true")]
    pub default_transitions: bool,
    /// Additional transition edges beyond the default graph.
    #[serde(default)]
    pub transitions: Vec<TransitionRule>,
    /// Allowed tool names keyed by phase name.
    #[serde(default)]
    pub eligibility: BTreeMap<String, Vec<String>>,
    /// Budget limits keyed by counter name.
    #[serde(default)]
    pub budgets: BTreeMap<String, u64>,
}

impl Default for PolicySection {
    fn default() -> Self {
        Self {
            default_transitions: true,
            transitions: Vec::new(),
            eligibility: BTreeMap::new(),
            budgets: BTreeMap::new(),
        }
    }
}

/// One allowed phase transition edge.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TransitionRule {
    /// Source phase name.
    pub from: String,
    /// Target phase name.
    pub to: String,
}

// ============================================================================
// SECTION: Loading and Validation
// ============================================================================

impl WardenConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// Resolution order: explicit path, `WARDEN_CONFIG`, then `warden.toml`
    /// in the working directory.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.policy.validate()?;
        Ok(())
    }

    /// Converts the eligibility rules into the runtime policy type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a phase name does not parse.
    pub fn eligibility(&self) -> Result<ToolEligibility, ConfigError> {
        let mut eligibility = ToolEligibility::new();
        for (phase_name, tools) in &self.policy.eligibility {
            let phase = parse_phase(phase_name)?;
            for tool in tools {
                eligibility.allow(phase, ToolName::new(tool.clone()));
            }
        }
        Ok(eligibility)
    }

    /// Converts the transition rules into the runtime policy type.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when a phase name does not parse.
    pub fn transitions(&self) -> Result<PhaseTransitions, ConfigError> {
        let mut transitions = if self.policy.default_transitions {
            PhaseTransitions::default_graph()
        } else {
            PhaseTransitions::new()
        };
        for rule in &self.policy.transitions {
            let from = parse_phase(&rule.from)?;
            let to = parse_phase(&rule.to)?;
            transitions.allow(from, to);
        }
        Ok(transitions)
    }

    /// Converts the budget limits into a runtime budget.
    #[must_use]
    pub fn budget(&self) -> Budget {
        let limits = self
            .policy
            .budgets
            .iter()
            .map(|(name, limit)| (BudgetName::new(name.clone()), *limit))
            .collect();
        Budget::with_limits(limits)
    }

    /// Converts the engine section into a runtime engine configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the risk threshold does not
    /// parse.
    pub fn engine_config(&self) -> Result<EngineConfig, ConfigError> {
        let risk_threshold = RiskLevel::from_str(&self.engine.risk_threshold).map_err(|_| {
            ConfigError::Invalid(format!(
                "engine.risk_threshold is not a risk level: {}",
                self.engine.risk_threshold
            ))
        })?;
        let retry = self.engine.retry.as_ref().map(|retry| RetryPolicy {
            max_attempts: retry.max_attempts,
            backoff: Duration::from_millis(retry.backoff_ms),
        });
        Ok(EngineConfig {
            max_steps: self.engine.max_steps,
            risk_threshold,
            tool_call_budget: self
                .engine
                .tool_call_budget
                .as_ref()
                .map(|name| BudgetName::new(name.clone())),
            cache_ttl: self.engine.cache_ttl_ms.map(Duration::from_millis),
            retry,
        })
    }
}

impl EngineSection {
    /// Validates engine tuning against hard limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_steps == 0 {
            return Err(ConfigError::Invalid("engine.max_steps must be at least 1".to_string()));
        }
        if self.max_steps > MAX_ENGINE_STEPS {
            return Err(ConfigError::Invalid("engine.max_steps exceeds limit".to_string()));
        }
        RiskLevel::from_str(&self.risk_threshold).map_err(|_| {
            ConfigError::Invalid(format!(
                "engine.risk_threshold is not a risk level: {}",
                self.risk_threshold
            ))
        })?;
        if let Some(name) = &self.tool_call_budget {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "engine.tool_call_budget must be non-empty".to_string(),
                ));
            }
        }
        if let Some(ttl) = self.cache_ttl_ms {
            if ttl == 0 || ttl > MAX_CACHE_TTL_MS {
                return Err(ConfigError::Invalid(
                    "engine.cache_ttl_ms is out of range".to_string(),
                ));
            }
        }
        if let Some(retry) = &self.retry {
            retry.validate()?;
        }
        Ok(())
    }
}

impl RetrySection {
    /// Validates retry tuning against hard limits.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "engine.retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(
                "engine.retry.max_attempts exceeds limit".to_string(),
            ));
        }
        if self.backoff_ms > MAX_RETRY_BACKOFF_MS {
            return Err(ConfigError::Invalid(
                "engine.retry.backoff_ms exceeds limit".to_string(),
            ));
        }
        Ok(())
    }
}

impl PolicySection {
    /// Validates policy rules against hard limits and parseability.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.transitions.len() > MAX_TRANSITION_EDGES {
            return Err(ConfigError::Invalid(
                "policy.transitions exceeds rule limit".to_string(),
            ));
        }
        for rule in &self.transitions {
            parse_phase(&rule.from)?;
            parse_phase(&rule.to)?;
        }
        let rule_count: usize = self.eligibility.values().map(Vec::len).sum();
        if rule_count > MAX_ELIGIBILITY_RULES {
            return Err(ConfigError::Invalid(
                "policy.eligibility exceeds rule limit".to_string(),
            ));
        }
        for (phase_name, tools) in &self.eligibility {
            parse_phase(phase_name)?;
            for tool in tools {
                if tool.trim().is_empty() {
                    return Err(ConfigError::Invalid(format!(
                        "policy.eligibility.{phase_name} contains an empty tool name"
                    )));
                }
            }
        }
        if self.budgets.len() > MAX_BUDGET_COUNTERS {
            return Err(ConfigError::Invalid(
                "policy.budgets exceeds counter limit".to_string(),
            ));
        }
        for name in self.budgets.keys() {
            if name.trim().is_empty() {
                return Err(ConfigError::Invalid(
                    "policy.budgets contains an empty counter name".to_string(),
                ));
            }
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Parses a phase name, mapping failure to a config error.
fn parse_phase(name: &str) -> Result<Phase, ConfigError> {
    Phase::from_str(name)
        .map_err(|_| ConfigError::Invalid(format!("unknown phase name: {name}")))
}

/// Resolves the config path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Default engine step limit.
const fn default_max_steps() -> u32 {
    64
}

/// Default risk threshold name.
fn default_risk_threshold() -> String {
    "high".to_string()
}

/// Serde default helper.
const fn default_true() -> bool {
    true
}
