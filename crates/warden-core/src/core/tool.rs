// crates/warden-core/src/core/tool.rs
// ============================================================================
// Module: Warden Tool Annotations
// Description: Behavioral annotations and risk classification for tools.
// Purpose: Let policy middleware reason about tools without executing them.
// Dependencies: serde
// ============================================================================

//! ## Overview
//! Tool annotations are declarative facts a tool states about itself. The
//! approval middleware gates on `destructive` and [`RiskLevel`]; the caching
//! middleware gates on `cacheable`. The core never verifies these claims;
//! they are policy inputs supplied by the tool author.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::str::FromStr;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Risk Level
// ============================================================================

/// Risk classification for a tool.
///
/// # Invariants
/// - Totally ordered from `None` (least risky) to `Critical` (most risky) so
///   approval thresholds compare with `>=`.
/// - Variants are stable for serialization and config matching.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    /// No meaningful risk.
    #[default]
    None,
    /// Low risk.
    Low,
    /// Medium risk.
    Medium,
    /// High risk.
    High,
    /// Critical risk.
    Critical,
}

impl RiskLevel {
    /// Returns a stable label for the risk level.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing a risk level from a string label.
#[derive(Debug, Error)]
#[error("unknown risk level: {0}")]
pub struct ParseRiskLevelError(String);

impl FromStr for RiskLevel {
    type Err = ParseRiskLevelError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(Self::None),
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(ParseRiskLevelError(other.to_owned())),
        }
    }
}

// ============================================================================
// SECTION: Annotations
// ============================================================================

/// Declarative behavioral annotations for a tool.
///
/// # Invariants
/// - Annotations are fixed at registration time; policy reads them, never
///   mutates them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ToolAnnotations {
    /// Tool performs no side effects.
    pub read_only: bool,
    /// Tool performs destructive side effects and always requires approval.
    pub destructive: bool,
    /// Tool is safe to retry with the same input.
    pub idempotent: bool,
    /// Tool results may be served from the cache.
    pub cacheable: bool,
    /// Risk classification for approval thresholds.
    pub risk: RiskLevel,
}

impl ToolAnnotations {
    /// Returns annotations for a read-only, no-risk tool.
    #[must_use]
    pub const fn read_only() -> Self {
        Self {
            read_only: true,
            destructive: false,
            idempotent: true,
            cacheable: false,
            risk: RiskLevel::None,
        }
    }

    /// Returns true when the tool requires approval at the given threshold.
    ///
    /// Destructive tools always require approval; otherwise the tool's risk
    /// level must meet the threshold.
    #[must_use]
    pub fn requires_approval(&self, threshold: RiskLevel) -> bool {
        self.destructive || self.risk >= threshold
    }
}
