// crates/warden-core/tests/common/mod.rs
// ============================================================================
// Module: Shared Test Fixtures
// Description: Tools, policies, and engine builders shared across test files.
// ============================================================================
//! ## Overview
//! Deterministic fixtures: an echo tool, an always-failing tool, a counting
//! tool for cache assertions, and a helper that assembles an engine with a
//! permissive default policy.

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::missing_docs_in_private_items,
    missing_docs,
    dead_code,
    reason = "Test-only fixtures; not every test file uses every helper."
)]

use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use std::sync::atomic::Ordering;

use serde_json::Value;
use serde_json::json;

use warden_core::EngineConfig;
use warden_core::InMemoryEventStore;
use warden_core::LogicalClock;
use warden_core::Phase;
use warden_core::PhaseTransitions;
use warden_core::RiskLevel;
use warden_core::RunEngine;
use warden_core::Tool;
use warden_core::ToolAnnotations;
use warden_core::ToolContext;
use warden_core::ToolEligibility;
use warden_core::ToolError;
use warden_core::ToolName;
use warden_core::ToolRegistry;
use warden_core::runtime::engine::PolicySet;
use warden_core::runtime::policy::Budget;

// ============================================================================
// SECTION: Tools
// ============================================================================

/// Tool that returns its input unchanged.
#[derive(Debug)]
pub struct EchoTool {
    /// Registered name.
    pub name: &'static str,
    /// Declared annotations.
    pub annotations: ToolAnnotations,
}

impl EchoTool {
    /// Creates a read-only echo tool.
    pub fn read_only(name: &'static str) -> Self {
        Self { name, annotations: ToolAnnotations::read_only() }
    }

    /// Creates an echo tool with explicit annotations.
    pub fn with_annotations(name: &'static str, annotations: ToolAnnotations) -> Self {
        Self { name, annotations }
    }
}

impl Tool for EchoTool {
    fn name(&self) -> ToolName {
        ToolName::new(self.name)
    }

    fn description(&self) -> String {
        "returns its input unchanged".to_owned()
    }

    fn annotations(&self) -> ToolAnnotations {
        self.annotations
    }

    fn execute(&self, _ctx: &ToolContext, input: &[u8]) -> Result<Vec<u8>, ToolError> {
        Ok(input.to_vec())
    }
}

/// Tool that fails every execution.
#[derive(Debug)]
pub struct FailTool {
    /// Registered name.
    pub name: &'static str,
}

impl Tool for FailTool {
    fn name(&self) -> ToolName {
        ToolName::new(self.name)
    }

    fn description(&self) -> String {
        "fails every execution".to_owned()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    fn execute(&self, _ctx: &ToolContext, _input: &[u8]) -> Result<Vec<u8>, ToolError> {
        Err(ToolError::Failed("deliberate failure".to_owned()))
    }
}

/// Cacheable tool that counts executions and returns a fixed payload.
#[derive(Debug)]
pub struct CountingTool {
    /// Registered name.
    pub name: &'static str,
    /// Number of times `execute` actually ran.
    pub executions: Arc<AtomicU64>,
    /// Fixed JSON payload returned on every execution.
    pub output: Value,
}

impl CountingTool {
    /// Creates a cacheable counting tool.
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            executions: Arc::new(AtomicU64::new(0)),
            output: json!({ "answer": 42 }),
        }
    }
}

impl Tool for CountingTool {
    fn name(&self) -> ToolName {
        ToolName::new(self.name)
    }

    fn description(&self) -> String {
        "counts executions and returns a fixed payload".to_owned()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations { cacheable: true, ..ToolAnnotations::read_only() }
    }

    fn execute(&self, _ctx: &ToolContext, _input: &[u8]) -> Result<Vec<u8>, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        serde_json::to_vec(&self.output).map_err(|err| ToolError::Failed(err.to_string()))
    }
}

/// Tool that fails a fixed number of times before succeeding.
#[derive(Debug)]
pub struct FlakyTool {
    /// Registered name.
    pub name: &'static str,
    /// Failures to emit before the first success.
    pub failures_before_success: u64,
    /// Number of times `execute` ran.
    pub executions: Arc<AtomicU64>,
}

impl FlakyTool {
    /// Creates a flaky tool.
    pub fn new(name: &'static str, failures_before_success: u64) -> Self {
        Self { name, failures_before_success, executions: Arc::new(AtomicU64::new(0)) }
    }
}

impl Tool for FlakyTool {
    fn name(&self) -> ToolName {
        ToolName::new(self.name)
    }

    fn description(&self) -> String {
        "fails a fixed number of times before succeeding".to_owned()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    fn execute(&self, _ctx: &ToolContext, input: &[u8]) -> Result<Vec<u8>, ToolError> {
        let attempt = self.executions.fetch_add(1, Ordering::SeqCst);
        if attempt < self.failures_before_success {
            return Err(ToolError::Failed("transient failure".to_owned()));
        }
        Ok(input.to_vec())
    }
}

/// Tool that cancels its own token mid-execution and reports the cancellation.
#[derive(Debug)]
pub struct AbortingTool {
    /// Registered name.
    pub name: &'static str,
    /// Number of times `execute` ran.
    pub executions: Arc<AtomicU64>,
}

impl AbortingTool {
    /// Creates a self-cancelling tool.
    pub fn new(name: &'static str) -> Self {
        Self { name, executions: Arc::new(AtomicU64::new(0)) }
    }
}

impl Tool for AbortingTool {
    fn name(&self) -> ToolName {
        ToolName::new(self.name)
    }

    fn description(&self) -> String {
        "cancels its own token and fails".to_owned()
    }

    fn annotations(&self) -> ToolAnnotations {
        ToolAnnotations::read_only()
    }

    fn execute(&self, ctx: &ToolContext, _input: &[u8]) -> Result<Vec<u8>, ToolError> {
        self.executions.fetch_add(1, Ordering::SeqCst);
        ctx.cancel.cancel();
        Err(ToolError::Cancelled)
    }
}

// ============================================================================
// SECTION: Policy Builders
// ============================================================================

/// Returns an eligibility policy allowing the named tools in every phase
/// that permits work.
pub fn allow_everywhere(tools: &[&str]) -> ToolEligibility {
    let mut eligibility = ToolEligibility::new();
    for phase in [Phase::Intake, Phase::Explore, Phase::Decide, Phase::Act, Phase::Validate] {
        for tool in tools {
            eligibility.allow(phase, ToolName::new(*tool));
        }
    }
    eligibility
}

// ============================================================================
// SECTION: Engine Builder
// ============================================================================

/// Assembles an engine with the default graph, the given eligibility, an
/// in-memory event store, and a logical clock.
pub fn test_engine(eligibility: ToolEligibility, config: EngineConfig) -> RunEngine {
    test_engine_with(eligibility, config, PolicyOverrides::default())
}

/// Optional policy overrides for [`test_engine_with`].
#[derive(Default)]
pub struct PolicyOverrides {
    /// Budget to install instead of an unlimited one.
    pub budget: Option<Budget>,
    /// Approver to install.
    pub approver: Option<Arc<dyn warden_core::Approver>>,
}

/// Assembles an engine with explicit policy overrides.
pub fn test_engine_with(
    eligibility: ToolEligibility,
    config: EngineConfig,
    overrides: PolicyOverrides,
) -> RunEngine {
    let registry = Arc::new(ToolRegistry::new());
    let policies = PolicySet {
        eligibility: Arc::new(eligibility),
        transitions: Arc::new(PhaseTransitions::default_graph()),
        budget: Arc::new(overrides.budget.unwrap_or_default()),
        approver: overrides.approver,
    };
    let events = Arc::new(InMemoryEventStore::new());
    RunEngine::new(registry, policies, config, events)
        .with_clock(Arc::new(LogicalClock::new()))
}

/// Returns a low risk threshold config so approval tests gate on Medium.
pub fn approval_config() -> EngineConfig {
    EngineConfig { risk_threshold: RiskLevel::Medium, ..EngineConfig::default() }
}
