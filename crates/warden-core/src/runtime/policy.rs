// crates/warden-core/src/runtime/policy.rs
// ============================================================================
// Module: Warden Policy Set
// Description: Eligibility, transition, and budget policies for runs.
// Purpose: Constrain planner decisions with declarative, deny-by-default rules.
// Dependencies: crate::core, crate::runtime::errors, serde
// ============================================================================

//! ## Overview
//! Policies are data, not code: eligibility is a per-phase allow-list of tool
//! names, transitions are a directed graph over phases, and budgets are named
//! counters with limits. All three deny by default. Budgets are the only
//! mutable policy and consume atomically under one lock so two concurrent
//! consumers can never both succeed past the limit.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::Mutex;
use std::sync::PoisonError;

use serde::Deserialize;
use serde::Serialize;

use crate::core::identifiers::BudgetName;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::runtime::errors::EngineError;

// ============================================================================
// SECTION: Tool Eligibility
// ============================================================================

/// Per-phase allow-list of tool names.
///
/// # Invariants
/// - Deny-by-default: a phase with no entry allows no tools.
/// - Immutable once shared with the engine; build it fully first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolEligibility {
    /// Allowed tool names keyed by phase.
    allowed: BTreeMap<Phase, BTreeSet<ToolName>>,
}

impl ToolEligibility {
    /// Creates an eligibility policy that allows nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allows a tool in a phase.
    pub fn allow(&mut self, phase: Phase, tool: ToolName) {
        self.allowed.entry(phase).or_default().insert(tool);
    }

    /// Returns true when the tool is allowed in the phase.
    #[must_use]
    pub fn is_allowed(&self, phase: Phase, tool: &ToolName) -> bool {
        self.allowed.get(&phase).is_some_and(|tools| tools.contains(tool))
    }

    /// Returns a copy of the tools allowed in a phase, in sorted order.
    #[must_use]
    pub fn allowed_tools(&self, phase: Phase) -> Vec<ToolName> {
        self.allowed.get(&phase).map(|tools| tools.iter().cloned().collect()).unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Phase Transitions
// ============================================================================

/// Directed graph of allowed phase transitions.
///
/// # Invariants
/// - Deny-by-default: a pair with no edge is rejected.
/// - Immutable once shared with the engine; build it fully first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseTransitions {
    /// Allowed target phases keyed by source phase.
    edges: BTreeMap<Phase, BTreeSet<Phase>>,
}

impl PhaseTransitions {
    /// Creates a transition policy that allows nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the default lifecycle graph.
    ///
    /// Intake -> {Explore, Failed}; Explore -> {Decide, Failed};
    /// Decide -> {Act, Done, Failed}; Act -> {Validate, Failed};
    /// Validate -> {Done, Explore, Failed}. The Validate -> Explore edge
    /// enables iterative loop-back; every non-terminal phase can escape to
    /// Failed.
    #[must_use]
    pub fn default_graph() -> Self {
        let mut graph = Self::new();
        graph.allow(Phase::Intake, Phase::Explore);
        graph.allow(Phase::Intake, Phase::Failed);
        graph.allow(Phase::Explore, Phase::Decide);
        graph.allow(Phase::Explore, Phase::Failed);
        graph.allow(Phase::Decide, Phase::Act);
        graph.allow(Phase::Decide, Phase::Done);
        graph.allow(Phase::Decide, Phase::Failed);
        graph.allow(Phase::Act, Phase::Validate);
        graph.allow(Phase::Act, Phase::Failed);
        graph.allow(Phase::Validate, Phase::Done);
        graph.allow(Phase::Validate, Phase::Explore);
        graph.allow(Phase::Validate, Phase::Failed);
        graph
    }

    /// Allows a transition from one phase to another.
    pub fn allow(&mut self, from: Phase, to: Phase) {
        self.edges.entry(from).or_default().insert(to);
    }

    /// Returns true when the transition is allowed.
    #[must_use]
    pub fn can_transition(&self, from: Phase, to: Phase) -> bool {
        self.edges.get(&from).is_some_and(|targets| targets.contains(&to))
    }

    /// Returns a copy of the phases reachable from a phase, in sorted order.
    #[must_use]
    pub fn targets(&self, from: Phase) -> Vec<Phase> {
        self.edges.get(&from).map(|targets| targets.iter().copied().collect()).unwrap_or_default()
    }
}

// ============================================================================
// SECTION: Budget
// ============================================================================

/// State of one budget counter.
///
/// # Invariants
/// - `used` never exceeds `limit` when a limit is configured.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetCounter {
    /// Configured limit; `None` means unlimited.
    pub limit: Option<u64>,
    /// Amount consumed so far.
    pub used: u64,
}

/// Named consumable counters with limits.
///
/// # Invariants
/// - Check-then-consume is atomic under one lock; consumption is permanent
///   for the life of the budget (no refund path).
#[derive(Debug, Default)]
pub struct Budget {
    /// Counter state keyed by budget name.
    counters: Mutex<BTreeMap<BudgetName, BudgetCounter>>,
}

impl Budget {
    /// Creates a budget with no configured limits.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a budget from named limits.
    #[must_use]
    pub fn with_limits(limits: BTreeMap<BudgetName, u64>) -> Self {
        let counters = limits
            .into_iter()
            .map(|(name, limit)| (name, BudgetCounter { limit: Some(limit), used: 0 }))
            .collect();
        Self { counters: Mutex::new(counters) }
    }

    /// Sets the limit for a named counter, preserving prior consumption.
    pub fn set_limit(&self, name: BudgetName, limit: u64) {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters.entry(name).or_insert(BudgetCounter { limit: None, used: 0 }).limit = Some(limit);
    }

    /// Atomically consumes from a named counter.
    ///
    /// Counters without a configured limit are tracked but never rejected.
    /// Returns the remaining amount when a limit is configured.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::BudgetExceeded`] when consumption would exceed
    /// the configured limit; the counter is left untouched.
    pub fn consume(&self, name: &BudgetName, amount: u64) -> Result<Option<u64>, EngineError> {
        let mut counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        let counter =
            counters.entry(name.clone()).or_insert(BudgetCounter { limit: None, used: 0 });
        let used = counter.used.saturating_add(amount);
        if let Some(limit) = counter.limit {
            if used > limit {
                return Err(EngineError::BudgetExceeded { name: name.clone(), limit });
            }
            counter.used = used;
            return Ok(Some(limit - used));
        }
        counter.used = used;
        Ok(None)
    }

    /// Returns the remaining amount for a counter, when a limit is configured.
    #[must_use]
    pub fn remaining(&self, name: &BudgetName) -> Option<u64> {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        counters
            .get(name)
            .and_then(|counter| counter.limit.map(|limit| limit.saturating_sub(counter.used)))
    }

    /// Returns a read-only snapshot of all counters.
    #[must_use]
    pub fn view(&self) -> BudgetView {
        let counters = self.counters.lock().unwrap_or_else(PoisonError::into_inner);
        BudgetView { counters: counters.clone() }
    }
}

/// Read-only snapshot of budget counters.
///
/// # Invariants
/// - A detached copy; mutating the live budget does not affect the view.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BudgetView {
    /// Counter state at snapshot time, keyed by budget name.
    counters: BTreeMap<BudgetName, BudgetCounter>,
}

impl BudgetView {
    /// Returns the counter state for a name, when configured or consumed.
    #[must_use]
    pub fn counter(&self, name: &BudgetName) -> Option<BudgetCounter> {
        self.counters.get(name).copied()
    }

    /// Returns the remaining amount for a counter, when a limit is configured.
    #[must_use]
    pub fn remaining(&self, name: &BudgetName) -> Option<u64> {
        self.counters
            .get(name)
            .and_then(|counter| counter.limit.map(|limit| limit.saturating_sub(counter.used)))
    }
}
