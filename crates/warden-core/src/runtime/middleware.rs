// crates/warden-core/src/runtime/middleware.rs
// ============================================================================
// Module: Warden Middleware Pipeline
// Description: Composable cross-cutting policies around tool execution.
// Purpose: Gate, meter, observe, cache, and record every tool invocation.
// Dependencies: crate::core, crate::interfaces, crate::runtime::{errors, policy, ledger}, sha2
// ============================================================================

//! ## Overview
//! A middleware wraps a [`Handler`] and returns a new one; [`chain`] composes
//! them so that the first middleware listed is the outermost wrapper and
//! execution order is exactly definition order. Failure at any stage
//! short-circuits with a typed error without invoking later stages or the
//! tool. The canonical chain for every invocation is: eligibility, approval,
//! budget, observation, caching, ledger recording, then the tool itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use sha2::Digest;
use sha2::Sha256;

use crate::core::identifiers::BudgetName;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::core::tool::RiskLevel;
use crate::core::tool::ToolAnnotations;
use crate::interfaces::ApprovalRequest;
use crate::interfaces::Approver;
use crate::interfaces::CacheStore;
use crate::interfaces::CancellationToken;
use crate::runtime::errors::EngineError;
use crate::runtime::ledger::Ledger;
use crate::runtime::policy::Budget;
use crate::runtime::policy::BudgetView;
use crate::runtime::policy::ToolEligibility;

// ============================================================================
// SECTION: Execution Context
// ============================================================================

/// Immutable facts about one tool invocation, visible to every stage.
///
/// # Invariants
/// - Stages read the context; shared state changes only through the budget,
///   cache, and ledger APIs.
#[derive(Clone)]
pub struct ExecutionContext {
    /// Run the invocation belongs to.
    pub run_id: RunId,
    /// Phase the run is in at dispatch time.
    pub phase: Phase,
    /// Tool being invoked.
    pub tool: ToolName,
    /// Declared annotations of the tool.
    pub annotations: ToolAnnotations,
    /// Opaque input payload.
    pub input: Vec<u8>,
    /// Read-only budget snapshot at dispatch time.
    pub budget: BudgetView,
    /// Cooperative cancellation signal.
    pub cancel: CancellationToken,
}

// ============================================================================
// SECTION: Handler and Chain
// ============================================================================

/// Terminal or wrapped tool invocation function.
pub type Handler = Box<dyn Fn(&ExecutionContext) -> Result<Vec<u8>, EngineError> + Send + Sync>;

/// A composable wrapper around a [`Handler`].
pub trait Middleware: Send + Sync {
    /// Wraps the next handler, choosing whether and when to invoke it.
    fn wrap(&self, next: Handler) -> Handler;
}

/// Composes middleware so the first listed is the outermost wrapper.
///
/// Execution order is exactly definition order; the terminal handler runs
/// last, and any stage may short-circuit without invoking it.
#[must_use]
pub fn chain(stages: Vec<Box<dyn Middleware>>, terminal: Handler) -> Handler {
    stages.into_iter().rev().fold(terminal, |next, stage| stage.wrap(next))
}

// ============================================================================
// SECTION: Execution Observer
// ============================================================================

/// Observability hook invoked around each tool execution.
///
/// Intentionally dependency-light so hosts can plug in their own logging or
/// metrics without the core taking a hard dependency.
pub trait ExecutionObserver: Send + Sync {
    /// Called before the remaining stages run.
    fn tool_started(&self, _ctx: &ExecutionContext) {}

    /// Called after the remaining stages return.
    fn tool_finished(&self, _ctx: &ExecutionContext, _outcome: &Result<Vec<u8>, EngineError>) {}
}

/// Observer that records nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl ExecutionObserver for NoopObserver {}

// ============================================================================
// SECTION: Eligibility Stage
// ============================================================================

/// Rejects tools not allowed in the current phase.
pub struct EligibilityMiddleware {
    /// Per-phase allow-list.
    eligibility: Arc<ToolEligibility>,
}

impl EligibilityMiddleware {
    /// Creates the eligibility stage.
    #[must_use]
    pub fn new(eligibility: Arc<ToolEligibility>) -> Self {
        Self { eligibility }
    }
}

impl Middleware for EligibilityMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let eligibility = Arc::clone(&self.eligibility);
        Box::new(move |ctx| {
            if !eligibility.is_allowed(ctx.phase, &ctx.tool) {
                return Err(EngineError::ToolNotAllowed {
                    phase: ctx.phase,
                    tool: ctx.tool.clone(),
                });
            }
            next(ctx)
        })
    }
}

// ============================================================================
// SECTION: Approval Stage
// ============================================================================

/// Gates destructive or high-risk tools behind an approver.
pub struct ApprovalMiddleware {
    /// Configured approver, when any.
    approver: Option<Arc<dyn Approver>>,
    /// Risk level at or above which approval is required.
    threshold: RiskLevel,
    /// Audit log for requests and verdicts.
    ledger: Arc<Ledger>,
}

impl ApprovalMiddleware {
    /// Creates the approval stage.
    #[must_use]
    pub fn new(
        approver: Option<Arc<dyn Approver>>,
        threshold: RiskLevel,
        ledger: Arc<Ledger>,
    ) -> Self {
        Self { approver, threshold, ledger }
    }
}

impl Middleware for ApprovalMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let approver = self.approver.clone();
        let threshold = self.threshold;
        let ledger = Arc::clone(&self.ledger);
        Box::new(move |ctx| {
            if !ctx.annotations.requires_approval(threshold) {
                return next(ctx);
            }
            let Some(approver) = &approver else {
                return Err(EngineError::ApprovalRequired { tool: ctx.tool.clone() });
            };
            ledger.record_approval_request(&ctx.run_id, &ctx.tool);
            let request = ApprovalRequest {
                run_id: ctx.run_id.clone(),
                tool: ctx.tool.clone(),
                risk: ctx.annotations.risk,
                destructive: ctx.annotations.destructive,
            };
            let outcome = approver
                .approve(&request)
                .map_err(|err| EngineError::Approver(err.to_string()))?;
            ledger.record_approval_result(&ctx.run_id, &ctx.tool, &outcome);
            if !outcome.approved {
                return Err(EngineError::ApprovalDenied {
                    tool: ctx.tool.clone(),
                    reason: outcome.reason,
                });
            }
            next(ctx)
        })
    }
}

// ============================================================================
// SECTION: Budget Stage
// ============================================================================

/// Consumes from a named budget before allowing the invocation to proceed.
pub struct BudgetMiddleware {
    /// Shared budget counters.
    budget: Arc<Budget>,
    /// Counter consumed once per invocation, when configured.
    counter: Option<BudgetName>,
    /// Audit log for consumption and exhaustion.
    ledger: Arc<Ledger>,
}

impl BudgetMiddleware {
    /// Creates the budget stage.
    #[must_use]
    pub fn new(budget: Arc<Budget>, counter: Option<BudgetName>, ledger: Arc<Ledger>) -> Self {
        Self { budget, counter, ledger }
    }
}

impl Middleware for BudgetMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let budget = Arc::clone(&self.budget);
        let counter = self.counter.clone();
        let ledger = Arc::clone(&self.ledger);
        Box::new(move |ctx| {
            let Some(name) = &counter else {
                return next(ctx);
            };
            match budget.consume(name, 1) {
                Ok(remaining) => {
                    ledger.record_budget_consumed(&ctx.run_id, name, 1, remaining);
                }
                Err(err) => {
                    if let EngineError::BudgetExceeded { name, limit } = &err {
                        ledger.record_budget_exhausted(&ctx.run_id, name, *limit);
                    }
                    return Err(err);
                }
            }
            next(ctx)
        })
    }
}

// ============================================================================
// SECTION: Observation Stage
// ============================================================================

/// Invokes the configured observer around the remaining stages.
pub struct ObserverMiddleware {
    /// Observability hook.
    observer: Arc<dyn ExecutionObserver>,
}

impl ObserverMiddleware {
    /// Creates the observation stage.
    #[must_use]
    pub fn new(observer: Arc<dyn ExecutionObserver>) -> Self {
        Self { observer }
    }
}

impl Middleware for ObserverMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let observer = Arc::clone(&self.observer);
        Box::new(move |ctx| {
            observer.tool_started(ctx);
            let outcome = next(ctx);
            observer.tool_finished(ctx, &outcome);
            outcome
        })
    }
}

// ============================================================================
// SECTION: Caching Stage
// ============================================================================

/// Serves cacheable tool results from the cache and populates it on success.
///
/// Only tools annotated `cacheable` participate. Keys are derived from the
/// tool name and a SHA-256 digest of the input payload, so identical inputs
/// hit the same entry. Outputs that are not valid JSON bypass the cache.
pub struct CachingMiddleware {
    /// Key-addressed cache.
    cache: Arc<dyn CacheStore>,
    /// TTL applied to populated entries.
    ttl: Option<Duration>,
}

impl CachingMiddleware {
    /// Creates the caching stage.
    #[must_use]
    pub fn new(cache: Arc<dyn CacheStore>, ttl: Option<Duration>) -> Self {
        Self { cache, ttl }
    }

    /// Derives the cache key for an invocation.
    #[must_use]
    pub fn cache_key(tool: &ToolName, input: &[u8]) -> String {
        let mut hasher = Sha256::new();
        hasher.update(input);
        let digest = hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        format!("{tool}:{hex}")
    }
}

impl Middleware for CachingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let cache = Arc::clone(&self.cache);
        let ttl = self.ttl;
        Box::new(move |ctx| {
            if !ctx.annotations.cacheable {
                return next(ctx);
            }
            let key = Self::cache_key(&ctx.tool, &ctx.input);
            if let Some(hit) = cache.get(&key)? {
                return serde_json::to_vec(&hit)
                    .map_err(|err| EngineError::Cache(crate::interfaces::CacheError::Backend(
                        err.to_string(),
                    )));
            }
            let output = next(ctx)?;
            if let Ok(value) = serde_json::from_slice(&output) {
                cache.set(&key, value, ttl)?;
            }
            Ok(output)
        })
    }
}

// ============================================================================
// SECTION: Recording Stage
// ============================================================================

/// Appends ToolCall before and ToolResult/ToolError after the invocation.
pub struct RecordingMiddleware {
    /// Audit log for invocation records.
    ledger: Arc<Ledger>,
}

impl RecordingMiddleware {
    /// Creates the recording stage.
    #[must_use]
    pub fn new(ledger: Arc<Ledger>) -> Self {
        Self { ledger }
    }
}

impl Middleware for RecordingMiddleware {
    fn wrap(&self, next: Handler) -> Handler {
        let ledger = Arc::clone(&self.ledger);
        Box::new(move |ctx| {
            ledger.record_tool_call(&ctx.run_id, &ctx.tool, &ctx.input);
            match next(ctx) {
                Ok(output) => {
                    ledger.record_tool_result(&ctx.run_id, &ctx.tool, &output);
                    Ok(output)
                }
                Err(err) => {
                    ledger.record_tool_error(&ctx.run_id, &ctx.tool, &err.to_string());
                    Err(err)
                }
            }
        })
    }
}

// ============================================================================
// SECTION: Default Chain
// ============================================================================

/// Parameters for assembling the canonical middleware chain.
pub struct DefaultChain {
    /// Per-phase allow-list.
    pub eligibility: Arc<ToolEligibility>,
    /// Configured approver, when any.
    pub approver: Option<Arc<dyn Approver>>,
    /// Risk level at or above which approval is required.
    pub risk_threshold: RiskLevel,
    /// Shared budget counters.
    pub budget: Arc<Budget>,
    /// Counter consumed once per invocation, when configured.
    pub budget_counter: Option<BudgetName>,
    /// Observability hook.
    pub observer: Arc<dyn ExecutionObserver>,
    /// Key-addressed cache for cacheable tools, when configured.
    pub cache: Option<Arc<dyn CacheStore>>,
    /// TTL applied to populated cache entries.
    pub cache_ttl: Option<Duration>,
    /// Audit log shared by the gating and recording stages.
    pub ledger: Arc<Ledger>,
}

impl DefaultChain {
    /// Assembles the canonical chain around a terminal handler.
    ///
    /// Order: eligibility, approval, budget, observation, caching (when a
    /// cache is configured), ledger recording, then the terminal handler.
    #[must_use]
    pub fn build(self, terminal: Handler) -> Handler {
        let mut stages: Vec<Box<dyn Middleware>> = vec![
            Box::new(EligibilityMiddleware::new(self.eligibility)),
            Box::new(ApprovalMiddleware::new(
                self.approver,
                self.risk_threshold,
                Arc::clone(&self.ledger),
            )),
            Box::new(BudgetMiddleware::new(
                self.budget,
                self.budget_counter,
                Arc::clone(&self.ledger),
            )),
            Box::new(ObserverMiddleware::new(self.observer)),
        ];
        if let Some(cache) = self.cache {
            stages.push(Box::new(CachingMiddleware::new(cache, self.cache_ttl)));
        }
        stages.push(Box::new(RecordingMiddleware::new(self.ledger)));
        chain(stages, terminal)
    }
}
