// crates/warden-core/src/runtime/engine.rs
// ============================================================================
// Module: Warden Run Engine
// Description: Drives runs through the planner/policy/execution loop.
// Purpose: Own the single mutation path so live runs and replay never diverge.
// Dependencies: crate::core, crate::interfaces, crate::runtime
// ============================================================================

//! ## Overview
//! The engine owns the decision loop: ask the planner for one decision,
//! record it, enforce policy, execute through the middleware pipeline, and
//! persist the resulting events. Every run mutation happens by appending an
//! event to the store and folding it through the replay reducer, so a
//! reconstructed run is always field-for-field identical to the live one.
//! Policy violations fail the run and surface as typed errors; tool-execution
//! failures become evidence and the loop continues so the planner can react.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use serde_json::Value;

use crate::core::decision::Decision;
use crate::core::event::Event;
use crate::core::evidence::Evidence;
use crate::core::identifiers::BudgetName;
use crate::core::identifiers::RunId;
use crate::core::identifiers::ToolName;
use crate::core::run::Phase;
use crate::core::run::Run;
use crate::core::run::RunStatus;
use crate::core::time::Clock;
use crate::core::time::SystemClock;
use crate::core::tool::RiskLevel;
use crate::interfaces::Approver;
use crate::interfaces::CacheStore;
use crate::interfaces::CancellationToken;
use crate::interfaces::EventStore;
use crate::interfaces::Planner;
use crate::interfaces::Tool;
use crate::interfaces::ToolContext;
use crate::interfaces::ToolError;
use crate::runtime::errors::EngineError;
use crate::runtime::ledger::Ledger;
use crate::runtime::machine::StateMachine;
use crate::runtime::middleware::DefaultChain;
use crate::runtime::middleware::ExecutionContext;
use crate::runtime::middleware::ExecutionObserver;
use crate::runtime::middleware::Handler;
use crate::runtime::middleware::NoopObserver;
use crate::runtime::policy::Budget;
use crate::runtime::policy::PhaseTransitions;
use crate::runtime::policy::ToolEligibility;
use crate::runtime::registry::ToolRegistry;
use crate::runtime::replay::apply_event;

// ============================================================================
// SECTION: Policy Set
// ============================================================================

/// The declarative policies one engine enforces.
///
/// # Invariants
/// - Eligibility and transitions are immutable once the engine is built;
///   budgets are the only mutable policy.
pub struct PolicySet {
    /// Per-phase tool allow-list.
    pub eligibility: Arc<ToolEligibility>,
    /// Allowed phase transitions.
    pub transitions: Arc<PhaseTransitions>,
    /// Named consumable counters.
    pub budget: Arc<Budget>,
    /// Approver for gated tools; absent means gated tools are rejected.
    pub approver: Option<Arc<dyn Approver>>,
}

impl Default for PolicySet {
    fn default() -> Self {
        Self {
            eligibility: Arc::new(ToolEligibility::new()),
            transitions: Arc::new(PhaseTransitions::default_graph()),
            budget: Arc::new(Budget::new()),
            approver: None,
        }
    }
}

// ============================================================================
// SECTION: Engine Configuration
// ============================================================================

/// Retry behavior for failed tool executions.
///
/// Applies only to execution failures; policy violations are never retried.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub max_attempts: u32,
    /// Fixed delay between attempts.
    pub backoff: Duration,
}

/// Tunable engine behavior.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum planner decisions per `drive` call.
    ///
    /// The budget applies to one `drive` call and resets when a paused run
    /// is resumed and driven again; configure a budget counter to bound
    /// total work across the whole run.
    pub max_steps: u32,
    /// Risk level at or above which tools require approval.
    pub risk_threshold: RiskLevel,
    /// Budget counter consumed once per tool invocation, when configured.
    pub tool_call_budget: Option<BudgetName>,
    /// TTL applied to cached tool results.
    pub cache_ttl: Option<Duration>,
    /// Retry policy for failed tool executions.
    pub retry: Option<RetryPolicy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_steps: 64,
            risk_threshold: RiskLevel::High,
            tool_call_budget: None,
            cache_ttl: None,
            retry: None,
        }
    }
}

// ============================================================================
// SECTION: Run Engine
// ============================================================================

/// Governed execution engine for runs.
///
/// # Invariants
/// - Every run mutation flows through [`RunEngine::record_event`]: append to
///   the event store, then fold through the replay reducer.
/// - The ledger is audit output only; nothing reads it back.
pub struct RunEngine {
    /// Shared tool lookup.
    registry: Arc<ToolRegistry>,
    /// Declarative policies enforced on every decision.
    policies: PolicySet,
    /// Append-only audit log.
    ledger: Arc<Ledger>,
    /// Source of truth for replay.
    events: Arc<dyn EventStore>,
    /// Cache for cacheable tool results, when configured.
    cache: Option<Arc<dyn CacheStore>>,
    /// Observability hook around tool execution.
    observer: Arc<dyn ExecutionObserver>,
    /// Timestamp source.
    clock: Arc<dyn Clock>,
    /// Tunable behavior.
    config: EngineConfig,
    /// Transition and eligibility interpreter.
    machine: StateMachine,
    /// Assembled middleware pipeline around tool execution.
    pipeline: Handler,
}

impl RunEngine {
    /// Creates an engine over a registry, policy set, and event store.
    ///
    /// Uses the system clock and a no-op observer; see the `with_*` methods
    /// to override collaborators before driving runs.
    #[must_use]
    pub fn new(
        registry: Arc<ToolRegistry>,
        policies: PolicySet,
        config: EngineConfig,
        events: Arc<dyn EventStore>,
    ) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let ledger = Arc::new(Ledger::new(Arc::clone(&clock)));
        let machine =
            StateMachine::new(Arc::clone(&policies.transitions), Arc::clone(&policies.eligibility));
        let observer: Arc<dyn ExecutionObserver> = Arc::new(NoopObserver);
        let pipeline = Self::build_pipeline(&registry, &policies, &config, &ledger, None, &observer);
        Self {
            registry,
            policies,
            ledger,
            events,
            cache: None,
            observer,
            clock,
            config,
            machine,
            pipeline,
        }
    }

    /// Replaces the timestamp source and rebinds the ledger to it.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self.ledger = Arc::new(Ledger::new(Arc::clone(&self.clock)));
        self.rebuild_pipeline();
        self
    }

    /// Attaches a cache for cacheable tool results.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<dyn CacheStore>) -> Self {
        self.cache = Some(cache);
        self.rebuild_pipeline();
        self
    }

    /// Replaces the execution observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn ExecutionObserver>) -> Self {
        self.observer = observer;
        self.rebuild_pipeline();
        self
    }

    /// Assembles the canonical pipeline around the terminal tool invoker.
    fn build_pipeline(
        registry: &Arc<ToolRegistry>,
        policies: &PolicySet,
        config: &EngineConfig,
        ledger: &Arc<Ledger>,
        cache: Option<Arc<dyn CacheStore>>,
        observer: &Arc<dyn ExecutionObserver>,
    ) -> Handler {
        let terminal = Self::terminal_handler(Arc::clone(registry), config.retry);
        DefaultChain {
            eligibility: Arc::clone(&policies.eligibility),
            approver: policies.approver.clone(),
            risk_threshold: config.risk_threshold,
            budget: Arc::clone(&policies.budget),
            budget_counter: config.tool_call_budget.clone(),
            observer: Arc::clone(observer),
            cache,
            cache_ttl: config.cache_ttl,
            ledger: Arc::clone(ledger),
        }
        .build(terminal)
    }

    /// Rebuilds the pipeline after a collaborator changes.
    fn rebuild_pipeline(&mut self) {
        self.pipeline = Self::build_pipeline(
            &self.registry,
            &self.policies,
            &self.config,
            &self.ledger,
            self.cache.clone(),
            &self.observer,
        );
    }

    /// Builds the innermost handler that resolves and executes the tool.
    ///
    /// Only execution failures are retried; a tool resolved once stays
    /// resolved for all attempts. A cancelled invocation is never retried:
    /// cancellation must fail the step fast, not re-run it to completion.
    fn terminal_handler(registry: Arc<ToolRegistry>, retry: Option<RetryPolicy>) -> Handler {
        Box::new(move |ctx: &ExecutionContext| {
            let tool: Arc<dyn Tool> = registry.get(&ctx.tool)?;
            let tool_ctx = ToolContext { run_id: ctx.run_id.clone(), cancel: ctx.cancel.clone() };
            let mut attempt: u32 = 0;
            loop {
                attempt = attempt.saturating_add(1);
                match tool.execute(&tool_ctx, &ctx.input) {
                    Ok(output) => return Ok(output),
                    Err(err) => {
                        let retryable = !matches!(err, ToolError::Cancelled);
                        let failure = EngineError::Tool {
                            tool: ctx.tool.clone(),
                            message: err.to_string(),
                        };
                        match retry {
                            Some(policy)
                                if retryable
                                    && attempt < policy.max_attempts
                                    && !ctx.cancel.is_cancelled() =>
                            {
                                thread::sleep(policy.backoff);
                            }
                            _ => return Err(failure),
                        }
                    }
                }
            }
        })
    }

    // ------------------------------------------------------------------
    // Run lifecycle.
    // ------------------------------------------------------------------

    /// Creates a run and records its `RunStarted` event.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::RunExists`] when the identifier already has an
    /// event history and [`EngineError::Events`] when the event store rejects
    /// the append.
    pub fn start_run(&self, run_id: RunId, goal: &str) -> Result<Run, EngineError> {
        if !self.events.events(&run_id)?.is_empty() {
            return Err(EngineError::RunExists(run_id));
        }
        let mut run = Run::new(run_id.clone(), goal.to_owned());
        self.record_event(&mut run, Event::RunStarted { goal: goal.to_owned() })?;
        self.ledger.record_run_started(&run_id, goal);
        Ok(run)
    }

    /// Drives a run by repeatedly asking the planner for decisions.
    ///
    /// Returns when the run reaches a terminal status, pauses for human
    /// input, or a failure surfaces. Tool-execution failures become evidence
    /// and the loop continues; policy violations fail the run and return the
    /// violation.
    ///
    /// # Errors
    ///
    /// Returns the policy violation or engine fault that stopped the run.
    pub fn drive(
        &self,
        run: &mut Run,
        planner: &mut dyn Planner,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        if run.status == RunStatus::Paused {
            return Err(EngineError::AwaitingHumanInput);
        }
        let mut steps: u32 = 0;
        while !run.status.is_terminal() {
            if cancel.is_cancelled() {
                self.fail_run(run, "run cancelled by caller")?;
                return Err(EngineError::Cancelled);
            }
            if steps >= self.config.max_steps {
                let limit = self.config.max_steps;
                self.fail_run(run, &format!("max steps exceeded: {limit}"))?;
                return Err(EngineError::MaxStepsExceeded { limit });
            }
            steps = steps.saturating_add(1);

            let decision = match planner.decide(run) {
                Ok(decision) => decision,
                Err(err) => {
                    self.fail_run(run, &err.to_string())?;
                    return Err(EngineError::Planner(err.to_string()));
                }
            };
            self.ledger.record_decision(&run.id, &decision);

            match decision {
                Decision::CallTool { tool, input, .. } => {
                    self.execute_tool(run, &tool, input, cancel)?;
                }
                Decision::Transition { to, reason } => {
                    let event = match self.machine.transition(run, to, &reason) {
                        Ok(event) => event,
                        Err(err) => {
                            self.fail_run(run, &err.to_string())?;
                            return Err(err);
                        }
                    };
                    self.ledger.record_state_transition(&run.id, run.phase, to, &reason);
                    self.record_event(run, event)?;
                }
                Decision::Finish { summary, result } => {
                    self.finish_run(run, &summary, result)?;
                    return Ok(());
                }
                Decision::Fail { reason, error } => {
                    let detail = error.map_or_else(
                        || reason.clone(),
                        |detail| format!("{reason}: {detail}"),
                    );
                    self.fail_run(run, &detail)?;
                    return Ok(());
                }
                Decision::AskHuman { question, options } => {
                    self.ledger.record_human_input_request(&run.id, &question, &options);
                    self.record_event(run, Event::HumanInputRequested { question, options })?;
                    return Ok(());
                }
            }
        }
        Ok(())
    }

    /// Answers a paused run's pending question and records the evidence.
    ///
    /// The caller drives the run again afterwards; resuming only unpauses.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::NoPendingQuestion`] when the run is not paused
    /// on a question and [`EngineError::InvalidHumanInput`] when the answer
    /// is not among the recorded options.
    pub fn resume_with_input(&self, run: &mut Run, answer: &str) -> Result<(), EngineError> {
        let Some(pending) = run.pending_question.clone() else {
            return Err(EngineError::NoPendingQuestion);
        };
        if run.status != RunStatus::Paused {
            return Err(EngineError::NoPendingQuestion);
        }
        if !pending.options.is_empty()
            && !pending.options.iter().any(|option| option == answer)
        {
            return Err(EngineError::InvalidHumanInput { answer: answer.to_owned() });
        }
        self.ledger.record_human_input_response(&run.id, answer);
        self.record_event(run, Event::HumanInputProvided { answer: answer.to_owned() })?;
        let evidence = Evidence::HumanInput {
            question: pending.question,
            answer: answer.to_owned(),
            timestamp: self.clock.now(),
        };
        self.record_event(run, Event::EvidenceAdded { evidence })?;
        Ok(())
    }

    /// Sets a run variable through the event path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Events`] when the event store rejects the
    /// append.
    pub fn set_var(&self, run: &mut Run, key: &str, value: Value) -> Result<(), EngineError> {
        self.record_event(run, Event::VariableSet { key: key.to_owned(), value })
    }

    // ------------------------------------------------------------------
    // Decision execution.
    // ------------------------------------------------------------------

    /// Executes one tool invocation through the middleware pipeline.
    ///
    /// Execution failures are converted to evidence; policy violations fail
    /// the run and propagate.
    fn execute_tool(
        &self,
        run: &mut Run,
        tool: &ToolName,
        input: Vec<u8>,
        cancel: &CancellationToken,
    ) -> Result<(), EngineError> {
        let annotations = match self.registry.get(tool) {
            Ok(registered) => registered.annotations(),
            Err(err) => {
                let failure = EngineError::from(err);
                self.fail_run(run, &failure.to_string())?;
                return Err(failure);
            }
        };
        self.record_event(run, Event::ToolCalled { tool: tool.clone() })?;
        let ctx = ExecutionContext {
            run_id: run.id.clone(),
            phase: run.phase,
            tool: tool.clone(),
            annotations,
            input,
            budget: self.policies.budget.view(),
            cancel: cancel.clone(),
        };
        match (self.pipeline)(&ctx) {
            Ok(output) => {
                self.record_event(run, Event::ToolSucceeded { tool: tool.clone() })?;
                let evidence = Evidence::ToolResult {
                    tool: tool.clone(),
                    output,
                    timestamp: self.clock.now(),
                };
                self.record_event(run, Event::EvidenceAdded { evidence })?;
                Ok(())
            }
            Err(EngineError::Tool { tool: failed, message }) => {
                self.record_event(
                    run,
                    Event::ToolFailed { tool: failed.clone(), error: message.clone() },
                )?;
                let evidence = Evidence::ToolFailure {
                    tool: failed,
                    error: message,
                    timestamp: self.clock.now(),
                };
                self.record_event(run, Event::EvidenceAdded { evidence })?;
                Ok(())
            }
            Err(err) => {
                self.fail_run(run, &err.to_string())?;
                Err(err)
            }
        }
    }

    /// Completes a run: transition to Done, then record completion.
    fn finish_run(
        &self,
        run: &mut Run,
        summary: &str,
        result: Value,
    ) -> Result<(), EngineError> {
        if run.phase != Phase::Done {
            let event = match self.machine.transition(run, Phase::Done, summary) {
                Ok(event) => event,
                Err(err) => {
                    self.fail_run(run, &err.to_string())?;
                    return Err(err);
                }
            };
            self.ledger.record_state_transition(&run.id, run.phase, Phase::Done, summary);
            self.record_event(run, event)?;
        }
        self.ledger.record_run_completed(&run.id, summary);
        self.record_event(run, Event::RunCompleted { summary: summary.to_owned(), result })
    }

    /// Fails a run: transition to Failed when the graph allows, then record
    /// the failure.
    fn fail_run(&self, run: &mut Run, reason: &str) -> Result<(), EngineError> {
        if run.phase != Phase::Failed && self.machine.can_transition(run, Phase::Failed) {
            self.ledger.record_state_transition(&run.id, run.phase, Phase::Failed, reason);
            let event =
                Event::StateTransitioned { from: run.phase, to: Phase::Failed, reason: reason.to_owned() };
            self.record_event(run, event)?;
        }
        self.ledger.record_run_failed(&run.id, reason);
        self.record_event(run, Event::RunFailed { reason: reason.to_owned() })
    }

    // ------------------------------------------------------------------
    // Event path.
    // ------------------------------------------------------------------

    /// Persists one event and applies it through the replay reducer.
    ///
    /// This is the only run mutation path; skipping it would let live state
    /// diverge from what replay reconstructs.
    fn record_event(&self, run: &mut Run, event: Event) -> Result<(), EngineError> {
        self.events.append(&run.id, vec![(self.clock.now(), event.clone())])?;
        apply_event(run, &event);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Accessors.
    // ------------------------------------------------------------------

    /// Returns the audit ledger.
    #[must_use]
    pub fn ledger(&self) -> &Arc<Ledger> {
        &self.ledger
    }

    /// Returns the event store.
    #[must_use]
    pub fn events(&self) -> &Arc<dyn EventStore> {
        &self.events
    }

    /// Returns the tool registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<ToolRegistry> {
        &self.registry
    }

    /// Returns the budget shared with the pipeline.
    #[must_use]
    pub fn budget(&self) -> &Arc<Budget> {
        &self.policies.budget
    }

    /// Returns the transition and eligibility interpreter.
    #[must_use]
    pub fn machine(&self) -> &StateMachine {
        &self.machine
    }
}
