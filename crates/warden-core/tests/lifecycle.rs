// crates/warden-core/tests/lifecycle.rs
// ============================================================================
// Module: Run Lifecycle Tests
// Description: End-to-end engine behavior across the run state machine.
// ============================================================================
//! ## Overview
//! Drives scripted runs through the engine and asserts phase, status,
//! evidence, and error outcomes for the happy path and every stop condition.

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
use std::time::Duration;

use serde_json::json;

use warden_core::CancellationToken;
use warden_core::Decision;
use warden_core::EngineConfig;
use warden_core::EngineError;
use warden_core::Evidence;
use warden_core::LogicalClock;
use warden_core::Phase;
use warden_core::RiskLevel;
use warden_core::RunId;
use warden_core::RunStatus;
use warden_core::ScriptedPlanner;
use warden_core::ToolAnnotations;
use warden_core::ToolName;
use warden_core::runtime::engine::RetryPolicy;

use common::AbortingTool;
use common::EchoTool;
use common::FailTool;
use common::FlakyTool;
use common::PolicyOverrides;
use common::allow_everywhere;
use common::test_engine;
use common::test_engine_with;

// ============================================================================
// SECTION: Happy Path
// ============================================================================

#[test]
fn test_run_completes_through_explore_and_decide() {
    let engine = test_engine(allow_everywhere(&["echo"]), EngineConfig::default());
    engine.registry().register(Arc::new(EchoTool::read_only("echo"))).unwrap();

    let mut run = engine.start_run(RunId::new("run-1"), "summarize the corpus").unwrap();
    assert_eq!(run.phase, Phase::Intake);
    assert_eq!(run.status, RunStatus::Pending);

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin exploration".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("echo"),
            input: serde_json::to_vec(&json!({ "query": "corpus" })).unwrap(),
            reason: "gather material".to_owned(),
        },
        Decision::Transition { to: Phase::Decide, reason: "enough material".to_owned() },
        Decision::Finish { summary: "done".to_owned(), result: json!({ "ok": true }) },
    ]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();

    assert_eq!(run.phase, Phase::Done);
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.result, Some(json!({ "ok": true })));
    assert!(run.error.is_none());
    assert_eq!(run.evidence.len(), 1);
    assert!(matches!(&run.evidence[0], Evidence::ToolResult { tool, .. } if tool.as_str() == "echo"));
    assert_eq!(planner.remaining(), 0);
}

#[test]
fn test_planner_fail_decision_fails_run_without_error_return() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-2"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![Decision::Fail {
        reason: "nothing to do".to_owned(),
        error: Some("empty corpus".to_owned()),
    }]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();

    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.phase, Phase::Failed);
    assert_eq!(run.error.as_deref(), Some("nothing to do: empty corpus"));
}

#[test]
fn test_start_run_rejects_an_existing_run_id() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    engine.start_run(RunId::new("run-1"), "first goal").unwrap();

    // A second start with the same id must not append another RunStarted.
    let err = engine.start_run(RunId::new("run-1"), "second goal").unwrap_err();
    assert!(matches!(err, EngineError::RunExists(id) if id.as_str() == "run-1"));
}

// ============================================================================
// SECTION: Policy Violations
// ============================================================================

#[test]
fn test_disallowed_transition_fails_run() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-3"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![Decision::Transition {
        to: Phase::Act,
        reason: "skip ahead".to_owned(),
    }]);
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(
        err,
        EngineError::TransitionNotAllowed { from: Phase::Intake, to: Phase::Act }
    ));
    assert_eq!(run.status, RunStatus::Failed);
}

#[test]
fn test_ineligible_tool_fails_run() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    engine.registry().register(Arc::new(EchoTool::read_only("echo"))).unwrap();
    let mut run = engine.start_run(RunId::new("run-4"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("echo"),
            input: b"{}".to_vec(),
            reason: "not allowed here".to_owned(),
        },
    ]);
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::ToolNotAllowed { phase: Phase::Explore, .. }));
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.evidence.is_empty());
}

#[test]
fn test_unregistered_tool_fails_run() {
    let engine = test_engine(allow_everywhere(&["ghost"]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-5"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("ghost"),
            input: b"{}".to_vec(),
            reason: "missing".to_owned(),
        },
    ]);
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::ToolNotFound(name) if name.as_str() == "ghost"));
    assert_eq!(run.status, RunStatus::Failed);
}

#[test]
fn test_max_steps_exceeded_fails_run() {
    let config = EngineConfig { max_steps: 2, ..EngineConfig::default() };
    let engine = test_engine(allow_everywhere(&["echo"]), config);
    engine.registry().register(Arc::new(EchoTool::read_only("echo"))).unwrap();
    let mut run = engine.start_run(RunId::new("run-6"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("echo"),
            input: b"{}".to_vec(),
            reason: "step".to_owned(),
        },
        Decision::CallTool {
            tool: ToolName::new("echo"),
            input: b"{}".to_vec(),
            reason: "one too many".to_owned(),
        },
    ]);
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::MaxStepsExceeded { limit: 2 }));
    assert_eq!(run.status, RunStatus::Failed);
}

#[test]
fn test_step_limit_applies_per_drive_call() {
    let config = EngineConfig { max_steps: 2, ..EngineConfig::default() };
    let engine = test_engine(allow_everywhere(&[]), config);
    let mut run = engine.start_run(RunId::new("run-6b"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::AskHuman { question: "continue?".to_owned(), options: vec![] },
        Decision::Transition { to: Phase::Decide, reason: "resumed".to_owned() },
        Decision::Finish { summary: "done".to_owned(), result: json!(null) },
    ]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();
    assert_eq!(run.status, RunStatus::Paused);

    // The step budget resets on resume; two more steps fit in the next call.
    engine.resume_with_input(&mut run, "yes").unwrap();
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[test]
fn test_cancellation_fails_run() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-7"), "goal").unwrap();

    let cancel = CancellationToken::new();
    cancel.cancel();
    let mut planner = ScriptedPlanner::new(vec![Decision::Transition {
        to: Phase::Explore,
        reason: "never reached".to_owned(),
    }]);
    let err = engine.drive(&mut run, &mut planner, &cancel).unwrap_err();

    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(planner.remaining(), 1);
}

#[test]
fn test_exhausted_planner_fails_run() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-8"), "goal").unwrap();

    let mut planner = ScriptedPlanner::default();
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::Planner(_)));
    assert_eq!(run.status, RunStatus::Failed);
}

// ============================================================================
// SECTION: Tool Failures
// ============================================================================

#[test]
fn test_tool_failure_becomes_evidence_and_run_continues() {
    let engine = test_engine(allow_everywhere(&["broken"]), EngineConfig::default());
    engine.registry().register(Arc::new(FailTool { name: "broken" })).unwrap();
    let mut run = engine.start_run(RunId::new("run-9"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("broken"),
            input: b"{}".to_vec(),
            reason: "attempt".to_owned(),
        },
        Decision::Transition { to: Phase::Decide, reason: "give up on the tool".to_owned() },
        Decision::Finish { summary: "finished anyway".to_owned(), result: json!(null) },
    ]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.evidence.len(), 1);
    assert!(matches!(
        &run.evidence[0],
        Evidence::ToolFailure { tool, .. } if tool.as_str() == "broken"
    ));
}

#[test]
fn test_retry_policy_recovers_transient_failures() {
    let config = EngineConfig {
        retry: Some(RetryPolicy { max_attempts: 3, backoff: Duration::ZERO }),
        ..EngineConfig::default()
    };
    let engine = test_engine(allow_everywhere(&["flaky"]), config);
    let tool = Arc::new(FlakyTool::new("flaky", 2));
    let executions = Arc::clone(&tool.executions);
    engine.registry().register(tool).unwrap();
    let mut run = engine.start_run(RunId::new("run-10"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("flaky"),
            input: b"{\"n\":1}".to_vec(),
            reason: "retryable".to_owned(),
        },
        Decision::Transition { to: Phase::Decide, reason: "done".to_owned() },
        Decision::Finish { summary: "ok".to_owned(), result: json!(null) },
    ]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();

    assert_eq!(executions.load(std::sync::atomic::Ordering::SeqCst), 3);
    assert!(matches!(&run.evidence[0], Evidence::ToolResult { .. }));
}

#[test]
fn test_cancelled_invocation_is_not_retried() {
    let config = EngineConfig {
        retry: Some(RetryPolicy { max_attempts: 3, backoff: Duration::ZERO }),
        ..EngineConfig::default()
    };
    let engine = test_engine(allow_everywhere(&["abort"]), config);
    let tool = Arc::new(AbortingTool::new("abort"));
    let executions = Arc::clone(&tool.executions);
    engine.registry().register(tool).unwrap();
    let mut run = engine.start_run(RunId::new("run-10b"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("abort"),
            input: b"{}".to_vec(),
            reason: "cancelled mid-flight".to_owned(),
        },
    ]);
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    // The tool ran once; cancellation short-circuits the retry loop.
    assert_eq!(executions.load(std::sync::atomic::Ordering::SeqCst), 1);
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(run.status, RunStatus::Failed);
    assert!(matches!(
        &run.evidence[0],
        Evidence::ToolFailure { tool, .. } if tool.as_str() == "abort"
    ));
}

// ============================================================================
// SECTION: Approval Gating
// ============================================================================

/// Destructive echo tool annotations used by the gating tests.
fn destructive() -> ToolAnnotations {
    ToolAnnotations {
        read_only: false,
        destructive: true,
        idempotent: false,
        cacheable: false,
        risk: RiskLevel::High,
    }
}

/// Script that transitions to Act and invokes the destructive tool.
fn destructive_script() -> Vec<Decision> {
    vec![
        Decision::Transition { to: Phase::Explore, reason: "begin".to_owned() },
        Decision::Transition { to: Phase::Decide, reason: "plan".to_owned() },
        Decision::Transition { to: Phase::Act, reason: "execute".to_owned() },
        Decision::CallTool {
            tool: ToolName::new("wipe"),
            input: b"{}".to_vec(),
            reason: "gated".to_owned(),
        },
    ]
}

#[test]
fn test_gated_tool_without_approver_is_rejected() {
    let engine = test_engine(allow_everywhere(&["wipe"]), EngineConfig::default());
    engine
        .registry()
        .register(Arc::new(EchoTool::with_annotations("wipe", destructive())))
        .unwrap();
    let mut run = engine.start_run(RunId::new("run-11"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(destructive_script());
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::ApprovalRequired { .. }));
    assert_eq!(run.status, RunStatus::Failed);
}

#[test]
fn test_gated_tool_with_auto_approve_executes() {
    let clock = Arc::new(LogicalClock::new());
    let engine = test_engine_with(
        allow_everywhere(&["wipe"]),
        EngineConfig::default(),
        PolicyOverrides {
            approver: Some(Arc::new(warden_core::AutoApprove::new(clock))),
            ..PolicyOverrides::default()
        },
    );
    engine
        .registry()
        .register(Arc::new(EchoTool::with_annotations("wipe", destructive())))
        .unwrap();
    let mut run = engine.start_run(RunId::new("run-12"), "goal").unwrap();

    let mut script = destructive_script();
    script.push(Decision::Transition { to: Phase::Validate, reason: "check".to_owned() });
    script.push(Decision::Finish { summary: "ok".to_owned(), result: json!(null) });
    let mut planner = ScriptedPlanner::new(script);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();

    assert_eq!(run.status, RunStatus::Completed);
    assert!(matches!(&run.evidence[0], Evidence::ToolResult { tool, .. } if tool.as_str() == "wipe"));
}

#[test]
fn test_gated_tool_with_auto_deny_fails_run() {
    let clock = Arc::new(LogicalClock::new());
    let engine = test_engine_with(
        allow_everywhere(&["wipe"]),
        EngineConfig::default(),
        PolicyOverrides {
            approver: Some(Arc::new(warden_core::AutoDeny::new(clock))),
            ..PolicyOverrides::default()
        },
    );
    engine
        .registry()
        .register(Arc::new(EchoTool::with_annotations("wipe", destructive())))
        .unwrap();
    let mut run = engine.start_run(RunId::new("run-13"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(destructive_script());
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();

    assert!(matches!(err, EngineError::ApprovalDenied { .. }));
    assert_eq!(run.status, RunStatus::Failed);
    assert!(run.evidence.is_empty());
}

// ============================================================================
// SECTION: Human Input
// ============================================================================

#[test]
fn test_ask_human_pauses_and_resume_validates_answer() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-14"), "goal").unwrap();

    let mut planner = ScriptedPlanner::new(vec![
        Decision::AskHuman {
            question: "proceed?".to_owned(),
            options: vec!["yes".to_owned(), "no".to_owned()],
        },
        Decision::Transition { to: Phase::Explore, reason: "resumed".to_owned() },
        Decision::Transition { to: Phase::Decide, reason: "plan".to_owned() },
        Decision::Finish { summary: "done".to_owned(), result: json!(null) },
    ]);
    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();
    assert_eq!(run.status, RunStatus::Paused);
    assert!(run.pending_question.is_some());

    // Driving while paused is rejected.
    let err = engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap_err();
    assert!(matches!(err, EngineError::AwaitingHumanInput));

    // An answer outside the recorded options is rejected and keeps the pause.
    let err = engine.resume_with_input(&mut run, "maybe").unwrap_err();
    assert!(matches!(err, EngineError::InvalidHumanInput { .. }));
    assert_eq!(run.status, RunStatus::Paused);

    engine.resume_with_input(&mut run, "yes").unwrap();
    assert_eq!(run.status, RunStatus::Running);
    assert!(run.pending_question.is_none());
    assert!(matches!(
        &run.evidence[0],
        Evidence::HumanInput { answer, .. } if answer == "yes"
    ));

    engine.drive(&mut run, &mut planner, &CancellationToken::new()).unwrap();
    assert_eq!(run.status, RunStatus::Completed);
}

#[test]
fn test_resume_without_pending_question_is_rejected() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-15"), "goal").unwrap();

    let err = engine.resume_with_input(&mut run, "yes").unwrap_err();
    assert!(matches!(err, EngineError::NoPendingQuestion));
}

// ============================================================================
// SECTION: Variables
// ============================================================================

#[test]
fn test_set_var_flows_through_event_path() {
    let engine = test_engine(allow_everywhere(&[]), EngineConfig::default());
    let mut run = engine.start_run(RunId::new("run-16"), "goal").unwrap();

    engine.set_var(&mut run, "target", json!("corpus")).unwrap();
    assert_eq!(run.vars.get("target"), Some(&json!("corpus")));

    // Overwrite keeps the latest value.
    engine.set_var(&mut run, "target", json!("archive")).unwrap();
    assert_eq!(run.vars.get("target"), Some(&json!("archive")));
}
