// crates/warden-core/src/runtime/replay.rs
// ============================================================================
// Module: Warden Replay
// Description: Deterministic run reconstruction from the event log.
// Purpose: Rebuild runs and timelines without touching the live engine.
// Dependencies: crate::core, crate::interfaces, thiserror
// ============================================================================

//! ## Overview
//! Replay folds a run's ordered event sequence into a [`Run`] using
//! [`apply_event`], the same reducer the live engine mutates runs with.
//! Each event type has exactly one defined effect, and every input the
//! reducer needs is embedded in the event payloads, so replaying the same
//! sequence any number of times, from any process, yields field-for-field
//! identical runs.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

use crate::core::event::Event;
use crate::core::identifiers::EventSeq;
use crate::core::identifiers::RunId;
use crate::core::run::PendingQuestion;
use crate::core::run::Phase;
use crate::core::run::Run;
use crate::core::run::RunStatus;
use crate::core::time::Timestamp;
use crate::interfaces::EventStore;
use crate::interfaces::EventStoreError;

// ============================================================================
// SECTION: Reducer
// ============================================================================

/// Applies one event's defined effect to a run.
///
/// This is the single mutation path shared by the live engine and replay.
/// `RunStarted` has no effect here because run construction owns it; see
/// [`Replay::reconstruct_run`].
pub fn apply_event(run: &mut Run, event: &Event) {
    match event {
        Event::RunStarted { .. } | Event::ToolSucceeded { .. } | Event::ToolFailed { .. } => {}
        Event::StateTransitioned { to, .. } => {
            run.phase = *to;
            run.status = RunStatus::Running;
        }
        Event::ToolCalled { .. } => {
            run.status = RunStatus::Running;
        }
        Event::VariableSet { key, value } => {
            run.vars.insert(key.clone(), value.clone());
        }
        Event::EvidenceAdded { evidence } => {
            run.evidence.push(evidence.clone());
        }
        Event::HumanInputRequested { question, options } => {
            run.status = RunStatus::Paused;
            run.pending_question =
                Some(PendingQuestion { question: question.clone(), options: options.clone() });
        }
        Event::HumanInputProvided { .. } => {
            run.status = RunStatus::Running;
            run.pending_question = None;
        }
        Event::RunCompleted { result, .. } => {
            run.status = RunStatus::Completed;
            run.result = Some(result.clone());
        }
        Event::RunFailed { reason } => {
            run.status = RunStatus::Failed;
            run.error = Some(reason.clone());
        }
    }
}

// ============================================================================
// SECTION: Replay Errors
// ============================================================================

/// Errors returned by replay.
///
/// # Invariants
/// - Variants are stable for programmatic handling.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// No events exist for the run.
    #[error("unknown run: {0}")]
    UnknownRun(RunId),
    /// Event log is malformed for reconstruction.
    #[error("corrupt event log: {0}")]
    Corrupt(String),
    /// Event store failure.
    #[error(transparent)]
    Store(#[from] EventStoreError),
}

// ============================================================================
// SECTION: Timeline
// ============================================================================

/// One phase transition in a run's timeline.
///
/// # Invariants
/// - Steps are ordered by event sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineStep {
    /// Position of the transition in the run's event log.
    pub seq: EventSeq,
    /// Time the transition was recorded.
    pub timestamp: Timestamp,
    /// Phase before the transition.
    pub from: Phase,
    /// Phase after the transition.
    pub to: Phase,
    /// Stated reason for the transition.
    pub reason: String,
}

// ============================================================================
// SECTION: Replay
// ============================================================================

/// Reconstructs runs and timelines purely from the event store.
pub struct Replay {
    /// Event source; never written by replay.
    events: Arc<dyn EventStore>,
}

impl Replay {
    /// Creates a replayer over an event store.
    #[must_use]
    pub fn new(events: Arc<dyn EventStore>) -> Self {
        Self { events }
    }

    /// Reconstructs a run by folding its ordered event sequence.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::UnknownRun`] when the run has no events and
    /// [`ReplayError::Corrupt`] when the log does not begin with
    /// `RunStarted`.
    pub fn reconstruct_run(&self, run_id: &RunId) -> Result<Run, ReplayError> {
        let records = self.events.events(run_id)?;
        let Some(first) = records.first() else {
            return Err(ReplayError::UnknownRun(run_id.clone()));
        };
        let Event::RunStarted { goal } = &first.event else {
            return Err(ReplayError::Corrupt("first event must be run_started".to_owned()));
        };
        let mut run = Run::new(run_id.clone(), goal.clone());
        for record in records.iter().skip(1) {
            apply_event(&mut run, &record.event);
        }
        Ok(run)
    }

    /// Derives the ordered list of phase transitions for a run.
    ///
    /// # Errors
    ///
    /// Returns [`ReplayError::UnknownRun`] when the run has no events.
    pub fn timeline(&self, run_id: &RunId) -> Result<Vec<TimelineStep>, ReplayError> {
        let records = self.events.events(run_id)?;
        if records.is_empty() {
            return Err(ReplayError::UnknownRun(run_id.clone()));
        }
        let steps = records
            .iter()
            .filter_map(|record| match &record.event {
                Event::StateTransitioned { from, to, reason } => Some(TimelineStep {
                    seq: record.seq,
                    timestamp: record.timestamp,
                    from: *from,
                    to: *to,
                    reason: reason.clone(),
                }),
                _ => None,
            })
            .collect();
        Ok(steps)
    }
}
