// crates/warden-core/src/runtime/events.rs
// ============================================================================
// Module: Warden In-Memory Event Store
// Description: Reference EventStore keeping ordered per-run event logs.
// Purpose: Provide the durability boundary for tests and embedded hosts.
// Dependencies: crate::core, crate::interfaces
// ============================================================================

//! ## Overview
//! The in-memory store keeps one ordered vector of event records per run
//! under a single lock. Sequence numbers start at zero per run and never
//! gap; timestamps are clamped to be non-decreasing within a run. Reads
//! return defensive copies.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Mutex;
use std::sync::PoisonError;

use crate::core::event::Event;
use crate::core::event::EventRecord;
use crate::core::identifiers::EventSeq;
use crate::core::identifiers::RunId;
use crate::core::time::Timestamp;
use crate::interfaces::EventStore;
use crate::interfaces::EventStoreError;

// ============================================================================
// SECTION: In-Memory Event Store
// ============================================================================

/// Reference [`EventStore`] backed by per-run vectors under one lock.
///
/// # Invariants
/// - Append-only; records are never edited or removed.
/// - Per-run sequence numbers are dense and strictly increasing.
#[derive(Default)]
pub struct InMemoryEventStore {
    /// Ordered event records keyed by run.
    logs: Mutex<BTreeMap<RunId, Vec<EventRecord>>>,
}

impl InMemoryEventStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        run_id: &RunId,
        events: Vec<(Timestamp, Event)>,
    ) -> Result<(), EventStoreError> {
        let mut logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        let log = logs.entry(run_id.clone()).or_default();
        for (timestamp, event) in events {
            let seq = EventSeq::new(u64::try_from(log.len()).unwrap_or(u64::MAX));
            let clamped = log.last().map_or(timestamp, |last| last.timestamp.max(timestamp));
            log.push(EventRecord { run_id: run_id.clone(), seq, timestamp: clamped, event });
        }
        Ok(())
    }

    fn events(&self, run_id: &RunId) -> Result<Vec<EventRecord>, EventStoreError> {
        let logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(logs.get(run_id).cloned().unwrap_or_default())
    }

    fn run_ids(&self) -> Result<Vec<RunId>, EventStoreError> {
        let logs = self.logs.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(logs.keys().cloned().collect())
    }
}
