// crates/warden-core/src/core/time.rs
// ============================================================================
// Module: Warden Time Model
// Description: Canonical timestamps and the clock abstraction.
// Purpose: Provide deterministic, replayable time values across run records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! All timestamps in ledger entries, events, and evidence flow through a
//! [`Clock`] dependency. Production code uses [`SystemClock`]; tests use
//! [`LogicalClock`] so that replayed histories are bit-identical. Stores
//! clamp timestamps to be non-decreasing per run; the clock itself makes no
//! monotonicity promise.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;
use std::sync::atomic::AtomicI64;
use std::sync::atomic::Ordering;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use time::OffsetDateTime;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical timestamp in unix epoch milliseconds.
///
/// # Invariants
/// - Totally ordered; comparisons are numeric on the millisecond value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Creates a timestamp from unix epoch milliseconds.
    #[must_use]
    pub const fn from_unix_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the timestamp as unix epoch milliseconds.
    #[must_use]
    pub const fn as_unix_millis(self) -> i64 {
        self.0
    }

    /// Returns this timestamp advanced by a duration, saturating on overflow.
    #[must_use]
    pub fn saturating_add(self, duration: Duration) -> Self {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        Self(self.0.saturating_add(millis))
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ============================================================================
// SECTION: Clock Abstraction
// ============================================================================

/// Source of timestamps for the engine, ledger, and stores.
pub trait Clock: Send + Sync {
    /// Returns the current timestamp.
    fn now(&self) -> Timestamp;
}

/// Wall-clock backed [`Clock`] for production use.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl SystemClock {
    /// Creates a new system clock.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let nanos = OffsetDateTime::now_utc().unix_timestamp_nanos();
        let millis = i64::try_from(nanos / 1_000_000).unwrap_or(i64::MAX);
        Timestamp::from_unix_millis(millis)
    }
}

/// Deterministic [`Clock`] that advances one millisecond per observation.
///
/// # Invariants
/// - Successive `now()` calls return strictly increasing timestamps.
#[derive(Debug, Default)]
pub struct LogicalClock {
    /// Last issued millisecond value.
    current: AtomicI64,
}

impl LogicalClock {
    /// Creates a logical clock starting at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self { current: AtomicI64::new(0) }
    }

    /// Creates a logical clock starting at the given millisecond value.
    #[must_use]
    pub const fn starting_at(millis: i64) -> Self {
        Self { current: AtomicI64::new(millis) }
    }

    /// Advances the clock by the given duration without issuing a timestamp.
    pub fn advance(&self, duration: Duration) {
        let millis = i64::try_from(duration.as_millis()).unwrap_or(i64::MAX);
        self.current.fetch_add(millis, Ordering::SeqCst);
    }
}

impl Clock for LogicalClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_unix_millis(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }
}
