// crates/warden-core/src/runtime/cache.rs
// ============================================================================
// Module: Warden In-Memory Cache
// Description: Reference CacheStore with TTL expiry and LRU eviction.
// Purpose: Serve repeated cacheable tool invocations without re-execution.
// Dependencies: crate::core, crate::interfaces, serde_json
// ============================================================================

//! ## Overview
//! The in-memory cache bounds its entry count and evicts the least recently
//! used entry when full. Expiry is checked on read against the injected
//! clock, so tests can advance time logically instead of sleeping. Reads
//! return independent copies and count as use for eviction ordering.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::PoisonError;
use std::time::Duration;

use serde_json::Value;

use crate::core::time::Clock;
use crate::core::time::Timestamp;
use crate::interfaces::CacheError;
use crate::interfaces::CacheStore;

// ============================================================================
// SECTION: Cache Entry
// ============================================================================

/// One cached value with its expiry and recency marker.
#[derive(Debug, Clone)]
struct CacheEntry {
    /// Stored value; copied out on read.
    value: Value,
    /// Absolute expiry time, when a TTL was supplied.
    expires_at: Option<Timestamp>,
    /// Monotonic use marker for LRU ordering.
    last_used: u64,
}

/// Interior cache state guarded by one lock.
#[derive(Debug, Default)]
struct CacheInner {
    /// Entries keyed by cache key.
    entries: BTreeMap<String, CacheEntry>,
    /// Next use marker to assign.
    tick: u64,
}

// ============================================================================
// SECTION: In-Memory Cache
// ============================================================================

/// Reference [`CacheStore`] bounded by entry count with LRU eviction.
///
/// # Invariants
/// - Never holds more than `capacity` entries.
/// - Expired entries are never returned, regardless of eviction state.
pub struct InMemoryCache {
    /// Entry map and recency state.
    inner: Mutex<CacheInner>,
    /// Maximum number of entries held at once.
    capacity: usize,
    /// Time source for expiry checks.
    clock: Arc<dyn Clock>,
}

impl InMemoryCache {
    /// Creates a cache bounded to `capacity` entries.
    #[must_use]
    pub fn new(capacity: usize, clock: Arc<dyn Clock>) -> Self {
        Self { inner: Mutex::new(CacheInner::default()), capacity: capacity.max(1), clock }
    }

    /// Returns the number of live entries, dropping any that have expired.
    #[must_use]
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        inner.entries.retain(|_, entry| entry.expires_at.is_none_or(|at| now < at));
        inner.entries.len()
    }

    /// Returns true when the cache holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes all entries.
    pub fn clear(&self) {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        inner.entries.clear();
    }

    /// Evicts the least recently used entry when at capacity.
    fn evict_if_full(inner: &mut CacheInner, capacity: usize) {
        if inner.entries.len() < capacity {
            return;
        }
        let victim = inner
            .entries
            .iter()
            .min_by_key(|(_, entry)| entry.last_used)
            .map(|(key, _)| key.clone());
        if let Some(key) = victim {
            inner.entries.remove(&key);
        }
    }
}

impl CacheStore for InMemoryCache {
    fn get(&self, key: &str) -> Result<Option<Value>, CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        let expired =
            inner.entries.get(key).is_some_and(|entry| entry.expires_at.is_some_and(|at| now >= at));
        if expired {
            inner.entries.remove(key);
            return Ok(None);
        }
        let tick = inner.tick;
        inner.tick = inner.tick.saturating_add(1);
        Ok(inner.entries.get_mut(key).map(|entry| {
            entry.last_used = tick;
            entry.value.clone()
        }))
    }

    fn set(&self, key: &str, value: Value, ttl: Option<Duration>) -> Result<(), CacheError> {
        let mut inner = self.inner.lock().unwrap_or_else(PoisonError::into_inner);
        let now = self.clock.now();
        if !inner.entries.contains_key(key) {
            Self::evict_if_full(&mut inner, self.capacity);
        }
        let tick = inner.tick;
        inner.tick = inner.tick.saturating_add(1);
        let expires_at = ttl.map(|ttl| now.saturating_add(ttl));
        inner
            .entries
            .insert(key.to_owned(), CacheEntry { value, expires_at, last_used: tick });
        Ok(())
    }
}
