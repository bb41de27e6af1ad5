//! Cache Statistics Module
//!
//! Tracks coordinator hit/miss counters for the lifetime of the process.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Lock-free hit and miss counters.
///
/// Counters only ever grow; nothing resets them short of dropping the
/// coordinator.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    /// Increments the hit counter.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    // == Snapshot ==
    /// Reads the counters without resetting them.
    pub fn snapshot(&self, pending_requests: usize) -> StatsSnapshot {
        StatsSnapshot::new(
            self.hits.load(Ordering::Relaxed),
            self.misses.load(Ordering::Relaxed),
            pending_requests,
        )
    }
}

// == Stats Snapshot ==
/// Point-in-time view of the coordinator statistics.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSnapshot {
    /// Number of lookups answered from the backend
    pub hits: u64,
    /// Number of lookups that had to go to the origin
    pub misses: u64,
    /// hits / (hits + misses), or 0.0 before the first lookup
    pub hit_rate: f64,
    /// Origin fetches currently in flight
    pub pending_requests: usize,
}

impl StatsSnapshot {
    /// Builds a snapshot, deriving the hit rate.
    pub fn new(hits: u64, misses: u64, pending_requests: usize) -> Self {
        let total = hits + misses;
        let hit_rate = if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        };
        Self {
            hits,
            misses,
            hit_rate,
            pending_requests,
        }
    }

    /// Hit rate formatted as a percentage, e.g. `"75.00%"`.
    pub fn hit_rate_percent(&self) -> String {
        format!("{:.2}%", self.hit_rate * 100.0)
    }
}
