//! Client cache statistics

use std::sync::atomic::{AtomicU64, Ordering};

/// Client cache counters
#[derive(Debug, Default)]
pub struct CacheStats {
    /// Requests served by an existing client
    pub hits: AtomicU64,
    /// Requests that built a new client
    pub misses: AtomicU64,
    /// Entries moved out because the cache was full
    pub capacity_evictions: AtomicU64,
    /// Entries moved out because they sat idle past the keep-alive
    pub idle_evictions: AtomicU64,
    /// Password replacements on live entries
    pub secret_rotations: AtomicU64,
    /// Clients stopped cleanly
    pub closed: AtomicU64,
    /// Client stops that returned an error
    pub close_failures: AtomicU64,
}

impl CacheStats {
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_capacity_eviction(&self) {
        self.capacity_evictions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_idle_evictions(&self, count: u64) {
        self.idle_evictions.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_secret_rotation(&self) {
        self.secret_rotations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close(&self) {
        self.closed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_close_failure(&self) {
        self.close_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    pub fn capacity_evictions(&self) -> u64 {
        self.capacity_evictions.load(Ordering::Relaxed)
    }

    pub fn idle_evictions(&self) -> u64 {
        self.idle_evictions.load(Ordering::Relaxed)
    }

    pub fn secret_rotations(&self) -> u64 {
        self.secret_rotations.load(Ordering::Relaxed)
    }

    pub fn closed(&self) -> u64 {
        self.closed.load(Ordering::Relaxed)
    }

    pub fn close_failures(&self) -> u64 {
        self.close_failures.load(Ordering::Relaxed)
    }
}

/// Point-in-time view of the cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheStatsSnapshot {
    /// Current number of live entries
    pub entries: usize,
    /// Maximum number of live entries
    pub max_entries: usize,
    /// Entries waiting to be closed
    pub pending_eviction: usize,
    /// Idle timeout in milliseconds
    pub keep_alive_ms: u64,
    pub hits: u64,
    pub misses: u64,
    pub capacity_evictions: u64,
    pub idle_evictions: u64,
    pub secret_rotations: u64,
    pub closed: u64,
    pub close_failures: u64,
}
