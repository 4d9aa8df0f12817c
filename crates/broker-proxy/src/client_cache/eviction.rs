//! Entries awaiting close
//!
//! Removing an entry from the index is instantaneous; closing its client is
//! network I/O. Detached entries wait here until the cleanup task drains them.

use super::factory::BrokerClient;
use super::index::CacheEntry;
use super::stats::CacheStats;
use tracing::debug;

/// Unordered staging area for detached entries
pub struct EvictionQueue<C> {
    items: Vec<CacheEntry<C>>,
}

impl<C> Default for EvictionQueue<C> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C> EvictionQueue<C> {
    pub fn new() -> Self {
        EvictionQueue { items: Vec::new() }
    }

    pub fn push(&mut self, entry: CacheEntry<C>) {
        self.items.push(entry);
    }

    pub fn extend(&mut self, entries: impl IntoIterator<Item = CacheEntry<C>>) {
        self.items.extend(entries);
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Empty the queue, handing every entry to the caller
    pub fn take_all(&mut self) -> Vec<CacheEntry<C>> {
        std::mem::take(&mut self.items)
    }
}

/// Stop every client in `entries`, one after another
///
/// A failing stop is logged and counted; the remaining clients are still
/// stopped. Returns the number of failures.
pub async fn close_clients<C: BrokerClient>(entries: Vec<CacheEntry<C>>, stats: &CacheStats) -> usize {
    let mut failures = 0;

    for entry in entries {
        match entry.client.stop().await {
            Ok(()) => {
                debug!(principal = %entry.key, "Stopped client");
                stats.record_close();
            }
            Err(e) => {
                debug!(
                    principal = %entry.key,
                    error = %e,
                    "Stale client stop already happened"
                );
                stats.record_close_failure();
                failures += 1;
            }
        }
    }

    failures
}
