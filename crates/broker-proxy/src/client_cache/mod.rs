//! Per-principal broker client cache
//!
//! Reuses one authenticated backend client per caller identity instead of
//! connecting and authenticating on every request.
//!
//! # Architecture
//!
//! - [`PrincipalIndex`] - live entries, recency ordered, bounded by `max_size`
//! - [`EvictionQueue`] - entries detached from the index, not yet stopped
//! - [`CleanupTimer`] - coalesced timer that schedules the cleanup sweep
//! - [`ClientCache`] - the facade request handlers call
//!
//! [`ClientCache::fetch_or_insert`] is synchronous and never waits on I/O:
//! evicting an entry only moves it to the queue. Stopping clients happens in
//! [`ClientCache::clean_stale_clients`], driven by the timer, and in
//! [`ClientCache::stop`] at shutdown.
//!
//! Stopping a client invalidates the shared handle. A request still holding
//! a handle that was stopped by a sweep sees [`broker_client::ClientError::Stopped`]
//! on its next operation and should fetch again.
//!
//! # Example
//!
//! ```rust,no_run
//! use broker_client::{AuthnMethod, ClientConfig, Credential};
//! use broker_proxy::client_cache::{ClientCache, CleanupTimer, KafkaClientFactory};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cache = ClientCache::new(
//!     ClientConfig::new(vec!["127.0.0.1:9092".to_string()]),
//!     10,
//!     Duration::from_secs(300),
//!     Arc::new(CleanupTimer::new()),
//!     KafkaClientFactory,
//! )?;
//!
//! let client = cache.fetch_or_insert(Credential::new("alice", "secret"), AuthnMethod::HttpBasic)?;
//! client.connect().await?;
//!
//! cache.stop().await;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod eviction;
pub mod factory;
pub mod index;
pub mod stats;
pub mod timer;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CacheError, CacheResult};
pub use eviction::{EvictionQueue, close_clients};
pub use factory::{BrokerClient, ClientFactory, KafkaClientFactory, principal_config};
pub use index::{CacheEntry, PrincipalIndex};
pub use stats::{CacheStats, CacheStatsSnapshot};
pub use timer::{CleanupTimer, TimerEvent};

use broker_client::{AuthnMethod, ClientConfig, Credential};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

/// Delay before evicted clients are stopped
pub const DEFAULT_EVICTION_DELAY: Duration = Duration::from_secs(1);

struct CacheState<C> {
    index: PrincipalIndex<C>,
    evicted: EvictionQueue<C>,
    /// Set by `stop()`; checked under the same lock as every insert
    stopped: bool,
}

/// Bounded, per-principal client cache
pub struct ClientCache<F: ClientFactory> {
    /// Base configuration, cloned for every principal
    config: ClientConfig,
    keep_alive: Duration,
    eviction_delay: Duration,
    factory: F,
    timer: Arc<CleanupTimer>,
    state: Mutex<CacheState<F::Client>>,
    stats: CacheStats,
    /// Held by a sweep while it stops clients
    sweep_gate: tokio::sync::Mutex<()>,
}

impl<F: ClientFactory> ClientCache<F> {
    /// Create a new client cache
    ///
    /// # Arguments
    /// * `config` - Base client configuration
    /// * `max_size` - Maximum number of live clients (must be positive)
    /// * `keep_alive` - Idle time after which a client is eligible for eviction
    /// * `timer` - Cleanup timer owned by the surrounding runtime
    /// * `factory` - Builds a client per principal
    pub fn new(
        config: ClientConfig,
        max_size: usize,
        keep_alive: Duration,
        timer: Arc<CleanupTimer>,
        factory: F,
    ) -> CacheResult<Self> {
        if max_size == 0 {
            return Err(CacheError::InvalidCapacity(max_size));
        }

        Ok(ClientCache {
            config,
            keep_alive,
            eviction_delay: DEFAULT_EVICTION_DELAY,
            factory,
            timer,
            state: Mutex::new(CacheState {
                index: PrincipalIndex::new(max_size),
                evicted: EvictionQueue::new(),
                stopped: false,
            }),
            stats: CacheStats::default(),
            sweep_gate: tokio::sync::Mutex::new(()),
        })
    }

    /// Override the delay between a capacity eviction and the cleanup sweep
    pub fn with_eviction_delay(mut self, delay: Duration) -> Self {
        self.eviction_delay = delay;
        self
    }

    fn state(&self) -> MutexGuard<'_, CacheState<F::Client>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Get the client for `user`, building one on a miss
    ///
    /// On a hit the entry becomes most recently used; if the stored password
    /// differs from the request's it is replaced in place so the client's
    /// next reconnect authenticates with it. On a miss a new client is built
    /// and, if the cache is then over capacity, the least recently used entry
    /// is queued for closing and the cleanup timer armed.
    ///
    /// Never waits on I/O. A construction failure leaves the cache unchanged.
    pub fn fetch_or_insert(
        &self,
        user: Credential,
        authn_method: AuthnMethod,
    ) -> CacheResult<Arc<F::Client>> {
        if authn_method.requires_credentials() && user.pass.is_empty() {
            return Err(CacheError::MissingCredentials {
                principal: user.name,
                method: authn_method.to_string(),
            });
        }

        let now = Instant::now();
        let mut state = self.state();
        if state.stopped {
            return Err(CacheError::Stopped);
        }

        let existing = state
            .index
            .peek(&user.name)
            .map(|entry| Arc::clone(&entry.client));

        if let Some(client) = existing {
            if authn_method.requires_credentials()
                && client.scram_password().as_deref() != Some(user.pass.as_str())
            {
                debug!(principal = %user.name, "Updating password for user");
                client.set_scram_password(user.pass);
                self.stats.record_secret_rotation();
            } else {
                debug!(principal = %user.name, "Reuse client for user");
            }

            state.index.touch(&user.name, now);
            self.stats.record_hit();
            return Ok(client);
        }

        debug!(principal = %user.name, "Make client for user");
        let client = Arc::new(
            self.factory
                .make_client(&self.config, &user, authn_method)?,
        );
        self.stats.record_miss();

        let detached = state
            .index
            .push_front(CacheEntry::new(user.name, Arc::clone(&client), now));

        if !detached.is_empty() {
            for entry in &detached {
                debug!(principal = %entry.key, "Cache size reached, evicting");
                self.stats.record_capacity_eviction();
            }
            state.evicted.extend(detached);
            self.timer.arm_within(self.eviction_delay);
        }

        Ok(client)
    }

    /// Evict idle clients and stop everything queued for closing
    ///
    /// Every entry idle for at least `keep_alive` is detached, wherever it
    /// sits in the recency order. Stop failures are logged and skipped.
    /// Returns the number of clients stopped or attempted.
    pub async fn clean_stale_clients(&self) -> usize {
        let _sweep = self.sweep_gate.lock().await;
        let now = Instant::now();
        let keep_alive = self.keep_alive;

        let pending = {
            let mut state = self.state();
            let stale = state.index.remove_if(|entry| entry.is_expired(now, keep_alive));
            if !stale.is_empty() {
                for entry in &stale {
                    debug!(
                        principal = %entry.key,
                        idle_ms = now.duration_since(entry.last_used).as_millis() as u64,
                        "Evicting stale client"
                    );
                }
                self.stats.record_idle_evictions(stale.len() as u64);
                state.evicted.extend(stale);
            }
            state.evicted.take_all()
        };

        let count = pending.len();
        if count > 0 {
            let failures = close_clients(pending, &self.stats).await;
            debug!(
                stopped = count,
                failures = failures,
                remaining = self.size(),
                "Client cache cleanup completed"
            );
        }

        count
    }

    /// Stop every client, live or queued, and leave the cache empty
    ///
    /// Cancels the cleanup timer first. Stop failures are logged and skipped.
    /// Returns only after a sweep already in progress has finished stopping
    /// the clients it took.
    pub async fn stop(&self) {
        self.timer.cancel();

        let (live, pending) = {
            let mut state = self.state();
            state.stopped = true;
            (state.index.drain(), state.evicted.take_all())
        };

        let count = live.len() + pending.len();
        let failures =
            close_clients(live, &self.stats).await + close_clients(pending, &self.stats).await;

        // Wait out a concurrent sweep
        drop(self.sweep_gate.lock().await);

        debug!(
            stopped = count,
            failures = failures,
            "Client cache stopped"
        );
    }

    /// Run the periodic cleanup loop until the timer is cancelled
    ///
    /// Sweeps at least every `sweep_interval`; capacity evictions pull the
    /// next sweep in to the eviction delay.
    pub async fn run_cleanup(&self, sweep_interval: Duration) {
        self.timer.arm_within(sweep_interval);

        while self.timer.wait().await == TimerEvent::Fired {
            self.clean_stale_clients().await;
            self.timer.arm_within(sweep_interval);
        }

        debug!("Client cache cleanup task stopped");
    }

    /// Number of live entries
    pub fn size(&self) -> usize {
        self.state().index.len()
    }

    pub fn max_size(&self) -> usize {
        self.state().index.max_size()
    }

    pub fn keep_alive(&self) -> Duration {
        self.keep_alive
    }

    /// Number of entries waiting to be stopped
    pub fn pending_evictions(&self) -> usize {
        self.state().evicted.len()
    }

    pub fn contains(&self, principal: &str) -> bool {
        self.state().index.contains(principal)
    }

    /// Live principals, most recently used first
    pub fn principals(&self) -> Vec<String> {
        self.state().index.keys()
    }

    pub fn is_stopped(&self) -> bool {
        self.state().stopped
    }

    pub fn timer(&self) -> &Arc<CleanupTimer> {
        &self.timer
    }

    /// Get cache statistics
    pub fn stats(&self) -> CacheStatsSnapshot {
        let (entries, max_entries, pending_eviction) = {
            let state = self.state();
            (state.index.len(), state.index.max_size(), state.evicted.len())
        };

        CacheStatsSnapshot {
            entries,
            max_entries,
            pending_eviction,
            keep_alive_ms: self.keep_alive.as_millis() as u64,
            hits: self.stats.hits(),
            misses: self.stats.misses(),
            capacity_evictions: self.stats.capacity_evictions(),
            idle_evictions: self.stats.idle_evictions(),
            secret_rotations: self.stats.secret_rotations(),
            closed: self.stats.closed(),
            close_failures: self.stats.close_failures(),
        }
    }
}
