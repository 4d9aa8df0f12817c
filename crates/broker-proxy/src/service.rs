//! Cache service
//!
//! Owns the cleanup timer and the background task that drives a
//! [`ClientCache`], and tears both down in order at shutdown.

use crate::client_cache::{CacheError, ClientCache, ClientFactory, CleanupTimer, KafkaClientFactory};
use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Client cache error: {0}")]
    Cache(#[from] CacheError),
}

/// A client cache together with its cleanup task
pub struct CacheService<F: ClientFactory> {
    cache: Arc<ClientCache<F>>,
    cleanup_task: Option<JoinHandle<()>>,
}

impl CacheService<KafkaClientFactory> {
    /// Start a service for the given proxy configuration
    pub fn start(config: &Config) -> Result<Self, ServiceError> {
        Self::with_factory(config, KafkaClientFactory)
    }
}

impl<F: ClientFactory> CacheService<F> {
    /// Start a service using a custom client factory
    ///
    /// Must be called from within a Tokio runtime.
    pub fn with_factory(config: &Config, factory: F) -> Result<Self, ServiceError> {
        let cache_config = &config.client_cache;
        let timer = Arc::new(CleanupTimer::new());

        let cache = ClientCache::new(
            config.client.clone(),
            cache_config.max_size,
            cache_config.keep_alive(),
            timer,
            factory,
        )?
        .with_eviction_delay(cache_config.eviction_delay());

        Ok(Self::spawn(Arc::new(cache), cache_config.sweep_interval()))
    }

    /// Spawn the cleanup task for an existing cache
    pub fn spawn(cache: Arc<ClientCache<F>>, sweep_interval: Duration) -> Self {
        let task_cache = Arc::clone(&cache);
        let cleanup_task = tokio::spawn(async move {
            task_cache.run_cleanup(sweep_interval).await;
        });

        info!(
            max_size = cache.max_size(),
            keep_alive_ms = cache.keep_alive().as_millis() as u64,
            sweep_interval_ms = sweep_interval.as_millis() as u64,
            "Client cache started"
        );

        CacheService {
            cache,
            cleanup_task: Some(cleanup_task),
        }
    }

    /// Shared cache handle for request handlers
    pub fn cache(&self) -> &Arc<ClientCache<F>> {
        &self.cache
    }

    /// Stop the cleanup task, then every cached client
    pub async fn shutdown(mut self) {
        self.cache.timer().cancel();

        if let Some(task) = self.cleanup_task.take()
            && let Err(e) = task.await
        {
            warn!(error = %e, "Client cache cleanup task failed");
        }

        self.cache.stop().await;

        let stats = self.cache.stats();
        info!(
            hits = stats.hits,
            misses = stats.misses,
            closed = stats.closed,
            close_failures = stats.close_failures,
            "Client cache shut down"
        );
    }
}

impl<F: ClientFactory> Drop for CacheService<F> {
    fn drop(&mut self) {
        // Dropped without shutdown(): let the cleanup task exit
        if self.cleanup_task.is_some() {
            self.cache.timer().cancel();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientCacheConfig;
    use broker_client::{AuthnMethod, Credential};

    fn config(max_size: usize) -> Config {
        Config {
            authentication_method: AuthnMethod::HttpBasic,
            client_cache: ClientCacheConfig {
                max_size,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_evicts_in_background() {
        let service = CacheService::start(&config(1)).unwrap();
        let cache = Arc::clone(service.cache());

        let first = cache
            .fetch_or_insert(Credential::new("a", "pw"), AuthnMethod::HttpBasic)
            .unwrap();
        cache
            .fetch_or_insert(Credential::new("b", "pw"), AuthnMethod::HttpBasic)
            .unwrap();
        assert_eq!(cache.pending_evictions(), 1);

        tokio::time::sleep(Duration::from_millis(1500)).await;

        assert_eq!(cache.pending_evictions(), 0);
        assert!(first.is_stopped());
        assert_eq!(cache.size(), 1);

        service.shutdown().await;
        assert_eq!(cache.size(), 0);
        assert!(cache.is_stopped());
    }

    #[tokio::test(start_paused = true)]
    async fn test_service_rejects_zero_capacity() {
        let mut config = config(1);
        config.client_cache.max_size = 0;
        assert!(matches!(
            CacheService::start(&config),
            Err(ServiceError::Cache(CacheError::InvalidCapacity(0)))
        ));
    }
}
