//! Broker Proxy Client Cache
//!
//! This crate provides the connection-reuse layer of a protocol-translating
//! proxy that sits in front of a message-broker cluster. Each caller identity
//! gets one authenticated backend client, reused across requests.
//!
//! # Features
//!
//! - Bounded LRU cache keyed by principal
//! - Idle eviction with a keep-alive threshold
//! - Password rotation without reconnecting
//! - Non-blocking request path; clients are stopped in the background
//! - JSON configuration
//!
//! # Example
//!
//! ```rust,no_run
//! use broker_client::{AuthnMethod, Credential};
//! use broker_proxy::{CacheService, Config};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_file("config.json")?;
//!     let service = CacheService::start(&config)?;
//!
//!     // In a request handler
//!     let client = service
//!         .cache()
//!         .fetch_or_insert(Credential::new("alice", "secret"), AuthnMethod::HttpBasic)?;
//!     client.connect().await?;
//!
//!     service.shutdown().await;
//!     Ok(())
//! }
//! ```

pub mod client_cache;
pub mod config;
pub mod service;

pub use client_cache::{
    BrokerClient, CacheError, CacheResult, CacheStatsSnapshot, ClientCache, ClientFactory,
    CleanupTimer, KafkaClientFactory,
};
pub use config::{ClientCacheConfig, Config, ConfigError};
pub use service::{CacheService, ServiceError};
