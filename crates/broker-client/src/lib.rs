//! Broker Client
//!
//! This crate provides the client-side pieces a proxy needs to talk to a
//! message-broker cluster on behalf of an authenticated caller.
//!
//! # Features
//!
//! - JSON-serializable base client configuration
//! - Per-principal SASL/SCRAM settings
//! - Lazy connection establishment with bounded retries
//! - Asynchronous shutdown with post-stop invalidation
//!
//! # Example
//!
//! ```rust
//! use broker_client::{ClientConfig, Credential, KafkaClient};
//!
//! let mut config = ClientConfig::new(vec!["127.0.0.1:9092".to_string()]);
//! config.apply_scram_credentials(&Credential::new("alice", "secret"));
//!
//! // No I/O happens here; the client connects on first use.
//! let client = KafkaClient::new(config).unwrap();
//! assert!(!client.is_connected());
//! ```

pub mod client;
pub mod config;
pub mod credential;
pub mod error;

pub use client::KafkaClient;
pub use config::{ClientConfig, DEFAULT_SASL_MECHANISM, SUPPORTED_SASL_MECHANISMS};
pub use credential::{AuthnMethod, Credential};
pub use error::{ClientError, ClientResult};
