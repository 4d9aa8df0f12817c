//! Broker client configuration

use crate::credential::Credential;
use crate::error::{ClientError, ClientResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// SASL mechanism used for principals authenticated with HTTP Basic
pub const DEFAULT_SASL_MECHANISM: &str = "SCRAM-SHA-256";

/// SASL mechanisms the client knows how to negotiate
pub const SUPPORTED_SASL_MECHANISMS: &[&str] = &["SCRAM-SHA-256", "SCRAM-SHA-512"];

/// Broker client configuration
///
/// The proxy keeps one base configuration and clones it for every principal,
/// injecting credentials into the clone.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Seed broker addresses (host:port)
    pub brokers: Vec<String>,

    /// Client identifier sent to the brokers
    #[serde(default = "default_client_id")]
    pub client_id: String,

    /// SASL mechanism, `None` for unauthenticated connections
    #[serde(default)]
    pub sasl_mechanism: Option<String>,

    /// SCRAM user name
    #[serde(default)]
    pub scram_username: Option<String>,

    /// SCRAM password
    #[serde(default)]
    pub scram_password: Option<String>,

    /// Per-attempt connect timeout in milliseconds
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Number of passes over the broker list after the first one fails
    #[serde(default = "default_retries")]
    pub retries: u32,

    /// Base backoff between passes in milliseconds (doubles each pass)
    #[serde(default = "default_retry_base_backoff_ms")]
    pub retry_base_backoff_ms: u64,
}

fn default_client_id() -> String {
    "broker-proxy".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5000
}

fn default_retries() -> u32 {
    3
}

fn default_retry_base_backoff_ms() -> u64 {
    100
}

impl ClientConfig {
    /// Create a configuration for the given seed brokers with defaults elsewhere
    pub fn new(brokers: Vec<String>) -> Self {
        ClientConfig {
            brokers,
            client_id: default_client_id(),
            sasl_mechanism: None,
            scram_username: None,
            scram_password: None,
            connect_timeout_ms: default_connect_timeout_ms(),
            retries: default_retries(),
            retry_base_backoff_ms: default_retry_base_backoff_ms(),
        }
    }

    /// Switch this configuration to SCRAM authentication as `credential`
    pub fn apply_scram_credentials(&mut self, credential: &Credential) {
        self.sasl_mechanism = Some(DEFAULT_SASL_MECHANISM.to_string());
        self.scram_username = Some(credential.name.clone());
        self.scram_password = Some(credential.pass.clone());
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Backoff before the pass following `attempt` (zero-based)
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 1u64 << attempt.min(16);
        Duration::from_millis(self.retry_base_backoff_ms.saturating_mul(factor))
    }

    /// Validate configuration
    pub fn validate(&self) -> ClientResult<()> {
        if self.brokers.is_empty() {
            return Err(ClientError::InvalidConfig(
                "At least one broker address is required".to_string(),
            ));
        }

        for broker in &self.brokers {
            validate_broker_address(broker)?;
        }

        if self.connect_timeout_ms == 0 {
            return Err(ClientError::InvalidConfig(
                "Connect timeout cannot be 0".to_string(),
            ));
        }

        if let Some(ref mechanism) = self.sasl_mechanism {
            if !SUPPORTED_SASL_MECHANISMS.contains(&mechanism.as_str()) {
                return Err(ClientError::InvalidConfig(format!(
                    "Unsupported SASL mechanism '{}'",
                    mechanism
                )));
            }

            let username = self.scram_username.as_deref().unwrap_or_default();
            let password = self.scram_password.as_deref().unwrap_or_default();
            if username.is_empty() || password.is_empty() {
                return Err(ClientError::InvalidConfig(format!(
                    "SASL mechanism {} requires a user name and password",
                    mechanism
                )));
            }
        }

        Ok(())
    }
}

fn validate_broker_address(address: &str) -> ClientResult<()> {
    let (host, port) = address.rsplit_once(':').ok_or_else(|| {
        ClientError::InvalidConfig(format!("Broker address '{}' is missing a port", address))
    })?;

    if host.is_empty() {
        return Err(ClientError::InvalidConfig(format!(
            "Broker address '{}' is missing a host",
            address
        )));
    }

    match port.parse::<u16>() {
        Ok(0) | Err(_) => Err(ClientError::InvalidConfig(format!(
            "Broker address '{}' has an invalid port",
            address
        ))),
        Ok(_) => Ok(()),
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("brokers", &self.brokers)
            .field("client_id", &self.client_id)
            .field("sasl_mechanism", &self.sasl_mechanism)
            .field("scram_username", &self.scram_username)
            .field(
                "scram_password",
                &self.scram_password.as_ref().map(|_| "<redacted>"),
            )
            .field("connect_timeout_ms", &self.connect_timeout_ms)
            .field("retries", &self.retries)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> ClientConfig {
        ClientConfig::new(vec!["127.0.0.1:9092".to_string()])
    }

    #[test]
    fn test_client_config_defaults() {
        let config: ClientConfig =
            serde_json::from_str(r#"{"brokers": ["broker-0.local:9092"]}"#).unwrap();
        assert_eq!(config.client_id, "broker-proxy");
        assert_eq!(config.connect_timeout_ms, 5000);
        assert_eq!(config.retries, 3);
        assert!(config.sasl_mechanism.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_client_config_empty_brokers() {
        let config = ClientConfig::new(vec![]);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_client_config_invalid_address() {
        for address in ["broker", ":9092", "broker:port", "broker:0", "broker:70000"] {
            let config = ClientConfig::new(vec![address.to_string()]);
            assert!(config.validate().is_err(), "{} should be rejected", address);
        }
    }

    #[test]
    fn test_apply_scram_credentials() {
        let mut config = base();
        config.apply_scram_credentials(&Credential::new("alice", "secret"));

        assert_eq!(config.sasl_mechanism.as_deref(), Some(DEFAULT_SASL_MECHANISM));
        assert_eq!(config.scram_username.as_deref(), Some("alice"));
        assert_eq!(config.scram_password.as_deref(), Some("secret"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_scram_requires_password() {
        let mut config = base();
        config.apply_scram_credentials(&Credential::new("alice", ""));
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unsupported_mechanism() {
        let mut config = base();
        config.apply_scram_credentials(&Credential::new("alice", "secret"));
        config.sasl_mechanism = Some("PLAIN".to_string());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_doubles() {
        let config = base();
        assert_eq!(config.backoff(0), Duration::from_millis(100));
        assert_eq!(config.backoff(1), Duration::from_millis(200));
        assert_eq!(config.backoff(3), Duration::from_millis(800));
    }

    #[test]
    fn test_debug_redacts_password() {
        let mut config = base();
        config.apply_scram_credentials(&Credential::new("alice", "hunter2"));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("<redacted>"));
    }
}
