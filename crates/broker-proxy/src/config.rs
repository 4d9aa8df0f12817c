use broker_client::{AuthnMethod, ClientConfig};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Client cache configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientCacheConfig {
    /// Maximum number of cached clients per cache
    #[serde(default = "default_max_size")]
    pub max_size: usize,

    /// Idle time in milliseconds before a client is evicted
    #[serde(default = "default_keep_alive_ms")]
    pub keep_alive_ms: u64,

    /// Delay in milliseconds between a capacity eviction and the sweep that stops it
    #[serde(default = "default_eviction_delay_ms")]
    pub eviction_delay_ms: u64,

    /// Maximum time in milliseconds between idle sweeps
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
}

fn default_max_size() -> usize {
    10
}

fn default_keep_alive_ms() -> u64 {
    300_000 // 5 minutes
}

fn default_eviction_delay_ms() -> u64 {
    1000
}

fn default_sweep_interval_ms() -> u64 {
    30_000
}

impl Default for ClientCacheConfig {
    fn default() -> Self {
        ClientCacheConfig {
            max_size: default_max_size(),
            keep_alive_ms: default_keep_alive_ms(),
            eviction_delay_ms: default_eviction_delay_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
        }
    }
}

impl ClientCacheConfig {
    pub fn keep_alive(&self) -> Duration {
        Duration::from_millis(self.keep_alive_ms)
    }

    pub fn eviction_delay(&self) -> Duration {
        Duration::from_millis(self.eviction_delay_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_size == 0 {
            return Err(ConfigError::Invalid(
                "client_cache.max_size must be positive".to_string(),
            ));
        }

        if self.eviction_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "client_cache.eviction_delay_ms cannot be 0".to_string(),
            ));
        }

        if self.sweep_interval_ms == 0 {
            return Err(ConfigError::Invalid(
                "client_cache.sweep_interval_ms cannot be 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Proxy configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Log level: "trace", "debug", "info", "warn", "error" (default: "info")
    #[serde(default)]
    pub log_level: Option<String>,

    /// How inbound requests authenticate
    #[serde(default)]
    pub authentication_method: AuthnMethod,

    /// Base configuration for every backend client
    pub client: ClientConfig,

    /// Client cache settings
    #[serde(default)]
    pub client_cache: ClientCacheConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            log_level: None,
            authentication_method: AuthnMethod::None,
            client: ClientConfig::new(vec!["127.0.0.1:9092".to_string()]),
            client_cache: ClientCacheConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a JSON file
    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), ConfigError> {
        let contents = serde_json::to_string_pretty(self)?;
        fs::write(path, contents)?;
        Ok(())
    }

    /// Effective log level
    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.client
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))?;

        // Credentials come from each request, never from the file
        if self.authentication_method.requires_credentials() && self.client.sasl_mechanism.is_some() {
            return Err(ConfigError::Invalid(format!(
                "client.sasl_mechanism must be unset when authentication_method is {}",
                self.authentication_method
            )));
        }

        self.client_cache.validate()
    }

    /// Create an example configuration file
    pub fn example() -> Self {
        Config {
            log_level: Some("info".to_string()),
            authentication_method: AuthnMethod::HttpBasic,
            client: ClientConfig::new(vec![
                "broker-0.local:9092".to_string(),
                "broker-1.local:9092".to_string(),
            ]),
            client_cache: ClientCacheConfig::default(),
        }
    }
}
