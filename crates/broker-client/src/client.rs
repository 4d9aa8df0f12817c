//! Lazily connecting broker client handle
//!
//! Construction never performs I/O. The first operation that needs the
//! cluster connects to the first reachable seed broker; `stop()` tears the
//! transport down and invalidates the handle for every holder.

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock};
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio::time;
use tracing::{debug, warn};

/// Broker client handle
pub struct KafkaClient {
    /// Active configuration; the SCRAM password can be rotated in place
    config: RwLock<ClientConfig>,
    /// Transport, established on first use
    connection: Mutex<Option<TcpStream>>,
    connected: AtomicBool,
    stopped: AtomicBool,
}

impl KafkaClient {
    /// Create a new client from configuration
    ///
    /// Validates the configuration; does not connect.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        config.validate()?;

        Ok(KafkaClient {
            config: RwLock::new(config),
            connection: Mutex::new(None),
            connected: AtomicBool::new(false),
            stopped: AtomicBool::new(false),
        })
    }

    /// Snapshot of the active configuration
    pub fn config(&self) -> ClientConfig {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// SCRAM user name, if the client authenticates
    pub fn scram_username(&self) -> Option<String> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .scram_username
            .clone()
    }

    /// SCRAM password the next connection attempt will present
    pub fn scram_password(&self) -> Option<String> {
        self.config
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .scram_password
            .clone()
    }

    /// Replace the SCRAM password
    ///
    /// A live connection is left untouched; the new password is used the
    /// next time the client (re)connects.
    pub fn set_scram_password(&self, password: String) {
        self.config
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .scram_password = Some(password);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }

    /// Connect to the cluster if not already connected
    ///
    /// Walks the seed broker list, bounded by the connect timeout per attempt,
    /// and retries the whole list `retries` times with exponential backoff.
    pub async fn connect(&self) -> ClientResult<()> {
        if self.is_stopped() {
            return Err(ClientError::Stopped);
        }

        let mut connection = self.connection.lock().await;
        // stop() may have won the race for the lock
        if self.is_stopped() {
            return Err(ClientError::Stopped);
        }
        if connection.is_some() {
            return Ok(());
        }

        let config = self.config();
        let timeout = config.connect_timeout();
        let attempts = config.retries.saturating_add(1);
        let mut failures = ConnectFailures::default();

        for attempt in 0..attempts {
            for broker in &config.brokers {
                match time::timeout(timeout, TcpStream::connect(broker.as_str())).await {
                    Ok(Ok(stream)) => {
                        debug!(
                            broker = %broker,
                            client_id = %config.client_id,
                            user = config.scram_username.as_deref().unwrap_or("-"),
                            "Connected to broker"
                        );
                        *connection = Some(stream);
                        self.connected.store(true, Ordering::Release);
                        return Ok(());
                    }
                    Ok(Err(e)) => {
                        debug!(broker = %broker, error = %e, "Broker connect failed");
                        failures.errors += 1;
                    }
                    Err(_) => {
                        debug!(
                            broker = %broker,
                            timeout_ms = config.connect_timeout_ms,
                            "Broker connect timed out"
                        );
                        failures.last_timed_out = Some(broker.clone());
                    }
                }
            }

            if attempt + 1 < attempts {
                time::sleep(config.backoff(attempt)).await;
            }
        }

        warn!(
            client_id = %config.client_id,
            attempts = attempts,
            "No brokers available"
        );
        Err(failures.into_error(attempts, config.connect_timeout_ms))
    }

    /// Stop the client
    ///
    /// Shuts down the transport if one was established. Every holder of this
    /// handle observes [`ClientError::Stopped`] afterwards, including a
    /// second call to `stop()`.
    pub async fn stop(&self) -> ClientResult<()> {
        if self.stopped.swap(true, Ordering::AcqRel) {
            return Err(ClientError::Stopped);
        }

        let mut connection = self.connection.lock().await;
        self.connected.store(false, Ordering::Release);
        if let Some(mut stream) = connection.take() {
            stream.shutdown().await?;
        }

        Ok(())
    }
}

impl std::fmt::Debug for KafkaClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KafkaClient")
            .field("config", &self.config())
            .field("connected", &self.is_connected())
            .field("stopped", &self.is_stopped())
            .finish()
    }
}

/// Outcome of every failed connect attempt
#[derive(Debug, Default)]
struct ConnectFailures {
    /// Attempts refused or reset before the timeout
    errors: u32,
    last_timed_out: Option<String>,
}

impl ConnectFailures {
    /// Timeout only when no attempt failed for another reason
    fn into_error(self, attempts: u32, timeout_ms: u64) -> ClientError {
        match self.last_timed_out {
            Some(broker) if self.errors == 0 => ClientError::Timeout(broker, timeout_ms),
            _ => ClientError::NoBrokersAvailable(attempts),
        }
    }
}
