//! Mock clients for unit tests

use super::factory::{BrokerClient, ClientFactory};
use async_trait::async_trait;
use broker_client::{AuthnMethod, ClientConfig, ClientError, ClientResult, Credential};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub struct MockClient {
    pub name: String,
    password: Mutex<Option<String>>,
    stop_calls: AtomicUsize,
    stopped: AtomicBool,
    fail_stop: bool,
    stop_delay: Option<Duration>,
}

impl MockClient {
    pub fn new() -> Self {
        Self::build("mock", None, false)
    }

    pub fn failing() -> Self {
        Self::build("mock", None, true)
    }

    fn build(name: &str, password: Option<String>, fail_stop: bool) -> Self {
        MockClient {
            name: name.to_string(),
            password: Mutex::new(password),
            stop_calls: AtomicUsize::new(0),
            stopped: AtomicBool::new(false),
            fail_stop,
            stop_delay: None,
        }
    }

    fn with_stop_delay(mut self, delay: Duration) -> Self {
        self.stop_delay = Some(delay);
        self
    }

    pub fn stop_calls(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BrokerClient for MockClient {
    async fn stop(&self) -> ClientResult<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.stop_delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail_stop || self.stopped.swap(true, Ordering::SeqCst) {
            return Err(ClientError::Stopped);
        }
        Ok(())
    }

    fn scram_password(&self) -> Option<String> {
        self.password.lock().unwrap().clone()
    }

    fn set_scram_password(&self, password: String) {
        *self.password.lock().unwrap() = Some(password);
    }
}

/// Factory that records every client it builds
#[derive(Default)]
pub struct MockFactory {
    pub built: AtomicUsize,
    /// Principals whose clients fail to stop
    pub failing: Mutex<Vec<String>>,
    /// Principals whose construction fails
    pub rejected: Mutex<Vec<String>>,
    /// Principals whose clients take a while to stop
    pub slow: Mutex<Vec<String>>,
}

impl MockFactory {
    pub fn built_count(&self) -> usize {
        self.built.load(Ordering::SeqCst)
    }
}

impl ClientFactory for Arc<MockFactory> {
    type Client = MockClient;

    fn make_client(
        &self,
        _base: &ClientConfig,
        user: &Credential,
        authn_method: AuthnMethod,
    ) -> ClientResult<MockClient> {
        if self.rejected.lock().unwrap().contains(&user.name) {
            return Err(ClientError::InvalidConfig(format!("rejected {}", user.name)));
        }
        let password = authn_method
            .requires_credentials()
            .then(|| user.pass.clone());
        let fail_stop = self.failing.lock().unwrap().contains(&user.name);
        self.built.fetch_add(1, Ordering::SeqCst);
        let client = MockClient::build(&user.name, password, fail_stop);
        if self.slow.lock().unwrap().contains(&user.name) {
            return Ok(client.with_stop_delay(Duration::from_secs(5)));
        }
        Ok(client)
    }
}
