//! Client construction seam
//!
//! The cache never builds broker clients itself. A [`ClientFactory`] turns the
//! base configuration plus a principal's credentials into a handle, and the
//! cache only needs the handle to support the [`BrokerClient`] operations.

use async_trait::async_trait;
use broker_client::{AuthnMethod, ClientConfig, ClientResult, Credential, KafkaClient};

/// Operations the cache needs from a client handle
#[async_trait]
pub trait BrokerClient: Send + Sync + 'static {
    /// Close the client's connection
    ///
    /// After this returns, every holder of the handle is expected to observe
    /// a stopped client.
    async fn stop(&self) -> ClientResult<()>;

    /// Secret the client presents on its next connection attempt
    fn scram_password(&self) -> Option<String>;

    /// Replace the secret without disturbing a live connection
    fn set_scram_password(&self, password: String);
}

#[async_trait]
impl BrokerClient for KafkaClient {
    async fn stop(&self) -> ClientResult<()> {
        KafkaClient::stop(self).await
    }

    fn scram_password(&self) -> Option<String> {
        KafkaClient::scram_password(self)
    }

    fn set_scram_password(&self, password: String) {
        KafkaClient::set_scram_password(self, password)
    }
}

/// Builds a client handle for one principal
///
/// Construction must not block; the returned handle connects lazily.
pub trait ClientFactory: Send + Sync + 'static {
    type Client: BrokerClient;

    fn make_client(
        &self,
        base: &ClientConfig,
        user: &Credential,
        authn_method: AuthnMethod,
    ) -> ClientResult<Self::Client>;
}

/// Per-principal client configuration
///
/// The base configuration is cloned; credentials are injected only when the
/// authentication method carries them.
pub fn principal_config(
    base: &ClientConfig,
    user: &Credential,
    authn_method: AuthnMethod,
) -> ClientConfig {
    let mut config = base.clone();
    if authn_method.requires_credentials() {
        config.apply_scram_credentials(user);
    }
    config
}

/// Factory producing [`KafkaClient`] handles
#[derive(Debug, Clone, Copy, Default)]
pub struct KafkaClientFactory;

impl ClientFactory for KafkaClientFactory {
    type Client = KafkaClient;

    fn make_client(
        &self,
        base: &ClientConfig,
        user: &Credential,
        authn_method: AuthnMethod,
    ) -> ClientResult<KafkaClient> {
        KafkaClient::new(principal_config(base, user, authn_method))
    }
}
