//! Client cache error types

use broker_client::ClientError;
use thiserror::Error;

/// Client cache errors
#[derive(Error, Debug)]
pub enum CacheError {
    /// Cache capacity must be positive
    #[error("Invalid cache capacity: {0}")]
    InvalidCapacity(usize),

    /// Credential-carrying request without a secret
    #[error("Authentication method {method} requires a password for principal '{principal}'")]
    MissingCredentials { principal: String, method: String },

    /// The cache has been shut down
    #[error("Client cache has been stopped")]
    Stopped,

    /// Client construction failed
    #[error("Client error: {0}")]
    Client(#[from] ClientError),
}

/// Result type for client cache operations
pub type CacheResult<T> = Result<T, CacheError>;
