//! Client error types

use thiserror::Error;

/// Broker client errors
#[derive(Error, Debug)]
pub enum ClientError {
    /// Client configuration rejected
    #[error("Invalid client configuration: {0}")]
    InvalidConfig(String),

    /// IO error during network operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Connection attempt timed out
    #[error("Connection to {0} timed out after {1}ms")]
    Timeout(String, u64),

    /// Every broker in the list failed
    #[error("No brokers available after {0} attempts")]
    NoBrokersAvailable(u32),

    /// Operation on a client that has already been stopped
    #[error("Client has been stopped")]
    Stopped,
}

/// Result type for client operations
pub type ClientResult<T> = Result<T, ClientError>;
