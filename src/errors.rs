//! Error types for synchronization operations

use thiserror::Error;

/// Errors that can occur while keeping the client state in sync
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    /// Push channel dropped or could not be opened; triggers a reconnect
    #[error("Transport error: {0}")]
    Transport(String),

    /// Server refused the handshake token
    #[error("Authentication rejected: {0}")]
    AuthRejected(String),

    /// A single resource call failed
    #[error("Request failed: {0}")]
    RequestFailed(String),

    /// Local validation failure; never reaches the network
    #[error("Validation error: {0}")]
    Validation(String),

    /// A completed fetch whose target no longer matches the active route
    #[error("Stale response for {0}")]
    StaleResponse(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// The store's dispatcher has shut down
    #[error("Store is closed")]
    StoreClosed,
}

impl SyncError {
    /// Whether this error should send the push channel into `Reconnecting`
    pub fn is_transport(&self) -> bool {
        matches!(self, SyncError::Transport(_) | SyncError::Timeout(_))
    }

    /// The part of the error worth showing a user
    pub fn user_message(&self) -> String {
        match self {
            SyncError::RequestFailed(message)
            | SyncError::Transport(message)
            | SyncError::Serialization(message)
            | SyncError::Timeout(message) => message.clone(),
            other => other.to_string(),
        }
    }
}

/// Result type for synchronization operations
pub type SyncResult<T> = Result<T, SyncError>;

impl From<async_nats::Error> for SyncError {
    fn from(err: async_nats::Error) -> Self {
        SyncError::Transport(err.to_string())
    }
}

impl From<serde_json::Error> for SyncError {
    fn from(err: serde_json::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}
