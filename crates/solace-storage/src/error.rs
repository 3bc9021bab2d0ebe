//! Error types for the session store.

use solace_core::error::SolaceError;
use solace_core::types::SessionId;

/// Errors from the session store and its backends.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("session not found: {0}")]
    NotFound(SessionId),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("serialization error: {0}")]
    Serialization(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl From<StoreError> for SolaceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Io(e) => SolaceError::Io(e),
            StoreError::Serialization(msg) => SolaceError::Serialization(msg),
            other => SolaceError::Storage(other.to_string()),
        }
    }
}
