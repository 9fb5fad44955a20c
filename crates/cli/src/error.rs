use thiserror::Error;

use crate::client::ApiError;

/// All possible errors that can occur in the sfb library.
#[derive(Debug, Error)]
pub enum Error {
    /// Terminal failure after the session-reconnect loop gave up.
    #[error("Salesforce connection ended after too many reconnection retries")]
    RetriesExhausted,

    /// Misconfigured model or settings. Never retried.
    #[error("improperly configured: {0}")]
    ImproperlyConfigured(String),

    #[error("file upload failed: {0}")]
    Upload(String),

    #[error(transparent)]
    Core(#[from] sfb_core::Error),

    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    /// True for a remote 404, the one remote error callers are expected
    /// to handle explicitly.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Api(ApiError::ResourceNotFound { .. }))
    }
}

/// A specialized Result type for sfb operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
