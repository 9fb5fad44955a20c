//! Remote error taxonomy.

use thiserror::Error;

use sfb_core::payload::RemoteErrorBody;

use super::gateway::{ApiResponse, GatewayError};

/// REST API spelling of the invalid-session error code.
const INVALID_SESSION_REST: &str = "INVALID_SESSION_ID";
/// Async (bulk) API spelling.
const INVALID_SESSION_ASYNC: &str = "InvalidSessionId";

/// A failed remote call, classified by what the caller may do about it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 404. Propagated to callers, never retried.
    #[error("resource not found: {url}")]
    ResourceNotFound { url: String },

    /// 401. The session token is expired or invalid; retried after a
    /// reconnect.
    #[error("session expired: {message}")]
    ExpiredSession { message: String },

    /// 400. Retried only when the embedded code signals an invalid
    /// session; any other code propagates untouched.
    #[error("malformed request ({}): {message}", .error_code.as_deref().unwrap_or("unknown"))]
    MalformedRequest {
        error_code: Option<String>,
        message: String,
    },

    /// Any other non-success status.
    #[error("request failed with status {status}: {message}")]
    Request { status: u16, message: String },

    /// A bulk batch that the remote side reported as failed, or one
    /// that never finished within the polling window. Never retried.
    #[error("bulk batch failed: {message}")]
    Batch { message: String },

    /// A response body that could not be decoded. The call itself
    /// went through, so a retry could repeat a completed mutation;
    /// never retried.
    #[error("invalid response body: {0}")]
    InvalidBody(String),

    /// Connection-level failure; retried after a reconnect.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ApiError {
    /// Classify a non-success HTTP response.
    pub fn from_response(url: &str, response: &ApiResponse) -> Self {
        let body = RemoteErrorBody::parse(&response.body);
        let message = body.message.unwrap_or_default();
        match response.status {
            404 => ApiError::ResourceNotFound {
                url: url.to_string(),
            },
            401 => ApiError::ExpiredSession { message },
            400 => ApiError::MalformedRequest {
                error_code: body.error_code,
                message,
            },
            status => ApiError::Request { status, message },
        }
    }

    /// Whether a reconnect-and-retry may fix this failure.
    pub fn is_session_expired(&self) -> bool {
        match self {
            ApiError::ExpiredSession { .. } | ApiError::Transport(_) => true,
            ApiError::MalformedRequest { error_code, .. } => matches!(
                error_code.as_deref(),
                Some(INVALID_SESSION_REST) | Some(INVALID_SESSION_ASYNC)
            ),
            _ => false,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::ResourceNotFound { .. })
    }
}

impl From<GatewayError> for ApiError {
    fn from(e: GatewayError) -> Self {
        match e {
            GatewayError::Transport(msg) => ApiError::Transport(msg),
        }
    }
}
