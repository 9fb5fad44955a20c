//! Remote client layer.
//!
//! Presents a uniform CRUD/bulk/query interface over the Salesforce
//! HTTP APIs, independent of which object it targets, and survives
//! transient session expiry.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐     ┌──────────────┐
//! │ ObjectClient │────►│  Connection  │────►│  HttpGateway │
//! │  BulkClient  │◄────│ (session +   │◄────│   (trait)    │
//! └──────────────┘     │  offline)    │     └──────────────┘
//!                      └──────────────┘
//! ```
//!
//! The gateway trait is the test seam; `Connection` is the injectable
//! context holding the rotated session and the offline switch.

mod bulk;
mod error;
mod gateway;
mod rest;
mod session;

pub use bulk::BulkClient;
pub use error::ApiError;
pub use gateway::{ApiBody, ApiRequest, ApiResponse, GatewayError, HttpGateway, Method, MultipartPayload, ReqwestGateway};
pub use rest::{ObjectClient, RETRY_COUNT_MAX};
pub use session::{Connection, Session};

use crate::error::{Error, Result};

/// Run a remote call, reconnecting on an expired session.
///
/// Retry state is local to this invocation: up to [`RETRY_COUNT_MAX`]
/// call attempts, with a reconnect between them. Any error outside the
/// session-expired set propagates immediately.
pub(crate) fn with_reconnect<T>(
    conn: &Connection,
    object: &str,
    op: &str,
    f: impl Fn(&Session) -> std::result::Result<T, ApiError>,
) -> Result<T> {
    let mut attempt: u32 = 1;
    loop {
        let session = conn.session()?;
        match f(&session) {
            Ok(value) => return Ok(value),
            Err(e) if e.is_session_expired() => {
                if attempt >= RETRY_COUNT_MAX {
                    tracing::error!(object, op, "reconnection retries exhausted");
                    return Err(Error::RetriesExhausted);
                }
                attempt += 1;
                tracing::warn!(object, op, attempt, error = %e, "session expired, reconnecting");
                conn.reconnect()?;
            }
            Err(e) => return Err(e.into()),
        }
    }
}

/// Execute one authenticated request, classifying non-success statuses.
pub(crate) fn send(
    conn: &Connection,
    session: &Session,
    method: Method,
    url: String,
    body: ApiBody,
) -> std::result::Result<ApiResponse, ApiError> {
    let response = conn
        .gateway()
        .execute(ApiRequest {
            method,
            url: url.clone(),
            bearer: Some(session.access_token.clone()),
            body,
        })
        .map_err(ApiError::from)?;
    if !response.is_success() {
        return Err(ApiError::from_response(&url, &response));
    }
    Ok(response)
}
