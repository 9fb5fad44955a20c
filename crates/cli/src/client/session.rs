//! Authentication and the shared connection context.
//!
//! `Connection` replaces ambient global state with an explicit context:
//! it owns the configuration, the HTTP gateway, and the current session,
//! and is passed to everything that talks to the remote side. The
//! session is rotated in place by `reconnect()`. The bridge is
//! single-threaded by design; the interior `RefCell` makes the type
//! `!Sync`, so that stays an invariant the compiler enforces.

use std::cell::RefCell;

use chrono::Utc;
use serde_json::Value;

use crate::config::BridgeConfig;
use crate::error::{Error, Result};

use super::error::ApiError;
use super::gateway::{ApiBody, ApiRequest, ApiResponse, HttpGateway, Method, ReqwestGateway};

/// Salesforce API tokens expire after 2h; refresh a little early.
const TOKEN_LIFETIME_SECS: i64 = 110 * 60;

/// An authenticated Salesforce session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    /// Instance base URL, no trailing slash.
    pub instance_url: String,
    pub token_type: String,
    /// Millisecond epoch string, as issued by the token endpoint.
    pub issued_at: Option<String>,
}

impl Session {
    /// Whether the token is old enough to be refreshed preemptively.
    pub fn is_stale(&self) -> bool {
        let Some(issued) = self.issued_at.as_ref().and_then(|s| s.parse::<i64>().ok()) else {
            return false;
        };
        let age_secs = Utc::now().timestamp() - issued / 1000;
        age_secs >= TOKEN_LIFETIME_SECS
    }
}

/// The injectable remote-client context.
pub struct Connection {
    config: BridgeConfig,
    gateway: Box<dyn HttpGateway>,
    session: RefCell<Option<Session>>,
}

impl Connection {
    /// Create a connection over the given gateway. No network call is
    /// made until a session is first needed.
    pub fn new(config: BridgeConfig, gateway: Box<dyn HttpGateway>) -> Self {
        Connection {
            config,
            gateway,
            session: RefCell::new(None),
        }
    }

    /// Create a connection with a pre-established session. This is the
    /// injection point for handing an externally obtained token to the
    /// bridge (and for tests).
    pub fn with_session(
        config: BridgeConfig,
        gateway: Box<dyn HttpGateway>,
        session: Session,
    ) -> Self {
        Connection {
            config,
            gateway,
            session: RefCell::new(Some(session)),
        }
    }

    /// Open a production connection.
    pub fn open(config: BridgeConfig) -> Result<Self> {
        let gateway = ReqwestGateway::new().map_err(ApiError::from)?;
        Ok(Connection::new(config, Box::new(gateway)))
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn is_offline(&self) -> bool {
        self.config.offline
    }

    pub fn separator(&self) -> &str {
        &self.config.multichoice_separator
    }

    pub(crate) fn gateway(&self) -> &dyn HttpGateway {
        self.gateway.as_ref()
    }

    /// The current session, authenticating first if necessary.
    pub fn session(&self) -> Result<Session> {
        if let Some(session) = self.session.borrow().as_ref() {
            return Ok(session.clone());
        }
        self.reconnect()
    }

    /// Re-authenticate, replacing the stored session.
    pub fn reconnect(&self) -> Result<Session> {
        let session = self.login()?;
        *self.session.borrow_mut() = Some(session.clone());
        Ok(session)
    }

    /// Refresh the session if the token is near its expiry. Used by the
    /// files client, which predates per-call retry.
    pub fn ensure_fresh(&self) -> Result<Session> {
        let session = self.session()?;
        if session.is_stale() {
            return self.reconnect();
        }
        Ok(session)
    }

    /// Versioned REST base for the current instance.
    pub fn api_base(&self, session: &Session) -> String {
        format!(
            "{}/services/data/v{}",
            session.instance_url, self.config.api_version
        )
    }

    /// Async (bulk) API base for the current instance.
    pub fn bulk_base(&self, session: &Session) -> String {
        format!(
            "{}/services/async/{}",
            session.instance_url, self.config.api_version
        )
    }

    /// OAuth2 resource-owner-password token request.
    fn login(&self) -> Result<Session> {
        self.config.validate()?;
        let url = format!("{}/services/oauth2/token", self.config.login_url);
        let form = vec![
            ("grant_type".to_string(), "password".to_string()),
            ("client_id".to_string(), self.config.client_id.clone()),
            ("client_secret".to_string(), self.config.client_secret.clone()),
            ("username".to_string(), self.config.username.clone()),
            (
                "password".to_string(),
                format!("{}{}", self.config.password, self.config.security_token),
            ),
        ];
        let response: ApiResponse = self
            .gateway
            .execute(ApiRequest {
                method: Method::Post,
                url: url.clone(),
                bearer: None,
                body: ApiBody::Form(form),
            })
            .map_err(ApiError::from)?;
        if !response.is_success() {
            let e = ApiError::from_response(&url, &response);
            tracing::error!(error = %e, "could not obtain login token");
            return Err(e.into());
        }
        let body: Value = response.json().map_err(Error::from)?;
        let field = |name: &str| {
            body.get(name)
                .and_then(Value::as_str)
                .map(str::to_string)
                .ok_or_else(|| Error::Config(format!("token response missing `{}`", name)))
        };
        Ok(Session {
            access_token: field("access_token")?,
            instance_url: field("instance_url")?.trim_end_matches('/').to_string(),
            token_type: field("token_type")?,
            issued_at: body.get("issued_at").and_then(Value::as_str).map(str::to_string),
        })
    }
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("offline", &self.config.offline)
            .field("connected", &self.session.borrow().is_some())
            .finish()
    }
}
