//! HTTP gateway abstraction.
//!
//! A trait-based seam between the client layer and the wire, enabling:
//! - Real HTTPS calls for production
//! - Scripted gateways for unit testing

use serde_json::Value;
use thiserror::Error;

/// Error type for gateway operations. Anything here is a
/// connection-level failure; HTTP error statuses come back as normal
/// [`ApiResponse`]s.
#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("transport error: {0}")]
    Transport(String),
}

/// Result type for gateway operations.
pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Patch,
    Delete,
}

/// The request body, one variant per content type the bridge sends.
#[derive(Debug, Clone)]
pub enum ApiBody {
    None,
    Json(Value),
    /// URL-encoded form, used by the OAuth token endpoint.
    Form(Vec<(String, String)>),
    /// Two-part upload for the files API.
    Multipart(MultipartPayload),
}

/// The files API upload shape: a JSON metadata part plus the binary part.
#[derive(Debug, Clone)]
pub struct MultipartPayload {
    /// JSON metadata document (the `json` part).
    pub meta: Value,
    pub file_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    /// Bearer token, absent only for the token request itself.
    pub bearer: Option<String>,
    pub body: ApiBody,
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status < 300
    }

    /// Parse the body as JSON. An empty body parses as null.
    pub fn json(&self) -> serde_json::Result<Value> {
        if self.body.is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_slice(&self.body)
    }
}

/// Transport seam for the client layer.
pub trait HttpGateway {
    fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse>;
}

/// Production gateway over a blocking reqwest client.
pub struct ReqwestGateway {
    client: reqwest::blocking::Client,
}

impl ReqwestGateway {
    pub fn new() -> GatewayResult<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Ok(ReqwestGateway { client })
    }
}

impl HttpGateway for ReqwestGateway {
    fn execute(&self, request: ApiRequest) -> GatewayResult<ApiResponse> {
        let transport = |e: reqwest::Error| GatewayError::Transport(e.to_string());

        let mut builder = match request.method {
            Method::Get => self.client.get(&request.url),
            Method::Post => self.client.post(&request.url),
            Method::Patch => self.client.patch(&request.url),
            Method::Delete => self.client.delete(&request.url),
        };
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        builder = builder.header(reqwest::header::ACCEPT, "application/json");

        builder = match request.body {
            ApiBody::None => builder,
            ApiBody::Json(value) => builder.json(&value),
            ApiBody::Form(pairs) => builder.form(&pairs),
            ApiBody::Multipart(payload) => {
                let meta = reqwest::blocking::multipart::Part::text(payload.meta.to_string())
                    .mime_str("application/json")
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;
                let file = reqwest::blocking::multipart::Part::bytes(payload.data)
                    .file_name(payload.file_name)
                    .mime_str(&payload.mime_type)
                    .map_err(|e| GatewayError::Transport(e.to_string()))?;
                let form = reqwest::blocking::multipart::Form::new()
                    .part("json", meta)
                    .part("fileData", file);
                builder.multipart(form)
            }
        };

        let response = builder.send().map_err(transport)?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(transport)?.to_vec();
        Ok(ApiResponse { status, body })
    }
}
