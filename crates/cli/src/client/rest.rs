//! Per-object REST client.

use serde_json::Value;

use sfb_core::payload::{FieldValues, QueryResult, SaveResult};
use sfb_core::schema::{RecordSchema, DEFAULT_REMOTE_KEY_FIELD};

use crate::error::Result;

use super::error::ApiError;
use super::gateway::{ApiBody, ApiResponse, Method};
use super::session::{Connection, Session};
use super::with_reconnect;

/// Total call attempts before the reconnect loop gives up.
pub const RETRY_COUNT_MAX: u32 = 3;

/// Uniform CRUD/query interface over one Salesforce object.
pub struct ObjectClient<'a> {
    conn: &'a Connection,
    object_name: String,
    key_field: String,
}

impl<'a> ObjectClient<'a> {
    pub fn new(conn: &'a Connection, object_name: impl Into<String>) -> Self {
        ObjectClient {
            conn,
            object_name: object_name.into(),
            key_field: DEFAULT_REMOTE_KEY_FIELD.to_string(),
        }
    }

    /// Address records by a custom external-id field instead of `Id`.
    pub fn with_key_field(mut self, field: impl Into<String>) -> Self {
        self.key_field = field.into();
        self
    }

    pub fn for_schema(conn: &'a Connection, schema: &RecordSchema) -> Self {
        ObjectClient::new(conn, schema.object_name())
            .with_key_field(schema.remote_key_field())
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    /// The offline placeholder for single-record payload ops.
    fn offline_record() -> FieldValues {
        let mut map = FieldValues::new();
        map.insert("salesforce_id".to_string(), Value::Null);
        map
    }

    fn sobject_base(&self, session: &Session) -> String {
        format!(
            "{}/sobjects/{}",
            self.conn.api_base(session),
            self.object_name
        )
    }

    /// Record URL; a non-default key field addresses as `<field>/<id>`.
    fn record_url(&self, session: &Session, id: &str) -> String {
        if self.key_field != DEFAULT_REMOTE_KEY_FIELD {
            format!("{}/{}/{}", self.sobject_base(session), self.key_field, id)
        } else {
            format!("{}/{}", self.sobject_base(session), id)
        }
    }

    fn send(
        &self,
        session: &Session,
        method: Method,
        url: String,
        body: ApiBody,
    ) -> std::result::Result<ApiResponse, ApiError> {
        super::send(self.conn, session, method, url, body)
    }

    /// Remove the remote primary-key field; the API rejects it in bodies.
    fn strip_key(fields: &FieldValues) -> FieldValues {
        let mut out = fields.clone();
        out.remove(DEFAULT_REMOTE_KEY_FIELD);
        out
    }

    /// Fetch a record by id (or by the configured key field).
    pub fn get(&self, id: &str) -> Result<FieldValues> {
        if self.conn.is_offline() {
            return Ok(Self::offline_record());
        }
        with_reconnect(self.conn, &self.object_name, "get", |session| {
            let url = self.record_url(session, id);
            let response = self.send(session, Method::Get, url, ApiBody::None).map_err(|e| {
                tracing::error!(object = %self.object_name, op = "get", id, error = %e, "salesforce call failed");
                e
            })?;
            parse_record(&response)
        })
    }

    /// Fetch a record by an arbitrary external-id field.
    pub fn get_by_custom_id(&self, field_name: &str, id: &str) -> Result<FieldValues> {
        if self.conn.is_offline() {
            return Ok(Self::offline_record());
        }
        with_reconnect(self.conn, &self.object_name, "get_by_custom_id", |session| {
            let url = format!("{}/{}/{}", self.sobject_base(session), field_name, id);
            let response = self.send(session, Method::Get, url, ApiBody::None).map_err(|e| {
                tracing::error!(object = %self.object_name, op = "get_by_custom_id", field_name, id, error = %e, "salesforce call failed");
                e
            })?;
            parse_record(&response)
        })
    }

    /// Create a record. Empty field sets are a no-op returning `None`.
    pub fn create(&self, fields: &FieldValues) -> Result<Option<SaveResult>> {
        if fields.is_empty() {
            return Ok(None);
        }
        if self.conn.is_offline() {
            return Ok(Some(SaveResult::default()));
        }
        let payload = Self::strip_key(fields);
        with_reconnect(self.conn, &self.object_name, "create", |session| {
            let url = format!("{}/", self.sobject_base(session));
            let response = self
                .send(session, Method::Post, url, ApiBody::Json(Value::Object(payload.clone())))
                .map_err(|e| {
                    tracing::error!(object = %self.object_name, op = "create", error = %e, payload = ?payload, "salesforce call failed");
                    e
                })?;
            let body = response.json().map_err(json_error)?;
            Ok(Some(SaveResult::from_body(&body)))
        })
    }

    /// Create a record, seeding the configured key field with `key`.
    pub fn create_with_custom_key(
        &self,
        fields: &FieldValues,
        key: Option<&str>,
    ) -> Result<Option<SaveResult>> {
        if fields.is_empty() {
            return Ok(None);
        }
        let mut payload = Self::strip_key(fields);
        if let Some(key) = key {
            payload.insert(self.key_field.clone(), Value::String(key.to_string()));
        }
        self.create(&payload)
    }

    /// Update an existing record. Returns the response status.
    pub fn update(&self, id: &str, fields: &FieldValues) -> Result<Option<u16>> {
        if fields.is_empty() || id.is_empty() {
            return Ok(None);
        }
        if self.conn.is_offline() {
            return Ok(Some(204));
        }
        let payload = Self::strip_key(fields);
        with_reconnect(self.conn, &self.object_name, "update", |session| {
            let url = self.record_url(session, id);
            let response = self
                .send(session, Method::Patch, url, ApiBody::Json(Value::Object(payload.clone())))
                .map_err(|e| {
                    tracing::error!(object = %self.object_name, op = "update", id, error = %e, payload = ?payload, "salesforce call failed");
                    e
                })?;
            Ok(Some(response.status))
        })
    }

    /// Create-or-update by the configured key field.
    pub fn upsert(&self, id: &str, fields: &FieldValues) -> Result<Option<SaveResult>> {
        if fields.is_empty() || id.is_empty() {
            return Ok(None);
        }
        if self.conn.is_offline() {
            return Ok(Some(SaveResult::default()));
        }
        let payload = Self::strip_key(fields);
        with_reconnect(self.conn, &self.object_name, "upsert", |session| {
            let url = self.record_url(session, id);
            let response = self
                .send(session, Method::Patch, url, ApiBody::Json(Value::Object(payload.clone())))
                .map_err(|e| {
                    tracing::error!(object = %self.object_name, op = "upsert", id, error = %e, payload = ?payload, "salesforce call failed");
                    e
                })?;
            let body = response.json().map_err(json_error)?;
            Ok(Some(SaveResult::from_body(&body)))
        })
    }

    /// Delete a record. Missing ids are a no-op.
    pub fn delete(&self, id: &str) -> Result<()> {
        if id.is_empty() || self.conn.is_offline() {
            return Ok(());
        }
        with_reconnect(self.conn, &self.object_name, "delete", |session| {
            let url = self.record_url(session, id);
            self.send(session, Method::Delete, url, ApiBody::None).map_err(|e| {
                tracing::error!(object = %self.object_name, op = "delete", id, error = %e, "salesforce call failed");
                e
            })?;
            Ok(())
        })
    }

    /// Run a SOQL query, returning the first page.
    pub fn query(&self, soql: &str) -> Result<QueryResult> {
        if self.conn.is_offline() {
            return Ok(QueryResult::empty());
        }
        tracing::debug!(soql, "query");
        with_reconnect(self.conn, &self.object_name, "query", |session| {
            let url = query_url(&self.conn.api_base(session), soql)?;
            let response = self.send(session, Method::Get, url, ApiBody::None)?;
            parse_query(&response)
        })
    }

    /// Fetch a continuation page by its `nextRecordsUrl`.
    pub fn query_more(&self, next_records_url: &str) -> Result<QueryResult> {
        if self.conn.is_offline() {
            return Ok(QueryResult::empty());
        }
        tracing::debug!(next_records_url, "query_more");
        with_reconnect(self.conn, &self.object_name, "query_more", |session| {
            let url = format!("{}{}", session.instance_url, next_records_url);
            let response = self.send(session, Method::Get, url, ApiBody::None)?;
            parse_query(&response)
        })
    }

    /// Run a SOQL query and follow pagination to the end.
    pub fn query_all(&self, soql: &str) -> Result<QueryResult> {
        if self.conn.is_offline() {
            return Ok(QueryResult::empty());
        }
        let mut result = self.query(soql)?;
        while !result.done {
            let Some(next) = result.next_records_url.take() else {
                break;
            };
            let page = self.query_more(&next)?;
            result.records.extend(page.records);
            result.done = page.done;
            result.next_records_url = page.next_records_url;
        }
        result.total_size = result.records.len() as u64;
        Ok(result)
    }

    /// Fetch the object's schema description. Not gated by offline mode:
    /// generation tooling needs it regardless.
    pub fn describe(&self) -> Result<Value> {
        with_reconnect(self.conn, &self.object_name, "describe", |session| {
            let url = format!("{}/describe", self.sobject_base(session));
            let response = self.send(session, Method::Get, url, ApiBody::None)?;
            response.json().map_err(json_error)
        })
    }
}

fn json_error(e: serde_json::Error) -> ApiError {
    ApiError::InvalidBody(e.to_string())
}

fn parse_record(response: &ApiResponse) -> std::result::Result<FieldValues, ApiError> {
    match response.json().map_err(json_error)? {
        Value::Object(map) => Ok(map),
        other => Err(ApiError::InvalidBody(format!(
            "expected a record object, got: {}",
            other
        ))),
    }
}

fn parse_query(response: &ApiResponse) -> std::result::Result<QueryResult, ApiError> {
    serde_json::from_slice(&response.body).map_err(json_error)
}

/// Percent-encoded query endpoint URL.
fn query_url(api_base: &str, soql: &str) -> std::result::Result<String, ApiError> {
    reqwest::Url::parse_with_params(&format!("{}/query/", api_base), [("q", soql)])
        .map(|u| u.to_string())
        .map_err(|e| ApiError::Transport(format!("invalid query url: {}", e)))
}
