//! Bulk (async) API client.
//!
//! Runs one job per call: create the job, submit the records as a
//! single JSON batch, close the job, then poll the batch until it
//! settles and fetch the per-record results.

use std::time::Duration;

use serde_json::{json, Value};

use sfb_core::payload::{BulkItemResult, FieldValues};

use crate::error::Result;

use super::error::ApiError;
use super::gateway::{ApiBody, Method};
use super::session::{Connection, Session};
use super::{send, with_reconnect};

const POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Polling attempts before the batch is declared stuck (~10 minutes).
const POLL_LIMIT: u32 = 120;

/// Batch states that end polling.
const STATE_COMPLETED: &str = "Completed";
const STATE_FAILED: &str = "Failed";
const STATE_NOT_PROCESSED: &str = "NotProcessed";

/// Bulk operations over one Salesforce object.
pub struct BulkClient<'a> {
    conn: &'a Connection,
    object_name: String,
}

impl<'a> BulkClient<'a> {
    pub fn new(conn: &'a Connection, object_name: impl Into<String>) -> Self {
        BulkClient {
            conn,
            object_name: object_name.into(),
        }
    }

    pub fn insert(&self, records: &[FieldValues]) -> Result<Option<Vec<BulkItemResult>>> {
        self.run_job("insert", None, records)
    }

    pub fn update(&self, records: &[FieldValues]) -> Result<Option<Vec<BulkItemResult>>> {
        self.run_job("update", None, records)
    }

    /// Upsert keyed on the given external-id field.
    pub fn upsert(
        &self,
        external_id_field: &str,
        records: &[FieldValues],
    ) -> Result<Option<Vec<BulkItemResult>>> {
        self.run_job("upsert", Some(external_id_field), records)
    }

    /// Soft-delete; records need only carry `Id`.
    pub fn delete(&self, records: &[FieldValues]) -> Result<Option<Vec<BulkItemResult>>> {
        self.run_job("delete", None, records)
    }

    /// Permanent delete, skipping the recycle bin.
    pub fn hard_delete(&self, records: &[FieldValues]) -> Result<Option<Vec<BulkItemResult>>> {
        self.run_job("hardDelete", None, records)
    }

    /// One complete job lifecycle. Empty inputs and offline mode are
    /// no-ops returning `None`.
    fn run_job(
        &self,
        operation: &str,
        external_id_field: Option<&str>,
        records: &[FieldValues],
    ) -> Result<Option<Vec<BulkItemResult>>> {
        if records.is_empty() || self.conn.is_offline() {
            return Ok(None);
        }
        tracing::debug!(object = %self.object_name, operation, count = records.len(), "bulk job");
        with_reconnect(self.conn, &self.object_name, operation, |session| {
            let base = self.conn.bulk_base(session);
            let job_id = self.create_job(session, &base, operation, external_id_field)?;
            let batch_id = self.add_batch(session, &base, &job_id, records)?;
            self.close_job(session, &base, &job_id)?;
            self.wait_for_batch(session, &base, &job_id, &batch_id)?;
            self.batch_results(session, &base, &job_id, &batch_id)
                .map(Some)
        })
        .map_err(|e| {
            tracing::error!(object = %self.object_name, operation, error = %e, "bulk job failed");
            e
        })
    }

    fn create_job(
        &self,
        session: &Session,
        base: &str,
        operation: &str,
        external_id_field: Option<&str>,
    ) -> std::result::Result<String, ApiError> {
        let mut body = json!({
            "operation": operation,
            "object": self.object_name,
            "contentType": "JSON",
        });
        if let (Some(field), Some(map)) = (external_id_field, body.as_object_mut()) {
            map.insert(
                "externalIdFieldName".to_string(),
                Value::String(field.to_string()),
            );
        }
        let response = send(
            self.conn,
            session,
            Method::Post,
            format!("{}/job", base),
            ApiBody::Json(body),
        )?;
        json_field(&response.json().map_err(bad_body)?, "id")
    }

    fn add_batch(
        &self,
        session: &Session,
        base: &str,
        job_id: &str,
        records: &[FieldValues],
    ) -> std::result::Result<String, ApiError> {
        let payload = Value::Array(records.iter().cloned().map(Value::Object).collect());
        let response = send(
            self.conn,
            session,
            Method::Post,
            format!("{}/job/{}/batch", base, job_id),
            ApiBody::Json(payload),
        )?;
        json_field(&response.json().map_err(bad_body)?, "id")
    }

    fn close_job(
        &self,
        session: &Session,
        base: &str,
        job_id: &str,
    ) -> std::result::Result<(), ApiError> {
        send(
            self.conn,
            session,
            Method::Post,
            format!("{}/job/{}", base, job_id),
            ApiBody::Json(json!({"state": "Closed"})),
        )?;
        Ok(())
    }

    /// Poll the batch until it reaches a terminal state.
    fn wait_for_batch(
        &self,
        session: &Session,
        base: &str,
        job_id: &str,
        batch_id: &str,
    ) -> std::result::Result<(), ApiError> {
        let url = format!("{}/job/{}/batch/{}", base, job_id, batch_id);
        for _ in 0..POLL_LIMIT {
            let response = send(self.conn, session, Method::Get, url.clone(), ApiBody::None)?;
            let body = response.json().map_err(bad_body)?;
            let state = body.get("state").and_then(Value::as_str).unwrap_or("");
            match state {
                STATE_COMPLETED => return Ok(()),
                STATE_FAILED | STATE_NOT_PROCESSED => {
                    let message = body
                        .get("stateMessage")
                        .and_then(Value::as_str)
                        .unwrap_or(state);
                    return Err(ApiError::Batch {
                        message: message.to_string(),
                    });
                }
                _ => std::thread::sleep(POLL_INTERVAL),
            }
        }
        Err(ApiError::Batch {
            message: format!("batch {} still running after polling window", batch_id),
        })
    }

    fn batch_results(
        &self,
        session: &Session,
        base: &str,
        job_id: &str,
        batch_id: &str,
    ) -> std::result::Result<Vec<BulkItemResult>, ApiError> {
        let url = format!("{}/job/{}/batch/{}/result", base, job_id, batch_id);
        let response = send(self.conn, session, Method::Get, url, ApiBody::None)?;
        serde_json::from_slice(&response.body).map_err(bad_body)
    }
}

fn bad_body(e: serde_json::Error) -> ApiError {
    ApiError::InvalidBody(e.to_string())
}

fn json_field(body: &Value, name: &str) -> std::result::Result<String, ApiError> {
    body.get(name)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| ApiError::InvalidBody(format!("missing `{}`", name)))
}
