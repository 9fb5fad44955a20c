//! Wire payload types for the Salesforce REST and Bulk APIs.

use serde::Deserialize;
use serde_json::Value;

/// A remote payload: remote field name to JSON scalar.
pub type FieldValues = serde_json::Map<String, Value>;

/// Result of a single-record create/upsert.
///
/// `id` is `None` for the offline placeholder and for upserts of
/// existing records (the API answers 204 with no body).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SaveResult {
    pub id: Option<String>,
    pub created: Option<bool>,
}

impl SaveResult {
    /// Parse from a create/upsert response body.
    pub fn from_body(body: &Value) -> Self {
        SaveResult {
            id: body.get("id").and_then(Value::as_str).map(str::to_string),
            created: body.get("created").and_then(Value::as_bool),
        }
    }
}

/// A SOQL query result page.
#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    #[serde(default)]
    pub total_size: u64,
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub records: Vec<FieldValues>,
    #[serde(default)]
    pub next_records_url: Option<String>,
}

impl QueryResult {
    /// The empty result used as the offline placeholder for query ops.
    pub fn empty() -> Self {
        QueryResult {
            done: true,
            ..QueryResult::default()
        }
    }
}

/// Per-record outcome of a bulk batch.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct BulkItemResult {
    pub id: Option<String>,
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub created: bool,
    #[serde(default)]
    pub errors: Vec<Value>,
}

/// A parsed Salesforce error body.
///
/// The REST API answers `[{"errorCode": ..., "message": ...}]`; the
/// async (bulk) API answers `{"exceptionCode": ..., "exceptionMessage": ...}`.
/// Both spellings are folded into one shape here.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteErrorBody {
    pub error_code: Option<String>,
    pub message: Option<String>,
}

impl RemoteErrorBody {
    /// Parse an error body from raw response bytes. Unparsable bodies
    /// yield the raw text as the message.
    pub fn parse(bytes: &[u8]) -> Self {
        let value: Value = match serde_json::from_slice(bytes) {
            Ok(v) => v,
            Err(_) => {
                return RemoteErrorBody {
                    error_code: None,
                    message: Some(String::from_utf8_lossy(bytes).into_owned()),
                }
            }
        };
        let entry = match &value {
            Value::Array(items) => items.first().cloned().unwrap_or(Value::Null),
            other => other.clone(),
        };
        let pick = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| entry.get(k).and_then(Value::as_str))
                .map(str::to_string)
        };
        RemoteErrorBody {
            error_code: pick(&["errorCode", "exceptionCode"]),
            message: pick(&["message", "exceptionMessage"]),
        }
    }
}

#[cfg(test)]
#[path = "payload_tests.rs"]
mod tests;
