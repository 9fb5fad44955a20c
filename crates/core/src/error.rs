use thiserror::Error;

/// Configuration and data-shape errors raised by the core layer.
///
/// These are all caller mistakes (bad field map, unsupported field,
/// malformed value); none of them is ever retried.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid field path '{path}': {reason}")]
    InvalidFieldPath { path: String, reason: String },

    #[error("duplicate field '{0}' in schema")]
    DuplicateField(String),

    #[error("unknown field '{0}'\n  hint: the field is not declared in the record schema")]
    UnknownField(String),

    #[error("field '{field}' is not serializable as {kind}")]
    UnsupportedField { field: String, kind: String },

    #[error("type mismatch for {kind} value: {value}")]
    TypeMismatch { kind: String, value: String },

    #[error("missing required setting: {0}")]
    MissingSetting(&'static str),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A specialized Result type for sfb-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
