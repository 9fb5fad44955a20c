//! sfb-core: data layer for the sfbridge Salesforce sync bridge.
//!
//! This crate holds the pure parts of the bridge: scalar type tags and
//! wire conversion, typed field paths, the per-object record schema with
//! its local-to-remote field map, and the wire payload types returned by
//! the Salesforce REST and Bulk APIs. Nothing here performs I/O; the
//! HTTP client, local store, and reconciliation engine live in the
//! `sfbridge` crate.

pub mod error;
pub mod path;
pub mod payload;
pub mod scalar;
pub mod schema;

pub use error::{Error, Result};
pub use path::FieldPath;
pub use payload::{BulkItemResult, FieldValues, QueryResult, RemoteErrorBody, SaveResult};
pub use scalar::{ScalarKind, ScalarValue};
pub use schema::{FieldDef, FieldKind, Record, RecordSchema, SchemaBuilder};
