//! Local persistence seam.
//!
//! The reconciliation engine never talks to a database directly; it
//! goes through [`SyncStore`], one implementation per synchronized
//! model. Implementations own the SQL, the engine owns the ordering of
//! saves and sync-stamps around remote calls.

use chrono::{DateTime, Utc};

use sfb_core::{Record, ScalarValue};

use crate::client::Connection;
use crate::error::{Error, Result};

/// The columns every synchronized table carries, for embedding in the
/// application's DDL. `modify_at` is refreshed on every save;
/// `sync_at` is written only by the engine.
pub fn sync_columns_ddl() -> &'static str {
    "salesforce_id TEXT,\n\
     sync_at TEXT,\n\
     modify_at TEXT NOT NULL,\n\
     create_at TEXT NOT NULL"
}

/// Storage operations the engine needs over one model's table.
///
/// The relation hooks have conservative defaults so stores for models
/// without foreign keys implement nothing extra: lookups resolve to
/// nothing and setting a relation is a configuration error.
pub trait SyncStore {
    type Rec: Record;

    /// A fresh, unpersisted record.
    fn new_record(&self) -> Self::Rec;

    fn find_by_remote_id(&self, remote_id: &str) -> Result<Option<Self::Rec>>;

    fn all(&self) -> Result<Vec<Self::Rec>>;

    /// Persist the record, refreshing `modify_at`.
    fn save(&self, record: &mut Self::Rec) -> Result<()>;

    /// Persist only the sync bookkeeping (`salesforce_id`, `sync_at`),
    /// leaving `modify_at` untouched.
    fn save_sync_fields(&self, record: &mut Self::Rec) -> Result<()>;

    /// Mark the record as synced now. Must leave `is_sync()` true.
    fn stamp_synced(&self, record: &mut Self::Rec, at: DateTime<Utc>) -> Result<()> {
        record.set_sync_at(Some(at));
        self.save_sync_fields(record)
    }

    /// Delete every persisted record whose local id is not in `keep`,
    /// returning the deleted records.
    fn delete_stale(&self, keep_local_ids: &[i64]) -> Result<Vec<Self::Rec>>;

    /// Delete the given records in a single transaction.
    fn delete_records(&self, records: &[Self::Rec]) -> Result<()>;

    /// Resolve a relation's local foreign-key value from the related
    /// record's remote id.
    fn find_relation_by_remote_id(
        &self,
        relation: &str,
        remote_id: &str,
    ) -> Result<Option<ScalarValue>> {
        let _ = (relation, remote_id);
        Ok(None)
    }

    /// Construct the related record from its remote id, pulling it if
    /// the connection is live. Remote failures resolve to `None`
    /// rather than aborting the caller's pull.
    fn create_relation_from_remote(
        &self,
        conn: &Connection,
        relation: &str,
        remote_id: &str,
    ) -> Result<Option<ScalarValue>> {
        let _ = (conn, relation, remote_id);
        Ok(None)
    }

    /// Write the local foreign-key value for a relation.
    fn set_relation(
        &self,
        record: &mut Self::Rec,
        relation: &str,
        value: ScalarValue,
    ) -> Result<()> {
        let _ = (record, value);
        Err(Error::ImproperlyConfigured(format!(
            "model has no relation `{}`",
            relation
        )))
    }

    /// Read a leaf through a relation, e.g. the related record's
    /// `salesforce_id`. `None` means the relation is unset.
    fn related_leaf_value(
        &self,
        record: &Self::Rec,
        relation: &str,
        leaf: &str,
    ) -> Result<Option<ScalarValue>> {
        let _ = (record, leaf);
        Err(Error::ImproperlyConfigured(format!(
            "model has no relation `{}`",
            relation
        )))
    }
}

#[cfg(test)]
#[path = "store_tests.rs"]
mod tests;
