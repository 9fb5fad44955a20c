//! Push / pull orchestration.

use chrono::Utc;
use serde_json::Value;

use sfb_core::payload::{BulkItemResult, FieldValues, SaveResult};
use sfb_core::schema::{DEFAULT_REMOTE_KEY_FIELD, SOFT_DELETE_FIELD};
use sfb_core::{FieldKind, FieldPath, Record, ScalarValue};

use crate::client::{BulkClient, Connection, ObjectClient};
use crate::error::{Error, Result};
use crate::store::SyncStore;

use super::deserialize::deserialize;
use super::serialize::{apply_update_fields, serialize, SerializeOptions};

/// What a push did.
#[derive(Debug)]
pub enum PushOutcome {
    /// Offline mode: the payload that would have been sent.
    Offline(FieldValues),
    /// Nothing to send (no writable fields survived filtering).
    Noop,
    Created(SaveResult),
    Updated(SaveResult),
}

/// Outcome of a bulk pull.
pub struct PullAllReport<R> {
    pub updated: Vec<R>,
    pub created: Vec<R>,
    pub deleted: Vec<R>,
}

impl<R> PullAllReport<R> {
    fn new() -> Self {
        PullAllReport {
            updated: Vec::new(),
            created: Vec::new(),
            deleted: Vec::new(),
        }
    }
}

/// Drives reconciliation for one model over a store and a connection.
pub struct Syncer<'a, S: SyncStore> {
    conn: &'a Connection,
    store: &'a S,
    opts: SerializeOptions,
}

impl<'a, S: SyncStore> Syncer<'a, S> {
    pub fn new(conn: &'a Connection, store: &'a S) -> Self {
        Syncer {
            conn,
            store,
            opts: SerializeOptions::default(),
        }
    }

    pub fn with_options(mut self, opts: SerializeOptions) -> Self {
        self.opts = opts;
        self
    }

    fn client(&self, record: &S::Rec) -> ObjectClient<'a> {
        ObjectClient::for_schema(self.conn, record.schema())
    }

    /// Send a record's current state to the remote side.
    ///
    /// A record with no remote id is created, seeding the custom key
    /// field when the schema declares one, and the returned remote id
    /// is stored; one with a remote id is upserted by its key. Either
    /// way the record is stamped synced on success.
    pub fn push(&self, record: &mut S::Rec, update_fields: Option<&[&str]>) -> Result<PushOutcome> {
        let mut fields = serialize(record, self.store, self.conn, &self.opts)?;
        if let Some(update_fields) = update_fields {
            fields = apply_update_fields(fields, update_fields);
        }
        if self.conn.is_offline() {
            return Ok(PushOutcome::Offline(fields));
        }
        if fields.is_empty() {
            return Ok(PushOutcome::Noop);
        }

        let client = self.client(record);
        match record.remote_id() {
            None => {
                let result = if record.schema().has_custom_remote_key() {
                    let key = record.remote_key_value()?;
                    client.create_with_custom_key(&fields, key.as_deref())?
                } else {
                    client.create(&fields)?
                };
                let Some(result) = result else {
                    return Ok(PushOutcome::Noop);
                };
                if result.id.is_some() {
                    record.set_remote_id(result.id.clone());
                }
                self.store.stamp_synced(record, Utc::now())?;
                if record.schema().pull_after_create() {
                    self.pull(record)?;
                }
                Ok(PushOutcome::Created(result))
            }
            Some(_) => {
                let Some(key) = record.remote_key_value()? else {
                    return Ok(PushOutcome::Noop);
                };
                let Some(result) = client.upsert(&key, &fields)? else {
                    return Ok(PushOutcome::Noop);
                };
                self.store.stamp_synced(record, Utc::now())?;
                let created = result.created == Some(true);
                Ok(if created {
                    PushOutcome::Created(result)
                } else {
                    PushOutcome::Updated(result)
                })
            }
        }
    }

    /// Refresh a record from the remote side.
    ///
    /// Returns `Ok(false)` when the remote record no longer exists;
    /// what to do with the orphan is the caller's decision.
    pub fn pull(&self, record: &mut S::Rec) -> Result<bool> {
        if self.conn.is_offline() {
            return Ok(true);
        }
        let Some(key) = record.remote_key_value()? else {
            return Err(Error::ImproperlyConfigured(
                "cannot pull a record that has no remote key".to_string(),
            ));
        };
        let payload = match self.client(record).get(&key) {
            Ok(payload) => payload,
            Err(e) if e.is_not_found() => return Ok(false),
            Err(e) => return Err(e),
        };
        self.absorb(record, &payload)?;
        Ok(true)
    }

    /// Pull every remote record of this model.
    ///
    /// `sql` overrides the schema-derived SOQL; a filtered pull never
    /// deletes local records, only the full unfiltered pull reconciles
    /// deletions. `update_fields` restricts which remote fields are
    /// written locally for existing records.
    pub fn pull_all(
        &self,
        sql: Option<&str>,
        update_fields: Option<&[&str]>,
        create_new: bool,
    ) -> Result<PullAllReport<S::Rec>> {
        let mut report = PullAllReport::new();
        if self.conn.is_offline() {
            report.updated = self.store.all()?;
            return Ok(report);
        }

        let schema = self.record_schema();
        let default_soql;
        let soql = match sql {
            Some(sql) => sql,
            None => {
                default_soql = schema.pull_all_soql();
                &default_soql
            }
        };
        let filtered = sql.is_some();

        let client = ObjectClient::for_schema(self.conn, &schema);
        let result = client.query_all(soql)?;
        tracing::info!(object = %client.object_name(), count = result.records.len(), "pull_all");

        // An empty result set reconciles nothing: a full fetch that
        // comes back empty (permissions, truncated visibility) must not
        // mark every local record stale.
        if result.records.is_empty() {
            return Ok(report);
        }

        let mut keep: Vec<i64> = Vec::new();
        for payload in &result.records {
            if is_soft_deleted(payload) {
                continue;
            }
            let Some(remote_id) = payload
                .get(DEFAULT_REMOTE_KEY_FIELD)
                .and_then(Value::as_str)
            else {
                tracing::warn!("remote row without an Id, skipping");
                continue;
            };
            match self.store.find_by_remote_id(remote_id)? {
                Some(mut record) => {
                    let payload = match update_fields {
                        Some(names) => apply_update_fields(payload.clone(), names),
                        None => payload.clone(),
                    };
                    self.absorb_pulled(&mut record, &payload, remote_id)?;
                    if let Some(id) = record.local_id() {
                        keep.push(id);
                    }
                    report.updated.push(record);
                }
                None if create_new => {
                    let mut record = self.store.new_record();
                    self.absorb_pulled(&mut record, payload, remote_id)?;
                    if let Some(id) = record.local_id() {
                        keep.push(id);
                    }
                    report.created.push(record);
                }
                None => {}
            }
        }

        if !filtered {
            report.deleted = self.store.delete_stale(&keep)?;
        }
        Ok(report)
    }

    /// Save locally, then push.
    pub fn save_and_push(&self, record: &mut S::Rec) -> Result<PushOutcome> {
        self.store.save(record)?;
        self.push(record, None)
    }

    /// Delete locally, then remotely. The remote record being already
    /// gone is not an error.
    pub fn delete_and_push(&self, record: S::Rec) -> Result<()> {
        let key = record.remote_key_value()?;
        let client = self.client(&record);
        self.store.delete_records(&[record])?;
        if let Some(key) = key {
            match client.delete(&key) {
                Ok(()) => {}
                Err(e) if e.is_not_found() => {}
                Err(e) => return Err(e),
            }
        }
        Ok(())
    }

    /// Delete many locally in one transaction, then bulk-delete the
    /// remote counterparts. `hard_delete` skips the recycle bin.
    pub fn delete_and_push_multiple(
        &self,
        records: Vec<S::Rec>,
        hard_delete: bool,
    ) -> Result<Option<Vec<BulkItemResult>>> {
        let Some(first) = records.first() else {
            return Ok(None);
        };
        let object_name = first.schema().object_name().to_string();
        let mut remote: Vec<FieldValues> = Vec::new();
        for record in &records {
            if let Some(id) = record.remote_id() {
                let mut row = FieldValues::new();
                row.insert(DEFAULT_REMOTE_KEY_FIELD.to_string(), Value::String(id));
                remote.push(row);
            }
        }
        self.store.delete_records(&records)?;
        let bulk = BulkClient::new(self.conn, object_name);
        if hard_delete {
            bulk.hard_delete(&remote)
        } else {
            bulk.delete(&remote)
        }
    }

    /// Apply the same field updates to many records locally, then push
    /// them in one bulk update keyed on `Id`. Update names are local
    /// leaf paths; records without a remote id are only updated
    /// locally.
    pub fn update_and_push_multiple(
        &self,
        records: &mut [S::Rec],
        updates: &[(&str, ScalarValue)],
    ) -> Result<Option<Vec<BulkItemResult>>> {
        let Some(first) = records.first() else {
            return Ok(None);
        };
        let schema = first.schema().clone();
        let separator = self.conn.separator().to_string();

        let mut wire_updates = FieldValues::new();
        for (leaf, value) in updates {
            let def = schema
                .fields()
                .iter()
                .find(|f| matches!(&f.path, FieldPath::Leaf(l) if l == leaf))
                .ok_or_else(|| {
                    Error::ImproperlyConfigured(format!("`{}` is not a mapped leaf field", leaf))
                })?;
            let wire = match def.kind {
                FieldKind::Scalar(kind) => kind.to_wire(value, &separator),
                FieldKind::Computed => {
                    return Err(Error::ImproperlyConfigured(format!(
                        "`{}` is computed and cannot be assigned",
                        leaf
                    )))
                }
            };
            wire_updates.insert(def.remote_name.clone(), wire);
        }

        let mut remote: Vec<FieldValues> = Vec::new();
        for record in records.iter_mut() {
            for (leaf, value) in updates {
                record.set(leaf, value.clone())?;
            }
            self.store.save(record)?;
            if let Some(id) = record.remote_id() {
                let mut row = wire_updates.clone();
                row.insert(DEFAULT_REMOTE_KEY_FIELD.to_string(), Value::String(id));
                remote.push(row);
            }
        }
        BulkClient::new(self.conn, schema.object_name().to_string()).update(&remote)
    }

    /// Deserialize, persist, and stamp one pulled payload.
    fn absorb_pulled(
        &self,
        record: &mut S::Rec,
        payload: &FieldValues,
        remote_id: &str,
    ) -> Result<()> {
        if record.remote_id().is_none() {
            record.set_remote_id(Some(remote_id.to_string()));
        }
        self.absorb(record, payload)
    }

    fn absorb(&self, record: &mut S::Rec, payload: &FieldValues) -> Result<()> {
        deserialize(payload, record, self.store, self.conn, &self.opts)?;
        if record.remote_id().is_none() {
            if let Some(id) = payload
                .get(DEFAULT_REMOTE_KEY_FIELD)
                .and_then(Value::as_str)
            {
                record.set_remote_id(Some(id.to_string()));
            }
        }
        self.store.save(record)?;
        // Stamped after the save so is_sync() holds.
        self.store.stamp_synced(record, Utc::now())
    }

    fn record_schema(&self) -> sfb_core::RecordSchema {
        self.store.new_record().schema().clone()
    }
}

/// Salesforce reports soft-deleted rows with a truthy `IsDeleted`.
fn is_soft_deleted(payload: &FieldValues) -> bool {
    match payload.get(SOFT_DELETE_FIELD) {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) => s.eq_ignore_ascii_case("true") || s == "1",
        _ => false,
    }
}
