//! Per-object record schema: the static field map plus the `Record` seam.
//!
//! A [`RecordSchema`] declares which Salesforce object a local model
//! mirrors, how its local field paths map to remote field names, and
//! which field addresses records remotely. It replaces the original
//! layer's runtime attribute reflection with a closed description that
//! is validated once, when the schema is built.

use chrono::{DateTime, Utc};

use crate::error::{Error, Result};
use crate::path::FieldPath;
use crate::scalar::{ScalarKind, ScalarValue};

/// Salesforce's default primary-key field.
pub const DEFAULT_REMOTE_KEY_FIELD: &str = "Id";

/// The default local column holding the remote identifier.
pub const DEFAULT_LOCAL_KEY_FIELD: &str = "salesforce_id";

/// Soft-delete flag present on every Salesforce table.
pub const SOFT_DELETE_FIELD: &str = "IsDeleted";

/// How a mapped field is read and written locally.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Scalar(ScalarKind),
    /// A computed property: serialized from its getter, never written
    /// back on deserialize.
    Computed,
}

/// One entry of the field map.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub path: FieldPath,
    pub remote_name: String,
    pub kind: FieldKind,
    pub read_only: bool,
}

/// Static description of a synchronized model class.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordSchema {
    object_name: String,
    remote_key_field: String,
    local_key_field: String,
    pull_after_create: bool,
    fields: Vec<FieldDef>,
}

impl RecordSchema {
    pub fn builder(object_name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder {
            object_name: object_name.into(),
            remote_key_field: DEFAULT_REMOTE_KEY_FIELD.to_string(),
            local_key_field: DEFAULT_LOCAL_KEY_FIELD.to_string(),
            pull_after_create: false,
            fields: Vec::new(),
        }
    }

    pub fn object_name(&self) -> &str {
        &self.object_name
    }

    pub fn remote_key_field(&self) -> &str {
        &self.remote_key_field
    }

    pub fn local_key_field(&self) -> &str {
        &self.local_key_field
    }

    /// True when records are addressed by something other than `Id`.
    pub fn has_custom_remote_key(&self) -> bool {
        self.remote_key_field != DEFAULT_REMOTE_KEY_FIELD
    }

    /// True when the local key column is not `salesforce_id`.
    pub fn has_custom_local_key(&self) -> bool {
        self.local_key_field != DEFAULT_LOCAL_KEY_FIELD
    }

    pub fn pull_after_create(&self) -> bool {
        self.pull_after_create
    }

    pub fn fields(&self) -> &[FieldDef] {
        &self.fields
    }

    /// Look up a field definition by its remote name.
    pub fn field_for_remote(&self, remote_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.remote_name == remote_name)
    }

    /// Look up the remote name for a local path.
    pub fn remote_name_for(&self, local_path: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.path.to_string() == local_path)
            .map(|f| f.remote_name.as_str())
    }

    /// Build the full-table SOQL used by bulk pull: every mapped remote
    /// field, plus `Id` when unmapped, plus the soft-delete flag.
    pub fn pull_all_soql(&self) -> String {
        let mut columns: Vec<&str> = self.fields.iter().map(|f| f.remote_name.as_str()).collect();
        if !columns.contains(&DEFAULT_REMOTE_KEY_FIELD) {
            columns.push(DEFAULT_REMOTE_KEY_FIELD);
        }
        columns.push(SOFT_DELETE_FIELD);
        format!("SELECT {} FROM {}", columns.join(","), self.object_name)
    }
}

/// Builder for [`RecordSchema`]; duplicate paths and remote names are
/// rejected at `build` time.
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    object_name: String,
    remote_key_field: String,
    local_key_field: String,
    pull_after_create: bool,
    fields: Vec<(String, String, FieldKind, bool)>,
}

impl SchemaBuilder {
    /// Address records remotely by a custom external-id field.
    pub fn remote_key_field(mut self, field: impl Into<String>) -> Self {
        self.remote_key_field = field.into();
        self
    }

    /// Use a local field other than `salesforce_id` as the remote key value.
    pub fn local_key_field(mut self, field: impl Into<String>) -> Self {
        self.local_key_field = field.into();
        self
    }

    /// Re-pull the record after a successful remote create, picking up
    /// remote-computed fields.
    pub fn pull_after_create(mut self, yes: bool) -> Self {
        self.pull_after_create = yes;
        self
    }

    pub fn field(
        mut self,
        local_path: impl Into<String>,
        remote_name: impl Into<String>,
        kind: ScalarKind,
    ) -> Self {
        self.fields
            .push((local_path.into(), remote_name.into(), FieldKind::Scalar(kind), false));
        self
    }

    /// A remote-computed field: pulled in, never pushed out.
    pub fn read_only_field(
        mut self,
        local_path: impl Into<String>,
        remote_name: impl Into<String>,
        kind: ScalarKind,
    ) -> Self {
        self.fields
            .push((local_path.into(), remote_name.into(), FieldKind::Scalar(kind), true));
        self
    }

    /// A locally computed property: pushed out, never pulled in.
    pub fn computed(
        mut self,
        local_path: impl Into<String>,
        remote_name: impl Into<String>,
    ) -> Self {
        self.fields
            .push((local_path.into(), remote_name.into(), FieldKind::Computed, false));
        self
    }

    pub fn build(self) -> Result<RecordSchema> {
        let mut fields = Vec::with_capacity(self.fields.len());
        for (local, remote, kind, read_only) in self.fields {
            let path = FieldPath::parse(&local)?;
            if fields.iter().any(|f: &FieldDef| f.path == path) {
                return Err(Error::DuplicateField(local));
            }
            if fields.iter().any(|f: &FieldDef| f.remote_name == remote) {
                return Err(Error::DuplicateField(remote));
            }
            fields.push(FieldDef {
                path,
                remote_name: remote,
                kind,
                read_only,
            });
        }
        Ok(RecordSchema {
            object_name: self.object_name,
            remote_key_field: self.remote_key_field,
            local_key_field: self.local_key_field,
            pull_after_create: self.pull_after_create,
            fields,
        })
    }
}

/// A local record participating in sync.
///
/// Implemented by application models; the trait is object-safe so the
/// reconciliation layer never needs to know concrete model types.
pub trait Record {
    /// The static schema this record conforms to.
    fn schema(&self) -> &RecordSchema;

    /// Local primary key, if the record has been persisted.
    fn local_id(&self) -> Option<i64>;

    /// The remote identifier, if the record was ever pushed or pulled.
    fn remote_id(&self) -> Option<String>;

    fn set_remote_id(&mut self, id: Option<String>);

    fn sync_at(&self) -> Option<DateTime<Utc>>;

    fn set_sync_at(&mut self, at: Option<DateTime<Utc>>);

    /// Last local mutation time, refreshed on every save.
    fn modify_at(&self) -> DateTime<Utc>;

    /// Read a leaf field by name.
    fn get(&self, leaf: &str) -> Result<ScalarValue>;

    /// Write a leaf field by name.
    fn set(&mut self, leaf: &str, value: ScalarValue) -> Result<()>;

    /// A record is in sync iff it was synced at or after its last local
    /// mutation.
    fn is_sync(&self) -> bool {
        match self.sync_at() {
            Some(sync_at) => sync_at >= self.modify_at(),
            None => false,
        }
    }

    /// The value addressing this record remotely: `salesforce_id` by
    /// default, or the configured custom local key field.
    fn remote_key_value(&self) -> Result<Option<String>> {
        if self.schema().has_custom_local_key() {
            let leaf = self.schema().local_key_field().to_string();
            match self.get(&leaf)? {
                ScalarValue::Null => Ok(None),
                ScalarValue::Text(s) => Ok(Some(s)),
                other => Ok(Some(
                    crate::scalar::wire_raw(&other, crate::scalar::DEFAULT_MULTICHOICE_SEPARATOR)
                        .to_string(),
                )),
            }
        } else {
            Ok(self.remote_id())
        }
    }
}

#[cfg(test)]
#[path = "schema_tests.rs"]
mod tests;
