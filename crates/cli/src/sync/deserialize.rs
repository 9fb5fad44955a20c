//! Remote payload → record.

use serde_json::Value;

use sfb_core::schema::DEFAULT_LOCAL_KEY_FIELD;
use sfb_core::{FieldKind, FieldPath, FieldValues, Record, ScalarValue};

use crate::client::Connection;
use crate::error::{Error, Result};
use crate::store::SyncStore;

use super::serialize::SerializeOptions;

/// Write a remote payload into a record through its schema.
///
/// Remote fields with no mapping are skipped, as are computed paths
/// (they only ever flow outward). A relation mapped through the related
/// model's `salesforce_id` is resolved to a local foreign key; when the
/// related record does not exist locally the store may construct it
/// from the remote side, and if that also fails the relation is left
/// unset.
pub fn deserialize<S: SyncStore>(
    payload: &FieldValues,
    record: &mut S::Rec,
    store: &S,
    conn: &Connection,
    opts: &SerializeOptions,
) -> Result<()> {
    let schema = record.schema().clone();
    let separator = conn.separator().to_string();

    for (remote_name, value) in payload {
        let Some(def) = schema.field_for_remote(remote_name) else {
            continue;
        };
        let FieldKind::Scalar(kind) = def.kind else {
            continue;
        };
        match &def.path {
            FieldPath::Leaf(leaf) => {
                let scalar = match kind.from_wire(value, &separator) {
                    Ok(v) => v,
                    Err(e) if opts.skip_field_errors => {
                        tracing::warn!(field = %def.path, error = %e, "skipping unconvertible value");
                        continue;
                    }
                    Err(e) => return Err(e.into()),
                };
                record.set(leaf, scalar)?;
            }
            FieldPath::Related { relation, leaf } if leaf == DEFAULT_LOCAL_KEY_FIELD => {
                apply_relation(record, store, conn, relation, value)?;
            }
            FieldPath::Related { .. } => {
                if opts.skip_data_errors {
                    continue;
                }
                return Err(Error::ImproperlyConfigured(format!(
                    "cannot deserialize into `{}`: only `<relation>.{}` paths are writable",
                    def.path, DEFAULT_LOCAL_KEY_FIELD
                )));
            }
        }
    }
    Ok(())
}

fn apply_relation<S: SyncStore>(
    record: &mut S::Rec,
    store: &S,
    conn: &Connection,
    relation: &str,
    value: &Value,
) -> Result<()> {
    let Some(remote_id) = value.as_str() else {
        // Remote lookup cleared (or never set): clear it locally too.
        return store.set_relation(record, relation, ScalarValue::Null);
    };
    let resolved = match store.find_relation_by_remote_id(relation, remote_id)? {
        Some(v) => Some(v),
        None => store.create_relation_from_remote(conn, relation, remote_id)?,
    };
    match resolved {
        Some(v) => store.set_relation(record, relation, v),
        None => {
            tracing::warn!(relation, remote_id, "related record unavailable, leaving relation unset");
            Ok(())
        }
    }
}
