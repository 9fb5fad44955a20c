//! Record → remote payload.

use serde_json::Value;

use sfb_core::{FieldKind, FieldPath, FieldValues, Record};

use crate::client::Connection;
use crate::error::{Error, Result};
use crate::store::SyncStore;

/// Error-tolerance knobs for serialization and deserialization.
///
/// The defaults are strict; the tolerant variants are for bulk paths
/// where one bad field should not sink a whole batch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SerializeOptions {
    /// Skip fields whose declared kind does not fit the value.
    pub skip_field_errors: bool,
    /// Skip fields whose value cannot be read or looked up.
    pub skip_data_errors: bool,
}

/// Build the remote payload for a record: every non-read-only mapped
/// field, keyed by remote name. An unset relation serializes its leaf
/// as `null` rather than omitting the field, so pushes clear remote
/// lookups that were cleared locally.
pub fn serialize<S: SyncStore>(
    record: &S::Rec,
    store: &S,
    conn: &Connection,
    opts: &SerializeOptions,
) -> Result<FieldValues> {
    let schema = record.schema();
    let separator = conn.separator();
    let mut payload = FieldValues::new();

    for def in schema.fields() {
        if def.read_only {
            continue;
        }
        let value = match (&def.path, def.kind) {
            (FieldPath::Leaf(leaf), FieldKind::Scalar(kind)) => match record.get(leaf) {
                Ok(v) => kind.to_wire(&v, separator),
                Err(e) if opts.skip_data_errors => {
                    tracing::warn!(field = %def.path, error = %e, "skipping unreadable field");
                    continue;
                }
                Err(e) => return Err(improper(&def.remote_name, &e)),
            },
            (FieldPath::Leaf(leaf), FieldKind::Computed) => match record.get(leaf) {
                Ok(v) => sfb_core::scalar::wire_raw(&v, separator),
                Err(e) if opts.skip_data_errors => {
                    tracing::warn!(field = %def.path, error = %e, "skipping unreadable property");
                    continue;
                }
                Err(e) => return Err(improper(&def.remote_name, &e)),
            },
            (FieldPath::Related { relation, leaf }, FieldKind::Scalar(kind)) => {
                match store.related_leaf_value(record, relation, leaf) {
                    Ok(Some(v)) => kind.to_wire(&v, separator),
                    Ok(None) => Value::Null,
                    Err(e) if opts.skip_data_errors => {
                        tracing::warn!(field = %def.path, error = %e, "skipping unresolvable relation");
                        continue;
                    }
                    Err(e) => return Err(improper(&def.remote_name, &e)),
                }
            }
            (FieldPath::Related { .. }, FieldKind::Computed) => {
                if opts.skip_field_errors {
                    continue;
                }
                return Err(Error::ImproperlyConfigured(format!(
                    "`{}` is a computed path through a relation; map the relation's own model instead",
                    def.path
                )));
            }
        };
        payload.insert(def.remote_name.clone(), value);
    }
    Ok(payload)
}

/// Restrict a payload to the named remote fields, for partial pushes.
pub fn apply_update_fields(mut fields: FieldValues, update_fields: &[&str]) -> FieldValues {
    fields.retain(|name, _| update_fields.contains(&name.as_str()));
    fields
}

fn improper(remote_name: &str, cause: &dyn std::fmt::Display) -> Error {
    Error::ImproperlyConfigured(format!("cannot serialize `{}`: {}", remote_name, cause))
}
