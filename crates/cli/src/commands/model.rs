//! `sfbridge model <object>`: generate a model skeleton from a
//! Salesforce object description.
//!
//! The output is a starting point, not finished code: a struct with
//! typed fields, constants for every picklist, and the schema builder
//! carrying the field map. Relations come out as `<relation>_id`
//! columns mapped through `<relation>.salesforce_id`.

use std::fmt::Write as _;
use std::path::Path;

use serde_json::Value;

use crate::client::{Connection, ObjectClient};
use crate::error::{Error, Result};

pub fn run(config: Option<&Path>, object: &str) -> Result<()> {
    let config = super::load_config(config)?;
    let conn = Connection::open(config)?;
    let describe = ObjectClient::new(&conn, object).describe()?;
    print!("{}", generate_model(&describe)?);
    Ok(())
}

/// Render the full skeleton from a describe document.
pub fn generate_model(describe: &Value) -> Result<String> {
    let object_name = describe
        .get("name")
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ImproperlyConfigured("describe has no `name`".to_string()))?;
    let label = describe
        .get("label")
        .and_then(Value::as_str)
        .unwrap_or(object_name);
    let fields = describe
        .get("fields")
        .and_then(Value::as_array)
        .ok_or_else(|| Error::ImproperlyConfigured("describe has no `fields`".to_string()))?;

    let struct_name = type_name(label);
    let mut constants = String::new();
    let mut members = String::new();
    let mut map_entries = String::new();

    for field in fields {
        let spec = FieldSpec::from_describe(field)?;
        match spec {
            FieldSpec::LocalId => {}
            FieldSpec::Relation { relation, remote } => {
                let _ = writeln!(members, "    pub {}_id: Option<i64>,", relation);
                let _ = writeln!(
                    map_entries,
                    "        .field(\"{}.salesforce_id\", \"{}\", ScalarKind::Text)",
                    relation, remote
                );
            }
            FieldSpec::Scalar {
                ident,
                remote,
                kind,
                rust_type,
            } => {
                let _ = writeln!(members, "    pub {}: {},", ident, rust_type);
                let _ = writeln!(
                    map_entries,
                    "        .field(\"{}\", \"{}\", ScalarKind::{})",
                    ident, remote, kind
                );
            }
        }
        append_picklist_constants(&mut constants, field);
    }

    let mut out = String::new();
    let _ = writeln!(out, "// Generated from the {} object description.", object_name);
    let _ = writeln!(out);
    if !constants.is_empty() {
        out.push_str(&constants);
        let _ = writeln!(out);
    }
    let _ = writeln!(out, "#[derive(Debug, Clone, Default)]");
    let _ = writeln!(out, "pub struct {} {{", struct_name);
    let _ = writeln!(out, "    pub id: Option<i64>,");
    out.push_str(&members);
    let _ = writeln!(out, "    pub salesforce_id: Option<String>,");
    let _ = writeln!(out, "    pub sync_at: Option<DateTime<Utc>>,");
    let _ = writeln!(out, "    pub modify_at: Option<DateTime<Utc>>,");
    let _ = writeln!(out, "}}");
    let _ = writeln!(out);
    let _ = writeln!(
        out,
        "pub fn {}_schema() -> RecordSchema {{",
        field_ident(object_name)
    );
    let _ = writeln!(out, "    RecordSchema::builder(\"{}\")", object_name);
    out.push_str(&map_entries);
    let _ = writeln!(out, "        .build()");
    let _ = writeln!(out, "        .expect(\"static field map\")");
    let _ = writeln!(out, "}}");
    Ok(out)
}

enum FieldSpec {
    /// The remote `Id` field; locally the auto primary key.
    LocalId,
    Relation {
        relation: String,
        remote: String,
    },
    Scalar {
        ident: String,
        remote: String,
        kind: &'static str,
        rust_type: &'static str,
    },
}

impl FieldSpec {
    fn from_describe(field: &Value) -> Result<FieldSpec> {
        let name = field
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::ImproperlyConfigured("field has no `name`".to_string()))?;
        let field_type = field.get("type").and_then(Value::as_str).unwrap_or("");
        let soap_type = field.get("soapType").and_then(Value::as_str).unwrap_or("");

        let scalar = |kind, rust_type| {
            Ok(FieldSpec::Scalar {
                ident: field_ident(name),
                remote: name.to_string(),
                kind,
                rust_type,
            })
        };

        match field_type {
            "id" if soap_type == "tns:ID" => Ok(FieldSpec::LocalId),
            "reference" if soap_type == "tns:ID" => {
                let ident = field_ident(name);
                let relation = ident.strip_suffix("_id").unwrap_or(&ident).to_string();
                Ok(FieldSpec::Relation {
                    relation,
                    remote: name.to_string(),
                })
            }
            "string" | "textarea" | "url" | "picklist" | "phone" | "email" => {
                scalar("Text", "Option<String>")
            }
            "multipicklist" => scalar("MultiChoice", "Vec<String>"),
            "datetime" => scalar("DateTime", "Option<DateTime<Utc>>"),
            "date" => scalar("Date", "Option<NaiveDate>"),
            "percent" | "currency" => scalar("Decimal", "Option<Decimal>"),
            "double" => {
                if field.get("scale").and_then(Value::as_i64) == Some(0) {
                    scalar("Integer", "Option<i64>")
                } else {
                    scalar("Decimal", "Option<Decimal>")
                }
            }
            "int" => scalar("Integer", "Option<i64>"),
            // A remote default makes the field non-nullable.
            "boolean" => match field.get("defaultValue") {
                Some(Value::Bool(_)) => scalar("Boolean", "bool"),
                _ => scalar("Boolean", "Option<bool>"),
            },
            other => Err(Error::ImproperlyConfigured(format!(
                "Salesforce field type `{}` not covered yet (field `{}`)",
                other, name
            ))),
        }
    }
}

fn append_picklist_constants(out: &mut String, field: &Value) {
    if field.get("type").and_then(Value::as_str) != Some("picklist") {
        return;
    }
    let Some(values) = field.get("picklistValues").and_then(Value::as_array) else {
        return;
    };
    if values.is_empty() {
        return;
    }
    let field_label = field
        .get("label")
        .or_else(|| field.get("name"))
        .and_then(Value::as_str)
        .unwrap_or("FIELD");

    let mut names = Vec::new();
    for choice in values {
        let Some(value) = choice.get("value").and_then(Value::as_str) else {
            continue;
        };
        let label = choice.get("label").and_then(Value::as_str).unwrap_or(value);
        let name = const_name(label);
        let _ = writeln!(out, "pub const {}: &str = \"{}\";", name, value);
        names.push(name);
    }
    let _ = writeln!(
        out,
        "pub const {}_CHOICES: &[&str] = &[{}];",
        const_name(field_label),
        names.join(", ")
    );
}

/// Sanitize a label into an identifier: separators become underscores,
/// and a leading digit gets a `var_` prefix.
fn sanitize(label: &str) -> String {
    let mut out: String = label
        .chars()
        .map(|c| match c {
            ' ' | '/' | '\\' | '.' | '-' | '(' => '_',
            other => other,
        })
        .filter(|c| *c != ')')
        .collect();
    if out.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        out = format!("var_{}", out);
    }
    out
}

fn type_name(label: &str) -> String {
    sanitize(label)
}

fn const_name(label: &str) -> String {
    sanitize(label).to_uppercase()
}

/// Derive the local column name from a remote field name:
/// `AccountNumber` → `account_number`. All-uppercase names (acronyms)
/// are lowercased whole.
pub(crate) fn field_ident(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    if chars.len() <= 2 || chars.iter().all(|c| !c.is_alphabetic() || c.is_uppercase()) {
        return name.to_lowercase();
    }
    let mut out = String::new();
    for (i, c) in chars.iter().enumerate() {
        if c.is_alphabetic() && c.is_uppercase() && i > 0 && chars[i - 1] != '_' {
            out.push('_');
        }
        out.push(*c);
    }
    out.to_lowercase()
}

#[cfg(test)]
#[path = "model_tests.rs"]
mod tests;
