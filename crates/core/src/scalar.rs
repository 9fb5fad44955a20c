//! Scalar type tags and wire conversion.
//!
//! Salesforce transfers every field as a JSON scalar, mostly strings.
//! Each local field declares a [`ScalarKind`]; the kind owns both
//! directions of the conversion, so serialize/deserialize never inspect
//! runtime types. Null propagates unchanged in both directions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

use crate::error::{Error, Result};

/// Wire format for datetime fields: UTC, second precision, trailing `Z`.
pub const DATETIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// Wire format for date fields.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Multi-select separator used where no configuration reaches the
/// conversion.
pub const DEFAULT_MULTICHOICE_SEPARATOR: &str = ";";

/// The closed set of scalar kinds a synchronized field may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Text,
    Integer,
    Float,
    Boolean,
    Decimal,
    Date,
    DateTime,
    /// Multi-select picklist, joined/split on a configurable separator.
    MultiChoice,
}

impl ScalarKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScalarKind::Text => "text",
            ScalarKind::Integer => "integer",
            ScalarKind::Float => "float",
            ScalarKind::Boolean => "boolean",
            ScalarKind::Decimal => "decimal",
            ScalarKind::Date => "date",
            ScalarKind::DateTime => "datetime",
            ScalarKind::MultiChoice => "multichoice",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ScalarKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "text" => Ok(ScalarKind::Text),
            "integer" => Ok(ScalarKind::Integer),
            "float" => Ok(ScalarKind::Float),
            "boolean" => Ok(ScalarKind::Boolean),
            "decimal" => Ok(ScalarKind::Decimal),
            "date" => Ok(ScalarKind::Date),
            "datetime" => Ok(ScalarKind::DateTime),
            "multichoice" => Ok(ScalarKind::MultiChoice),
            other => Err(Error::UnsupportedField {
                field: other.to_string(),
                kind: "scalar kind".to_string(),
            }),
        }
    }
}

/// A typed local field value.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    Decimal(Decimal),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    Multi(Vec<String>),
}

impl ScalarValue {
    pub fn is_null(&self) -> bool {
        matches!(self, ScalarValue::Null)
    }

    /// The value as text, if it carries one.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ScalarValue::Text(s) => Some(s),
            _ => None,
        }
    }
}

/// Best-effort conversion to a wire value with no kind information.
///
/// Used for computed fields and as the permissive fallback when a value's
/// shape does not match its declared kind: the value passes through
/// unchanged rather than raising. Multi values join on `separator`.
pub fn wire_raw(value: &ScalarValue, separator: &str) -> Value {
    match value {
        ScalarValue::Null => Value::Null,
        ScalarValue::Text(s) => Value::String(s.clone()),
        ScalarValue::Integer(i) => Value::Number((*i).into()),
        ScalarValue::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ScalarValue::Boolean(b) => Value::Bool(*b),
        // Decimal always travels as a string, including from computed fields.
        ScalarValue::Decimal(d) => Value::String(d.to_string()),
        ScalarValue::Date(d) => Value::String(d.format(DATE_FORMAT).to_string()),
        ScalarValue::DateTime(dt) => Value::String(dt.format(DATETIME_FORMAT).to_string()),
        ScalarValue::Multi(vs) => Value::String(vs.join(separator)),
    }
}

impl ScalarKind {
    /// Convert a local value to its remote wire form.
    ///
    /// Null passes through. A value whose shape does not match the
    /// declared kind is passed through unchanged (permissive default).
    pub fn to_wire(&self, value: &ScalarValue, separator: &str) -> Value {
        match (self, value) {
            (_, ScalarValue::Null) => Value::Null,
            (ScalarKind::Text, ScalarValue::Text(s)) => Value::String(s.clone()),
            (ScalarKind::Integer, ScalarValue::Integer(i)) => Value::Number((*i).into()),
            (ScalarKind::Float, ScalarValue::Float(f)) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            (ScalarKind::Boolean, ScalarValue::Boolean(b)) => Value::Bool(*b),
            (ScalarKind::Decimal, ScalarValue::Decimal(d)) => Value::String(d.to_string()),
            (ScalarKind::Date, ScalarValue::Date(d)) => {
                Value::String(d.format(DATE_FORMAT).to_string())
            }
            (ScalarKind::DateTime, ScalarValue::DateTime(dt)) => {
                Value::String(dt.format(DATETIME_FORMAT).to_string())
            }
            (ScalarKind::MultiChoice, ScalarValue::Multi(vs)) => {
                Value::String(vs.join(separator))
            }
            (_, other) => wire_raw(other, separator),
        }
    }

    /// Convert a remote wire value back to a local value.
    ///
    /// Null and the literal string `"None"` map to [`ScalarValue::Null`].
    /// Booleans accept case-insensitive `"true"`/`"1"` and `"false"`/`"0"`;
    /// anything else yields null. Unparsable date/datetime strings yield
    /// null. A decimal or number that cannot be parsed is an error.
    pub fn from_wire(&self, value: &Value, separator: &str) -> Result<ScalarValue> {
        if value.is_null() {
            return Ok(ScalarValue::Null);
        }
        if let Some(s) = value.as_str() {
            if s == "None" {
                return Ok(ScalarValue::Null);
            }
        }

        match self {
            ScalarKind::Text => match value {
                Value::String(s) => Ok(ScalarValue::Text(s.clone())),
                Value::Number(n) => Ok(ScalarValue::Text(n.to_string())),
                Value::Bool(b) => Ok(ScalarValue::Text(b.to_string())),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::Integer => match value {
                Value::Number(n) => n
                    .as_i64()
                    .map(ScalarValue::Integer)
                    .ok_or_else(|| mismatch(self, value)),
                Value::String(s) => s
                    .parse::<i64>()
                    .map(ScalarValue::Integer)
                    .map_err(|_| mismatch(self, value)),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::Float => match value {
                Value::Number(n) => n
                    .as_f64()
                    .map(ScalarValue::Float)
                    .ok_or_else(|| mismatch(self, value)),
                Value::String(s) => s
                    .parse::<f64>()
                    .map(ScalarValue::Float)
                    .map_err(|_| mismatch(self, value)),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::Boolean => match value {
                Value::Bool(b) => Ok(ScalarValue::Boolean(*b)),
                Value::String(s) => Ok(parse_wire_boolean(s)),
                Value::Number(n) => match n.as_i64() {
                    Some(0) => Ok(ScalarValue::Boolean(false)),
                    Some(1) => Ok(ScalarValue::Boolean(true)),
                    _ => Ok(ScalarValue::Null),
                },
                other => Err(mismatch(self, other)),
            },
            ScalarKind::Decimal => match value {
                Value::String(s) => Decimal::from_str(s)
                    .map(ScalarValue::Decimal)
                    .map_err(|_| mismatch(self, value)),
                Value::Number(n) => Decimal::from_str(&n.to_string())
                    .map(ScalarValue::Decimal)
                    .map_err(|_| mismatch(self, value)),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::Date => match value {
                Value::String(s) => Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)
                    .map(ScalarValue::Date)
                    .unwrap_or(ScalarValue::Null)),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::DateTime => match value {
                Value::String(s) => Ok(parse_wire_datetime(s)
                    .map(ScalarValue::DateTime)
                    .unwrap_or(ScalarValue::Null)),
                other => Err(mismatch(self, other)),
            },
            ScalarKind::MultiChoice => match value {
                Value::String(s) if s.is_empty() => Ok(ScalarValue::Multi(Vec::new())),
                Value::String(s) => Ok(ScalarValue::Multi(
                    s.split(separator).map(str::to_string).collect(),
                )),
                other => Err(mismatch(self, other)),
            },
        }
    }
}

/// Case-insensitive boolean parse: "true"/"1" and "false"/"0", else null.
fn parse_wire_boolean(s: &str) -> ScalarValue {
    match s.to_lowercase().as_str() {
        "true" | "1" => ScalarValue::Boolean(true),
        "false" | "0" => ScalarValue::Boolean(false),
        _ => ScalarValue::Null,
    }
}

/// Parse a wire datetime, accepting both the bridge's own second-precision
/// form and Salesforce's millisecond RFC 3339 form.
fn parse_wire_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    // Salesforce emits millisecond precision with a colon-less offset,
    // which RFC 3339 parsing rejects.
    if let Ok(dt) = DateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f%z") {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, DATETIME_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn mismatch(kind: &ScalarKind, value: &Value) -> Error {
    Error::TypeMismatch {
        kind: kind.to_string(),
        value: value.to_string(),
    }
}

#[cfg(test)]
#[path = "scalar_tests.rs"]
mod tests;
