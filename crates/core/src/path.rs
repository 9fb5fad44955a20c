//! Typed local field paths.
//!
//! A field map key is either a plain field name (`"name"`) or one hop
//! through a relation (`"account.salesforce_id"`). Deeper traversal is
//! rejected when the schema is built, not at sync time.

use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

/// A local field path: a leaf field, or a leaf reached through exactly
/// one relation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldPath {
    Leaf(String),
    Related { relation: String, leaf: String },
}

impl FieldPath {
    /// Parse a dotted path. At most one dot is allowed.
    pub fn parse(s: &str) -> Result<Self> {
        let invalid = |reason: &str| Error::InvalidFieldPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = s.split('.');
        let first = segments.next().unwrap_or("");
        if first.is_empty() {
            return Err(invalid("empty field name"));
        }
        match segments.next() {
            None => Ok(FieldPath::Leaf(first.to_string())),
            Some(leaf) => {
                if leaf.is_empty() {
                    return Err(invalid("empty leaf segment"));
                }
                if segments.next().is_some() {
                    return Err(invalid("at most one relation hop is supported"));
                }
                Ok(FieldPath::Related {
                    relation: first.to_string(),
                    leaf: leaf.to_string(),
                })
            }
        }
    }

    /// The final field name the path resolves to.
    pub fn leaf(&self) -> &str {
        match self {
            FieldPath::Leaf(name) => name,
            FieldPath::Related { leaf, .. } => leaf,
        }
    }

    /// The relation traversed, if any.
    pub fn relation(&self) -> Option<&str> {
        match self {
            FieldPath::Leaf(_) => None,
            FieldPath::Related { relation, .. } => Some(relation),
        }
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldPath::Leaf(name) => write!(f, "{}", name),
            FieldPath::Related { relation, leaf } => write!(f, "{}.{}", relation, leaf),
        }
    }
}

impl FromStr for FieldPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        FieldPath::parse(s)
    }
}

#[cfg(test)]
#[path = "path_tests.rs"]
mod tests;
