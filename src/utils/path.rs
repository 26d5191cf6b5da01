//! Dotted navigation paths
//!
//! Seed blobs locate values with dotted paths like `escrow.maker` or
//! `params.amounts.0`. The same path grammar navigates JSON values and
//! full type trees, so a located value can always be re-encoded with its
//! own type.

use std::fmt;

use serde_json::Value;

use crate::models::type_full::{TypeFull, TypeFullFields};

/// One step of a dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdlPathPart {
    /// Named lookup (object key, struct field)
    Key(String),
    /// Positional lookup (array element, tuple field)
    Index(usize),
}

impl fmt::Display for IdlPathPart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IdlPathPart::Key(key) => write!(f, "{}", key),
            IdlPathPart::Index(index) => write!(f, "{}", index),
        }
    }
}

/// A parsed dotted path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdlPath {
    parts: Vec<IdlPathPart>,
}

impl IdlPath {
    /// Parse a dotted path; purely numeric segments become indices
    pub fn parse(path: &str) -> Self {
        let parts = path
            .split('.')
            .filter(|segment| !segment.is_empty())
            .map(|segment| match segment.parse::<usize>() {
                Ok(index) => IdlPathPart::Index(index),
                Err(_) => IdlPathPart::Key(segment.to_string()),
            })
            .collect();
        Self { parts }
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// First segment as a name, if it is one
    pub fn first_key(&self) -> Option<&str> {
        match self.parts.first() {
            Some(IdlPathPart::Key(key)) => Some(key.as_str()),
            _ => None,
        }
    }

    /// Split off the first segment, returning it and the remainder
    pub fn split_first(&self) -> Option<(&IdlPathPart, IdlPath)> {
        let (first, rest) = self.parts.split_first()?;
        Some((
            first,
            IdlPath {
                parts: rest.to_vec(),
            },
        ))
    }

    /// Navigate a JSON value tree
    pub fn value_at<'a>(&self, value: &'a Value) -> Option<&'a Value> {
        let mut current = value;
        for part in &self.parts {
            current = match (part, current) {
                (IdlPathPart::Key(key), Value::Object(map)) => map.get(key)?,
                (IdlPathPart::Index(index), Value::Array(items)) => items.get(*index)?,
                // Objects keyed by digit strings still resolve by index parts
                (IdlPathPart::Index(index), Value::Object(map)) => map.get(&index.to_string())?,
                _ => return None,
            };
        }
        Some(current)
    }

    /// Navigate a full type tree to the sub-type a value at this path would have
    pub fn type_full_at<'a>(&self, type_full: &'a TypeFull) -> Option<&'a TypeFull> {
        let mut current = type_full;
        for part in &self.parts {
            current = step_type(current, part)?;
        }
        Some(strip_wrappers(current))
    }

    /// Navigate field sets (instruction args) to the sub-type at this path
    pub fn type_full_at_fields<'a>(&self, fields: &'a TypeFullFields) -> Option<&'a TypeFull> {
        let (first, rest) = self.split_first()?;
        let content = step_fields(fields, first)?;
        rest.type_full_at(content)
    }
}

impl fmt::Display for IdlPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .parts
            .iter()
            .map(|part| part.to_string())
            .collect::<Vec<_>>()
            .join(".");
        write!(f, "{}", rendered)
    }
}

/// Step through transparent wrappers that do not change the addressed value
fn strip_wrappers(type_full: &TypeFull) -> &TypeFull {
    match type_full {
        TypeFull::Typedef { content, .. } => strip_wrappers(content),
        TypeFull::Padded { content, .. } => strip_wrappers(content),
        other => other,
    }
}

fn step_type<'a>(type_full: &'a TypeFull, part: &IdlPathPart) -> Option<&'a TypeFull> {
    match strip_wrappers(type_full) {
        TypeFull::Struct { fields } => step_fields(fields, part),
        TypeFull::Array { items, .. } => match part {
            IdlPathPart::Index(_) => Some(items),
            IdlPathPart::Key(_) => None,
        },
        TypeFull::Vec { items, .. } => match part {
            IdlPathPart::Index(_) => Some(items),
            IdlPathPart::Key(_) => None,
        },
        _ => None,
    }
}

fn step_fields<'a>(fields: &'a TypeFullFields, part: &IdlPathPart) -> Option<&'a TypeFull> {
    match (fields, part) {
        (TypeFullFields::Named(fields), IdlPathPart::Key(key)) => fields
            .iter()
            .find(|field| field.name == *key)
            .map(|field| &field.content),
        (TypeFullFields::Unnamed(fields), IdlPathPart::Index(index)) => fields.get(*index),
        _ => None,
    }
}
