//! JSON access helpers
//!
//! The IDL dialect has enough historical spellings that the parser walks
//! `serde_json::Value` trees by hand. These helpers centralize the
//! kind/key checks so every failure becomes a uniform `ParseError`.

use serde_json::{Map, Value};

use crate::errors::ParseError;

/// Human-readable kind of a JSON value, for error messages
pub fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Expect an object
pub fn as_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>, ParseError> {
    value.as_object().ok_or_else(|| ParseError::WrongKind {
        expected: "object",
        found: kind(value),
        context: context.to_string(),
    })
}

/// Expect an array
pub fn as_array<'a>(value: &'a Value, context: &str) -> Result<&'a Vec<Value>, ParseError> {
    value.as_array().ok_or_else(|| ParseError::WrongKind {
        expected: "array",
        found: kind(value),
        context: context.to_string(),
    })
}

/// Expect a string
pub fn as_str<'a>(value: &'a Value, context: &str) -> Result<&'a str, ParseError> {
    value.as_str().ok_or_else(|| ParseError::WrongKind {
        expected: "string",
        found: kind(value),
        context: context.to_string(),
    })
}

/// Expect an unsigned integer
pub fn as_u64(value: &Value, context: &str) -> Result<u64, ParseError> {
    value.as_u64().ok_or_else(|| ParseError::WrongKind {
        expected: "unsigned number",
        found: kind(value),
        context: context.to_string(),
    })
}

/// Expect an unsigned integer and narrow it to usize
pub fn as_usize(value: &Value, context: &str) -> Result<usize, ParseError> {
    Ok(as_u64(value, context)? as usize)
}

/// Expect a boolean
pub fn as_bool(value: &Value, context: &str) -> Result<bool, ParseError> {
    value.as_bool().ok_or_else(|| ParseError::WrongKind {
        expected: "bool",
        found: kind(value),
        context: context.to_string(),
    })
}

/// Fetch a required key from an object
pub fn key<'a>(
    map: &'a Map<String, Value>,
    key: &str,
    context: &str,
) -> Result<&'a Value, ParseError> {
    map.get(key).ok_or_else(|| ParseError::MissingKey {
        key: key.to_string(),
        context: context.to_string(),
    })
}

/// Fetch an optional key, treating JSON null as absent
pub fn key_opt<'a>(map: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    map.get(key).filter(|value| !value.is_null())
}

/// Fetch the first present key among several legacy spellings
pub fn key_any<'a>(map: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|name| key_opt(map, name))
}

/// Parse an array of JSON numbers into bytes
pub fn as_bytes(value: &Value, context: &str) -> Result<Vec<u8>, ParseError> {
    let array = as_array(value, context)?;
    let mut bytes = Vec::with_capacity(array.len());
    for item in array {
        bytes.push(as_u64(item, context)? as u8);
    }
    Ok(bytes)
}
