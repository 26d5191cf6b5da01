//! IDL JSON parsing
//!
//! Walks IDL JSON into the flat model and hydrates every type at parse
//! time, so a successfully parsed program is fully resolved and ready
//! for codec/layout/resolver calls. The dialect accepts the modern IDL
//! spellings plus the common legacy ones (`isMut`/`writable`,
//! `publicKey`/`pubkey`, string or object `defined` forms, ...).

pub mod account;
pub mod event;
pub mod instruction;
pub mod program;
pub mod type_flat;
pub mod typedef;

use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::utils::hash;
use crate::utils::json;

/// Optional `docs` array of strings
pub(crate) fn parse_docs(map: &Map<String, Value>) -> Option<Vec<String>> {
    json::key_opt(map, "docs")
        .and_then(|value| value.as_array())
        .map(|items| {
            items
                .iter()
                .filter_map(|item| item.as_str().map(String::from))
                .collect()
        })
}

/// Explicit `discriminator` byte array, or the namespace default
pub(crate) fn parse_discriminator(
    map: &Map<String, Value>,
    namespace: &str,
    name: &str,
    context: &str,
) -> Result<Vec<u8>, ParseError> {
    match json::key_opt(map, "discriminator") {
        Some(value) => json::as_bytes(value, context),
        None => Ok(hash::discriminator(namespace, name).to_vec()),
    }
}
