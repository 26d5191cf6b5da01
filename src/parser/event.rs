//! Event entry parsing

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::constants::discriminators::EVENT_DISCRIMINATOR_NAMESPACE;
use crate::errors::IdlError;
use crate::hydration;
use crate::models::event::IdlEvent;
use crate::models::type_flat::TypeFlat;
use crate::models::typedef::IdlTypedef;
use crate::parser::{parse_discriminator, parse_docs};
use crate::utils::json;

/// Parse one entry of the `events` section; the content type is the
/// typedef sharing the event's name
pub fn parse(value: &Value, typedefs: &BTreeMap<String, IdlTypedef>) -> Result<IdlEvent, IdlError> {
    let map = json::as_object(value, "event")?;
    let name = json::as_str(json::key(map, "name", "event")?, "event")?;
    let context = format!("event \"{}\"", name);

    let content_type_flat = TypeFlat::Defined {
        name: name.to_string(),
        generics: vec![],
    };
    let content_type_full = hydration::hydrate(&content_type_flat, &HashMap::new(), typedefs)?;

    Ok(IdlEvent {
        name: name.to_string(),
        docs: parse_docs(map),
        discriminator: parse_discriminator(map, EVENT_DISCRIMINATOR_NAMESPACE, name, &context)?,
        content_type_flat,
        content_type_full,
    })
}
