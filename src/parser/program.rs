//! Whole-program parsing

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::errors::{IdlError, ParseError};
use crate::hydration;
use crate::models::program::{IdlConstant, IdlErrorCode, IdlMetadata, IdlProgram};
use crate::models::typedef::IdlTypedef;
use crate::parser::{account, event, instruction, type_flat, typedef};
use crate::utils::json;

/// Parse a complete IDL document into a fully hydrated program.
///
/// Runs in two phases: first the typedef registry is assembled (the
/// `types` section plus inline `type` declarations on accounts and
/// events), then every section is parsed and hydrated against it.
pub fn parse(value: &Value) -> Result<IdlProgram, IdlError> {
    let root = json::as_object(value, "program")?;

    let mut metadata: IdlMetadata = match root.get("metadata") {
        Some(value) => serde_json::from_value(value.clone()).unwrap_or_default(),
        None => IdlMetadata::default(),
    };
    // Legacy documents keep name/version at the top level
    if metadata.name.is_none() {
        metadata.name = json::key_opt(root, "name")
            .and_then(|value| value.as_str())
            .map(String::from);
    }
    if metadata.version.is_none() {
        metadata.version = json::key_opt(root, "version")
            .and_then(|value| value.as_str())
            .map(String::from);
    }

    let address_text = json::key_opt(root, "address")
        .or_else(|| {
            root.get("metadata")
                .and_then(|value| value.as_object())
                .and_then(|metadata| json::key_opt(metadata, "address"))
        })
        .and_then(|value| value.as_str());
    let address = match address_text {
        Some(text) => Some(Pubkey::from_str(text).map_err(|_| ParseError::InvalidAddress {
            value: text.to_string(),
            context: "program".to_string(),
        })?),
        None => None,
    };

    // Phase one: the typedef registry
    let mut typedefs = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "types") {
        for entry in json::as_array(entries, "types")? {
            let parsed = typedef::parse(entry)?;
            typedefs.insert(parsed.name.clone(), parsed);
        }
    }
    register_inline_types(root, "accounts", &mut typedefs)?;
    register_inline_types(root, "events", &mut typedefs)?;

    // Phase two: sections, hydrated against the complete registry
    let mut accounts = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "accounts") {
        for entry in json::as_array(entries, "accounts")? {
            let parsed = account::parse(entry, &typedefs)?;
            accounts.insert(parsed.name.clone(), parsed);
        }
    }

    let mut events = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "events") {
        for entry in json::as_array(entries, "events")? {
            let parsed = event::parse(entry, &typedefs)?;
            events.insert(parsed.name.clone(), parsed);
        }
    }

    let mut instructions = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "instructions") {
        for entry in json::as_array(entries, "instructions")? {
            let parsed = instruction::parse(entry, &typedefs)?;
            instructions.insert(parsed.name.clone(), parsed);
        }
    }

    let mut errors = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "errors") {
        for entry in json::as_array(entries, "errors")? {
            let parsed: IdlErrorCode =
                serde_json::from_value(entry.clone()).map_err(|error| {
                    ParseError::UnsupportedType {
                        context: "errors".to_string(),
                        detail: error.to_string(),
                    }
                })?;
            errors.insert(parsed.name.clone(), parsed);
        }
    }

    let mut constants = BTreeMap::new();
    if let Some(entries) = json::key_opt(root, "constants") {
        for entry in json::as_array(entries, "constants")? {
            let parsed = parse_constant(entry, &typedefs)?;
            constants.insert(parsed.name.clone(), parsed);
        }
    }

    Ok(IdlProgram {
        address,
        metadata,
        typedefs,
        accounts,
        instructions,
        events,
        errors,
        constants,
    })
}

/// Accounts and events may declare their content type inline; those
/// declarations join the registry under the entity's name
fn register_inline_types(
    root: &serde_json::Map<String, Value>,
    section: &str,
    typedefs: &mut BTreeMap<String, IdlTypedef>,
) -> Result<(), IdlError> {
    let Some(entries) = json::key_opt(root, section) else {
        return Ok(());
    };
    for entry in json::as_array(entries, section)? {
        let Some(map) = entry.as_object() else {
            continue;
        };
        let (Some(name), Some(type_value)) = (
            json::key_opt(map, "name").and_then(|value| value.as_str()),
            json::key_opt(map, "type"),
        ) else {
            continue;
        };
        if typedefs.contains_key(name) {
            continue;
        }
        let context = format!("{} \"{}\"", section, name);
        typedefs.insert(
            name.to_string(),
            IdlTypedef {
                name: name.to_string(),
                docs: None,
                generics: vec![],
                repr: None,
                content_type_flat: type_flat::parse(type_value, &context)?,
            },
        );
    }
    Ok(())
}

fn parse_constant(
    value: &Value,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<IdlConstant, IdlError> {
    let map = json::as_object(value, "constants")?;
    let name = json::as_str(json::key(map, "name", "constants")?, "constants")?;
    let context = format!("constant \"{}\"", name);

    let type_flat = type_flat::parse(json::key(map, "type", &context)?, &context)?;
    let type_full = hydration::hydrate(&type_flat, &HashMap::new(), typedefs)?;

    // Constant values arrive as JSON, or as a string holding JSON
    let raw = json::key(map, "value", &context)?;
    let value = match raw {
        Value::String(text) => serde_json::from_str(text).unwrap_or_else(|_| raw.clone()),
        other => other.clone(),
    };

    Ok(IdlConstant {
        name: name.to_string(),
        type_flat,
        type_full,
        value,
    })
}
