//! Account entry parsing

use std::collections::{BTreeMap, HashMap};

use serde_json::Value;

use crate::constants::discriminators::ACCOUNT_DISCRIMINATOR_NAMESPACE;
use crate::errors::IdlError;
use crate::hydration;
use crate::models::account::{IdlAccount, IdlAccountBlob};
use crate::models::type_flat::TypeFlat;
use crate::models::typedef::IdlTypedef;
use crate::parser::{parse_discriminator, parse_docs};
use crate::utils::json;

/// Parse one entry of the `accounts` section.
///
/// The account's content type is the typedef sharing its name (inline
/// `type` declarations are registered there before this runs).
pub fn parse(
    value: &Value,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<IdlAccount, IdlError> {
    let map = json::as_object(value, "account")?;
    let name = json::as_str(json::key(map, "name", "account")?, "account")?;
    let context = format!("account \"{}\"", name);

    let mut blobs = vec![];
    if let Some(entries) = json::key_opt(map, "blobs") {
        for entry in json::as_array(entries, &context)? {
            let blob = json::as_object(entry, &context)?;
            blobs.push(IdlAccountBlob {
                offset: json::as_usize(json::key(blob, "offset", &context)?, &context)?,
                bytes: json::as_bytes(json::key(blob, "bytes", &context)?, &context)?,
            });
        }
    }

    let content_type_flat = TypeFlat::Defined {
        name: name.to_string(),
        generics: vec![],
    };
    let content_type_full = hydration::hydrate(&content_type_flat, &HashMap::new(), typedefs)?;

    Ok(IdlAccount {
        name: name.to_string(),
        docs: parse_docs(map),
        discriminator: parse_discriminator(map, ACCOUNT_DISCRIMINATOR_NAMESPACE, name, &context)?,
        blobs,
        content_type_flat,
        content_type_full,
    })
}
