//! Instruction entry parsing
//!
//! Accounts may nest in groups; they are flattened here with dotted
//! names so the resolver and meta ordering see one linear list. Seed
//! blobs are resolved to their full types at parse time: constants are
//! pre-encoded, argument paths are walked through the args type, and
//! account paths through the referenced account's typedef.

use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use serde_json::{Map, Value};
use solana_pubkey::Pubkey;

use crate::codec;
use crate::constants::discriminators::INSTRUCTION_DISCRIMINATOR_NAMESPACE;
use crate::errors::{IdlError, ParseError};
use crate::hydration;
use crate::models::blob::{IdlInstructionAccountPda, IdlInstructionBlob};
use crate::models::instruction::{IdlInstruction, IdlInstructionAccount};
use crate::models::type_flat::TypeFlatFields;
use crate::models::type_full::TypeFullFields;
use crate::models::typedef::IdlTypedef;
use crate::parser::{parse_discriminator, parse_docs, type_flat};
use crate::utils::json;
use crate::utils::path::IdlPath;

/// Parse one entry of the `instructions` section
pub fn parse(
    value: &Value,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<IdlInstruction, IdlError> {
    let map = json::as_object(value, "instruction")?;
    let name = json::as_str(json::key(map, "name", "instruction")?, "instruction")?;
    let context = format!("instruction \"{}\"", name);

    let args_type_flat_fields = match json::key_opt(map, "args") {
        Some(args) => type_flat::parse_fields(args, &context)?,
        None => TypeFlatFields::Nothing,
    };
    let args_type_full_fields =
        hydration::hydrate_fields(&args_type_flat_fields, &HashMap::new(), typedefs)?;

    let return_type_flat = match json::key_opt(map, "returns") {
        Some(returns) => Some(type_flat::parse(returns, &context)?),
        None => None,
    };
    let return_type_full = match &return_type_flat {
        Some(flat) => Some(hydration::hydrate(flat, &HashMap::new(), typedefs)?),
        None => None,
    };

    let mut accounts = vec![];
    if let Some(entries) = json::key_opt(map, "accounts") {
        flatten_accounts(
            entries,
            "",
            &mut accounts,
            &args_type_full_fields,
            typedefs,
            &context,
        )?;
    }

    Ok(IdlInstruction {
        name: name.to_string(),
        docs: parse_docs(map),
        discriminator: parse_discriminator(
            map,
            INSTRUCTION_DISCRIMINATOR_NAMESPACE,
            name,
            &context,
        )?,
        accounts,
        args_type_flat_fields,
        args_type_full_fields,
        return_type_flat,
        return_type_full,
    })
}

fn flatten_accounts(
    value: &Value,
    prefix: &str,
    accounts: &mut Vec<IdlInstructionAccount>,
    args: &TypeFullFields,
    typedefs: &BTreeMap<String, IdlTypedef>,
    context: &str,
) -> Result<(), IdlError> {
    for entry in json::as_array(value, context)? {
        let map = json::as_object(entry, context)?;
        let name = json::as_str(json::key(map, "name", context)?, context)?;
        let full_name = if prefix.is_empty() {
            name.to_string()
        } else {
            format!("{}.{}", prefix, name)
        };

        // A group carries nested accounts instead of flags
        if let Some(nested) = json::key_opt(map, "accounts") {
            flatten_accounts(nested, &full_name, accounts, args, typedefs, context)?;
            continue;
        }

        let flag = |keys: &[&str]| -> Result<bool, ParseError> {
            match json::key_any(map, keys) {
                Some(value) => json::as_bool(value, context),
                None => Ok(false),
            }
        };

        let address = match json::key_opt(map, "address") {
            Some(value) => {
                let text = json::as_str(value, context)?;
                Some(
                    Pubkey::from_str(text).map_err(|_| ParseError::InvalidAddress {
                        value: text.to_string(),
                        context: context.to_string(),
                    })?,
                )
            }
            None => None,
        };

        let pda = match json::key_opt(map, "pda") {
            Some(value) => Some(parse_pda(value, args, typedefs, context)?),
            None => None,
        };

        accounts.push(IdlInstructionAccount {
            name: full_name,
            docs: parse_docs(map),
            writable: flag(&["writable", "isMut", "is_mut"])?,
            signer: flag(&["signer", "isSigner", "is_signer"])?,
            optional: flag(&["optional", "isOptional", "is_optional"])?,
            address,
            pda,
        });
    }
    Ok(())
}

fn parse_pda(
    value: &Value,
    args: &TypeFullFields,
    typedefs: &BTreeMap<String, IdlTypedef>,
    context: &str,
) -> Result<IdlInstructionAccountPda, IdlError> {
    let map = json::as_object(value, context)?;
    let mut seeds = vec![];
    for entry in json::as_array(json::key(map, "seeds", context)?, context)? {
        seeds.push(parse_blob(entry, args, typedefs, context)?);
    }
    let program = match json::key_opt(map, "program") {
        Some(entry) => Some(parse_blob(entry, args, typedefs, context)?),
        None => None,
    };
    Ok(IdlInstructionAccountPda { seeds, program })
}

fn parse_blob(
    value: &Value,
    args: &TypeFullFields,
    typedefs: &BTreeMap<String, IdlTypedef>,
    context: &str,
) -> Result<IdlInstructionBlob, IdlError> {
    // A bare byte array is a constant seed
    if value.is_array() {
        return Ok(IdlInstructionBlob::Const {
            bytes: json::as_bytes(value, context)?,
        });
    }
    let map = json::as_object(value, context)?;
    let kind = match json::key_opt(map, "kind") {
        Some(kind) => json::as_str(kind, context)?,
        // No kind but a value: constant shorthand
        None if map.contains_key("value") => "const",
        None => {
            return Err(ParseError::InvalidBlob {
                context: context.to_string(),
                detail: "seed without kind".to_string(),
            }
            .into());
        }
    };
    match kind {
        "const" => parse_const_blob(map, typedefs, context),
        "arg" => {
            let path = parse_path(map, context)?;
            let type_full =
                path.type_full_at_fields(args)
                    .ok_or_else(|| ParseError::InvalidPath {
                        path: path.to_string(),
                        context: context.to_string(),
                        detail: "not found in instruction args".to_string(),
                    })?;
            Ok(IdlInstructionBlob::Arg {
                path,
                type_full: type_full.clone(),
            })
        }
        "account" => {
            let path = parse_path(map, context)?;
            // The declared account typedef types multi-segment paths;
            // a bare account reference resolves to its address
            let content_type = match json::key_opt(map, "account") {
                Some(account) if path.len() > 1 => {
                    let type_name = json::as_str(account, context)?;
                    let hydrated = hydration::hydrate_typedef(type_name, typedefs)?;
                    let (_, field_path) = path.split_first().expect("multi-segment path");
                    let content = field_path.type_full_at(&hydrated).ok_or_else(|| {
                        ParseError::InvalidPath {
                            path: path.to_string(),
                            context: context.to_string(),
                            detail: format!("not found in account type \"{}\"", type_name),
                        }
                    })?;
                    Some(content.clone())
                }
                _ => None,
            };
            Ok(IdlInstructionBlob::Account { path, content_type })
        }
        other => Err(ParseError::InvalidBlob {
            context: context.to_string(),
            detail: format!("seed kind \"{}\"", other),
        }
        .into()),
    }
}

/// A constant seed: raw bytes, a UTF-8 string, or a typed value encoded
/// (unprefixed) at parse time
fn parse_const_blob(
    map: &Map<String, Value>,
    typedefs: &BTreeMap<String, IdlTypedef>,
    context: &str,
) -> Result<IdlInstructionBlob, IdlError> {
    let value = json::key(map, "value", context)?;
    let bytes = match json::key_opt(map, "type") {
        Some(type_value) => {
            let flat = type_flat::parse(type_value, context)?;
            let full = hydration::hydrate(&flat, &HashMap::new(), typedefs)?;
            let mut data = vec![];
            codec::serialize(&full, value, &mut data, false)?;
            data
        }
        None => match value {
            Value::Array(_) => json::as_bytes(value, context)?,
            Value::String(text) => text.as_bytes().to_vec(),
            other => {
                return Err(ParseError::InvalidBlob {
                    context: context.to_string(),
                    detail: format!("const seed value of kind {}", json::kind(other)),
                }
                .into());
            }
        },
    };
    Ok(IdlInstructionBlob::Const { bytes })
}

fn parse_path(map: &Map<String, Value>, context: &str) -> Result<IdlPath, ParseError> {
    let text = json::as_str(json::key(map, "path", context)?, context)?;
    Ok(IdlPath::parse(text))
}
