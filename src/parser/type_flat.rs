//! Type node parsing

use serde_json::{Map, Value};

use crate::errors::ParseError;
use crate::models::type_flat::{TypeFlat, TypeFlatEnumVariant, TypeFlatFieldNamed, TypeFlatFields};
use crate::models::type_prefix::TypePrefix;
use crate::models::type_primitive::TypePrimitive;
use crate::utils::json;

/// Parse one type node in any accepted spelling
pub fn parse(value: &Value, context: &str) -> Result<TypeFlat, ParseError> {
    match value {
        Value::String(name) => Ok(parse_name(name)),
        // Bare numbers are const literals (array lengths, const generics)
        Value::Number(_) => Ok(TypeFlat::Const {
            literal: json::as_u64(value, context)?,
        }),
        // A bare two-element array is the legacy [items, length] spelling
        Value::Array(items) if items.len() == 2 => parse_array_parts(&items[0], &items[1], context),
        Value::Object(map) => parse_object(map, context),
        other => Err(ParseError::WrongKind {
            expected: "type",
            found: json::kind(other),
            context: context.to_string(),
        }),
    }
}

fn parse_name(name: &str) -> TypeFlat {
    if let Some(primitive) = TypePrimitive::from_name(name) {
        return TypeFlat::primitive(primitive);
    }
    match name {
        "string" => TypeFlat::String {
            prefix: TypePrefix::U32,
        },
        "bytes" => TypeFlat::Vec {
            prefix: TypePrefix::U32,
            items: Box::new(TypeFlat::primitive(TypePrimitive::U8)),
        },
        // Anything else is a reference to a typedef
        _ => TypeFlat::Defined {
            name: name.to_string(),
            generics: vec![],
        },
    }
}

fn parse_object(map: &Map<String, Value>, context: &str) -> Result<TypeFlat, ParseError> {
    if let Some(defined) = json::key_opt(map, "defined") {
        return parse_defined(defined, context);
    }
    if let Some(symbol) = json::key_opt(map, "generic") {
        return Ok(TypeFlat::Generic {
            symbol: json::as_str(symbol, context)?.to_string(),
        });
    }
    if let Some(content) = json::key_opt(map, "option") {
        return Ok(TypeFlat::Option {
            prefix: parse_prefix(map, TypePrefix::U8, context)?,
            content: Box::new(parse(content, context)?),
        });
    }
    // The SPL c-option spelling carries a 4-byte flag
    if let Some(content) = json::key_opt(map, "coption") {
        return Ok(TypeFlat::Option {
            prefix: parse_prefix(map, TypePrefix::U32, context)?,
            content: Box::new(parse(content, context)?),
        });
    }
    if let Some(items) = json::key_opt(map, "vec") {
        return Ok(TypeFlat::Vec {
            prefix: parse_prefix(map, TypePrefix::U32, context)?,
            items: Box::new(parse(items, context)?),
        });
    }
    if let Some(array) = json::key_opt(map, "array") {
        let parts = json::as_array(array, context)?;
        if parts.len() != 2 {
            return Err(ParseError::UnsupportedType {
                context: context.to_string(),
                detail: format!("array with {} parts instead of [items, length]", parts.len()),
            });
        }
        return parse_array_parts(&parts[0], &parts[1], context);
    }
    if let Some(padded) = json::key_opt(map, "padded") {
        return parse_padded(padded, context);
    }
    if let Some(kind) = json::key_opt(map, "kind") {
        return match json::as_str(kind, context)? {
            "struct" => Ok(TypeFlat::Struct {
                fields: match json::key_opt(map, "fields") {
                    Some(fields) => parse_fields(fields, context)?,
                    None => TypeFlatFields::Nothing,
                },
            }),
            "enum" => parse_enum(map, context),
            other => Err(ParseError::UnsupportedType {
                context: context.to_string(),
                detail: format!("kind \"{}\"", other),
            }),
        };
    }
    Err(ParseError::UnsupportedType {
        context: context.to_string(),
        detail: format!(
            "object with keys [{}]",
            map.keys().cloned().collect::<Vec<_>>().join(", ")
        ),
    })
}

fn parse_defined(value: &Value, context: &str) -> Result<TypeFlat, ParseError> {
    match value {
        // Legacy: {"defined": "Name"}
        Value::String(name) => Ok(TypeFlat::Defined {
            name: name.clone(),
            generics: vec![],
        }),
        // Modern: {"defined": {"name": ..., "generics": [...]}}
        Value::Object(map) => {
            let name = json::as_str(json::key(map, "name", context)?, context)?;
            let mut generics = vec![];
            if let Some(entries) = json::key_opt(map, "generics") {
                for entry in json::as_array(entries, context)? {
                    generics.push(parse_generic_argument(entry, context)?);
                }
            }
            Ok(TypeFlat::Defined {
                name: name.to_string(),
                generics,
            })
        }
        other => Err(ParseError::WrongKind {
            expected: "string or object",
            found: json::kind(other),
            context: context.to_string(),
        }),
    }
}

/// A generic argument: a plain type, or a `{"kind": "type"|"const", ...}`
/// wrapper around one
fn parse_generic_argument(value: &Value, context: &str) -> Result<TypeFlat, ParseError> {
    if let Value::Object(map) = value {
        match json::key_opt(map, "kind").and_then(|kind| kind.as_str()) {
            Some("type") => return parse(json::key(map, "type", context)?, context),
            Some("const") => {
                let literal = json::key(map, "value", context)?;
                // Const values arrive as numbers or decimal strings
                let literal = match literal {
                    Value::String(text) => text.parse::<u64>().map_err(|_| {
                        ParseError::WrongKind {
                            expected: "decimal string",
                            found: "string",
                            context: context.to_string(),
                        }
                    })?,
                    other => json::as_u64(other, context)?,
                };
                return Ok(TypeFlat::Const { literal });
            }
            _ => {}
        }
    }
    parse(value, context)
}

fn parse_array_parts(items: &Value, length: &Value, context: &str) -> Result<TypeFlat, ParseError> {
    Ok(TypeFlat::Array {
        items: Box::new(parse(items, context)?),
        length: Box::new(parse(length, context)?),
    })
}

fn parse_padded(value: &Value, context: &str) -> Result<TypeFlat, ParseError> {
    let map = json::as_object(value, context)?;
    let amount = |keys: &[&str]| -> Result<usize, ParseError> {
        match json::key_any(map, keys) {
            Some(value) => json::as_usize(value, context),
            None => Ok(0),
        }
    };
    Ok(TypeFlat::Padded {
        before: amount(&["before"])?,
        min_size: amount(&["minSize", "min_size"])?,
        after: amount(&["after"])?,
        content: Box::new(parse(json::key(map, "type", context)?, context)?),
    })
}

fn parse_enum(map: &Map<String, Value>, context: &str) -> Result<TypeFlat, ParseError> {
    let mut variants = vec![];
    if let Some(entries) = json::key_opt(map, "variants") {
        for (index, entry) in json::as_array(entries, context)?.iter().enumerate() {
            let variant = json::as_object(entry, context)?;
            let name = json::as_str(json::key(variant, "name", context)?, context)?;
            // Tags default to the declaration index
            let code = match json::key_any(variant, &["code", "discriminant"]) {
                Some(code) => u128::from(json::as_u64(code, context)?),
                None => index as u128,
            };
            let fields = match json::key_opt(variant, "fields") {
                Some(fields) => parse_fields(fields, context)?,
                None => TypeFlatFields::Nothing,
            };
            variants.push(TypeFlatEnumVariant {
                name: name.to_string(),
                code,
                fields,
            });
        }
    }
    Ok(TypeFlat::Enum {
        prefix: parse_prefix(map, TypePrefix::U8, context)?,
        variants,
    })
}

/// Parse a field list: named (`{"name", "type"}` objects) or tuple
/// (plain types), decided by the first entry
pub fn parse_fields(value: &Value, context: &str) -> Result<TypeFlatFields, ParseError> {
    let entries = json::as_array(value, context)?;
    let Some(first) = entries.first() else {
        return Ok(TypeFlatFields::Nothing);
    };

    let named = matches!(first, Value::Object(map) if map.contains_key("name"));
    if named {
        let mut fields = Vec::with_capacity(entries.len());
        for entry in entries {
            let field = json::as_object(entry, context)?;
            let name = json::as_str(json::key(field, "name", context)?, context)?;
            fields.push(TypeFlatFieldNamed {
                name: name.to_string(),
                content: parse(json::key(field, "type", context)?, context)?,
            });
        }
        Ok(TypeFlatFields::Named(fields))
    } else {
        let mut fields = Vec::with_capacity(entries.len());
        for entry in entries {
            fields.push(parse(entry, context)?);
        }
        Ok(TypeFlatFields::Unnamed(fields))
    }
}

/// Optional `prefix` override on option/vec/enum nodes
fn parse_prefix(
    map: &Map<String, Value>,
    default: TypePrefix,
    context: &str,
) -> Result<TypePrefix, ParseError> {
    match json::key_opt(map, "prefix") {
        Some(value) => {
            let name = json::as_str(value, context)?;
            TypePrefix::from_name(name).ok_or_else(|| ParseError::UnsupportedType {
                context: context.to_string(),
                detail: format!("prefix \"{}\"", name),
            })
        }
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_primitive_and_defined_names() {
        assert_eq!(
            parse(&json!("u64"), "test").unwrap(),
            TypeFlat::primitive(TypePrimitive::U64)
        );
        assert_eq!(
            parse(&json!("publicKey"), "test").unwrap(),
            TypeFlat::primitive(TypePrimitive::Pubkey)
        );
        assert_eq!(
            parse(&json!("MyState"), "test").unwrap(),
            TypeFlat::Defined {
                name: "MyState".to_string(),
                generics: vec![]
            }
        );
    }

    #[test]
    fn test_defined_spellings_agree() {
        let legacy = parse(&json!({"defined": "Escrow"}), "test").unwrap();
        let modern = parse(&json!({"defined": {"name": "Escrow"}}), "test").unwrap();
        assert_eq!(legacy, modern);
    }

    #[test]
    fn test_defined_with_generics() {
        let parsed = parse(
            &json!({"defined": {"name": "Pair", "generics": [
                {"kind": "type", "type": "u32"},
                {"kind": "const", "value": "8"}
            ]}}),
            "test",
        )
        .unwrap();
        assert_eq!(
            parsed,
            TypeFlat::Defined {
                name: "Pair".to_string(),
                generics: vec![
                    TypeFlat::primitive(TypePrimitive::U32),
                    TypeFlat::Const { literal: 8 },
                ],
            }
        );
    }

    #[test]
    fn test_container_spellings() {
        assert_eq!(
            parse(&json!({"option": "u16"}), "test").unwrap(),
            TypeFlat::Option {
                prefix: TypePrefix::U8,
                content: Box::new(TypeFlat::primitive(TypePrimitive::U16)),
            }
        );
        assert_eq!(
            parse(&json!({"coption": "u64"}), "test").unwrap(),
            TypeFlat::Option {
                prefix: TypePrefix::U32,
                content: Box::new(TypeFlat::primitive(TypePrimitive::U64)),
            }
        );
        assert_eq!(
            parse(&json!({"vec": "u8", "prefix": "u16"}), "test").unwrap(),
            TypeFlat::Vec {
                prefix: TypePrefix::U16,
                items: Box::new(TypeFlat::primitive(TypePrimitive::U8)),
            }
        );
        // Object form and bare pair agree for arrays
        let object_form = parse(&json!({"array": ["u16", 4]}), "test").unwrap();
        let bare_form = parse(&json!(["u16", 4]), "test").unwrap();
        assert_eq!(object_form, bare_form);
    }

    #[test]
    fn test_struct_and_enum_parsing() {
        let parsed = parse(
            &json!({"kind": "struct", "fields": [
                {"name": "a", "type": "u8"},
                {"name": "b", "type": "string"}
            ]}),
            "test",
        )
        .unwrap();
        match parsed {
            TypeFlat::Struct {
                fields: TypeFlatFields::Named(fields),
            } => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[1].name, "b");
            }
            other => panic!("expected struct, got {:?}", other),
        }

        let parsed = parse(
            &json!({"kind": "enum", "variants": [
                {"name": "idle"},
                {"name": "busy", "code": 7, "fields": ["u32"]}
            ]}),
            "test",
        )
        .unwrap();
        match parsed {
            TypeFlat::Enum { variants, .. } => {
                assert_eq!(variants[0].code, 0);
                assert_eq!(variants[1].code, 7);
                assert!(matches!(variants[1].fields, TypeFlatFields::Unnamed(_)));
            }
            other => panic!("expected enum, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_forms_fail() {
        let error = parse(&json!({"mystery": 1}), "test").unwrap_err();
        assert!(matches!(error, ParseError::UnsupportedType { .. }));
        let error = parse(&json!(null), "test").unwrap_err();
        assert!(matches!(error, ParseError::WrongKind { .. }));
    }
}
