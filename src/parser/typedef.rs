//! Typedef entry parsing

use serde_json::Value;

use crate::errors::ParseError;
use crate::models::type_full::TypeRepr;
use crate::models::typedef::IdlTypedef;
use crate::parser::{parse_docs, type_flat};
use crate::utils::json;

/// Parse one entry of the `types` section
pub fn parse(value: &Value) -> Result<IdlTypedef, ParseError> {
    let map = json::as_object(value, "typedef")?;
    let name = json::as_str(json::key(map, "name", "typedef")?, "typedef")?;
    let context = format!("type \"{}\"", name);

    let mut generics = vec![];
    if let Some(entries) = json::key_opt(map, "generics") {
        for entry in json::as_array(entries, &context)? {
            // A parameter is a bare symbol or an object naming one
            let symbol = match entry {
                Value::String(symbol) => symbol.clone(),
                Value::Object(parameter) => {
                    json::as_str(json::key(parameter, "name", &context)?, &context)?.to_string()
                }
                other => {
                    return Err(ParseError::WrongKind {
                        expected: "string or object",
                        found: json::kind(other),
                        context: context.clone(),
                    });
                }
            };
            generics.push(symbol);
        }
    }

    let repr = json::key_opt(map, "repr").and_then(|value| match value {
        Value::String(name) => TypeRepr::from_name(name),
        Value::Object(repr) => json::key_opt(repr, "kind")
            .and_then(|kind| kind.as_str())
            .and_then(TypeRepr::from_name),
        _ => None,
    });

    Ok(IdlTypedef {
        name: name.to_string(),
        docs: parse_docs(map),
        generics,
        repr,
        content_type_flat: type_flat::parse(json::key(map, "type", &context)?, &context)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_typedef_with_generics_and_repr() {
        let typedef = parse(&json!({
            "name": "Slab",
            "repr": {"kind": "c"},
            "generics": [{"kind": "const", "name": "N", "type": "usize"}],
            "type": {"kind": "struct", "fields": [
                {"name": "entries", "type": {"array": ["u64", {"generic": "N"}]}}
            ]}
        }))
        .unwrap();
        assert_eq!(typedef.name, "Slab");
        assert_eq!(typedef.generics, vec!["N".to_string()]);
        assert_eq!(typedef.repr, Some(TypeRepr::C));
    }

    #[test]
    fn test_missing_type_key_fails() {
        let error = parse(&json!({"name": "Broken"})).unwrap_err();
        assert!(matches!(error, ParseError::MissingKey { key, .. } if key == "type"));
    }
}
