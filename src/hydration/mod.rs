//! Type hydration
//!
//! Hydration resolves a flat type tree into a full one: `defined` nodes
//! are expanded through the typedef registry and `generic` symbols are
//! substituted from the environment. The environment is a read-only
//! snapshot per call; a fresh one is built for each typedef expansion, so
//! a typedef's generics never leak into its caller.
//!
//! The recursion carries an explicit depth counter: a directly
//! self-referential typedef (a struct containing itself with no
//! indirection) would otherwise recurse until the stack overflows.

use std::collections::{BTreeMap, HashMap};

use crate::errors::HydrationError;
use crate::models::type_flat::{TypeFlat, TypeFlatFields};
use crate::models::type_full::{TypeFull, TypeFullEnumVariant, TypeFullFieldNamed, TypeFullFields};
use crate::models::typedef::IdlTypedef;

/// Nesting bound for hydration; deeper trees fail `TypeTooDeep`
pub const HYDRATION_DEPTH_LIMIT: usize = 64;

/// Resolve a flat type into a full one.
///
/// `generics_by_symbol` binds the generic symbols visible at this point;
/// top-level callers pass an empty map.
pub fn hydrate(
    type_flat: &TypeFlat,
    generics_by_symbol: &HashMap<String, TypeFull>,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<TypeFull, HydrationError> {
    hydrate_at(type_flat, generics_by_symbol, typedefs, 0)
}

/// Resolve a flat field set (instruction arguments) into a full one
pub fn hydrate_fields(
    fields: &TypeFlatFields,
    generics_by_symbol: &HashMap<String, TypeFull>,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<TypeFullFields, HydrationError> {
    hydrate_fields_at(fields, generics_by_symbol, typedefs, 0)
}

/// Convenience: resolve a typedef by name with no generic arguments
pub fn hydrate_typedef(
    name: &str,
    typedefs: &BTreeMap<String, IdlTypedef>,
) -> Result<TypeFull, HydrationError> {
    hydrate(
        &TypeFlat::Defined {
            name: name.to_string(),
            generics: vec![],
        },
        &HashMap::new(),
        typedefs,
    )
}

fn hydrate_at(
    type_flat: &TypeFlat,
    env: &HashMap<String, TypeFull>,
    typedefs: &BTreeMap<String, IdlTypedef>,
    depth: usize,
) -> Result<TypeFull, HydrationError> {
    if depth > HYDRATION_DEPTH_LIMIT {
        return Err(HydrationError::TypeTooDeep {
            depth: HYDRATION_DEPTH_LIMIT,
        });
    }
    match type_flat {
        TypeFlat::Defined { name, generics } => {
            let typedef = typedefs
                .get(name)
                .ok_or_else(|| HydrationError::UnknownTypedef { name: name.clone() })?;
            // Generic arguments hydrate under the caller's environment,
            // then seed a fresh environment for the typedef's own content
            let mut inner_env = HashMap::with_capacity(generics.len());
            for (symbol, generic) in typedef.generics.iter().zip(generics.iter()) {
                let resolved = hydrate_at(generic, env, typedefs, depth + 1)?;
                inner_env.insert(symbol.clone(), resolved);
            }
            let content = hydrate_at(&typedef.content_type_flat, &inner_env, typedefs, depth + 1)?;
            Ok(TypeFull::Typedef {
                name: name.clone(),
                repr: typedef.repr,
                content: Box::new(content),
            })
        }
        TypeFlat::Generic { symbol } => env
            .get(symbol)
            .cloned()
            .ok_or_else(|| HydrationError::UnresolvedGeneric {
                symbol: symbol.clone(),
            }),
        TypeFlat::Option { prefix, content } => Ok(TypeFull::Option {
            prefix: *prefix,
            content: Box::new(hydrate_at(content, env, typedefs, depth + 1)?),
        }),
        TypeFlat::Vec { prefix, items } => Ok(TypeFull::Vec {
            prefix: *prefix,
            items: Box::new(hydrate_at(items, env, typedefs, depth + 1)?),
        }),
        TypeFlat::Array { items, length } => {
            let items = hydrate_at(items, env, typedefs, depth + 1)?;
            let length = match hydrate_at(length, env, typedefs, depth + 1)? {
                TypeFull::Const { literal } => literal as usize,
                other => {
                    return Err(HydrationError::NonConstantArrayLength {
                        context: other.describe(),
                    });
                }
            };
            Ok(TypeFull::Array {
                items: Box::new(items),
                length,
            })
        }
        TypeFlat::String { prefix } => Ok(TypeFull::String { prefix: *prefix }),
        TypeFlat::Struct { fields } => Ok(TypeFull::Struct {
            fields: hydrate_fields_at(fields, env, typedefs, depth + 1)?,
        }),
        TypeFlat::Enum { prefix, variants } => {
            let mut full_variants = Vec::with_capacity(variants.len());
            for variant in variants {
                full_variants.push(TypeFullEnumVariant {
                    name: variant.name.clone(),
                    code: variant.code,
                    fields: hydrate_fields_at(&variant.fields, env, typedefs, depth + 1)?,
                });
            }
            Ok(TypeFull::enumeration(*prefix, full_variants))
        }
        TypeFlat::Padded {
            before,
            min_size,
            after,
            content,
        } => Ok(TypeFull::Padded {
            before: *before,
            min_size: *min_size,
            after: *after,
            content: Box::new(hydrate_at(content, env, typedefs, depth + 1)?),
        }),
        TypeFlat::Const { literal } => Ok(TypeFull::Const { literal: *literal }),
        TypeFlat::Primitive { primitive } => Ok(TypeFull::Primitive {
            primitive: *primitive,
        }),
    }
}

fn hydrate_fields_at(
    fields: &TypeFlatFields,
    env: &HashMap<String, TypeFull>,
    typedefs: &BTreeMap<String, IdlTypedef>,
    depth: usize,
) -> Result<TypeFullFields, HydrationError> {
    match fields {
        TypeFlatFields::Nothing => Ok(TypeFullFields::Nothing),
        TypeFlatFields::Named(named) => {
            let mut full = Vec::with_capacity(named.len());
            for field in named {
                full.push(TypeFullFieldNamed {
                    name: field.name.clone(),
                    content: hydrate_at(&field.content, env, typedefs, depth + 1)?,
                });
            }
            Ok(TypeFullFields::Named(full))
        }
        TypeFlatFields::Unnamed(unnamed) => {
            let mut full = Vec::with_capacity(unnamed.len());
            for content in unnamed {
                full.push(hydrate_at(content, env, typedefs, depth + 1)?);
            }
            Ok(TypeFullFields::Unnamed(full))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::type_flat::TypeFlatFieldNamed;
    use crate::models::type_primitive::TypePrimitive;

    fn registry(typedefs: Vec<IdlTypedef>) -> BTreeMap<String, IdlTypedef> {
        typedefs
            .into_iter()
            .map(|typedef| (typedef.name.clone(), typedef))
            .collect()
    }

    #[test]
    fn test_defined_expands_to_typedef_wrapper() {
        let typedefs = registry(vec![IdlTypedef {
            name: "Amount".to_string(),
            docs: None,
            generics: vec![],
            repr: None,
            content_type_flat: TypeFlat::primitive(TypePrimitive::U64),
        }]);
        let full = hydrate_typedef("Amount", &typedefs).unwrap();
        match full {
            TypeFull::Typedef { name, content, .. } => {
                assert_eq!(name, "Amount");
                assert_eq!(*content, TypeFull::primitive(TypePrimitive::U64));
            }
            other => panic!("expected typedef, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_typedef_fails() {
        let typedefs = BTreeMap::new();
        let error = hydrate_typedef("Missing", &typedefs).unwrap_err();
        assert!(matches!(error, HydrationError::UnknownTypedef { name } if name == "Missing"));
    }

    #[test]
    fn test_generic_substitution_uses_fresh_environment() {
        // Pair<T> { first: T, second: u8 } instantiated with T = u32
        let typedefs = registry(vec![IdlTypedef {
            name: "Pair".to_string(),
            docs: None,
            generics: vec!["T".to_string()],
            repr: None,
            content_type_flat: TypeFlat::Struct {
                fields: TypeFlatFields::Named(vec![
                    TypeFlatFieldNamed {
                        name: "first".to_string(),
                        content: TypeFlat::Generic {
                            symbol: "T".to_string(),
                        },
                    },
                    TypeFlatFieldNamed {
                        name: "second".to_string(),
                        content: TypeFlat::primitive(TypePrimitive::U8),
                    },
                ]),
            },
        }]);
        let flat = TypeFlat::Defined {
            name: "Pair".to_string(),
            generics: vec![TypeFlat::primitive(TypePrimitive::U32)],
        };
        let full = hydrate(&flat, &HashMap::new(), &typedefs).unwrap();
        match full.content() {
            TypeFull::Struct {
                fields: TypeFullFields::Named(fields),
            } => {
                assert_eq!(fields[0].content, TypeFull::primitive(TypePrimitive::U32));
                assert_eq!(fields[1].content, TypeFull::primitive(TypePrimitive::U8));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn test_array_length_from_generic_const() {
        // Buffer<N> = [u8; N] instantiated with N = 4
        let typedefs = registry(vec![IdlTypedef {
            name: "Buffer".to_string(),
            docs: None,
            generics: vec!["N".to_string()],
            repr: None,
            content_type_flat: TypeFlat::Array {
                items: Box::new(TypeFlat::primitive(TypePrimitive::U8)),
                length: Box::new(TypeFlat::Generic {
                    symbol: "N".to_string(),
                }),
            },
        }]);
        let flat = TypeFlat::Defined {
            name: "Buffer".to_string(),
            generics: vec![TypeFlat::Const { literal: 4 }],
        };
        let full = hydrate(&flat, &HashMap::new(), &typedefs).unwrap();
        match full.content() {
            TypeFull::Array { length, .. } => assert_eq!(*length, 4),
            other => panic!("expected array, got {:?}", other),
        }
    }

    #[test]
    fn test_non_constant_array_length_fails() {
        let flat = TypeFlat::Array {
            items: Box::new(TypeFlat::primitive(TypePrimitive::U8)),
            length: Box::new(TypeFlat::primitive(TypePrimitive::U32)),
        };
        let error = hydrate(&flat, &HashMap::new(), &BTreeMap::new()).unwrap_err();
        assert!(matches!(error, HydrationError::NonConstantArrayLength { .. }));
    }

    #[test]
    fn test_self_referential_typedef_fails_type_too_deep() {
        let typedefs = registry(vec![IdlTypedef {
            name: "Node".to_string(),
            docs: None,
            generics: vec![],
            repr: None,
            content_type_flat: TypeFlat::Struct {
                fields: TypeFlatFields::Named(vec![TypeFlatFieldNamed {
                    name: "next".to_string(),
                    content: TypeFlat::Defined {
                        name: "Node".to_string(),
                        generics: vec![],
                    },
                }]),
            },
        }]);
        let error = hydrate_typedef("Node", &typedefs).unwrap_err();
        assert!(matches!(error, HydrationError::TypeTooDeep { .. }));
    }
}
