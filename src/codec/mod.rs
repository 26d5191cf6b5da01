//! Binary codec
//!
//! Serializes and deserializes JSON values against full types, producing
//! the exact little-endian wire bytes the on-chain program expects.
//! `prefixed = false` drops vec/string length prefixes, which is how PDA
//! seed bytes are produced. Every recursive step wraps failures with a
//! breadcrumb segment so errors point into the value tree.

mod deserialize;
mod serialize;
mod values;

pub use deserialize::{deserialize, deserialize_fields};
pub use serialize::{serialize, serialize_fields};

#[cfg(test)]
mod tests {
    use serde_json::{json, Value};

    use super::*;
    use crate::errors::CodecErrorKind;
    use crate::models::type_full::{TypeFull, TypeFullEnumVariant, TypeFullFieldNamed, TypeFullFields};
    use crate::models::type_prefix::TypePrefix;
    use crate::models::type_primitive::TypePrimitive;

    fn encode(type_full: &TypeFull, value: &Value) -> Vec<u8> {
        let mut data = Vec::new();
        serialize(type_full, value, &mut data, true).unwrap();
        data
    }

    fn round_trip(type_full: &TypeFull, value: &Value) {
        let data = encode(type_full, value);
        let (consumed, decoded) = deserialize(type_full, &data, 0).unwrap();
        assert_eq!(consumed, data.len(), "consumed length mismatch");
        assert_eq!(&decoded, value, "round trip mismatch");
    }

    fn struct_u16_string() -> TypeFull {
        TypeFull::Struct {
            fields: TypeFullFields::Named(vec![
                TypeFullFieldNamed {
                    name: "a".to_string(),
                    content: TypeFull::primitive(TypePrimitive::U16),
                },
                TypeFullFieldNamed {
                    name: "b".to_string(),
                    content: TypeFull::String {
                        prefix: TypePrefix::U32,
                    },
                },
            ]),
        }
    }

    #[test]
    fn test_struct_with_string_exact_bytes() {
        let type_full = struct_u16_string();
        let value = json!({"a": 300, "b": "hi"});
        let data = encode(&type_full, &value);
        assert_eq!(
            data,
            vec![0x2C, 0x01, 0x02, 0x00, 0x00, 0x00, 0x68, 0x69]
        );
        let (consumed, decoded) = deserialize(&type_full, &data, 0).unwrap();
        assert_eq!(consumed, 8);
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_primitive_round_trips() {
        round_trip(&TypeFull::primitive(TypePrimitive::U8), &json!(255));
        round_trip(&TypeFull::primitive(TypePrimitive::I32), &json!(-77));
        round_trip(&TypeFull::primitive(TypePrimitive::U64), &json!(1u64 << 53));
        round_trip(&TypeFull::primitive(TypePrimitive::F64), &json!(1.5));
        round_trip(&TypeFull::primitive(TypePrimitive::Bool), &json!(true));
        round_trip(
            &TypeFull::primitive(TypePrimitive::Pubkey),
            &json!("11111111111111111111111111111111"),
        );
    }

    #[test]
    fn test_u128_beyond_u64_decodes_to_string() {
        let type_full = TypeFull::primitive(TypePrimitive::U128);
        let value = json!("340282366920938463463374607431768211455");
        let data = encode(&type_full, &value);
        assert_eq!(data, vec![0xFF; 16]);
        let (consumed, decoded) = deserialize(&type_full, &data, 0).unwrap();
        assert_eq!(consumed, 16);
        assert_eq!(decoded, value);
    }

    #[test]
    fn test_vec_of_u8_accepts_blob_forms() {
        let type_full = TypeFull::Vec {
            prefix: TypePrefix::U32,
            items: Box::new(TypeFull::primitive(TypePrimitive::U8)),
        };
        // All three forms produce the same bytes for "hi"
        let from_array = encode(&type_full, &json!([104, 105]));
        let from_string = encode(&type_full, &json!("hi"));
        let from_tagged = encode(&type_full, &json!({"base16": "6869"}));
        assert_eq!(from_array, vec![2, 0, 0, 0, 104, 105]);
        assert_eq!(from_array, from_string);
        assert_eq!(from_array, from_tagged);
    }

    #[test]
    fn test_option_round_trips() {
        let type_full = TypeFull::Option {
            prefix: TypePrefix::U8,
            content: Box::new(TypeFull::primitive(TypePrimitive::U16)),
        };
        round_trip(&type_full, &Value::Null);
        round_trip(&type_full, &json!(512));
        assert_eq!(encode(&type_full, &Value::Null), vec![0]);
        assert_eq!(encode(&type_full, &json!(512)), vec![1, 0, 2]);
    }

    #[test]
    fn test_enum_three_forms_encode_identically() {
        let type_full = TypeFull::enumeration(
            TypePrefix::U8,
            vec![
                TypeFullEnumVariant {
                    name: "idle".to_string(),
                    code: 0,
                    fields: TypeFullFields::Nothing,
                },
                TypeFullEnumVariant {
                    name: "running".to_string(),
                    code: 1,
                    fields: TypeFullFields::Nothing,
                },
            ],
        );
        let from_code = encode(&type_full, &json!(1));
        let from_name = encode(&type_full, &json!("running"));
        let from_object = encode(&type_full, &json!({"running": null}));
        assert_eq!(from_code, vec![1]);
        assert_eq!(from_code, from_name);
        assert_eq!(from_code, from_object);
        // Tag-only variants decode to the bare name
        let (consumed, decoded) = deserialize(&type_full, &from_code, 0).unwrap();
        assert_eq!((consumed, decoded), (1, json!("running")));
    }

    #[test]
    fn test_enum_with_payload_round_trips() {
        let type_full = TypeFull::enumeration(
            TypePrefix::U8,
            vec![
                TypeFullEnumVariant {
                    name: "none".to_string(),
                    code: 0,
                    fields: TypeFullFields::Nothing,
                },
                TypeFullEnumVariant {
                    name: "transfer".to_string(),
                    code: 1,
                    fields: TypeFullFields::Named(vec![TypeFullFieldNamed {
                        name: "amount".to_string(),
                        content: TypeFull::primitive(TypePrimitive::U64),
                    }]),
                },
            ],
        );
        round_trip(&type_full, &json!({"transfer": {"amount": 42}}));
    }

    #[test]
    fn test_enum_unknown_variant_fails() {
        let type_full = TypeFull::enumeration(
            TypePrefix::U8,
            vec![TypeFullEnumVariant {
                name: "only".to_string(),
                code: 0,
                fields: TypeFullFields::Nothing,
            }],
        );
        let mut data = Vec::new();
        let error = serialize(&type_full, &json!("other"), &mut data, true).unwrap_err();
        assert!(matches!(
            error.kind,
            CodecErrorKind::UnknownVariant { .. }
        ));
    }

    #[test]
    fn test_array_length_mismatch_fails() {
        let type_full = TypeFull::Array {
            items: Box::new(TypeFull::primitive(TypePrimitive::U16)),
            length: 3,
        };
        let mut data = Vec::new();
        let error = serialize(&type_full, &json!([1, 2]), &mut data, true).unwrap_err();
        assert!(matches!(
            error.kind,
            CodecErrorKind::LengthMismatch {
                expected: 3,
                found: 2
            }
        ));
    }

    #[test]
    fn test_padded_zero_fills_and_consumes_exactly() {
        let type_full = TypeFull::Padded {
            before: 1,
            min_size: 4,
            after: 2,
            content: Box::new(TypeFull::primitive(TypePrimitive::U8)),
        };
        let data = encode(&type_full, &json!(7));
        assert_eq!(data, vec![0, 7, 0, 0, 0, 0, 0]);
        let (consumed, decoded) = deserialize(&type_full, &data, 0).unwrap();
        assert_eq!(consumed, 7);
        assert_eq!(decoded, json!(7));
    }

    #[test]
    fn test_unprefixed_serialization_drops_lengths() {
        let type_full = struct_u16_string();
        let mut data = Vec::new();
        serialize(&type_full, &json!({"a": 300, "b": "hi"}), &mut data, false).unwrap();
        assert_eq!(data, vec![0x2C, 0x01, 0x68, 0x69]);
    }

    #[test]
    fn test_buffer_underrun_carries_offset() {
        let type_full = TypeFull::primitive(TypePrimitive::U64);
        let error = deserialize(&type_full, &[1, 2, 3], 0).unwrap_err();
        match error.kind {
            CodecErrorKind::BufferUnderrun {
                offset,
                needed,
                available,
            } => {
                assert_eq!((offset, needed, available), (0, 8, 3));
            }
            other => panic!("expected underrun, got {:?}", other),
        }
    }

    #[test]
    fn test_breadcrumbs_point_into_nested_values() {
        let type_full = TypeFull::Struct {
            fields: TypeFullFields::Named(vec![TypeFullFieldNamed {
                name: "items".to_string(),
                content: TypeFull::Vec {
                    prefix: TypePrefix::U32,
                    items: Box::new(TypeFull::primitive(TypePrimitive::U16)),
                },
            }]),
        };
        let mut data = Vec::new();
        let error = serialize(
            &type_full,
            &json!({"items": [1, "bad", 3]}),
            &mut data,
            true,
        )
        .unwrap_err();
        assert!(error.to_string().contains("`items.1`"), "{}", error);
    }

    #[test]
    fn test_nested_struct_round_trip() {
        let inner = TypeFull::Struct {
            fields: TypeFullFields::Unnamed(vec![
                TypeFull::primitive(TypePrimitive::U8),
                TypeFull::String {
                    prefix: TypePrefix::U32,
                },
            ]),
        };
        let type_full = TypeFull::Struct {
            fields: TypeFullFields::Named(vec![
                TypeFullFieldNamed {
                    name: "pair".to_string(),
                    content: inner,
                },
                TypeFullFieldNamed {
                    name: "flags".to_string(),
                    content: TypeFull::Array {
                        items: Box::new(TypeFull::primitive(TypePrimitive::Bool)),
                        length: 2,
                    },
                },
            ]),
        };
        round_trip(
            &type_full,
            &json!({"pair": [9, "ok"], "flags": [true, false]}),
        );
    }
}
