//! JSON -> bytes

use serde_json::Value;

use crate::codec::values;
use crate::errors::{CodecError, CodecErrorKind, CodecResultExt};
use crate::models::type_full::{TypeFull, TypeFullFields};
use crate::models::type_primitive::TypePrimitive;

// Payload stand-in for tag-only enum forms and omitted fields
static NULL_VALUE: Value = Value::Null;

/// Append the encoding of `value` against `type_full` to `data`.
///
/// With `prefixed = false`, vec and string length prefixes are omitted
/// (the form PDA seed bytes take).
pub fn serialize(
    type_full: &TypeFull,
    value: &Value,
    data: &mut Vec<u8>,
    prefixed: bool,
) -> Result<(), CodecError> {
    match type_full {
        TypeFull::Typedef { content, .. } => serialize(content, value, data, prefixed),
        TypeFull::Option { prefix, content } => {
            if value.is_null() {
                prefix.write(0, data);
                Ok(())
            } else {
                prefix.write(1, data);
                serialize(content, value, data, prefixed)
            }
        }
        TypeFull::Vec { prefix, items } => {
            // Vec of u8 accepts whole byte blobs directly
            if items.is_u8() && !value.is_array() {
                let bytes = values::as_bytes(value)?;
                if prefixed {
                    prefix.write(bytes.len() as u128, data);
                }
                data.extend_from_slice(&bytes);
                return Ok(());
            }
            let array = value
                .as_array()
                .ok_or_else(|| values::shape_mismatch("array", value))?;
            if prefixed {
                prefix.write(array.len() as u128, data);
            }
            for (index, item) in array.iter().enumerate() {
                serialize(items, item, data, prefixed).breadcrumb(|| index.to_string())?;
            }
            Ok(())
        }
        TypeFull::Array { items, length } => {
            // Byte blobs also serve fixed [u8; N] arrays, length-checked
            if items.is_u8() && !value.is_array() {
                let bytes = values::as_bytes(value)?;
                if bytes.len() != *length {
                    return Err(CodecErrorKind::LengthMismatch {
                        expected: *length,
                        found: bytes.len(),
                    }
                    .into());
                }
                data.extend_from_slice(&bytes);
                return Ok(());
            }
            let array = value
                .as_array()
                .ok_or_else(|| values::shape_mismatch("array", value))?;
            if array.len() != *length {
                return Err(CodecErrorKind::LengthMismatch {
                    expected: *length,
                    found: array.len(),
                }
                .into());
            }
            for (index, item) in array.iter().enumerate() {
                serialize(items, item, data, prefixed).breadcrumb(|| index.to_string())?;
            }
            Ok(())
        }
        TypeFull::String { prefix } => {
            let text = values::as_str(value)?;
            if prefixed {
                prefix.write(text.len() as u128, data);
            }
            data.extend_from_slice(text.as_bytes());
            Ok(())
        }
        TypeFull::Struct { fields } => serialize_fields(fields, value, data, prefixed),
        TypeFull::Enum {
            prefix,
            variants,
            index_by_name,
            index_by_code,
            ..
        } => {
            // A variant is named by a number (its code), a string (its
            // name), or a single-key object carrying its payload
            let (index, payload) = match value {
                Value::Number(_) => {
                    let code = values::as_u128(value)?;
                    let index = index_by_code.get(&code).ok_or_else(|| {
                        CodecError::new(CodecErrorKind::UnknownVariant {
                            variant: code.to_string(),
                        })
                    })?;
                    (*index, &NULL_VALUE)
                }
                Value::String(name) => {
                    let index = index_by_name.get(name).ok_or_else(|| {
                        CodecError::new(CodecErrorKind::UnknownVariant {
                            variant: name.clone(),
                        })
                    })?;
                    (*index, &NULL_VALUE)
                }
                Value::Object(map) if map.len() == 1 => {
                    let (name, payload) = map.iter().next().unwrap();
                    let index = index_by_name.get(name).ok_or_else(|| {
                        CodecError::new(CodecErrorKind::UnknownVariant {
                            variant: name.clone(),
                        })
                    })?;
                    (*index, payload)
                }
                other => {
                    return Err(values::shape_mismatch(
                        "enum variant (number, name or single-key object)",
                        other,
                    ));
                }
            };
            let variant = &variants[index];
            prefix.write(variant.code, data);
            serialize_fields(&variant.fields, payload, data, prefixed)
                .breadcrumb(|| variant.name.clone())
        }
        TypeFull::Padded {
            before,
            min_size,
            after,
            content,
        } => {
            data.resize(data.len() + before, 0);
            let start = data.len();
            serialize(content, value, data, prefixed)?;
            if data.len() - start < *min_size {
                data.resize(start + min_size, 0);
            }
            data.resize(data.len() + after, 0);
            Ok(())
        }
        TypeFull::Const { .. } => Err(values::shape_mismatch("value-bearing type", value)),
        TypeFull::Primitive { primitive } => serialize_primitive(*primitive, value, data),
    }
}

/// Append the encoding of a field set (named by key, unnamed by position)
pub fn serialize_fields(
    fields: &TypeFullFields,
    value: &Value,
    data: &mut Vec<u8>,
    prefixed: bool,
) -> Result<(), CodecError> {
    match fields {
        TypeFullFields::Nothing => Ok(()),
        TypeFullFields::Named(named) => {
            if named.is_empty() {
                return Ok(());
            }
            let map = value
                .as_object()
                .ok_or_else(|| values::shape_mismatch("object", value))?;
            for field in named {
                // Absent keys encode as null so option fields can be omitted
                let field_value = map.get(&field.name).unwrap_or(&NULL_VALUE);
                serialize(&field.content, field_value, data, prefixed)
                    .breadcrumb(|| field.name.clone())?;
            }
            Ok(())
        }
        TypeFullFields::Unnamed(unnamed) => {
            if unnamed.is_empty() {
                return Ok(());
            }
            let array = value
                .as_array()
                .ok_or_else(|| values::shape_mismatch("array", value))?;
            if array.len() != unnamed.len() {
                return Err(CodecErrorKind::LengthMismatch {
                    expected: unnamed.len(),
                    found: array.len(),
                }
                .into());
            }
            for (index, (content, item)) in unnamed.iter().zip(array.iter()).enumerate() {
                serialize(content, item, data, prefixed).breadcrumb(|| index.to_string())?;
            }
            Ok(())
        }
    }
}

fn serialize_primitive(
    primitive: TypePrimitive,
    value: &Value,
    data: &mut Vec<u8>,
) -> Result<(), CodecError> {
    match primitive {
        TypePrimitive::U8 => {
            let number = unsigned_in_range::<u8>(value)?;
            data.push(number);
        }
        TypePrimitive::U16 => {
            let number = unsigned_in_range::<u16>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::U32 => {
            let number = unsigned_in_range::<u32>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::U64 => {
            let number = unsigned_in_range::<u64>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::U128 => {
            let number = values::as_u128(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::I8 => {
            let number = signed_in_range::<i8>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::I16 => {
            let number = signed_in_range::<i16>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::I32 => {
            let number = signed_in_range::<i32>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::I64 => {
            let number = signed_in_range::<i64>(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::I128 => {
            let number = values::as_i128(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::F32 => {
            let number = values::as_f64(value)? as f32;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::F64 => {
            let number = values::as_f64(value)?;
            data.extend_from_slice(&number.to_le_bytes());
        }
        TypePrimitive::Bool => {
            let flag = values::as_bool(value)?;
            data.push(u8::from(flag));
        }
        TypePrimitive::Pubkey => {
            let bytes = values::as_pubkey_bytes(value)?;
            data.extend_from_slice(&bytes);
        }
    }
    Ok(())
}

fn unsigned_in_range<T: TryFrom<u128>>(value: &Value) -> Result<T, CodecError> {
    let number = values::as_u128(value)?;
    T::try_from(number).map_err(|_| {
        values::shape_mismatch(
            format!("unsigned integer of {} bytes", std::mem::size_of::<T>()),
            value,
        )
    })
}

fn signed_in_range<T: TryFrom<i128>>(value: &Value) -> Result<T, CodecError> {
    let number = values::as_i128(value)?;
    T::try_from(number).map_err(|_| {
        values::shape_mismatch(
            format!("signed integer of {} bytes", std::mem::size_of::<T>()),
            value,
        )
    })
}
