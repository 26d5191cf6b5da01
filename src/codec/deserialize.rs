//! Bytes -> JSON

use serde_json::{Map, Value};

use crate::codec::values;
use crate::errors::{CodecError, CodecErrorKind, CodecResultExt};
use crate::models::type_full::{TypeFull, TypeFullFields};
use crate::models::type_prefix::TypePrefix;
use crate::models::type_primitive::TypePrimitive;

/// Decode `data` starting at `offset` against `type_full`.
///
/// Returns the number of bytes consumed and the decoded JSON value.
pub fn deserialize(
    type_full: &TypeFull,
    data: &[u8],
    offset: usize,
) -> Result<(usize, Value), CodecError> {
    match type_full {
        TypeFull::Typedef { content, .. } => deserialize(content, data, offset),
        TypeFull::Option { prefix, content } => {
            let flag = read_prefix(prefix, data, offset)?;
            match flag {
                0 => Ok((prefix.size(), Value::Null)),
                1 => {
                    let (consumed, value) = deserialize(content, data, offset + prefix.size())?;
                    Ok((prefix.size() + consumed, value))
                }
                other => Err(CodecError::new(CodecErrorKind::ShapeMismatch {
                    expected: "option flag 0 or 1".to_string(),
                    found: other.to_string(),
                })),
            }
        }
        TypeFull::Vec { prefix, items } => {
            let raw_length = read_prefix(prefix, data, offset)?;
            let length = checked_length(raw_length, data, offset + prefix.size())?;
            let mut consumed = prefix.size();
            if items.is_u8() {
                let bytes = read(data, offset + consumed, length)?;
                let decoded = bytes.iter().map(|byte| Value::from(*byte)).collect();
                return Ok((consumed + length, Value::Array(decoded)));
            }
            let mut decoded = Vec::with_capacity(length);
            for index in 0..length {
                let (item_consumed, item) = deserialize(items, data, offset + consumed)
                    .breadcrumb(|| index.to_string())?;
                consumed += item_consumed;
                decoded.push(item);
            }
            Ok((consumed, Value::Array(decoded)))
        }
        TypeFull::Array { items, length } => {
            let mut consumed = 0;
            let mut decoded = Vec::with_capacity(*length);
            for index in 0..*length {
                let (item_consumed, item) = deserialize(items, data, offset + consumed)
                    .breadcrumb(|| index.to_string())?;
                consumed += item_consumed;
                decoded.push(item);
            }
            Ok((consumed, Value::Array(decoded)))
        }
        TypeFull::String { prefix } => {
            let raw_length = read_prefix(prefix, data, offset)?;
            let length = checked_length(raw_length, data, offset + prefix.size())?;
            let bytes = read(data, offset + prefix.size(), length)?;
            let text = std::str::from_utf8(bytes)
                .map_err(|_| CodecError::new(CodecErrorKind::InvalidUtf8))?;
            Ok((prefix.size() + length, Value::String(text.to_string())))
        }
        TypeFull::Struct { fields } => deserialize_fields(fields, data, offset),
        TypeFull::Enum {
            prefix,
            variants,
            mask,
            index_by_code,
            ..
        } => {
            let raw = read_prefix(prefix, data, offset)?;
            // Strip bits no variant uses before the lookup
            let code = raw & mask;
            let index = index_by_code.get(&code).ok_or_else(|| {
                CodecError::new(CodecErrorKind::UnknownVariant {
                    variant: raw.to_string(),
                })
            })?;
            let variant = &variants[*index];
            if matches!(variant.fields, TypeFullFields::Nothing) {
                return Ok((prefix.size(), Value::String(variant.name.clone())));
            }
            let (consumed, payload) =
                deserialize_fields(&variant.fields, data, offset + prefix.size())
                    .breadcrumb(|| variant.name.clone())?;
            let mut wrapped = Map::new();
            wrapped.insert(variant.name.clone(), payload);
            Ok((prefix.size() + consumed, Value::Object(wrapped)))
        }
        TypeFull::Padded {
            before,
            min_size,
            after,
            content,
        } => {
            // The padding bytes must exist, but their content is not checked
            read(data, offset, *before)?;
            let (consumed, value) = deserialize(content, data, offset + before)?;
            let content_span = consumed.max(*min_size);
            read(data, offset + before, content_span)?;
            read(data, offset + before + content_span, *after)?;
            Ok((before + content_span + after, value))
        }
        TypeFull::Const { literal } => Err(CodecError::new(CodecErrorKind::ShapeMismatch {
            expected: "value-bearing type".to_string(),
            found: format!("const({})", literal),
        })),
        TypeFull::Primitive { primitive } => deserialize_primitive(*primitive, data, offset),
    }
}

/// Decode a field set: named fields become an object in declaration
/// order, unnamed fields an array
pub fn deserialize_fields(
    fields: &TypeFullFields,
    data: &[u8],
    offset: usize,
) -> Result<(usize, Value), CodecError> {
    match fields {
        TypeFullFields::Nothing => Ok((0, Value::Object(Map::new()))),
        TypeFullFields::Named(named) => {
            let mut consumed = 0;
            let mut decoded = Map::new();
            for field in named {
                let (field_consumed, value) = deserialize(&field.content, data, offset + consumed)
                    .breadcrumb(|| field.name.clone())?;
                consumed += field_consumed;
                decoded.insert(field.name.clone(), value);
            }
            Ok((consumed, Value::Object(decoded)))
        }
        TypeFullFields::Unnamed(unnamed) => {
            let mut consumed = 0;
            let mut decoded = Vec::with_capacity(unnamed.len());
            for (index, content) in unnamed.iter().enumerate() {
                let (item_consumed, value) = deserialize(content, data, offset + consumed)
                    .breadcrumb(|| index.to_string())?;
                consumed += item_consumed;
                decoded.push(value);
            }
            Ok((consumed, Value::Array(decoded)))
        }
    }
}

fn deserialize_primitive(
    primitive: TypePrimitive,
    data: &[u8],
    offset: usize,
) -> Result<(usize, Value), CodecError> {
    let size = primitive.size();
    let bytes = read(data, offset, size)?;
    let value = match primitive {
        TypePrimitive::U8 => Value::from(bytes[0]),
        TypePrimitive::U16 => Value::from(u16::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::U32 => Value::from(u32::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::U64 => Value::from(u64::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::U128 => {
            values::u128_to_value(u128::from_le_bytes(bytes.try_into().unwrap()))
        }
        TypePrimitive::I8 => Value::from(i8::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::I16 => Value::from(i16::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::I32 => Value::from(i32::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::I64 => Value::from(i64::from_le_bytes(bytes.try_into().unwrap())),
        TypePrimitive::I128 => {
            values::i128_to_value(i128::from_le_bytes(bytes.try_into().unwrap()))
        }
        TypePrimitive::F32 => {
            let number = f32::from_le_bytes(bytes.try_into().unwrap());
            finite_number(f64::from(number))?
        }
        TypePrimitive::F64 => {
            let number = f64::from_le_bytes(bytes.try_into().unwrap());
            finite_number(number)?
        }
        TypePrimitive::Bool => match bytes[0] {
            0 => Value::Bool(false),
            1 => Value::Bool(true),
            other => {
                return Err(CodecError::new(CodecErrorKind::ShapeMismatch {
                    expected: "bool byte 0 or 1".to_string(),
                    found: other.to_string(),
                }));
            }
        },
        TypePrimitive::Pubkey => Value::String(bs58::encode(bytes).into_string()),
    };
    Ok((size, value))
}

fn finite_number(number: f64) -> Result<Value, CodecError> {
    serde_json::Number::from_f64(number)
        .map(Value::Number)
        .ok_or_else(|| {
            CodecError::new(CodecErrorKind::ShapeMismatch {
                expected: "finite float".to_string(),
                found: number.to_string(),
            })
        })
}

fn read_prefix(prefix: &TypePrefix, data: &[u8], offset: usize) -> Result<u128, CodecError> {
    let bytes = read(data, offset, prefix.size())?;
    Ok(prefix.read(bytes))
}

/// Bounds-checked slice access; the only place `BufferUnderrun` is born
fn read(data: &[u8], offset: usize, needed: usize) -> Result<&[u8], CodecError> {
    let end = offset.checked_add(needed).unwrap_or(usize::MAX);
    if end > data.len() {
        return Err(CodecError::new(CodecErrorKind::BufferUnderrun {
            offset,
            needed,
            available: data.len().saturating_sub(offset),
        }));
    }
    Ok(&data[offset..end])
}

/// Narrow a decoded length and reject lengths the buffer cannot possibly
/// hold, so adversarial prefixes cannot drive huge allocations or loops
/// over zero-sized items
fn checked_length(raw: u128, data: &[u8], offset: usize) -> Result<usize, CodecError> {
    let available = data.len().saturating_sub(offset);
    match usize::try_from(raw) {
        Ok(length) if length <= available => Ok(length),
        _ => Err(CodecError::new(CodecErrorKind::BufferUnderrun {
            offset,
            needed: raw.min(u128::from(u64::MAX)) as usize,
            available,
        })),
    }
}
