//! JSON value coercions shared by the encoder and decoder

use serde_json::Value;

use crate::errors::{CodecError, CodecErrorKind};
use crate::utils::json;

/// Uniform shape-mismatch constructor
pub(crate) fn shape_mismatch(expected: impl Into<String>, value: &Value) -> CodecError {
    CodecError::new(CodecErrorKind::ShapeMismatch {
        expected: expected.into(),
        found: json::kind(value).to_string(),
    })
}

/// Unsigned integer from a JSON number or decimal string
pub(crate) fn as_u128(value: &Value) -> Result<u128, CodecError> {
    match value {
        Value::Number(number) => number
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| shape_mismatch("unsigned integer", value)),
        Value::String(text) => text
            .parse::<u128>()
            .map_err(|_| shape_mismatch("unsigned integer string", value)),
        _ => Err(shape_mismatch("unsigned integer", value)),
    }
}

/// Signed integer from a JSON number or decimal string
pub(crate) fn as_i128(value: &Value) -> Result<i128, CodecError> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .map(i128::from)
            .ok_or_else(|| shape_mismatch("signed integer", value)),
        Value::String(text) => text
            .parse::<i128>()
            .map_err(|_| shape_mismatch("signed integer string", value)),
        _ => Err(shape_mismatch("signed integer", value)),
    }
}

/// Float from a JSON number
pub(crate) fn as_f64(value: &Value) -> Result<f64, CodecError> {
    value
        .as_f64()
        .ok_or_else(|| shape_mismatch("number", value))
}

/// Strict boolean
pub(crate) fn as_bool(value: &Value) -> Result<bool, CodecError> {
    value.as_bool().ok_or_else(|| shape_mismatch("bool", value))
}

/// UTF-8 text
pub(crate) fn as_str(value: &Value) -> Result<&str, CodecError> {
    value.as_str().ok_or_else(|| shape_mismatch("string", value))
}

/// Raw 32 bytes of a base58 pubkey string
pub(crate) fn as_pubkey_bytes(value: &Value) -> Result<[u8; 32], CodecError> {
    let text = as_str(value)?;
    let invalid = || {
        CodecError::new(CodecErrorKind::InvalidPubkey {
            value: text.to_string(),
        })
    };
    let decoded = bs58::decode(text).into_vec().map_err(|_| invalid())?;
    <[u8; 32]>::try_from(decoded.as_slice()).map_err(|_| invalid())
}

/// Byte blob from any accepted form: a JSON byte array, a UTF-8 string,
/// or a `{"base16"|"base58"|"base64"|"utf8": "..."}` tagged object
pub(crate) fn as_bytes(value: &Value) -> Result<Vec<u8>, CodecError> {
    match value {
        Value::Array(items) => {
            let mut bytes = Vec::with_capacity(items.len());
            for item in items {
                let byte = as_u128(item)?;
                let byte =
                    u8::try_from(byte).map_err(|_| shape_mismatch("byte (0-255)", item))?;
                bytes.push(byte);
            }
            Ok(bytes)
        }
        Value::String(text) => Ok(text.as_bytes().to_vec()),
        Value::Object(map) if map.len() == 1 => {
            let (tag, content) = map.iter().next().unwrap();
            let text = as_str(content)?;
            match tag.as_str() {
                "base16" | "hex" => hex::decode(text)
                    .map_err(|_| shape_mismatch("base16 string", content)),
                "base58" => bs58::decode(text)
                    .into_vec()
                    .map_err(|_| shape_mismatch("base58 string", content)),
                "base64" => base64::decode(text)
                    .map_err(|_| shape_mismatch("base64 string", content)),
                "utf8" => Ok(text.as_bytes().to_vec()),
                _ => Err(shape_mismatch("bytes object tag", value)),
            }
        }
        _ => Err(shape_mismatch("bytes", value)),
    }
}

/// JSON value for an unsigned integer; large values become decimal strings
/// because `serde_json::Number` tops out at u64
pub(crate) fn u128_to_value(value: u128) -> Value {
    match u64::try_from(value) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(value.to_string()),
    }
}

/// JSON value for a signed integer; out-of-range values become strings
pub(crate) fn i128_to_value(value: i128) -> Value {
    match i64::try_from(value) {
        Ok(small) => Value::from(small),
        Err(_) => Value::String(value.to_string()),
    }
}
