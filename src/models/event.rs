//! Program event model

use serde_json::Value;

use crate::codec;
use crate::errors::{CodecError, CodecErrorKind};
use crate::models::type_flat::TypeFlat;
use crate::models::type_full::TypeFull;

/// A program event as declared by the IDL
#[derive(Debug, Clone, PartialEq)]
pub struct IdlEvent {
    /// Event name
    pub name: String,
    /// Documentation
    pub docs: Option<Vec<String>>,
    /// Byte prefix identifying this event kind
    pub discriminator: Vec<u8>,
    /// Unresolved content type
    pub content_type_flat: TypeFlat,
    /// Resolved content type
    pub content_type_full: TypeFull,
}

impl IdlEvent {
    /// True when raw event data starts with this event's discriminator
    pub fn matches(&self, data: &[u8]) -> bool {
        data.starts_with(&self.discriminator)
    }

    /// Encode a JSON value into raw event data (discriminator included)
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut data = self.discriminator.clone();
        codec::serialize(&self.content_type_full, value, &mut data, true)?;
        Ok(data)
    }

    /// Decode raw event data (discriminator verified) into JSON
    pub fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        if !self.matches(data) {
            return Err(CodecErrorKind::DiscriminatorMismatch {
                name: self.name.clone(),
            }
            .into());
        }
        let (_, value) =
            codec::deserialize(&self.content_type_full, data, self.discriminator.len())?;
        Ok(value)
    }
}
