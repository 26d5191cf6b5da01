//! Program account model

use serde_json::Value;

use crate::codec;
use crate::errors::{CodecError, CodecErrorKind};
use crate::models::type_flat::TypeFlat;
use crate::models::type_full::TypeFull;

/// A fixed byte pattern expected at a given offset of the account data
#[derive(Debug, Clone, PartialEq)]
pub struct IdlAccountBlob {
    /// Absolute offset into the raw account data
    pub offset: usize,
    /// Expected bytes
    pub bytes: Vec<u8>,
}

impl IdlAccountBlob {
    /// True when `data` carries the expected bytes at the blob's offset
    pub fn matches(&self, data: &[u8]) -> bool {
        let end = self.offset.saturating_add(self.bytes.len());
        data.len() >= end && &data[self.offset..end] == self.bytes.as_slice()
    }
}

/// A program account as declared by the IDL
#[derive(Debug, Clone, PartialEq)]
pub struct IdlAccount {
    /// Account name
    pub name: String,
    /// Documentation
    pub docs: Option<Vec<String>>,
    /// Byte prefix identifying this account kind
    pub discriminator: Vec<u8>,
    /// Extra fixed byte patterns that must also match
    pub blobs: Vec<IdlAccountBlob>,
    /// Unresolved content type
    pub content_type_flat: TypeFlat,
    /// Resolved content type
    pub content_type_full: TypeFull,
}

impl IdlAccount {
    /// Check the discriminator and every declared blob against raw data
    pub fn check(&self, data: &[u8]) -> Result<(), CodecError> {
        if !data.starts_with(&self.discriminator) {
            return Err(CodecErrorKind::DiscriminatorMismatch {
                name: self.name.clone(),
            }
            .into());
        }
        for blob in &self.blobs {
            if !blob.matches(data) {
                return Err(CodecErrorKind::BlobMismatch {
                    name: self.name.clone(),
                    offset: blob.offset,
                }
                .into());
            }
        }
        Ok(())
    }

    /// True when raw data fully matches this account's byte patterns
    pub fn matches(&self, data: &[u8]) -> bool {
        self.check(data).is_ok()
    }

    /// Encode a JSON value into raw account data (discriminator included)
    pub fn encode(&self, value: &Value) -> Result<Vec<u8>, CodecError> {
        let mut data = self.discriminator.clone();
        codec::serialize(&self.content_type_full, value, &mut data, true)?;
        Ok(data)
    }

    /// Decode raw account data (discriminator and blobs verified) into JSON
    pub fn decode(&self, data: &[u8]) -> Result<Value, CodecError> {
        self.check(data)?;
        let (_, value) =
            codec::deserialize(&self.content_type_full, data, self.discriminator.len())?;
        Ok(value)
    }
}
