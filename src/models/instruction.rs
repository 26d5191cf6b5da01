//! Program instruction model

use std::collections::HashMap;

use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::codec;
use crate::errors::{CodecError, CodecErrorKind, IdlError, ResolveError};
use crate::models::blob::IdlInstructionAccountPda;
use crate::models::type_flat::{TypeFlat, TypeFlatFields};
use crate::models::type_full::{TypeFull, TypeFullFields};

/// An account required by an instruction
///
/// Nested IDL account groups are flattened at parse time, so `name` may be
/// dotted (`vault.authority`).
#[derive(Debug, Clone, PartialEq)]
pub struct IdlInstructionAccount {
    /// Flattened account name
    pub name: String,
    /// Documentation
    pub docs: Option<Vec<String>>,
    /// Account must be writable
    pub writable: bool,
    /// Account must sign the transaction
    pub signer: bool,
    /// Account may be omitted entirely
    pub optional: bool,
    /// Fixed address declared by the IDL
    pub address: Option<Pubkey>,
    /// PDA specification deriving the address
    pub pda: Option<IdlInstructionAccountPda>,
}

/// A program instruction as declared by the IDL
#[derive(Debug, Clone, PartialEq)]
pub struct IdlInstruction {
    /// Instruction name
    pub name: String,
    /// Documentation
    pub docs: Option<Vec<String>>,
    /// Byte prefix identifying this instruction
    pub discriminator: Vec<u8>,
    /// Required accounts, flattened, in on-chain order
    pub accounts: Vec<IdlInstructionAccount>,
    /// Unresolved argument fields
    pub args_type_flat_fields: TypeFlatFields,
    /// Resolved argument fields
    pub args_type_full_fields: TypeFullFields,
    /// Unresolved return type, when declared
    pub return_type_flat: Option<TypeFlat>,
    /// Resolved return type, when declared
    pub return_type_full: Option<TypeFull>,
}

impl IdlInstruction {
    /// Look up an account by its flattened name
    pub fn account(&self, name: &str) -> Option<&IdlInstructionAccount> {
        self.accounts.iter().find(|account| account.name == name)
    }

    /// True when raw instruction data starts with this instruction's discriminator
    pub fn matches(&self, data: &[u8]) -> bool {
        data.starts_with(&self.discriminator)
    }

    /// Encode a JSON payload into raw instruction data (discriminator included)
    pub fn encode_payload(&self, payload: &Value) -> Result<Vec<u8>, CodecError> {
        let mut data = self.discriminator.clone();
        codec::serialize_fields(&self.args_type_full_fields, payload, &mut data, true)?;
        Ok(data)
    }

    /// Decode raw instruction data (discriminator verified) into a JSON payload
    pub fn decode_payload(&self, data: &[u8]) -> Result<Value, CodecError> {
        if !self.matches(data) {
            return Err(CodecErrorKind::DiscriminatorMismatch {
                name: self.name.clone(),
            }
            .into());
        }
        let (_, payload) =
            codec::deserialize_fields(&self.args_type_full_fields, data, self.discriminator.len())?;
        Ok(payload)
    }

    /// Decode a raw return value against the declared return type
    pub fn decode_return(&self, data: &[u8]) -> Result<Option<Value>, CodecError> {
        match &self.return_type_full {
            None => Ok(None),
            Some(type_full) => {
                let (_, value) = codec::deserialize(type_full, data, 0)?;
                Ok(Some(value))
            }
        }
    }

    /// Order the resolved addresses into on-chain account metas.
    ///
    /// Optional accounts without an address are skipped; a required account
    /// without one fails `MissingRequiredAccount`.
    pub fn account_metas(
        &self,
        addresses: &HashMap<String, Pubkey>,
    ) -> Result<Vec<solana_instruction::AccountMeta>, ResolveError> {
        let mut metas = Vec::with_capacity(self.accounts.len());
        for account in &self.accounts {
            match addresses.get(&account.name) {
                Some(address) => {
                    let meta = if account.writable {
                        solana_instruction::AccountMeta::new(*address, account.signer)
                    } else {
                        solana_instruction::AccountMeta::new_readonly(*address, account.signer)
                    };
                    metas.push(meta);
                }
                None if account.optional => continue,
                None => {
                    return Err(ResolveError::MissingRequiredAccount {
                        name: account.name.clone(),
                    });
                }
            }
        }
        Ok(metas)
    }

    /// Compile payload and addresses into a ready-to-send instruction
    pub fn compile(
        &self,
        program_id: &Pubkey,
        payload: &Value,
        addresses: &HashMap<String, Pubkey>,
    ) -> Result<solana_instruction::Instruction, IdlError> {
        let data = self.encode_payload(payload)?;
        let accounts = self.account_metas(addresses)?;
        Ok(solana_instruction::Instruction {
            program_id: *program_id,
            accounts,
            data,
        })
    }
}
