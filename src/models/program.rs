//! Program model
//!
//! The aggregate of everything one IDL declares. Built once by the parser
//! (all types hydrated) and read-only afterward, so every lookup and
//! guess below is a pure read. Maps are `BTreeMap`s to keep "first match"
//! semantics deterministic.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use solana_pubkey::Pubkey;

use crate::models::account::IdlAccount;
use crate::models::event::IdlEvent;
use crate::models::instruction::IdlInstruction;
use crate::models::type_flat::TypeFlat;
use crate::models::type_full::TypeFull;
use crate::models::typedef::IdlTypedef;

/// Program metadata block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IdlMetadata {
    /// Program name
    pub name: Option<String>,
    /// Program version
    pub version: Option<String>,
    /// IDL dialect tag
    pub spec: Option<String>,
    /// Free-form description
    pub description: Option<String>,
}

/// Error code definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdlErrorCode {
    /// Error code
    pub code: u64,
    /// Error name
    pub name: String,
    /// Error message
    #[serde(default)]
    pub msg: Option<String>,
}

/// A named constant declared by the IDL
#[derive(Debug, Clone, PartialEq)]
pub struct IdlConstant {
    /// Constant name
    pub name: String,
    /// Unresolved type
    pub type_flat: TypeFlat,
    /// Resolved type
    pub type_full: TypeFull,
    /// Constant value, as JSON
    pub value: Value,
}

/// A parsed, fully hydrated program interface
#[derive(Debug, Clone, Default)]
pub struct IdlProgram {
    /// Program address, when the IDL pins one
    pub address: Option<Pubkey>,
    /// Metadata block
    pub metadata: IdlMetadata,
    /// Named type definitions
    pub typedefs: BTreeMap<String, IdlTypedef>,
    /// Account declarations
    pub accounts: BTreeMap<String, IdlAccount>,
    /// Instruction declarations
    pub instructions: BTreeMap<String, IdlInstruction>,
    /// Event declarations
    pub events: BTreeMap<String, IdlEvent>,
    /// Error code declarations, by name
    pub errors: BTreeMap<String, IdlErrorCode>,
    /// Constant declarations
    pub constants: BTreeMap<String, IdlConstant>,
}

impl IdlProgram {
    /// Program name, when the metadata carries one
    pub fn name(&self) -> Option<&str> {
        self.metadata.name.as_deref()
    }

    /// Guess which declared account some raw data belongs to.
    ///
    /// Requires the discriminator prefix AND every declared blob to match.
    /// Returns the first full match in name order; no match is a normal
    /// outcome when scanning arbitrary on-chain data, not an error.
    pub fn guess_account(&self, data: &[u8]) -> Option<&IdlAccount> {
        self.accounts.values().find(|account| account.matches(data))
    }

    /// Guess which declared instruction some raw instruction data invokes
    pub fn guess_instruction(&self, data: &[u8]) -> Option<&IdlInstruction> {
        self.instructions
            .values()
            .find(|instruction| instruction.matches(data))
    }

    /// Guess which declared event some raw event data carries
    pub fn guess_event(&self, data: &[u8]) -> Option<&IdlEvent> {
        self.events.values().find(|event| event.matches(data))
    }

    /// Map an on-chain custom error code back to its declaration
    pub fn lookup_error(&self, code: u64) -> Option<&IdlErrorCode> {
        self.errors.values().find(|error| error.code == code)
    }
}
