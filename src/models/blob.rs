//! Seed blob descriptors
//!
//! A blob is a byte-producing ingredient of a PDA seed. Constants are
//! pre-encoded at parse time; argument and account references carry the
//! full type of the value they point at, so the resolver can re-encode
//! the located JSON value byte-exactly instead of stringifying it.

use crate::models::type_full::TypeFull;
use crate::utils::path::IdlPath;

/// A byte-producing seed descriptor
#[derive(Debug, Clone, PartialEq)]
pub enum IdlInstructionBlob {
    /// Bytes fixed at parse time
    Const { bytes: Vec<u8> },
    /// A value inside the instruction payload, re-encoded with its own type
    Arg { path: IdlPath, type_full: TypeFull },
    /// Another account: its address (single-segment path) or a field of
    /// its decoded state (multi-segment path, typed when the IDL declares
    /// the account's typedef)
    Account {
        path: IdlPath,
        content_type: Option<TypeFull>,
    },
}

/// PDA specification attached to an instruction account
#[derive(Debug, Clone, PartialEq)]
pub struct IdlInstructionAccountPda {
    /// Seed blobs, in order
    pub seeds: Vec<IdlInstructionBlob>,
    /// Deriving program override; defaults to the instruction's program
    pub program: Option<IdlInstructionBlob>,
}
