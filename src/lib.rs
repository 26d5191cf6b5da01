//! A library for interpreting Solana program IDLs
//!
//! This crate parses a program's Interface Definition (IDL JSON) and uses
//! it to convert between human-readable JSON values and the exact binary
//! encodings the program expects on-chain: instruction payloads, account
//! contents and events. On top of the codec it derives program addresses
//! (PDAs, with the Ed25519 off-curve guarantee checked locally), resolves
//! every account an instruction needs (including PDAs whose seeds depend
//! on other accounts' decoded state), and computes native bytemuck
//! layouts for zero-copy account structs.
//!
//! Everything here is pure and synchronous over immutable parsed
//! programs; RPC transport, transaction assembly and signing live in
//! other crates.

pub mod codec;
pub mod constants;
pub mod errors;
pub mod hydration;
pub mod layout;
pub mod models;
pub mod parser;
pub mod pda;
pub mod resolver;
pub mod utils;

use serde_json::Value;

pub use crate::errors::{IdlError, IdlResult};
pub use crate::layout::{bytemuck, bytemuck_with_repr, PodLayout};
pub use crate::models::program::IdlProgram;
pub use crate::pda::{derive_pda, is_on_curve};
pub use crate::resolver::resolve_instruction_addresses;

/// Parse an IDL JSON document into a fully hydrated program
pub fn parse_program(value: &Value) -> IdlResult<IdlProgram> {
    parser::program::parse(value)
}

/// Parse an IDL document from its JSON text form
pub fn parse_program_str(text: &str) -> IdlResult<IdlProgram> {
    let value: Value =
        serde_json::from_str(text).map_err(|error| errors::ParseError::InvalidJson {
            detail: error.to_string(),
        })?;
    parse_program(&value)
}

/// Version of the IDL codec
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
