//! Program-derived-address constants
//!
//! These mirror the limits enforced by the Solana runtime; candidates are
//! hashed as `seeds ‖ bump ‖ program_id ‖ PDA_MARKER`.

/// Maximum number of seeds accepted for one derivation
pub const MAX_SEEDS: usize = 16;

/// Maximum byte length of a single seed
pub const MAX_SEED_LENGTH: usize = 32;

/// Domain separator appended after the program id when hashing a candidate
pub const PDA_MARKER: &[u8; 21] = b"ProgramDerivedAddress";
