//! Program-derived-address derivation
//!
//! A PDA is the first SHA-256 candidate, searching the bump from 255 down
//! to 0, that is NOT a valid Ed25519 point, so no key pair can ever sign
//! for it. Derivation is a pure function of the program id and seeds.

mod curve;

pub use curve::is_on_curve;

use sha2::{Digest, Sha256};
use solana_pubkey::Pubkey;

use crate::constants::pda::{MAX_SEEDS, MAX_SEED_LENGTH, PDA_MARKER};
use crate::errors::PdaError;

/// Derive the program address and bump for a seed list.
///
/// Seeds are limited to 16 entries of at most 32 bytes each. Fails with
/// `NoViablePda` in the (astronomically unlikely) case that every bump
/// value lands on the curve.
pub fn derive_pda(program_id: &Pubkey, seeds: &[&[u8]]) -> Result<(Pubkey, u8), PdaError> {
    if seeds.len() > MAX_SEEDS {
        return Err(PdaError::TooManySeeds {
            count: seeds.len(),
            max: MAX_SEEDS,
        });
    }
    for seed in seeds {
        if seed.len() > MAX_SEED_LENGTH {
            return Err(PdaError::SeedTooLong {
                length: seed.len(),
                max: MAX_SEED_LENGTH,
            });
        }
    }

    let program_bytes = program_id.to_bytes();
    for bump in (0..=u8::MAX).rev() {
        let mut hasher = Sha256::new();
        for seed in seeds {
            hasher.update(seed);
        }
        hasher.update([bump]);
        hasher.update(program_bytes);
        hasher.update(PDA_MARKER);
        let candidate: [u8; 32] = hasher.finalize().into();

        if !is_on_curve(&candidate) {
            return Ok((Pubkey::new_from_array(candidate), bump));
        }
    }
    Err(PdaError::NoViablePda)
}

/// Derive from owned seed buffers (the form the resolver produces)
pub fn derive_pda_from_bytes(
    program_id: &Pubkey,
    seeds: &[Vec<u8>],
) -> Result<(Pubkey, u8), PdaError> {
    let borrowed: Vec<&[u8]> = seeds.iter().map(|seed| seed.as_slice()).collect();
    derive_pda(program_id, &borrowed)
}
