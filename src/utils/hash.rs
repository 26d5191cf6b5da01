//! Hashing utilities

use sha2::{Digest, Sha256};

use crate::constants::discriminators::DISCRIMINATOR_LENGTH;

/// Generate an Anchor-style discriminator from a namespace and a name
pub fn discriminator(namespace: &str, name: &str) -> [u8; DISCRIMINATOR_LENGTH] {
    let preimage = format!("{}:{}", namespace, name);
    let mut hasher = Sha256::new();
    hasher.update(preimage.as_bytes());
    let hash = hasher.finalize();

    let mut result = [0u8; DISCRIMINATOR_LENGTH];
    result.copy_from_slice(&hash[..DISCRIMINATOR_LENGTH]);
    result
}
