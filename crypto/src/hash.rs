//! Keccak-256 hashing for Ethereum address derivation.

use sha3::{Digest, Keccak256};

/// Compute the Keccak-256 hash of arbitrary data.
pub fn keccak_256(data: &[u8]) -> [u8; 32] {
    let result = Keccak256::digest(data);
    let mut output = [0u8; 32];
    output.copy_from_slice(&result);
    output
}
