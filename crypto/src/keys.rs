//! Foreign-chain key handling: Ethereum addresses and secp256k1 public keys.
//!
//! PW-lock args are the 20-byte Ethereum address of the owner, i.e. the last
//! 20 bytes of Keccak-256 over the 64-byte uncompressed public key.

use crate::address::encode_full_address;
use crate::error::CryptoError;
use crate::hash::keccak_256;
use crate::script::Script;
use k256::elliptic_curve::sec1::ToEncodedPoint;
use watchdog_types::{CkbAddress, NetworkId};

/// Decode a hex string, with or without a `0x` prefix.
fn decode_hex(raw: &str) -> Result<Vec<u8>, CryptoError> {
    let trimmed = raw.trim();
    let body = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    hex::decode(body).map_err(|e| CryptoError::InvalidHex(e.to_string()))
}

/// Keccak-256 of the uncompressed point, last 20 bytes.
fn eth_address_from_point(uncompressed: &[u8]) -> [u8; 20] {
    let hash = keccak_256(uncompressed);
    let mut out = [0u8; 20];
    out.copy_from_slice(&hash[12..]);
    out
}

/// Normalise a SEC1 encoding to the 64-byte uncompressed point (no `0x04` tag).
fn uncompressed_point(sec1: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let key = k256::PublicKey::from_sec1_bytes(sec1).map_err(|_| CryptoError::InvalidPublicKey)?;
    Ok(key.to_encoded_point(false).as_bytes()[1..].to_vec())
}

/// Interpret a foreign-chain binding as an Ethereum address.
///
/// Accepts a 20-byte address, a 33-byte compressed key, a 65-byte `0x04`-tagged
/// uncompressed key, or a bare 64-byte uncompressed key.
pub fn eth_address_from_binding(raw: &str) -> Result<[u8; 20], CryptoError> {
    let bytes = decode_hex(raw)?;
    match bytes.len() {
        20 => {
            let mut out = [0u8; 20];
            out.copy_from_slice(&bytes);
            Ok(out)
        }
        33 | 65 => Ok(eth_address_from_point(&uncompressed_point(&bytes)?)),
        64 => {
            let mut tagged = Vec::with_capacity(65);
            tagged.push(0x04);
            tagged.extend_from_slice(&bytes);
            Ok(eth_address_from_point(&uncompressed_point(&tagged)?))
        }
        other => Err(CryptoError::InvalidKeyLength(other)),
    }
}

/// Derive the PW-lock CKB address controlled by a foreign-chain binding.
///
/// Pure and deterministic: no network access.
pub fn derive_pw_lock_address(raw: &str, network: NetworkId) -> Result<CkbAddress, CryptoError> {
    let eth = eth_address_from_binding(raw)?;
    Ok(encode_full_address(&Script::pw_lock(network, eth), network))
}
