//! CKB address encoding (RFC 0021).
//!
//! Full format: bech32m(hrp, 0x00 || code_hash(32) || hash_type(1) || args).
//! Short (0x01) and deprecated full (0x02, 0x04) formats are bech32 and are
//! accepted on input only.

use crate::bech32::{self, Variant};
use crate::error::CryptoError;
use crate::script::{short_format_code_hash, HashType, Script};
use watchdog_types::{CkbAddress, NetworkId};

const FORMAT_FULL: u8 = 0x00;
const FORMAT_SHORT: u8 = 0x01;
const FORMAT_FULL_DATA: u8 = 0x02;
const FORMAT_FULL_TYPE: u8 = 0x04;

/// Encode a lock script as a full-format address for `network`.
pub fn encode_full_address(script: &Script, network: NetworkId) -> CkbAddress {
    let mut payload = Vec::with_capacity(1 + 32 + 1 + script.args.len());
    payload.push(FORMAT_FULL);
    payload.extend_from_slice(&script.code_hash);
    payload.push(script.hash_type as u8);
    payload.extend_from_slice(&script.args);

    // Regrouping 8-bit input into 5-bit words with padding cannot fail.
    let data = bech32::convert_bits(&payload, 8, 5, true).unwrap_or_default();
    CkbAddress::new(bech32::encode(network.hrp(), &data, Variant::Bech32m))
}

/// Decode an address into its raw payload, checking network and checksum variant.
fn decode_payload(raw: &str, network: NetworkId) -> Result<Vec<u8>, CryptoError> {
    let decoded = bech32::decode(raw.trim())?;
    if decoded.hrp != network.hrp() {
        return Err(CryptoError::WrongNetwork {
            expected: network.hrp().to_string(),
            found: decoded.hrp,
        });
    }
    let payload = bech32::convert_bits(&decoded.data, 5, 8, false)?;
    let format = *payload
        .first()
        .ok_or_else(|| CryptoError::MalformedPayload("empty payload".into()))?;

    let (expected_variant, min_len) = match format {
        FORMAT_FULL => (Variant::Bech32m, 1 + 32 + 1),
        FORMAT_SHORT => (Variant::Bech32, 1 + 1 + 20),
        FORMAT_FULL_DATA | FORMAT_FULL_TYPE => (Variant::Bech32, 1 + 32),
        other => return Err(CryptoError::UnsupportedFormat(other)),
    };
    if decoded.variant != expected_variant {
        return Err(CryptoError::MalformedPayload(format!(
            "format 0x{format:02x} must use {expected_variant:?}"
        )));
    }
    if payload.len() < min_len {
        return Err(CryptoError::MalformedPayload(format!(
            "payload of {} bytes is shorter than {min_len}",
            payload.len()
        )));
    }
    Ok(payload)
}

/// Decode an address in any supported format into the lock script it names.
pub fn decode_address(raw: &str, network: NetworkId) -> Result<Script, CryptoError> {
    let payload = decode_payload(raw, network)?;
    match payload[0] {
        FORMAT_FULL => {
            let hash_type = HashType::from_byte(payload[33]).ok_or_else(|| {
                CryptoError::MalformedPayload(format!("unknown hash type 0x{:02x}", payload[33]))
            })?;
            Ok(Script {
                code_hash: code_hash_at(&payload[1..33]),
                hash_type,
                args: payload[34..].to_vec(),
            })
        }
        FORMAT_SHORT => {
            let code_hash = short_format_code_hash(payload[1], network).ok_or_else(|| {
                CryptoError::MalformedPayload(format!("unknown short-format index 0x{:02x}", payload[1]))
            })?;
            Ok(Script {
                code_hash,
                hash_type: HashType::Type,
                args: payload[2..].to_vec(),
            })
        }
        format => Ok(Script {
            code_hash: code_hash_at(&payload[1..33]),
            hash_type: if format == FORMAT_FULL_DATA { HashType::Data } else { HashType::Type },
            args: payload[33..].to_vec(),
        }),
    }
}

fn code_hash_at(bytes: &[u8]) -> [u8; 32] {
    let mut code_hash = [0u8; 32];
    code_hash.copy_from_slice(bytes);
    code_hash
}

/// Validate a user-supplied address and return its canonical form.
///
/// Every encoding of one lock script maps to the same full-format address.
pub fn parse_address(raw: &str, network: NetworkId) -> Result<CkbAddress, CryptoError> {
    decode_address(raw, network).map(|script| encode_full_address(&script, network))
}

/// Decode a full-format (0x00) address back into its lock script.
pub fn decode_full_address(raw: &str, network: NetworkId) -> Result<Script, CryptoError> {
    let payload = decode_payload(raw, network)?;
    if payload[0] != FORMAT_FULL {
        return Err(CryptoError::UnsupportedFormat(payload[0]));
    }
    decode_address(raw, network)
}
