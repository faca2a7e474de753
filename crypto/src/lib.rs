//! Cryptographic primitives for the DAO vote watchdog.
//!
//! - **Bech32 / Bech32m** codec for CKB addresses
//! - **Lock scripts** and full-format address encoding (RFC 0021)
//! - **Keccak-256** and secp256k1 key handling for PW-lock derivation

pub mod address;
pub mod bech32;
pub mod error;
pub mod hash;
pub mod keys;
pub mod script;

pub use address::{decode_address, decode_full_address, encode_full_address, parse_address};
pub use error::CryptoError;
pub use hash::keccak_256;
pub use keys::{derive_pw_lock_address, eth_address_from_binding};
pub use script::{HashType, Script};
