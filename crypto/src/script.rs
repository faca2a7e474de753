//! CKB lock scripts.

use watchdog_types::NetworkId;

/// How a script's `code_hash` is matched against on-chain code.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HashType {
    Data = 0x00,
    Type = 0x01,
    Data1 = 0x02,
    Data2 = 0x04,
}

impl HashType {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x00 => Some(Self::Data),
            0x01 => Some(Self::Type),
            0x02 => Some(Self::Data1),
            0x04 => Some(Self::Data2),
            _ => None,
        }
    }
}

/// A lock script: the owner condition of a cell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Script {
    pub code_hash: [u8; 32],
    pub hash_type: HashType,
    pub args: Vec<u8>,
}

/// PW-lock `code_hash` on mainnet (Lina).
pub const PW_LOCK_CODE_HASH_MAINNET: [u8; 32] =
    hex_literal("bf43c3602455798c1a61a596e0d95278864c552fafe231c063b3fabf97a8febc");

/// PW-lock `code_hash` on testnet (Aggron).
pub const PW_LOCK_CODE_HASH_TESTNET: [u8; 32] =
    hex_literal("58c5f491aba6d61678b7cf7edf4910b1f5e00ec0cde2f42e0abb4fd9aff25a63");

/// `secp256k1_blake160_sighash_all` type hash, short-format index 0x00.
pub const SECP256K1_BLAKE160_CODE_HASH: [u8; 32] =
    hex_literal("9bd7e06f3ecf4be0f2fcd2188b23f1b9fcc88e5d4b65a8637b17723bbda3cce8");

/// `secp256k1_blake160_multisig_all` type hash, short-format index 0x01.
pub const SECP256K1_MULTISIG_CODE_HASH: [u8; 32] =
    hex_literal("5c5069eb0857efc65e1bca0c07df34c31663b3622fd3876c876320fc9634e2a8");

/// anyone-can-pay type hash on mainnet, short-format index 0x02.
pub const ACP_CODE_HASH_MAINNET: [u8; 32] =
    hex_literal("d369597ff47f29fbc0d47d2e3775370d1250b85140c670e4718af712983a2354");

/// anyone-can-pay type hash on testnet, short-format index 0x02.
pub const ACP_CODE_HASH_TESTNET: [u8; 32] =
    hex_literal("3419a1c09eb2567f6552ee7a8ecffd64155cffe0f1796e6e61ec088d740c1356");

/// Code hash a short-format address refers to by index.
pub fn short_format_code_hash(index: u8, network: NetworkId) -> Option<[u8; 32]> {
    match (index, network) {
        (0x00, _) => Some(SECP256K1_BLAKE160_CODE_HASH),
        (0x01, _) => Some(SECP256K1_MULTISIG_CODE_HASH),
        (0x02, NetworkId::Mainnet) => Some(ACP_CODE_HASH_MAINNET),
        (0x02, NetworkId::Testnet) => Some(ACP_CODE_HASH_TESTNET),
        _ => None,
    }
}

impl Script {
    /// PW-lock script owned by an Ethereum address.
    pub fn pw_lock(network: NetworkId, eth_address: [u8; 20]) -> Self {
        let code_hash = match network {
            NetworkId::Mainnet => PW_LOCK_CODE_HASH_MAINNET,
            NetworkId::Testnet => PW_LOCK_CODE_HASH_TESTNET,
        };
        Self {
            code_hash,
            hash_type: HashType::Type,
            args: eth_address.to_vec(),
        }
    }
}

/// Decode a 64-character hex string at compile time.
const fn hex_literal(s: &str) -> [u8; 32] {
    const fn nibble(c: u8) -> u8 {
        match c {
            b'0'..=b'9' => c - b'0',
            b'a'..=b'f' => c - b'a' + 10,
            _ => panic!("invalid hex digit"),
        }
    }
    let bytes = s.as_bytes();
    assert!(bytes.len() == 64, "expected 32 bytes of hex");
    let mut out = [0u8; 32];
    let mut i = 0;
    while i < 32 {
        out[i] = (nibble(bytes[2 * i]) << 4) | nibble(bytes[2 * i + 1]);
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pw_lock_code_hash_matches_hex() {
        assert_eq!(
            hex::encode(PW_LOCK_CODE_HASH_MAINNET),
            "bf43c3602455798c1a61a596e0d95278864c552fafe231c063b3fabf97a8febc"
        );
    }

    #[test]
    fn short_format_indices() {
        assert_eq!(
            short_format_code_hash(0x00, NetworkId::Testnet),
            Some(SECP256K1_BLAKE160_CODE_HASH)
        );
        assert_eq!(short_format_code_hash(0x02, NetworkId::Mainnet), Some(ACP_CODE_HASH_MAINNET));
        assert_eq!(short_format_code_hash(0x02, NetworkId::Testnet), Some(ACP_CODE_HASH_TESTNET));
        assert_eq!(short_format_code_hash(0x03, NetworkId::Mainnet), None);
    }

    #[test]
    fn pw_lock_uses_type_hash() {
        let script = Script::pw_lock(NetworkId::Mainnet, [0x11; 20]);
        assert_eq!(script.hash_type, HashType::Type);
        assert_eq!(script.args, vec![0x11; 20]);
    }
}
