use thiserror::Error;

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("mixed-case bech32 string")]
    MixedCase,

    #[error("missing bech32 separator")]
    MissingSeparator,

    #[error("invalid human-readable part: {0:?}")]
    InvalidHrp(String),

    #[error("bech32 string too short")]
    TooShort,

    #[error("invalid bech32 character {0:?}")]
    InvalidChar(char),

    #[error("invalid bech32 checksum")]
    InvalidChecksum,

    #[error("invalid bit padding")]
    InvalidPadding,

    #[error("address is for {found}, expected {expected}")]
    WrongNetwork { expected: String, found: String },

    #[error("unsupported address payload format 0x{0:02x}")]
    UnsupportedFormat(u8),

    #[error("malformed address payload: {0}")]
    MalformedPayload(String),

    #[error("invalid hex: {0}")]
    InvalidHex(String),

    #[error("expected a 20-byte address or a 33/64/65-byte secp256k1 key, got {0} bytes")]
    InvalidKeyLength(usize),

    #[error("invalid secp256k1 public key")]
    InvalidPublicKey,
}
