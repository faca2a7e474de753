//! Bech32 / Bech32m codec (BIP-173, BIP-350).
//!
//! CKB addresses exceed the 90-character limit of BIP-173, so no length cap is
//! enforced here.

use crate::error::CryptoError;

/// Bech32 data alphabet.
const CHARSET: &[u8; 32] = b"qpzry9x8gf2tvdw0s3jn54khce6mua7l";

/// Reverse lookup table: ASCII byte → 5-bit value (0xFF = invalid).
const CHARSET_DECODE: [u8; 128] = {
    let mut table = [0xFFu8; 128];
    let mut i = 0;
    while i < 32 {
        table[CHARSET[i] as usize] = i as u8;
        i += 1;
    }
    table
};

const GENERATOR: [u32; 5] = [0x3b6a_57b2, 0x2650_8e6d, 0x1ea1_19fa, 0x3d42_33dd, 0x2a14_62b3];

/// Number of checksum characters.
const CHECKSUM_LEN: usize = 6;

/// Checksum variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Variant {
    /// BIP-173; used by CKB short and deprecated full addresses.
    Bech32,
    /// BIP-350; used by CKB full addresses.
    Bech32m,
}

impl Variant {
    fn constant(self) -> u32 {
        match self {
            Self::Bech32 => 1,
            Self::Bech32m => 0x2bc8_30a3,
        }
    }

    fn from_residue(residue: u32) -> Option<Self> {
        match residue {
            1 => Some(Self::Bech32),
            0x2bc8_30a3 => Some(Self::Bech32m),
            _ => None,
        }
    }
}

fn polymod(values: impl Iterator<Item = u8>) -> u32 {
    let mut chk: u32 = 1;
    for v in values {
        let top = chk >> 25;
        chk = ((chk & 0x01ff_ffff) << 5) ^ v as u32;
        for (i, g) in GENERATOR.iter().enumerate() {
            if (top >> i) & 1 == 1 {
                chk ^= g;
            }
        }
    }
    chk
}

fn hrp_expand(hrp: &str) -> impl Iterator<Item = u8> + '_ {
    hrp.bytes()
        .map(|b| b >> 5)
        .chain(std::iter::once(0))
        .chain(hrp.bytes().map(|b| b & 0x1f))
}

/// Regroup a bit stream from `from`-bit to `to`-bit words.
///
/// With `pad`, trailing bits are zero-padded into a final word. Without it,
/// leftover bits must be fewer than `from` and all zero.
pub fn convert_bits(data: &[u8], from: u32, to: u32, pad: bool) -> Result<Vec<u8>, CryptoError> {
    let mut acc: u32 = 0;
    let mut bits: u32 = 0;
    let max_value: u32 = (1 << to) - 1;
    let max_acc: u32 = (1 << (from + to - 1)) - 1;
    let mut out = Vec::with_capacity(data.len() * from as usize / to as usize + 1);

    for &value in data {
        let v = value as u32;
        if v >> from != 0 {
            return Err(CryptoError::InvalidPadding);
        }
        acc = ((acc << from) | v) & max_acc;
        bits += from;
        while bits >= to {
            bits -= to;
            out.push(((acc >> bits) & max_value) as u8);
        }
    }

    if pad {
        if bits > 0 {
            out.push(((acc << (to - bits)) & max_value) as u8);
        }
    } else if bits >= from || ((acc << (to - bits)) & max_value) != 0 {
        return Err(CryptoError::InvalidPadding);
    }

    Ok(out)
}

/// Encode 5-bit `data` under `hrp` with the given checksum variant.
pub fn encode(hrp: &str, data: &[u8], variant: Variant) -> String {
    let residue = polymod(
        hrp_expand(hrp)
            .chain(data.iter().copied())
            .chain(std::iter::repeat(0).take(CHECKSUM_LEN)),
    ) ^ variant.constant();

    let mut out = String::with_capacity(hrp.len() + 1 + data.len() + CHECKSUM_LEN);
    out.push_str(hrp);
    out.push('1');
    for &d in data {
        out.push(CHARSET[d as usize] as char);
    }
    for i in 0..CHECKSUM_LEN {
        let idx = (residue >> (5 * (5 - i))) & 0x1f;
        out.push(CHARSET[idx as usize] as char);
    }
    out
}

/// A decoded bech32 string: lowercase hrp, 5-bit data without checksum, variant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Decoded {
    pub hrp: String,
    pub data: Vec<u8>,
    pub variant: Variant,
}

/// Decode and checksum-verify a bech32 or bech32m string.
pub fn decode(s: &str) -> Result<Decoded, CryptoError> {
    let has_lower = s.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = s.bytes().any(|b| b.is_ascii_uppercase());
    if has_lower && has_upper {
        return Err(CryptoError::MixedCase);
    }
    let s = s.to_ascii_lowercase();

    let sep = s.rfind('1').ok_or(CryptoError::MissingSeparator)?;
    let (hrp, rest) = (&s[..sep], &s[sep + 1..]);
    if hrp.is_empty() || !hrp.bytes().all(|b| (33..=126).contains(&b)) {
        return Err(CryptoError::InvalidHrp(hrp.to_string()));
    }
    if rest.len() < CHECKSUM_LEN {
        return Err(CryptoError::TooShort);
    }

    let mut values = Vec::with_capacity(rest.len());
    for c in rest.chars() {
        let v = u8::try_from(c)
            .ok()
            .filter(|b| *b < 128)
            .map(|b| CHARSET_DECODE[b as usize])
            .filter(|v| *v != 0xFF)
            .ok_or(CryptoError::InvalidChar(c))?;
        values.push(v);
    }

    let residue = polymod(hrp_expand(hrp).chain(values.iter().copied()));
    let variant = Variant::from_residue(residue).ok_or(CryptoError::InvalidChecksum)?;

    values.truncate(values.len() - CHECKSUM_LEN);
    Ok(Decoded {
        hrp: hrp.to_string(),
        data: values,
        variant,
    })
}
