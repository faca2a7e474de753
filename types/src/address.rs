//! Canonical CKB address type.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A canonical CKB address string (`ckb1...` / `ckt1...`).
///
/// Canonical form is the lowercase full-format encoding. Use `watchdog_crypto::parse_address` to obtain one
/// from untrusted input; this type does not re-validate the checksum.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CkbAddress(String);

impl CkbAddress {
    /// Wrap an already-validated address, normalising it to lowercase.
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().to_ascii_lowercase())
    }

    /// Return the raw address string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Human-readable part (everything before the last `1` separator).
    pub fn hrp(&self) -> Option<&str> {
        self.0.rfind('1').map(|pos| &self.0[..pos])
    }

    /// Block explorer page for this address.
    pub fn explorer_url(&self, explorer_web_base: &str) -> String {
        format!("{}/address/{}", explorer_web_base.trim_end_matches('/'), self.0)
    }

    /// Shortened form for log lines.
    pub fn short(&self) -> &str {
        self.0.get(..15).unwrap_or(&self.0)
    }
}

impl fmt::Display for CkbAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
