//! Raw address bindings from a forum profile.

use serde::{Deserialize, Serialize};
use std::fmt;

/// One address binding on a user profile, before resolution.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum AddressBinding {
    /// A CKB address bound directly (e.g. via Neuron).
    Native(String),
    /// A foreign-chain (Ethereum) address or secp256k1 public key, mapped to a
    /// CKB address through the PW-lock script.
    Derived(String),
}

impl AddressBinding {
    pub fn raw(&self) -> &str {
        match self {
            Self::Native(s) | Self::Derived(s) => s,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Native(_) => "native",
            Self::Derived(_) => "derived",
        }
    }
}

impl fmt::Display for AddressBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind(), self.raw())
    }
}
