//! Network identifier.

use crate::error::TypesError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifies which CKB network addresses belong to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkId {
    /// The production network.
    #[default]
    Mainnet,
    /// The public test network.
    Testnet,
}

impl NetworkId {
    /// Human-readable part of addresses on this network.
    pub fn hrp(&self) -> &'static str {
        match self {
            Self::Mainnet => "ckb",
            Self::Testnet => "ckt",
        }
    }

    /// Default explorer API base URL.
    pub fn default_explorer_api(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://mainnet-api.explorer.nervos.org/api/v1",
            Self::Testnet => "https://testnet-api.explorer.nervos.org/api/v1",
        }
    }

    /// Human-readable name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Mainnet => "mainnet",
            Self::Testnet => "testnet",
        }
    }
}

impl FromStr for NetworkId {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" | "main" | "ckb" => Ok(Self::Mainnet),
            "testnet" | "test" | "ckt" => Ok(Self::Testnet),
            other => Err(TypesError::UnknownNetwork(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hrp_per_network() {
        assert_eq!(NetworkId::Mainnet.hrp(), "ckb");
        assert_eq!(NetworkId::Testnet.hrp(), "ckt");
    }

    #[test]
    fn parse_aliases() {
        assert_eq!("Mainnet".parse::<NetworkId>().unwrap(), NetworkId::Mainnet);
        assert_eq!("ckt".parse::<NetworkId>().unwrap(), NetworkId::Testnet);
        assert!("devnet".parse::<NetworkId>().is_err());
    }
}
