use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("Unsupported chain {0:?}: expected ethereum or solana")]
pub struct UnsupportedChainError(pub String);

/// A supported blockchain network.
///
/// Each chain carries fixed constants for its native asset. Decimals are part
/// of the chain definition and are never read from an upstream response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainId {
    #[serde(alias = "ETHEREUM")]
    Ethereum,
    #[serde(alias = "SOLANA")]
    Solana,
}

impl ChainId {
    pub const ALL: [ChainId; 2] = [ChainId::Ethereum, ChainId::Solana];

    pub fn as_str(self) -> &'static str {
        match self {
            ChainId::Ethereum => "ethereum",
            ChainId::Solana => "solana",
        }
    }

    pub fn display_name(self) -> &'static str {
        match self {
            ChainId::Ethereum => "Ethereum",
            ChainId::Solana => "Solana",
        }
    }

    /// Symbol of the chain's native asset.
    pub fn native_symbol(self) -> &'static str {
        match self {
            ChainId::Ethereum => "ETH",
            ChainId::Solana => "SOL",
        }
    }

    /// Decimal exponent of the native asset's smallest unit (wei, lamport).
    pub fn native_decimals(self) -> u32 {
        match self {
            ChainId::Ethereum => 18,
            ChainId::Solana => 9,
        }
    }
}

impl fmt::Display for ChainId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChainId {
    type Err = UnsupportedChainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "ethereum" | "eth" => Ok(ChainId::Ethereum),
            "solana" | "sol" => Ok(ChainId::Solana),
            _ => Err(UnsupportedChainError(value.to_string())),
        }
    }
}
