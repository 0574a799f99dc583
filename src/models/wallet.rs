use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{ChainId, Id, UnsupportedChainError};

/// The target of a balance query: one address on one chain.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WalletRef {
    pub address: String,
    pub chain: ChainId,
}

impl WalletRef {
    pub fn new(chain: ChainId, address: impl Into<String>) -> Self {
        Self {
            address: address.into().trim().to_string(),
            chain,
        }
    }

    pub fn ethereum(address: impl Into<String>) -> Self {
        Self::new(ChainId::Ethereum, address)
    }

    pub fn solana(address: impl Into<String>) -> Self {
        Self::new(ChainId::Solana, address)
    }

    /// Build a reference from an untyped chain name such as `"ETHEREUM"`.
    pub fn parse(chain: &str, address: &str) -> Result<Self, UnsupportedChainError> {
        Ok(Self::new(chain.parse()?, address))
    }

    /// `chain:address`, with EVM addresses lowercased since their case only
    /// carries a checksum.
    pub fn natural_key(&self) -> String {
        match self.chain {
            ChainId::Ethereum => format!("{}:{}", self.chain, self.address.to_ascii_lowercase()),
            ChainId::Solana => format!("{}:{}", self.chain, self.address),
        }
    }

    pub fn id(&self) -> Id {
        Id::for_wallet_key(&self.natural_key())
    }
}

/// A linked wallet as kept by storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Wallet {
    pub id: Id,
    pub chain: ChainId,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Wallet {
    pub fn new(wallet: WalletRef, label: Option<String>) -> Self {
        Self {
            id: wallet.id(),
            chain: wallet.chain,
            address: wallet.address,
            label,
            created_at: Utc::now(),
        }
    }

    pub fn wallet_ref(&self) -> WalletRef {
        WalletRef::new(self.chain, self.address.clone())
    }
}
