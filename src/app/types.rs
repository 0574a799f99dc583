use serde::Serialize;

use crate::models::{BalanceRecord, Wallet};
use crate::portfolio::{AllocationLine, ChainTotal, WalletValuation};

/// JSON output for linked wallets
#[derive(Debug, Serialize)]
pub struct WalletOutput {
    pub id: String,
    pub chain: String,
    pub address: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub created_at: String,
}

impl From<Wallet> for WalletOutput {
    fn from(wallet: Wallet) -> Self {
        Self {
            id: wallet.id.to_string(),
            chain: wallet.chain.to_string(),
            address: wallet.address,
            label: wallet.label,
            created_at: wallet.created_at.to_rfc3339(),
        }
    }
}

/// JSON output for ledger records
#[derive(Debug, Serialize)]
pub struct BalanceOutput {
    pub id: String,
    pub wallet_id: String,
    pub symbol: String,
    pub amount: String,
    pub recorded_at: String,
}

impl From<BalanceRecord> for BalanceOutput {
    fn from(record: BalanceRecord) -> Self {
        Self {
            id: record.id.to_string(),
            wallet_id: record.wallet_id.to_string(),
            symbol: record.symbol,
            amount: record.amount.normalize().to_string(),
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

/// JSON output for the `portfolio` command
#[derive(Debug, Serialize)]
pub struct PortfolioOutput {
    pub as_of: String,
    pub chain: String,
    pub total_usd: String,
    pub total_display: String,
    pub wallets: Vec<WalletValuation>,
    pub chains: Vec<ChainTotal>,
    pub allocation: Vec<AllocationLine>,
    pub failed_wallets: usize,
}
