use anyhow::{Context, Result};

use crate::models::Id;
use crate::storage::Storage;

use super::{BalanceOutput, WalletOutput};

pub async fn list_wallets(storage: &dyn Storage) -> Result<Vec<WalletOutput>> {
    let wallets = storage.list_wallets().await?;
    Ok(wallets.into_iter().map(WalletOutput::from).collect())
}

/// Ledger records for one wallet, oldest first.
pub async fn list_balances(storage: &dyn Storage, wallet_id: &str) -> Result<Vec<BalanceOutput>> {
    let id = Id::parse(wallet_id)?;
    storage
        .get_wallet(&id)
        .await?
        .with_context(|| format!("Wallet not found: {id}"))?;

    let mut records = storage.get_balance_records(&id).await?;
    records.sort_by_key(|record| record.recorded_at);
    Ok(records.into_iter().map(BalanceOutput::from).collect())
}
