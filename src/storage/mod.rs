mod json_file;
mod memory;

pub use json_file::JsonFileStorage;
pub use memory::MemoryStorage;

use anyhow::Result;
use rust_decimal::Decimal;

use crate::models::{BalanceRecord, Id, Wallet, WalletRef};

/// Storage trait for linked wallets and their balance ledger.
#[async_trait::async_trait]
pub trait Storage: Send + Sync {
    // Wallets
    /// All linked wallets, oldest first.
    async fn list_wallets(&self) -> Result<Vec<Wallet>>;
    async fn get_wallet(&self, id: &Id) -> Result<Option<Wallet>>;
    async fn save_wallet(&self, wallet: &Wallet) -> Result<()>;
    /// Removes the wallet and its ledger. Returns `false` if it did not exist.
    async fn delete_wallet(&self, id: &Id) -> Result<bool>;

    /// Looks a wallet up by (address, chain), ignoring EVM checksum case.
    async fn find_wallet(&self, wallet: &WalletRef) -> Result<Option<Wallet>> {
        if let Some(found) = self.get_wallet(&wallet.id()).await? {
            return Ok(Some(found));
        }

        let key = wallet.natural_key();
        Ok(self
            .list_wallets()
            .await?
            .into_iter()
            .find(|w| w.wallet_ref().natural_key() == key))
    }

    // Balance ledger
    async fn get_balance_records(&self, wallet_id: &Id) -> Result<Vec<BalanceRecord>>;

    /// Appends one record. Fails with `Wallet not found` for unknown wallets.
    async fn append_balance_record(
        &self,
        wallet_id: &Id,
        symbol: &str,
        amount: Decimal,
    ) -> Result<BalanceRecord>;
}

fn sort_wallets(wallets: &mut [Wallet]) {
    wallets.sort_by(|a, b| {
        a.created_at
            .cmp(&b.created_at)
            .then_with(|| a.id.as_str().cmp(b.id.as_str()))
    });
}
