// src/storage/memory.rs
//! In-memory storage implementation for testing.

use std::collections::HashMap;

use anyhow::{bail, Result};
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::models::{BalanceRecord, Id, Wallet};

use super::{sort_wallets, Storage};

/// In-memory storage for tests and one-shot runs.
pub struct MemoryStorage {
    wallets: Mutex<HashMap<Id, Wallet>>,
    balances: Mutex<HashMap<Id, Vec<BalanceRecord>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            wallets: Mutex::new(HashMap::new()),
            balances: Mutex::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl Storage for MemoryStorage {
    async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        let wallets = self.wallets.lock().await;
        let mut list: Vec<Wallet> = wallets.values().cloned().collect();
        sort_wallets(&mut list);
        Ok(list)
    }

    async fn get_wallet(&self, id: &Id) -> Result<Option<Wallet>> {
        let wallets = self.wallets.lock().await;
        Ok(wallets.get(id).cloned())
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        let mut wallets = self.wallets.lock().await;
        wallets.insert(wallet.id.clone(), wallet.clone());
        Ok(())
    }

    async fn delete_wallet(&self, id: &Id) -> Result<bool> {
        let removed = self.wallets.lock().await.remove(id).is_some();
        self.balances.lock().await.remove(id);
        Ok(removed)
    }

    async fn get_balance_records(&self, wallet_id: &Id) -> Result<Vec<BalanceRecord>> {
        let balances = self.balances.lock().await;
        Ok(balances.get(wallet_id).cloned().unwrap_or_default())
    }

    async fn append_balance_record(
        &self,
        wallet_id: &Id,
        symbol: &str,
        amount: Decimal,
    ) -> Result<BalanceRecord> {
        if !self.wallets.lock().await.contains_key(wallet_id) {
            bail!("Wallet not found: {wallet_id}");
        }

        let record = BalanceRecord::new(wallet_id.clone(), symbol, amount);
        let mut balances = self.balances.lock().await;
        balances
            .entry(wallet_id.clone())
            .or_default()
            .push(record.clone());
        Ok(record)
    }
}
