#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use alloy_primitives::U256;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

use chainbook::chains::{validate_evm_address, validate_solana_address, ChainAdapter, FetchError};
use chainbook::market_data::{PriceError, PriceOracle};
use chainbook::models::{BalanceRecord, ChainId, Id, RawBalance, Wallet, WalletRef};
use chainbook::storage::{MemoryStorage, Storage};

// EIP-55 checksummed test vectors.
pub const ETH_ADDRESS: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
pub const ETH_ADDRESS_2: &str = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
pub const SOL_ADDRESS: &str = "So11111111111111111111111111111111111111112";
pub const SOL_ADDRESS_2: &str = "11111111111111111111111111111111";

pub const TWO_AND_A_HALF_ETH: u128 = 2_500_000_000_000_000_000;
pub const ONE_AND_A_HALF_SOL: u128 = 1_500_000_000;

/// Chain adapter serving canned balances and counting upstream calls.
pub struct FakeAdapter {
    chain: ChainId,
    balances: HashMap<String, Result<U256, FetchError>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeAdapter {
    pub fn new(chain: ChainId) -> Self {
        Self {
            chain,
            balances: HashMap::new(),
            delay: None,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_balance(mut self, address: &str, amount: u128) -> Self {
        self.balances
            .insert(address.to_string(), Ok(U256::from(amount)));
        self
    }

    pub fn with_error(mut self, address: &str, error: FetchError) -> Self {
        self.balances.insert(address.to_string(), Err(error));
        self
    }

    /// Every fetch sleeps this long before answering.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainAdapter for FakeAdapter {
    fn chain(&self) -> ChainId {
        self.chain
    }

    fn validate_address(&self, address: &str) -> Result<(), FetchError> {
        let result = match self.chain {
            ChainId::Ethereum => validate_evm_address(address),
            ChainId::Solana => validate_solana_address(address),
        };
        result.map_err(|reason| FetchError::invalid_address(self.chain, address, reason))
    }

    async fn fetch_native_balance(&self, address: &str) -> Result<RawBalance, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.validate_address(address)?;

        match self.balances.get(address) {
            Some(Ok(amount)) => Ok(RawBalance::new(WalletRef::new(self.chain, address), *amount)),
            Some(Err(e)) => Err(e.clone()),
            None => Err(FetchError::unavailable(self.chain, "no canned balance")),
        }
    }
}

/// Price oracle whose prices can change between portfolio builds.
#[derive(Default)]
pub struct FakeOracle {
    prices: Mutex<HashMap<String, Decimal>>,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(self, symbol: &str, price: i64) -> Self {
        self.set_price(symbol, Decimal::from(price));
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn set_price(&self, symbol: &str, price: Decimal) {
        if let Ok(mut prices) = self.prices.lock() {
            prices.insert(symbol.to_string(), price);
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PriceOracle for FakeOracle {
    async fn unit_price_usd(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let price = self.prices.lock().ok().and_then(|p| p.get(symbol).copied());
        price.ok_or_else(|| PriceError::unavailable(symbol, "not quoted"))
    }

    fn name(&self) -> &str {
        "fake"
    }
}

/// Storage whose ledger rejects every write.
#[derive(Default)]
pub struct BrokenLedgerStorage {
    inner: MemoryStorage,
    append_attempts: AtomicUsize,
}

impl BrokenLedgerStorage {
    pub fn append_attempts(&self) -> usize {
        self.append_attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Storage for BrokenLedgerStorage {
    async fn list_wallets(&self) -> Result<Vec<Wallet>> {
        self.inner.list_wallets().await
    }

    async fn get_wallet(&self, id: &Id) -> Result<Option<Wallet>> {
        self.inner.get_wallet(id).await
    }

    async fn save_wallet(&self, wallet: &Wallet) -> Result<()> {
        self.inner.save_wallet(wallet).await
    }

    async fn delete_wallet(&self, id: &Id) -> Result<bool> {
        self.inner.delete_wallet(id).await
    }

    async fn get_balance_records(&self, wallet_id: &Id) -> Result<Vec<BalanceRecord>> {
        self.inner.get_balance_records(wallet_id).await
    }

    async fn append_balance_record(
        &self,
        _wallet_id: &Id,
        _symbol: &str,
        _amount: Decimal,
    ) -> Result<BalanceRecord> {
        self.append_attempts.fetch_add(1, Ordering::SeqCst);
        anyhow::bail!("disk full")
    }
}
