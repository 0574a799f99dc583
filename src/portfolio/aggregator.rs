//! Fan-out over wallets, fan-in into one cross-chain portfolio.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::stream::{self, StreamExt};
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::chains::{AdapterRegistry, ChainAdapter, FetchError};
use crate::config::FetchConfig;
use crate::market_data::PriceOracle;
use crate::models::{ChainId, NormalizedAsset, PricedAsset, RawBalance, WalletRef};
use crate::storage::Storage;

use super::models::{
    AggregatedPortfolio, ChainTotal, PortfolioSnapshot, ValuationStatus, WalletValuation,
};
use super::normalize::normalize;

/// Failures that prevent building any portfolio at all.
///
/// Problems with individual wallets are reported in their
/// [`WalletValuation`] slot instead.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PortfolioError {
    #[error("No wallets given")]
    EmptyWalletList,

    #[error("Unsupported chain {chain} for wallet {address}: no adapter registered")]
    UnsupportedChain { chain: ChainId, address: String },
}

pub struct PortfolioAggregator {
    registry: AdapterRegistry,
    oracle: Arc<dyn PriceOracle>,
    storage: Option<Arc<dyn Storage>>,
    timeout: Duration,
    max_concurrent: usize,
}

impl PortfolioAggregator {
    pub fn new(registry: AdapterRegistry, oracle: Arc<dyn PriceOracle>) -> Self {
        let defaults = FetchConfig::default();
        Self {
            registry,
            oracle,
            storage: None,
            timeout: defaults.timeout,
            max_concurrent: defaults.max_concurrent,
        }
    }

    /// Append every normalized balance to this storage's ledger.
    pub fn with_storage(mut self, storage: Arc<dyn Storage>) -> Self {
        self.storage = Some(storage);
        self
    }

    /// Upper bound for each balance fetch and each price lookup.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    pub fn with_fetch_config(self, fetch: &FetchConfig) -> Self {
        self.with_timeout(fetch.timeout)
            .with_max_concurrent(fetch.max_concurrent)
    }

    /// Values every wallet and merges the results.
    ///
    /// Each wallet runs fetch, normalize, price in sequence; wallets run
    /// concurrently. The result lists wallets in input order.
    pub async fn build_portfolio(
        &self,
        wallets: &[WalletRef],
    ) -> Result<AggregatedPortfolio, PortfolioError> {
        if wallets.is_empty() {
            return Err(PortfolioError::EmptyWalletList);
        }

        let jobs = wallets
            .iter()
            .map(|wallet| {
                self.registry
                    .get(wallet.chain)
                    .map(|adapter| (wallet, adapter))
                    .ok_or_else(|| PortfolioError::UnsupportedChain {
                        chain: wallet.chain,
                        address: wallet.address.clone(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        debug!(
            wallets = jobs.len(),
            max_concurrent = self.max_concurrent,
            "building portfolio"
        );

        let valuations: Vec<WalletValuation> = stream::iter(jobs)
            .map(|(wallet, adapter)| self.value_wallet(wallet, adapter))
            .buffered(self.max_concurrent.max(1))
            .collect()
            .await;

        let portfolio = merge(valuations, Utc::now());
        info!(
            wallets = portfolio.wallets.len(),
            failed = portfolio.failures().count(),
            grand_total_usd = %portfolio.grand_total_usd,
            "portfolio built"
        );

        Ok(portfolio)
    }

    async fn value_wallet(
        &self,
        wallet: &WalletRef,
        adapter: Arc<dyn ChainAdapter>,
    ) -> WalletValuation {
        let raw = match self.fetch_stage(adapter.as_ref(), wallet).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(
                    chain = %wallet.chain,
                    address = %wallet.address,
                    kind = %e.kind(),
                    error = %e,
                    "wallet fetch failed"
                );
                return WalletValuation {
                    wallet: wallet.clone(),
                    status: ValuationStatus::Failed {
                        kind: e.kind(),
                        message: e.to_string(),
                    },
                };
            }
        };

        let asset = normalize(&raw);
        self.record_balance(wallet, &asset).await;
        let priced = self.price_stage(asset).await;

        WalletValuation {
            wallet: wallet.clone(),
            status: ValuationStatus::Valued(PortfolioSnapshot::new(wallet.clone(), priced)),
        }
    }

    /// Validates locally, then makes the single bounded upstream call.
    async fn fetch_stage(
        &self,
        adapter: &dyn ChainAdapter,
        wallet: &WalletRef,
    ) -> Result<RawBalance, FetchError> {
        adapter.validate_address(&wallet.address)?;

        match tokio::time::timeout(self.timeout, adapter.fetch_native_balance(&wallet.address))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(FetchError::unavailable(
                wallet.chain,
                format!("timed out after {:?}", self.timeout),
            )),
        }
    }

    /// A missing price degrades the asset to `price_unavailable`.
    async fn price_stage(&self, asset: NormalizedAsset) -> PricedAsset {
        let lookup = tokio::time::timeout(self.timeout, self.oracle.unit_price_usd(&asset.symbol));

        match lookup.await {
            Ok(Ok(price)) => PricedAsset::priced(asset, price),
            Ok(Err(e)) => {
                warn!(symbol = %asset.symbol, error = %e, "price unavailable");
                PricedAsset::unpriced(asset)
            }
            Err(_) => {
                warn!(symbol = %asset.symbol, timeout = ?self.timeout, "price lookup timed out");
                PricedAsset::unpriced(asset)
            }
        }
    }

    async fn record_balance(&self, wallet: &WalletRef, asset: &NormalizedAsset) {
        let Some(storage) = &self.storage else {
            return;
        };

        // Ledger rows belong to the id the wallet was stored under, which need
        // not be its natural-key id.
        let wallet_id = match storage.find_wallet(wallet).await {
            Ok(Some(stored)) => stored.id,
            Ok(None) => {
                warn!(
                    chain = %wallet.chain,
                    address = %wallet.address,
                    "wallet is not linked; balance not recorded"
                );
                return;
            }
            Err(e) => {
                warn!(
                    chain = %wallet.chain,
                    address = %wallet.address,
                    error = %e,
                    "failed to look up wallet for ledger"
                );
                return;
            }
        };

        if let Err(e) = storage
            .append_balance_record(&wallet_id, &asset.symbol, asset.decimal_amount)
            .await
        {
            warn!(
                chain = %wallet.chain,
                address = %wallet.address,
                wallet_id = %wallet_id,
                error = %e,
                "failed to record balance"
            );
        }
    }
}

/// Combines per-wallet results. Failed slots count toward nothing.
pub fn merge(wallets: Vec<WalletValuation>, as_of: DateTime<Utc>) -> AggregatedPortfolio {
    let mut chains: Vec<ChainTotal> = Vec::new();

    for valuation in &wallets {
        let chain = valuation.wallet.chain;
        let index = match chains.iter().position(|total| total.chain == chain) {
            Some(index) => index,
            None => {
                chains.push(ChainTotal::new(chain));
                chains.len() - 1
            }
        };

        if let Some(snapshot) = valuation.snapshot() {
            let total = &mut chains[index];
            total.totals.usd = total.totals.usd.saturating_add(snapshot.totals.usd);
            total.snapshots.push(snapshot.clone());
        }
    }

    let grand_total_usd = chains
        .iter()
        .map(|total| total.totals.usd)
        .fold(Decimal::ZERO, Decimal::saturating_add);

    AggregatedPortfolio {
        as_of,
        wallets,
        chains,
        grand_total_usd,
    }
}
