use std::sync::Arc;

use anyhow::{bail, Result};

use crate::chains::build_registry;
use crate::config::{DisplayConfig, ResolvedConfig};
use crate::format::format_usd;
use crate::market_data::build_price_oracle;
use crate::models::WalletRef;
use crate::portfolio::{AggregatedPortfolio, ChainFilter, PortfolioAggregator};
use crate::storage::Storage;

use super::PortfolioOutput;

/// Values every linked wallet matching `filter` and renders the result.
pub async fn portfolio_snapshot(
    storage: Arc<dyn Storage>,
    config: &ResolvedConfig,
    filter: ChainFilter,
) -> Result<PortfolioOutput> {
    let wallets: Vec<WalletRef> = storage
        .list_wallets()
        .await?
        .iter()
        .map(|wallet| wallet.wallet_ref())
        .filter(|wallet| filter.matches(wallet.chain))
        .collect();

    if wallets.is_empty() {
        bail!("No linked wallets for chain filter '{filter}'. Add one with `chainbook wallet add <chain> <address>`");
    }

    let registry = build_registry(config)?;
    let oracle = Arc::new(build_price_oracle(config)?);
    let aggregator = PortfolioAggregator::new(registry, oracle)
        .with_storage(storage)
        .with_fetch_config(&config.fetch);

    let portfolio = aggregator.build_portfolio(&wallets).await?;
    Ok(portfolio_output(&portfolio, filter, &config.display))
}

pub fn portfolio_output(
    portfolio: &AggregatedPortfolio,
    filter: ChainFilter,
    display: &DisplayConfig,
) -> PortfolioOutput {
    let total = portfolio.total_for(filter);

    PortfolioOutput {
        as_of: portfolio.as_of.to_rfc3339(),
        chain: filter.to_string(),
        total_usd: total.normalize().to_string(),
        total_display: format_usd(total, display),
        wallets: portfolio
            .wallets
            .iter()
            .filter(|w| filter.matches(w.wallet.chain))
            .cloned()
            .collect(),
        chains: portfolio
            .chains
            .iter()
            .filter(|c| filter.matches(c.chain))
            .cloned()
            .collect(),
        allocation: portfolio.allocation(filter),
        failed_wallets: portfolio
            .failures()
            .filter(|w| filter.matches(w.wallet.chain))
            .count(),
    }
}
