use std::sync::Arc;

use anyhow::{Context, Result};

use crate::chains::http_client;
use crate::config::ResolvedConfig;
use crate::market_data::providers::CoinGeckoPriceOracle;
use crate::market_data::{PriceOracle, PriceOracleRouter, StaticPriceOracle};

/// Builds the price chain from configuration: fixed prices first, then
/// CoinGecko when enabled.
pub fn build_price_oracle(config: &ResolvedConfig) -> Result<PriceOracleRouter> {
    let mut oracles: Vec<Arc<dyn PriceOracle>> = Vec::new();

    let fixed = StaticPriceOracle::new().with_prices(
        config
            .prices
            .fixed
            .iter()
            .map(|(symbol, price)| (symbol.as_str(), *price)),
    );
    if !fixed.is_empty() {
        oracles.push(Arc::new(fixed));
    }

    if config.prices.coingecko {
        let client = http_client(config.fetch.timeout).context("Failed to build HTTP client")?;

        let coingecko = CoinGeckoPriceOracle::with_client(client)
            .with_base_url(config.prices.coingecko_base.clone())
            .with_api_key(config.prices.api_key.clone())
            .with_custom_mappings(config.prices.mappings.clone());
        oracles.push(Arc::new(coingecko));
    }

    Ok(PriceOracleRouter::new(oracles))
}
