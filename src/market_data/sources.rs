use std::collections::HashMap;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::debug;

/// A USD price could not be resolved for a symbol.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum PriceError {
    #[error("No USD price for {symbol}: {reason}")]
    Unavailable { symbol: String, reason: String },
}

impl PriceError {
    pub fn unavailable(symbol: &str, reason: impl std::fmt::Display) -> Self {
        PriceError::Unavailable {
            symbol: symbol.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Resolves a spot USD price for an asset symbol such as `ETH`.
#[async_trait::async_trait]
pub trait PriceOracle: Send + Sync {
    async fn unit_price_usd(&self, symbol: &str) -> Result<Decimal, PriceError>;

    fn name(&self) -> &str;
}

/// Fixed price table. Symbols are matched case-insensitively.
#[derive(Debug, Clone, Default)]
pub struct StaticPriceOracle {
    prices: HashMap<String, Decimal>,
}

impl StaticPriceOracle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price(mut self, symbol: &str, price: Decimal) -> Self {
        self.prices.insert(symbol.to_uppercase(), price);
        self
    }

    pub fn with_prices<I, S>(mut self, prices: I) -> Self
    where
        I: IntoIterator<Item = (S, Decimal)>,
        S: AsRef<str>,
    {
        for (symbol, price) in prices {
            self.prices.insert(symbol.as_ref().to_uppercase(), price);
        }
        self
    }

    pub fn is_empty(&self) -> bool {
        self.prices.is_empty()
    }
}

#[async_trait::async_trait]
impl PriceOracle for StaticPriceOracle {
    async fn unit_price_usd(&self, symbol: &str) -> Result<Decimal, PriceError> {
        self.prices
            .get(&symbol.to_uppercase())
            .copied()
            .ok_or_else(|| PriceError::unavailable(symbol, "no fixed price configured"))
    }

    fn name(&self) -> &str {
        "static"
    }
}

/// Tries each oracle in order and returns the first price found.
pub struct PriceOracleRouter {
    oracles: Vec<Arc<dyn PriceOracle>>,
}

impl PriceOracleRouter {
    pub fn new(oracles: Vec<Arc<dyn PriceOracle>>) -> Self {
        Self { oracles }
    }

    pub fn len(&self) -> usize {
        self.oracles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.oracles.is_empty()
    }
}

#[async_trait::async_trait]
impl PriceOracle for PriceOracleRouter {
    async fn unit_price_usd(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let mut last_error = None;

        for oracle in &self.oracles {
            match oracle.unit_price_usd(symbol).await {
                Ok(price) => return Ok(price),
                Err(e) => {
                    debug!(oracle = oracle.name(), symbol, error = %e, "price source missed");
                    last_error = Some(e);
                }
            }
        }

        Err(last_error
            .unwrap_or_else(|| PriceError::unavailable(symbol, "no price sources configured")))
    }

    fn name(&self) -> &str {
        "router"
    }
}
