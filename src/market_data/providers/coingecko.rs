//! CoinGecko spot prices via the `/simple/price` endpoint.
//!
//! No API key is required. A demo key, when configured, is sent in the
//! `x-cg-demo-api-key` header and raises the rate limit.

use std::collections::HashMap;
use std::str::FromStr;

use reqwest::Client;
use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::value::RawValue;
use tracing::debug;

use crate::chains::default_http_client;
use crate::market_data::{PriceError, PriceOracle};

const COINGECKO_API_BASE: &str = "https://api.coingecko.com/api/v3";
const QUOTE_CURRENCY: &str = "usd";

/// `{"ethereum": {"usd": 3012.55}}`. Prices are kept as raw JSON text so they
/// parse into `Decimal` without a trip through `f64`.
type SimplePriceResponse = HashMap<String, HashMap<String, Box<RawValue>>>;

pub struct CoinGeckoPriceOracle {
    client: Client,
    api_base: String,
    api_key: Option<SecretString>,
    /// Custom symbol to CoinGecko ID mappings (overrides defaults)
    custom_mappings: HashMap<String, String>,
}

impl CoinGeckoPriceOracle {
    pub fn new() -> Self {
        Self::with_client(default_http_client())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            api_base: COINGECKO_API_BASE.to_string(),
            api_key: None,
            custom_mappings: HashMap::new(),
        }
    }

    /// Override API base URL (useful for tests).
    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_api_key(mut self, api_key: Option<SecretString>) -> Self {
        self.api_key = api_key;
        self
    }

    pub fn with_custom_mappings(mut self, mappings: HashMap<String, String>) -> Self {
        self.custom_mappings = mappings
            .into_iter()
            .map(|(symbol, id)| (symbol.to_uppercase(), id))
            .collect();
        self
    }

    pub fn with_mapping(mut self, symbol: impl Into<String>, coingecko_id: impl Into<String>) -> Self {
        self.custom_mappings
            .insert(symbol.into().to_uppercase(), coingecko_id.into());
        self
    }

    /// Custom mappings first, then the built-in table, then the lowercased
    /// symbol itself.
    fn coingecko_id(&self, symbol: &str) -> String {
        let symbol_upper = symbol.to_uppercase();

        if let Some(id) = self.custom_mappings.get(&symbol_upper) {
            return id.clone();
        }

        let id = match symbol_upper.as_str() {
            "ETH" => "ethereum",
            "SOL" => "solana",
            "BTC" => "bitcoin",
            "WETH" => "weth",
            "WBTC" => "wrapped-bitcoin",
            "STETH" => "staked-ether",
            "USDC" => "usd-coin",
            "USDT" => "tether",
            "DAI" => "dai",
            "MATIC" | "POL" => "matic-network",
            "ARB" => "arbitrum",
            "OP" => "optimism",
            "JUP" => "jupiter-exchange-solana",
            "BONK" => "bonk",
            _ => return symbol.to_lowercase(),
        };

        id.to_string()
    }

    fn parse_price(symbol: &str, coingecko_id: &str, body: &SimplePriceResponse) -> Result<Decimal, PriceError> {
        let raw = body
            .get(coingecko_id)
            .and_then(|quotes| quotes.get(QUOTE_CURRENCY))
            .ok_or_else(|| {
                PriceError::unavailable(symbol, format!("no {QUOTE_CURRENCY} quote for {coingecko_id}"))
            })?;

        let text = raw.get();
        Decimal::from_str(text)
            .or_else(|_| Decimal::from_scientific(text))
            .map_err(|e| PriceError::unavailable(symbol, format!("invalid price {text}: {e}")))
    }
}

impl Default for CoinGeckoPriceOracle {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl PriceOracle for CoinGeckoPriceOracle {
    async fn unit_price_usd(&self, symbol: &str) -> Result<Decimal, PriceError> {
        let coingecko_id = self.coingecko_id(symbol);
        let url = format!("{}/simple/price", self.api_base);

        debug!(symbol, coingecko_id = %coingecko_id, "requesting coingecko price");

        let mut request = self
            .client
            .get(&url)
            .query(&[("ids", coingecko_id.as_str()), ("vs_currencies", QUOTE_CURRENCY)])
            .header("Accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key.expose_secret());
        }

        let response = request
            .send()
            .await
            .map_err(|e| PriceError::unavailable(symbol, e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(PriceError::unavailable(
                symbol,
                format!("CoinGecko simple/price API error: {status} - {body}"),
            ));
        }

        let body: SimplePriceResponse = response
            .json()
            .await
            .map_err(|e| PriceError::unavailable(symbol, format!("unreadable response: {e}")))?;

        Self::parse_price(symbol, &coingecko_id, &body)
    }

    fn name(&self) -> &str {
        "coingecko"
    }
}
