//! Ethereum native balances via the Etherscan account API.

use std::str::FromStr;

use alloy_primitives::{Address, U256};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::{debug, info};

use crate::models::{ChainId, RawBalance, WalletRef};

use super::{default_http_client, transport_error, ChainAdapter, FetchError};

const ETHERSCAN_API_BASE: &str = "https://api.etherscan.io/v2/api";
const MAINNET_CHAIN_ID: u64 = 1;
const DEFAULT_CREDENTIAL_NAME: &str = "ETHERSCAN_API_KEY";

/// Etherscan's envelope. `status` is `"1"` on success; on failure `result`
/// usually holds an error string rather than a balance. Any other `status`,
/// including a missing or non-string one, is a rejection.
#[derive(Debug, Deserialize)]
struct EtherscanResponse {
    #[serde(default)]
    status: serde_json::Value,
    #[serde(default)]
    message: String,
    #[serde(default)]
    result: serde_json::Value,
}

/// Checks `0x` + 40 hex digits, and the EIP-55 checksum when the address
/// mixes upper and lower case.
pub fn validate_evm_address(address: &str) -> Result<(), String> {
    let hex = address
        .strip_prefix("0x")
        .ok_or_else(|| "missing 0x prefix".to_string())?;

    if hex.len() != 40 {
        return Err(format!("expected 40 hex digits, got {}", hex.len()));
    }
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err("contains non-hex characters".to_string());
    }

    let has_lower = hex.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = hex.chars().any(|c| c.is_ascii_uppercase());
    if has_lower && has_upper {
        let parsed = Address::from_str(address).map_err(|e| e.to_string())?;
        if parsed.to_checksum(None) != address {
            return Err("EIP-55 checksum mismatch".to_string());
        }
    }

    Ok(())
}

/// Etherscan balance adapter.
///
/// Requires an API key. Etherscan reports failures with HTTP 200 and a
/// non-`"1"` status, so only the explicit success flag counts as success.
pub struct EtherscanAdapter {
    client: Client,
    api_base: String,
    chain_id: Option<u64>,
    api_key: Option<SecretString>,
    credential_name: String,
}

impl EtherscanAdapter {
    pub fn new(api_key: Option<SecretString>) -> Self {
        Self::with_client(default_http_client(), api_key)
    }

    pub fn with_client(client: Client, api_key: Option<SecretString>) -> Self {
        Self {
            client,
            api_base: ETHERSCAN_API_BASE.to_string(),
            chain_id: Some(MAINNET_CHAIN_ID),
            api_key,
            credential_name: DEFAULT_CREDENTIAL_NAME.to_string(),
        }
    }

    /// Override API base URL (useful for tests).
    pub fn with_base_url(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Sets the `chainid` query parameter. `None` omits it, for endpoints
    /// that predate the multichain API.
    pub fn with_chain_id(mut self, chain_id: Option<u64>) -> Self {
        self.chain_id = chain_id;
        self
    }

    /// Name reported in `MissingCredential` errors.
    pub fn with_credential_name(mut self, name: impl Into<String>) -> Self {
        self.credential_name = name.into();
        self
    }

    fn parse_balance(&self, body: EtherscanResponse) -> Result<U256, FetchError> {
        let chain = ChainId::Ethereum;

        if body.status.as_str() != Some("1") {
            let detail = match body.result.as_str() {
                Some(result) if !result.is_empty() => format!("{}: {}", body.message, result),
                _ => body.message,
            };
            return Err(FetchError::rejected(
                chain,
                format!("status {}: {}", body.status, detail),
            ));
        }

        let wei = body
            .result
            .as_str()
            .ok_or_else(|| FetchError::rejected(chain, "balance result is not a string"))?;

        U256::from_str_radix(wei.trim(), 10)
            .map_err(|e| FetchError::rejected(chain, format!("invalid wei amount {wei:?}: {e}")))
    }
}

#[async_trait::async_trait]
impl ChainAdapter for EtherscanAdapter {
    fn chain(&self) -> ChainId {
        ChainId::Ethereum
    }

    fn validate_address(&self, address: &str) -> Result<(), FetchError> {
        validate_evm_address(address)
            .map_err(|reason| FetchError::invalid_address(ChainId::Ethereum, address, reason))
    }

    async fn fetch_native_balance(&self, address: &str) -> Result<RawBalance, FetchError> {
        let chain = ChainId::Ethereum;
        self.validate_address(address)?;

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| FetchError::MissingCredential {
                chain,
                name: self.credential_name.clone(),
            })?;

        let mut query: Vec<(&str, String)> = Vec::with_capacity(6);
        if let Some(chain_id) = self.chain_id {
            query.push(("chainid", chain_id.to_string()));
        }
        query.push(("module", "account".to_string()));
        query.push(("action", "balance".to_string()));
        query.push(("address", address.to_string()));
        query.push(("tag", "latest".to_string()));
        query.push(("apikey", api_key.expose_secret().to_string()));

        debug!(chain = %chain, address, "requesting etherscan balance");

        let response = self
            .client
            .get(&self.api_base)
            .query(&query)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| transport_error(chain, e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(FetchError::unavailable(
                chain,
                format!("HTTP {status}: {body}"),
            ));
        }

        let body: EtherscanResponse = response.json().await.map_err(|e| {
            FetchError::unavailable(chain, format!("unreadable etherscan response: {e}"))
        })?;

        let wei = self.parse_balance(body)?;
        info!(chain = %chain, address, wei = %wei, "fetched native balance");

        Ok(RawBalance::new(WalletRef::ethereum(address), wei))
    }
}
