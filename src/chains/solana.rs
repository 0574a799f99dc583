//! Solana native balances via the JSON-RPC `getBalance` method.

use alloy_primitives::U256;
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use crate::models::{ChainId, RawBalance, WalletRef};

use super::{default_http_client, transport_error, ChainAdapter, FetchError};

const SOLANA_MAINNET_RPC: &str = "https://api.mainnet-beta.solana.com";
const PUBKEY_LEN: usize = 32;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<BalanceResult>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct BalanceResult {
    /// Lamports.
    value: u64,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

/// A Solana address is a base58-encoded 32-byte public key.
pub fn validate_solana_address(address: &str) -> Result<(), String> {
    if address.is_empty() {
        return Err("address is empty".to_string());
    }

    let decoded = bs58::decode(address)
        .into_vec()
        .map_err(|e| format!("invalid base58: {e}"))?;

    if decoded.len() != PUBKEY_LEN {
        return Err(format!(
            "expected {PUBKEY_LEN} bytes, decoded {}",
            decoded.len()
        ));
    }

    Ok(())
}

/// Solana JSON-RPC balance adapter.
///
/// `getBalance` already answers in lamports, so the value is used as-is.
pub struct SolanaRpcAdapter {
    client: Client,
    rpc_url: String,
    commitment: String,
}

impl SolanaRpcAdapter {
    pub fn new() -> Self {
        Self::with_client(default_http_client())
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            rpc_url: SOLANA_MAINNET_RPC.to_string(),
            commitment: "confirmed".to_string(),
        }
    }

    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_commitment(mut self, commitment: impl Into<String>) -> Self {
        self.commitment = commitment.into();
        self
    }

    fn parse_balance(body: RpcResponse) -> Result<u64, FetchError> {
        let chain = ChainId::Solana;

        if let Some(error) = body.error {
            return Err(FetchError::rejected(
                chain,
                format!("RPC error {}: {}", error.code, error.message),
            ));
        }

        body.result
            .map(|result| result.value)
            .ok_or_else(|| FetchError::unavailable(chain, "RPC response has neither result nor error"))
    }
}

impl Default for SolanaRpcAdapter {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl ChainAdapter for SolanaRpcAdapter {
    fn chain(&self) -> ChainId {
        ChainId::Solana
    }

    fn validate_address(&self, address: &str) -> Result<(), FetchError> {
        validate_solana_address(address)
            .map_err(|reason| FetchError::invalid_address(ChainId::Solana, address, reason))
    }

    async fn fetch_native_balance(&self, address: &str) -> Result<RawBalance, FetchError> {
        let chain = ChainId::Solana;
        self.validate_address(address)?;

        let request = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "getBalance",
            "params": [address, { "commitment": self.commitment }],
        });

        debug!(chain = %chain, address, rpc_url = %self.rpc_url, "requesting solana balance");

        let response = self
            .client
            .post(&self.rpc_url)
            .json(&request)
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

        let body: RpcResponse = response.json().await.map_err(|e| {
            FetchError::unavailable(chain, format!("unreadable RPC response: {e}"))
        })?;

        let lamports = Self::parse_balance(body)?;
        info!(chain = %chain, address, lamports, "fetched native balance");

        Ok(RawBalance::new(WalletRef::solana(address), U256::from(lamports)))
    }
}
