use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::ResolvedConfig;
use crate::models::ChainId;

use super::{ChainAdapter, EtherscanAdapter, SolanaRpcAdapter};

pub const USER_AGENT: &str = concat!("chainbook/", env!("CARGO_PKG_VERSION"));

/// Request timeout for clients built without a config.
pub const DEFAULT_HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// HTTP client shared by adapters and price sources. Every request it sends
/// is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
}

/// [`http_client`] with [`DEFAULT_HTTP_TIMEOUT`], for standalone adapters.
pub(crate) fn default_http_client() -> reqwest::Client {
    http_client(DEFAULT_HTTP_TIMEOUT).unwrap_or_default()
}

/// Chain adapters keyed by the chain they serve.
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ChainId, Arc<dyn ChainAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Self::register`].
    pub fn with_adapter(mut self, adapter: Arc<dyn ChainAdapter>) -> Self {
        self.register(adapter);
        self
    }

    /// Registers `adapter` under its own chain, replacing any previous one.
    pub fn register(&mut self, adapter: Arc<dyn ChainAdapter>) {
        self.adapters.insert(adapter.chain(), adapter);
    }

    pub fn get(&self, chain: ChainId) -> Option<Arc<dyn ChainAdapter>> {
        self.adapters.get(&chain).cloned()
    }

    pub fn contains(&self, chain: ChainId) -> bool {
        self.adapters.contains_key(&chain)
    }

    /// Registered chains in [`ChainId::ALL`] order.
    pub fn chains(&self) -> Vec<ChainId> {
        ChainId::ALL
            .iter()
            .copied()
            .filter(|chain| self.adapters.contains_key(chain))
            .collect()
    }

    /// Builds the Etherscan and Solana RPC adapters from resolved config.
    pub fn from_config(config: &ResolvedConfig) -> Result<Self> {
        let client = http_client(config.fetch.timeout).context("Failed to build HTTP client")?;

        let ethereum = EtherscanAdapter::with_client(client.clone(), config.ethereum.api_key.clone())
            .with_base_url(config.ethereum.api_base.clone())
            .with_chain_id(config.ethereum.chain_id)
            .with_credential_name(config.ethereum.api_key_name.clone());

        let solana = SolanaRpcAdapter::with_client(client)
            .with_rpc_url(config.solana.rpc_url.clone())
            .with_commitment(config.solana.commitment.clone());

        Ok(Self::new()
            .with_adapter(Arc::new(ethereum))
            .with_adapter(Arc::new(solana)))
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdapterRegistry")
            .field("chains", &self.chains())
            .finish()
    }
}

/// Registry with one adapter per supported chain, configured from `config`.
pub fn build_registry(config: &ResolvedConfig) -> Result<AdapterRegistry> {
    AdapterRegistry::from_config(config)
}
