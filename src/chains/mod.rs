//! Chain balance adapters.
//!
//! Each supported chain has one adapter that turns an address into a
//! [`RawBalance`] in the chain's smallest unit. Chain-specific quirks (address
//! formats, success flags, RPC envelopes) stay behind the [`ChainAdapter`]
//! trait so the aggregator never branches on the chain.

mod ethereum;
mod registry;
mod solana;

pub use ethereum::{validate_evm_address, EtherscanAdapter};
pub use registry::{build_registry, http_client, AdapterRegistry, DEFAULT_HTTP_TIMEOUT, USER_AGENT};
pub(crate) use registry::default_http_client;
pub use solana::{validate_solana_address, SolanaRpcAdapter};

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::{ChainId, RawBalance};

/// Serializable category of a [`FetchError`], attached to failed wallet slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidAddress,
    MissingCredential,
    UpstreamUnavailable,
    UpstreamRejected,
}

impl fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FetchErrorKind::InvalidAddress => "invalid_address",
            FetchErrorKind::MissingCredential => "missing_credential",
            FetchErrorKind::UpstreamUnavailable => "upstream_unavailable",
            FetchErrorKind::UpstreamRejected => "upstream_rejected",
        };
        f.write_str(name)
    }
}

/// Why a single wallet's balance could not be fetched.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
pub enum FetchError {
    /// The address is malformed for its chain. Raised before any I/O.
    #[error("Invalid {chain} address {address:?}: {reason}")]
    InvalidAddress {
        chain: ChainId,
        address: String,
        reason: String,
    },

    /// The adapter needs a credential that is not configured.
    #[error("Missing credential {name} for {chain}")]
    MissingCredential { chain: ChainId, name: String },

    /// Transport failure, timeout, non-success HTTP status or unreadable body.
    #[error("{chain} balance source unavailable: {message}")]
    UpstreamUnavailable { chain: ChainId, message: String },

    /// The source answered but reported an error for the request.
    #[error("{chain} balance source rejected the request: {message}")]
    UpstreamRejected { chain: ChainId, message: String },
}

impl FetchError {
    pub fn kind(&self) -> FetchErrorKind {
        match self {
            FetchError::InvalidAddress { .. } => FetchErrorKind::InvalidAddress,
            FetchError::MissingCredential { .. } => FetchErrorKind::MissingCredential,
            FetchError::UpstreamUnavailable { .. } => FetchErrorKind::UpstreamUnavailable,
            FetchError::UpstreamRejected { .. } => FetchErrorKind::UpstreamRejected,
        }
    }

    pub fn chain(&self) -> ChainId {
        match self {
            FetchError::InvalidAddress { chain, .. }
            | FetchError::MissingCredential { chain, .. }
            | FetchError::UpstreamUnavailable { chain, .. }
            | FetchError::UpstreamRejected { chain, .. } => *chain,
        }
    }

    pub fn invalid_address(chain: ChainId, address: &str, reason: impl Into<String>) -> Self {
        FetchError::InvalidAddress {
            chain,
            address: address.to_string(),
            reason: reason.into(),
        }
    }

    pub fn unavailable(chain: ChainId, message: impl fmt::Display) -> Self {
        FetchError::UpstreamUnavailable {
            chain,
            message: message.to_string(),
        }
    }

    pub fn rejected(chain: ChainId, message: impl fmt::Display) -> Self {
        FetchError::UpstreamRejected {
            chain,
            message: message.to_string(),
        }
    }
}

/// Fetches the native balance of an address from one chain's data source.
#[async_trait::async_trait]
pub trait ChainAdapter: Send + Sync {
    fn chain(&self) -> ChainId;

    /// Syntactic check of `address` for this chain. Never touches the network.
    fn validate_address(&self, address: &str) -> Result<(), FetchError>;

    /// Validates `address`, then issues exactly one request to the chain's
    /// balance source.
    async fn fetch_native_balance(&self, address: &str) -> Result<RawBalance, FetchError>;
}

/// Maps a reqwest transport error onto the chain's error taxonomy.
pub(crate) fn transport_error(chain: ChainId, err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::unavailable(chain, "request timed out")
    } else {
        FetchError::unavailable(chain, err)
    }
}
