use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::chains::DEFAULT_HTTP_TIMEOUT;
use crate::duration::{deserialize_duration, serialize_duration};

fn default_etherscan_api_base() -> String {
    "https://api.etherscan.io/v2/api".to_string()
}

fn default_etherscan_chain_id() -> Option<u64> {
    Some(1)
}

fn default_etherscan_key_env() -> String {
    "ETHERSCAN_API_KEY".to_string()
}

fn default_solana_rpc_env() -> String {
    "SOLANA_RPC_URL".to_string()
}

fn default_solana_rpc_url() -> String {
    "https://api.mainnet-beta.solana.com".to_string()
}

fn default_commitment() -> String {
    "confirmed".to_string()
}

fn default_coingecko_base() -> String {
    "https://api.coingecko.com/api/v3".to_string()
}

fn default_coingecko_key_env() -> String {
    "COINGECKO_API_KEY".to_string()
}

fn default_timeout() -> Duration {
    DEFAULT_HTTP_TIMEOUT
}

fn default_true() -> bool {
    true
}

/// Etherscan settings for the Ethereum adapter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EthereumConfig {
    #[serde(default = "default_etherscan_api_base")]
    pub api_base: String,

    /// `chainid` parameter of the multichain API. `0` leaves the parameter
    /// off, for single-chain endpoints.
    #[serde(default = "default_etherscan_chain_id")]
    pub chain_id: Option<u64>,

    /// Inline API key. Prefer `api_key_env` so the key stays out of the file.
    pub api_key: Option<String>,

    /// Environment variable read for the API key when `api_key` is unset.
    #[serde(default = "default_etherscan_key_env")]
    pub api_key_env: String,
}

impl Default for EthereumConfig {
    fn default() -> Self {
        Self {
            api_base: default_etherscan_api_base(),
            chain_id: default_etherscan_chain_id(),
            api_key: None,
            api_key_env: default_etherscan_key_env(),
        }
    }
}

/// Solana RPC settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SolanaConfig {
    /// RPC endpoint. Falls back to `rpc_url_env`, then mainnet-beta.
    pub rpc_url: Option<String>,

    #[serde(default = "default_solana_rpc_env")]
    pub rpc_url_env: String,

    #[serde(default = "default_commitment")]
    pub commitment: String,
}

impl Default for SolanaConfig {
    fn default() -> Self {
        Self {
            rpc_url: None,
            rpc_url_env: default_solana_rpc_env(),
            commitment: default_commitment(),
        }
    }
}

/// Price oracle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PricesConfig {
    /// Query CoinGecko for prices not listed in `fixed`.
    #[serde(default = "default_true")]
    pub coingecko: bool,

    #[serde(default = "default_coingecko_base")]
    pub coingecko_base: String,

    /// Environment variable holding an optional CoinGecko demo API key.
    #[serde(default = "default_coingecko_key_env")]
    pub api_key_env: String,

    /// Fixed USD prices by symbol. Consulted before any network source.
    pub fixed: BTreeMap<String, Decimal>,

    /// Extra symbol to CoinGecko id mappings.
    pub mappings: HashMap<String, String>,
}

impl Default for PricesConfig {
    fn default() -> Self {
        Self {
            coingecko: true,
            coingecko_base: default_coingecko_base(),
            api_key_env: default_coingecko_key_env(),
            fixed: BTreeMap::new(),
            mappings: HashMap::new(),
        }
    }
}

/// Network call limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Upper bound for any single balance or price request.
    #[serde(
        default = "default_timeout",
        serialize_with = "serialize_duration",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// Maximum wallets fetched concurrently within one portfolio build.
    pub max_concurrent: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: default_timeout(),
            max_concurrent: 8,
        }
    }
}

/// Display/output formatting configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Rounding applied to USD values in `*_display` fields. Calculations are
    /// never rounded.
    pub currency_decimals: Option<u32>,

    /// Thousands separators in `*_display` fields.
    pub currency_grouping: bool,

    pub currency_symbol: Option<String>,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency_decimals: Some(2),
            currency_grouping: true,
            currency_symbol: Some("$".to_string()),
        }
    }
}

/// Application configuration as written in `chainbook.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Path to data directory. If relative, resolved from config file location.
    /// If not specified, defaults to the config file's directory.
    pub data_dir: Option<PathBuf>,

    pub ethereum: EthereumConfig,

    pub solana: SolanaConfig,

    pub prices: PricesConfig,

    pub fetch: FetchConfig,

    pub display: DisplayConfig,
}

impl Config {
    /// Load config from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    pub fn resolve_data_dir(&self, config_dir: &Path) -> PathBuf {
        match &self.data_dir {
            Some(data_dir) if data_dir.is_absolute() => data_dir.clone(),
            Some(data_dir) => config_dir.join(data_dir),
            None => config_dir.to_path_buf(),
        }
    }
}

/// Ethereum settings with the API key looked up.
#[derive(Debug)]
pub struct ResolvedEthereum {
    pub api_base: String,
    pub chain_id: Option<u64>,
    pub api_key: Option<SecretString>,
    /// Where the key was expected, for error messages.
    pub api_key_name: String,
}

#[derive(Debug, Clone)]
pub struct ResolvedSolana {
    pub rpc_url: String,
    pub commitment: String,
}

#[derive(Debug)]
pub struct ResolvedPrices {
    pub coingecko: bool,
    pub coingecko_base: String,
    pub api_key: Option<SecretString>,
    pub fixed: BTreeMap<String, Decimal>,
    pub mappings: HashMap<String, String>,
}

/// Configuration with paths resolved and environment fallbacks applied.
///
/// The environment is read here, once. Adapters and oracles receive these
/// values at construction and never look at process state themselves.
#[derive(Debug)]
pub struct ResolvedConfig {
    pub data_dir: PathBuf,
    pub ethereum: ResolvedEthereum,
    pub solana: ResolvedSolana,
    pub prices: ResolvedPrices,
    pub fetch: FetchConfig,
    pub display: DisplayConfig,
}

/// Returns the default config file path.
///
/// Resolution order:
/// 1. `./chainbook.toml` if it exists in current directory
/// 2. `~/.local/share/chainbook/chainbook.toml` (XDG data directory)
pub fn default_config_path() -> PathBuf {
    let local_config = PathBuf::from("chainbook.toml");
    if local_config.exists() {
        return local_config;
    }

    if let Some(data_dir) = dirs::data_dir() {
        return data_dir.join("chainbook").join("chainbook.toml");
    }

    local_config
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl ResolvedConfig {
    /// Load and resolve config from a file path, reading credentials from the
    /// process environment.
    pub fn load(config_path: &Path) -> Result<Self> {
        let config_path = config_path
            .canonicalize()
            .with_context(|| format!("Config file not found: {}", config_path.display()))?;

        let config_dir = config_path
            .parent()
            .context("Config file has no parent directory")?;

        let config = Config::load(&config_path)?;
        Ok(Self::resolve(config, config_dir, |name| std::env::var(name).ok()))
    }

    /// Like [`Self::load`], but a missing file yields the default config with
    /// the file's intended directory as data directory.
    pub fn load_or_default(config_path: &Path) -> Result<Self> {
        if config_path.exists() {
            return Self::load(config_path);
        }

        let config_path = if config_path.is_relative() {
            std::env::current_dir()
                .context("Failed to get current directory")?
                .join(config_path)
        } else {
            config_path.to_path_buf()
        };

        let config_dir = config_path
            .parent()
            .context("Config path has no parent directory")?;

        Ok(Self::resolve(Config::default(), config_dir, |name| {
            std::env::var(name).ok()
        }))
    }

    /// Resolve `config` against `config_dir`, using `env` for variable lookups.
    pub fn resolve(config: Config, config_dir: &Path, env: impl Fn(&str) -> Option<String>) -> Self {
        let data_dir = config.resolve_data_dir(config_dir);

        let ethereum = {
            let c = config.ethereum;
            let (api_key, api_key_name) = match non_empty(c.api_key) {
                Some(key) => (Some(key), "ethereum.api_key".to_string()),
                None => (non_empty(env(&c.api_key_env)), c.api_key_env),
            };
            ResolvedEthereum {
                api_base: c.api_base,
                chain_id: c.chain_id.filter(|id| *id != 0),
                api_key: api_key.map(SecretString::from),
                api_key_name,
            }
        };

        let solana = {
            let c = config.solana;
            let rpc_url = non_empty(c.rpc_url)
                .or_else(|| non_empty(env(&c.rpc_url_env)))
                .unwrap_or_else(default_solana_rpc_url);
            ResolvedSolana {
                rpc_url,
                commitment: c.commitment,
            }
        };

        let prices = {
            let c = config.prices;
            ResolvedPrices {
                coingecko: c.coingecko,
                coingecko_base: c.coingecko_base,
                api_key: non_empty(env(&c.api_key_env)).map(SecretString::from),
                fixed: c.fixed,
                mappings: c.mappings,
            }
        };

        Self {
            data_dir,
            ethereum,
            solana,
            prices,
            fetch: config.fetch,
            display: config.display,
        }
    }
}
