use std::path::Path;

use crate::config::ResolvedConfig;
use crate::duration::format_duration;

/// Resolved configuration for display. Credentials are reported only as
/// present or absent.
pub fn config_output(config_path: &Path, config: &ResolvedConfig) -> serde_json::Value {
    serde_json::json!({
        "config_file": config_path.display().to_string(),
        "data_directory": config.data_dir.display().to_string(),
        "ethereum": {
            "api_base": config.ethereum.api_base,
            "chain_id": config.ethereum.chain_id,
            "api_key": config.ethereum.api_key_name,
            "api_key_configured": config.ethereum.api_key.is_some()
        },
        "solana": {
            "rpc_url": config.solana.rpc_url,
            "commitment": config.solana.commitment
        },
        "prices": {
            "coingecko": config.prices.coingecko,
            "coingecko_base": config.prices.coingecko_base,
            "api_key_configured": config.prices.api_key.is_some(),
            "fixed": config.prices.fixed,
            "mappings": config.prices.mappings
        },
        "fetch": {
            "timeout": format_duration(config.fetch.timeout),
            "max_concurrent": config.fetch.max_concurrent
        }
    })
}
