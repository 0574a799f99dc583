use anyhow::Result;

use crate::chains::build_registry;
use crate::config::ResolvedConfig;
use crate::models::{Id, WalletRef};
use crate::portfolio::{link_wallet, unlink_wallet};
use crate::storage::Storage;

use super::WalletOutput;

pub async fn add_wallet(
    storage: &dyn Storage,
    config: &ResolvedConfig,
    chain: &str,
    address: &str,
    label: Option<String>,
) -> Result<WalletOutput> {
    let wallet_ref = WalletRef::parse(chain, address)?;
    let registry = build_registry(config)?;
    let wallet = link_wallet(storage, &registry, wallet_ref, label).await?;
    Ok(wallet.into())
}

pub async fn remove_wallet(storage: &dyn Storage, wallet_id: &str) -> Result<serde_json::Value> {
    let id = Id::parse(wallet_id)?;
    let removed = unlink_wallet(storage, &id).await?;
    if !removed {
        anyhow::bail!("Wallet not found: {id}");
    }
    Ok(serde_json::json!({
        "success": true,
        "wallet_id": id.to_string(),
    }))
}
