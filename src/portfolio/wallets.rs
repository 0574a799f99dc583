//! Linking and unlinking wallets.

use anyhow::{bail, Context, Result};
use tracing::info;

use crate::chains::AdapterRegistry;
use crate::models::{Id, Wallet, WalletRef};
use crate::storage::Storage;

/// Validates `wallet_ref` locally and saves it as a new linked wallet.
///
/// Fails if no adapter serves the chain, if the address is malformed, or if
/// the same (address, chain) pair is already linked.
pub async fn link_wallet(
    storage: &dyn Storage,
    registry: &AdapterRegistry,
    wallet_ref: WalletRef,
    label: Option<String>,
) -> Result<Wallet> {
    let adapter = registry
        .get(wallet_ref.chain)
        .with_context(|| format!("Unsupported chain: {}", wallet_ref.chain))?;
    adapter.validate_address(&wallet_ref.address)?;

    if let Some(existing) = storage.find_wallet(&wallet_ref).await? {
        bail!(
            "Wallet {} on {} is already linked as {}",
            wallet_ref.address,
            wallet_ref.chain,
            existing.id
        );
    }

    let label = label
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty());
    let wallet = Wallet::new(wallet_ref, label);
    storage.save_wallet(&wallet).await?;

    info!(wallet_id = %wallet.id, chain = %wallet.chain, address = %wallet.address, "wallet linked");
    Ok(wallet)
}

/// Removes a linked wallet. Returns `false` if it was not linked.
pub async fn unlink_wallet(storage: &dyn Storage, id: &Id) -> Result<bool> {
    let removed = storage.delete_wallet(id).await?;
    if removed {
        info!(wallet_id = %id, "wallet unlinked");
    }
    Ok(removed)
}
