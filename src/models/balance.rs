use alloy_primitives::U256;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Id, WalletRef};

/// A native balance exactly as reported by the chain, in its smallest unit.
///
/// Lives for a single query and is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawBalance {
    pub wallet: WalletRef,
    pub smallest_unit_amount: U256,
}

impl RawBalance {
    pub fn new(wallet: WalletRef, smallest_unit_amount: U256) -> Self {
        Self {
            wallet,
            smallest_unit_amount,
        }
    }
}

/// A balance scaled to human units using the chain's fixed exponent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizedAsset {
    pub symbol: String,
    pub decimal_amount: Decimal,
    pub decimals: u32,
}

/// A normalized asset with its USD valuation, if one could be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricedAsset {
    pub symbol: String,
    pub decimal_amount: Decimal,
    pub decimals: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit_price_usd: Option<Decimal>,
    /// `None` when the price lookup failed; see `price_unavailable`.
    pub usd_value: Option<Decimal>,
    pub price_unavailable: bool,
}

impl PricedAsset {
    /// Values `asset` at `unit_price_usd`. A product outside the `Decimal`
    /// range is treated like a missing price.
    pub fn priced(asset: NormalizedAsset, unit_price_usd: Decimal) -> Self {
        let usd_value = asset.decimal_amount.checked_mul(unit_price_usd);
        Self {
            symbol: asset.symbol,
            decimal_amount: asset.decimal_amount,
            decimals: asset.decimals,
            unit_price_usd: Some(unit_price_usd),
            price_unavailable: usd_value.is_none(),
            usd_value,
        }
    }

    pub fn unpriced(asset: NormalizedAsset) -> Self {
        Self {
            symbol: asset.symbol,
            decimal_amount: asset.decimal_amount,
            decimals: asset.decimals,
            unit_price_usd: None,
            usd_value: None,
            price_unavailable: true,
        }
    }
}

/// One row of the balance ledger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceRecord {
    pub id: Id,
    pub wallet_id: Id,
    pub symbol: String,
    pub amount: Decimal,
    pub recorded_at: DateTime<Utc>,
}

impl BalanceRecord {
    pub fn new(wallet_id: Id, symbol: impl Into<String>, amount: Decimal) -> Self {
        Self {
            id: Id::new(),
            wallet_id,
            symbol: symbol.into(),
            amount,
            recorded_at: Utc::now(),
        }
    }
}
