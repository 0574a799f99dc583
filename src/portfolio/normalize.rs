//! Smallest-unit integers to human-unit decimals.

use alloy_primitives::U256;
use rust_decimal::Decimal;
use tracing::warn;

use crate::models::{NormalizedAsset, RawBalance};

/// Scales a raw native balance by its chain's fixed exponent.
///
/// The exponent comes from [`ChainId::native_decimals`], never from the
/// upstream response.
///
/// [`ChainId::native_decimals`]: crate::models::ChainId::native_decimals
pub fn normalize(raw: &RawBalance) -> NormalizedAsset {
    let chain = raw.wallet.chain;
    let decimals = chain.native_decimals();

    NormalizedAsset {
        symbol: chain.native_symbol().to_string(),
        decimal_amount: scale_down(raw.smallest_unit_amount, decimals),
        decimals,
    }
}

/// `amount / 10^decimals` without floating point.
///
/// The integer and fractional parts are split in `U256` before either is
/// converted. Amounts whose integer part does not fit a `Decimal` saturate at
/// `Decimal::MAX`.
pub fn scale_down(amount: U256, decimals: u32) -> Decimal {
    let divisor = U256::from(10u64).pow(U256::from(decimals));
    let (whole, fraction) = amount.div_rem(divisor);

    let Some(whole) = to_decimal(whole, 0) else {
        warn!(amount = %amount, decimals, "balance exceeds decimal range, saturating");
        return Decimal::MAX;
    };

    // fraction < 10^decimals, so it always fits.
    let fraction = to_decimal(fraction, decimals).unwrap_or(Decimal::ZERO);

    match whole.checked_add(fraction) {
        Some(value) => value.normalize(),
        None => {
            warn!(amount = %amount, decimals, "balance exceeds decimal range, saturating");
            Decimal::MAX
        }
    }
}

fn to_decimal(value: U256, scale: u32) -> Option<Decimal> {
    let value = u128::try_from(value).ok()?;
    let value = i128::try_from(value).ok()?;
    Decimal::try_from_i128_with_scale(value, scale).ok()
}
