//! Human-facing rendering of USD amounts. Canonical JSON fields keep full
//! precision; these strings only feed `*_display` fields.

use rust_decimal::{Decimal, RoundingStrategy};

use crate::config::DisplayConfig;

/// Insert commas every 3 digits.
fn group_int_digits(int_part: &str) -> String {
    let len = int_part.len();
    let mut out = String::with_capacity(len + len / 3);
    for (i, ch) in int_part.chars().enumerate() {
        out.push(ch);
        let remaining = len - i - 1;
        if remaining > 0 && remaining % 3 == 0 {
            out.push(',');
        }
    }
    out
}

/// Render `value` as USD per the display settings.
///
/// With `currency_decimals` set the value is rounded half away from zero and
/// always shows exactly that many decimals (`$7,500.00`). Without it the
/// value is printed in full, trailing zeros removed.
pub fn format_usd(value: Decimal, display: &DisplayConfig) -> String {
    let text = match display.currency_decimals {
        Some(dp) => {
            let mut rounded =
                value.round_dp_with_strategy(dp, RoundingStrategy::MidpointAwayFromZero);
            rounded.rescale(dp);
            rounded.abs().to_string()
        }
        None => value.abs().normalize().to_string(),
    };

    let text = if display.currency_grouping {
        match text.split_once('.') {
            Some((int_part, frac)) => format!("{}.{frac}", group_int_digits(int_part)),
            None => group_int_digits(&text),
        }
    } else {
        text
    };

    let negative = value.is_sign_negative() && !text.chars().all(|c| matches!(c, '0' | '.' | ','));

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    if let Some(symbol) = &display.currency_symbol {
        out.push_str(symbol);
    }
    out.push_str(&text);
    out
}
