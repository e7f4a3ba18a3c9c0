//! Monetary rounding, coercion and display helpers.
//!
//! All amounts are carried as [`Decimal`] internally. Rounding happens only
//! where a value leaves the calculation (record output, fines), and string
//! formatting happens only at the display boundary.

use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use crate::error::{EngineError, EngineResult};

/// Number of decimal places money is rounded to.
pub const MONEY_DECIMAL_PLACES: u32 = 2;

/// Rounds an amount to two decimal places, midpoints away from zero.
///
/// # Example
///
/// ```
/// use payroll_engine::models::round_money;
/// use rust_decimal::Decimal;
/// use std::str::FromStr;
///
/// assert_eq!(round_money(Decimal::from_str("10.005").unwrap()), Decimal::from_str("10.01").unwrap());
/// assert_eq!(round_money(Decimal::from_str("10.004").unwrap()), Decimal::from_str("10.00").unwrap());
/// ```
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Clamps an amount to be non-negative.
pub fn non_negative(amount: Decimal) -> Decimal {
    amount.max(Decimal::ZERO)
}

/// Sums amounts, failing with [`EngineError::AmountOverflow`] instead of
/// overflowing.
///
/// # Example
///
/// ```
/// use payroll_engine::models::checked_sum;
/// use rust_decimal::Decimal;
///
/// assert_eq!(checked_sum([Decimal::ONE, Decimal::TWO], "total").unwrap(), Decimal::from(3));
/// assert!(checked_sum([Decimal::MAX, Decimal::ONE], "total").is_err());
/// ```
pub fn checked_sum<I>(amounts: I, context: &str) -> EngineResult<Decimal>
where
    I: IntoIterator<Item = Decimal>,
{
    amounts
        .into_iter()
        .try_fold(Decimal::ZERO, |acc, amount| acc.checked_add(amount))
        .ok_or_else(|| EngineError::overflow(context))
}

/// Coerces raw user input into a line item amount.
///
/// Non-numeric input becomes zero, as does any negative value. Surrounding
/// whitespace is ignored and scientific notation is accepted.
///
/// # Example
///
/// ```
/// use payroll_engine::models::coerce_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(coerce_amount("20000"), Decimal::from(20_000));
/// assert_eq!(coerce_amount(" 1.5e3 "), Decimal::from(1_500));
/// assert_eq!(coerce_amount("abc"), Decimal::ZERO);
/// assert_eq!(coerce_amount("-50"), Decimal::ZERO);
/// ```
pub fn coerce_amount(raw: &str) -> Decimal {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Decimal::ZERO;
    }

    let parsed = Decimal::from_str(trimmed).or_else(|_| Decimal::from_scientific(trimmed));
    match parsed {
        Ok(amount) if amount.is_sign_negative() && !amount.is_zero() => {
            warn!(input = %trimmed, "Negative line item amount coerced to zero");
            Decimal::ZERO
        }
        Ok(amount) => amount,
        Err(_) => {
            warn!(input = %trimmed, "Non-numeric line item amount coerced to zero");
            Decimal::ZERO
        }
    }
}

/// Formats an amount for display with thousands separators.
///
/// The amount is rounded to `decimal_places` first. An empty `symbol` omits
/// the currency prefix.
///
/// # Example
///
/// ```
/// use payroll_engine::models::format_amount;
/// use rust_decimal::Decimal;
///
/// assert_eq!(format_amount(Decimal::from(445_000), "Rp", 2), "Rp 445,000.00");
/// assert_eq!(format_amount(Decimal::new(-12345, 1), "", 0), "-1,235");
/// ```
pub fn format_amount(amount: Decimal, symbol: &str, decimal_places: u32) -> String {
    let rounded =
        amount.round_dp_with_strategy(decimal_places, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = rounded.abs().to_string();

    let (integer, fraction) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), f.to_string()),
        None => (text, String::new()),
    };

    let mut grouped = String::with_capacity(integer.len() + integer.len() / 3);
    for (i, ch) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if !symbol.is_empty() {
        out.push_str(symbol);
        out.push(' ');
    }
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if decimal_places > 0 {
        let mut fraction = fraction;
        while fraction.len() < decimal_places as usize {
            fraction.push('0');
        }
        out.push('.');
        out.push_str(&fraction);
    }
    out
}
