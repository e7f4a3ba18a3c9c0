//! Line item model shared by deductions and allowances.
//!
//! A [`LineItem`] is a named amount. Whether it reduces or increases pay is
//! decided by the collection holding it, see [`LineItemKind`].

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::money::{coerce_amount, non_negative};

/// The reserved name of the auto-generated missed-hours fine deduction.
pub const MISSED_HOURS_FINE_LABEL: &str = "Missed Hours Fine";

/// Whether a line item collection reduces or increases pay.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LineItemKind {
    /// Subtracted from gross pay.
    Deduction,
    /// Added to gross pay.
    Allowance,
}

/// A single named deduction or allowance.
///
/// The amount is never negative: deserialization and the ledger editing
/// operations coerce invalid input to zero.
///
/// # Example
///
/// ```
/// use payroll_engine::models::LineItem;
/// use rust_decimal::Decimal;
///
/// let item: LineItem = serde_json::from_str(r#"{"name": "Tax", "amount": "oops"}"#).unwrap();
/// assert_eq!(item.name, "Tax");
/// assert_eq!(item.amount, Decimal::ZERO);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    /// Display name; may be empty while the entry is being composed.
    #[serde(default)]
    pub name: String,
    /// Non-negative amount.
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub amount: Decimal,
}

impl LineItem {
    /// Creates a line item, clamping a negative amount to zero.
    pub fn new(name: impl Into<String>, amount: Decimal) -> Self {
        Self {
            name: name.into(),
            amount: non_negative(amount),
        }
    }

    /// Creates the `{name: "", amount: 0}` entry appended by an add operation.
    pub fn blank() -> Self {
        Self {
            name: String::new(),
            amount: Decimal::ZERO,
        }
    }

    /// Returns true if this is the auto-generated missed-hours fine.
    pub fn is_missed_hours_fine(&self) -> bool {
        self.name == MISSED_HOURS_FINE_LABEL
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Integer(i64),
    Float(f64),
    Text(String),
    Other(serde::de::IgnoredAny),
}

/// Accepts numbers, numeric strings, or anything else (which becomes zero).
fn deserialize_amount<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = match RawAmount::deserialize(deserializer)? {
        RawAmount::Integer(amount) => non_negative(Decimal::from(amount)),
        RawAmount::Float(amount) => coerce_amount(&amount.to_string()),
        RawAmount::Text(text) => coerce_amount(&text),
        RawAmount::Other(_) => Decimal::ZERO,
    };
    Ok(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_new_clamps_negative_amount() {
        let item = LineItem::new("Tax", dec("-5"));
        assert_eq!(item.amount, Decimal::ZERO);
    }

    #[test]
    fn test_blank_item_is_empty() {
        let item = LineItem::blank();
        assert!(item.name.is_empty());
        assert_eq!(item.amount, Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_numeric_string_amount() {
        let item: LineItem =
            serde_json::from_str(r#"{"name": "Transport", "amount": "15000"}"#).unwrap();
        assert_eq!(item.amount, dec("15000"));
    }

    #[test]
    fn test_deserialize_number_amount() {
        let item: LineItem = serde_json::from_str(r#"{"name": "Tax", "amount": 20000}"#).unwrap();
        assert_eq!(item.amount, dec("20000"));
    }

    #[test]
    fn test_deserialize_fractional_number_amount() {
        let item: LineItem = serde_json::from_str(r#"{"name": "Meal", "amount": 1500.5}"#).unwrap();
        assert_eq!(item.amount, dec("1500.5"));
    }

    #[test]
    fn test_deserialize_negative_amount_is_zero() {
        let item: LineItem = serde_json::from_str(r#"{"name": "Tax", "amount": -10}"#).unwrap();
        assert_eq!(item.amount, Decimal::ZERO);
    }

    #[test]
    fn test_deserialize_null_or_missing_amount_is_zero() {
        let item: LineItem = serde_json::from_str(r#"{"name": "Tax", "amount": null}"#).unwrap();
        assert_eq!(item.amount, Decimal::ZERO);

        let item: LineItem = serde_json::from_str(r#"{"name": "Tax"}"#).unwrap();
        assert_eq!(item.amount, Decimal::ZERO);
    }

    #[test]
    fn test_serialize_amount_as_string() {
        let item = LineItem::new("Tax", dec("20000.50"));
        let json = serde_json::to_string(&item).unwrap();
        assert!(json.contains("\"amount\":\"20000.50\""));
    }

    #[test]
    fn test_is_missed_hours_fine() {
        assert!(LineItem::new(MISSED_HOURS_FINE_LABEL, dec("1")).is_missed_hours_fine());
        assert!(!LineItem::new("Tax", dec("1")).is_missed_hours_fine());
    }

    #[test]
    fn test_line_item_kind_serialization() {
        assert_eq!(
            serde_json::to_string(&LineItemKind::Deduction).unwrap(),
            "\"deduction\""
        );
        let kind: LineItemKind = serde_json::from_str("\"allowance\"").unwrap();
        assert_eq!(kind, LineItemKind::Allowance);
    }
}
