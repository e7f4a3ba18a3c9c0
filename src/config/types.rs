//! Configuration types for the payroll engine.
//!
//! This module contains the strongly-typed configuration structures that
//! are deserialized from `payroll.yaml`.

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::calculation::{LineItemLedger, LineItems};
use crate::engine::EngineSettings;
use crate::models::{LineItem, MONEY_DECIMAL_PLACES, format_amount, non_negative};

/// How amounts are rendered for people.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CurrencyConfig {
    /// Prefix placed before formatted amounts (e.g., "Rp").
    #[serde(default)]
    pub symbol: String,
    /// Digits after the decimal point in formatted amounts.
    #[serde(default = "default_decimal_places")]
    pub decimal_places: u32,
}

impl Default for CurrencyConfig {
    fn default() -> Self {
        Self {
            symbol: String::new(),
            decimal_places: default_decimal_places(),
        }
    }
}

impl CurrencyConfig {
    /// Formats `amount` with this currency's symbol and precision.
    pub fn format(&self, amount: Decimal) -> String {
        format_amount(amount, &self.symbol, self.decimal_places)
    }
}

fn default_decimal_places() -> u32 {
    MONEY_DECIMAL_PLACES
}

/// HTTP server settings.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Socket address the API listens on.
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
        }
    }
}

fn default_bind_address() -> String {
    "127.0.0.1:3000".to_string()
}

/// The complete payroll configuration loaded from `payroll.yaml`.
///
/// Every section is optional; an empty file yields a zero fine rate, an
/// empty ledger and the default server address.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct PayrollConfig {
    /// Fine per missed hour applied to a freshly loaded period.
    #[serde(default)]
    pub default_fine_per_missed_hour: Decimal,
    /// Display currency.
    #[serde(default)]
    pub currency: CurrencyConfig,
    /// General deductions every new period starts with.
    #[serde(default)]
    pub general_deductions: Vec<LineItem>,
    /// General allowances every new period starts with.
    #[serde(default)]
    pub general_allowances: Vec<LineItem>,
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
}

impl PayrollConfig {
    /// The ledger a freshly loaded period starts with.
    pub fn default_ledger(&self) -> LineItemLedger {
        LineItemLedger {
            general_deductions: LineItems::from(self.general_deductions.clone()),
            general_allowances: LineItems::from(self.general_allowances.clone()),
        }
    }

    /// Engine defaults derived from this configuration.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            default_fine_rate: non_negative(self.default_fine_per_missed_hour),
            default_ledger: self.default_ledger(),
        }
    }
}
