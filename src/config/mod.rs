//! Configuration loading and management for the payroll engine.
//!
//! This module loads the engine defaults from `payroll.yaml`: the fine per
//! missed hour, general deduction and allowance templates, the display
//! currency and the HTTP bind address.
//!
//! # Example
//!
//! ```no_run
//! use payroll_engine::config::ConfigLoader;
//!
//! let config = ConfigLoader::load("./config").unwrap();
//! println!("Default fine: {}", config.config().default_fine_per_missed_hour);
//! ```

mod loader;
mod types;

pub use loader::{CONFIG_FILE_NAME, ConfigLoader};
pub use types::{CurrencyConfig, PayrollConfig, ServerConfig};
