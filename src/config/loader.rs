//! Configuration loading functionality.
//!
//! This module provides the [`ConfigLoader`] type for loading payroll
//! configuration from YAML files.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::engine::EngineSettings;
use crate::error::{EngineError, EngineResult};

use super::types::{CurrencyConfig, PayrollConfig, ServerConfig};

/// Name of the configuration file inside the configuration directory.
pub const CONFIG_FILE_NAME: &str = "payroll.yaml";

/// Loads and provides access to payroll configuration.
///
/// # Directory Structure
///
/// ```text
/// config/
/// └── payroll.yaml   # Fine rate, ledger templates, currency, server
/// ```
///
/// # Example
///
/// ```no_run
/// use payroll_engine::config::ConfigLoader;
///
/// let loader = ConfigLoader::load("./config").unwrap();
/// println!("Listening on {}", loader.server().bind_address);
/// ```
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    config: PayrollConfig,
}

impl ConfigLoader {
    /// Loads configuration from the specified directory.
    ///
    /// # Returns
    ///
    /// Returns a `ConfigLoader` instance on success, or an error if:
    /// - `payroll.yaml` is missing (`ConfigNotFound`)
    /// - the file contains invalid YAML or wrongly typed values (`ConfigParseError`)
    ///
    /// # Example
    ///
    /// ```no_run
    /// use payroll_engine::config::ConfigLoader;
    ///
    /// let loader = ConfigLoader::load("./config")?;
    /// # Ok::<(), payroll_engine::error::EngineError>(())
    /// ```
    pub fn load<P: AsRef<Path>>(path: P) -> EngineResult<Self> {
        let file = path.as_ref().join(CONFIG_FILE_NAME);
        let config = Self::load_yaml::<PayrollConfig>(&file)?;
        debug!(
            path = %file.display(),
            default_fine_rate = %config.default_fine_per_missed_hour,
            "Loaded payroll configuration"
        );
        Ok(Self { config })
    }

    /// Wraps an already-built configuration.
    pub fn from_config(config: PayrollConfig) -> Self {
        Self { config }
    }

    /// Loads and parses a YAML file.
    fn load_yaml<T: serde::de::DeserializeOwned>(path: &Path) -> EngineResult<T> {
        let path_str = path.display().to_string();

        let content = fs::read_to_string(path).map_err(|_| EngineError::ConfigNotFound {
            path: path_str.clone(),
        })?;

        serde_yaml::from_str(&content).map_err(|e| EngineError::ConfigParseError {
            path: path_str,
            message: e.to_string(),
        })
    }

    /// Returns the underlying configuration.
    pub fn config(&self) -> &PayrollConfig {
        &self.config
    }

    /// Returns the display currency.
    pub fn currency(&self) -> &CurrencyConfig {
        &self.config.currency
    }

    /// Returns the HTTP server settings.
    pub fn server(&self) -> &ServerConfig {
        &self.config.server
    }

    /// Returns the defaults a new [`RecalculationEngine`](crate::engine::RecalculationEngine)
    /// starts from.
    pub fn engine_settings(&self) -> EngineSettings {
        self.config.engine_settings()
    }
}
