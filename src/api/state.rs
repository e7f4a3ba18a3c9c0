//! Application state for the payroll API.
//!
//! This module defines the shared application state that is available
//! to all request handlers.

use std::sync::Arc;

use crate::config::ConfigLoader;
use crate::engine::{InMemoryPayrollStore, PayrollStore};

/// Shared application state.
///
/// Holds the loaded configuration and the payroll store that submitted
/// periods are written to.
#[derive(Clone)]
pub struct AppState {
    config: Arc<ConfigLoader>,
    store: Arc<dyn PayrollStore>,
}

impl AppState {
    /// Creates a state backed by a fresh in-memory store.
    pub fn new(config: ConfigLoader) -> Self {
        Self::with_store(config, Arc::new(InMemoryPayrollStore::new()))
    }

    /// Creates a state backed by `store`.
    pub fn with_store(config: ConfigLoader, store: Arc<dyn PayrollStore>) -> Self {
        Self {
            config: Arc::new(config),
            store,
        }
    }

    /// Returns a reference to the configuration loader.
    pub fn config(&self) -> &ConfigLoader {
        &self.config
    }

    /// Returns the payroll store.
    pub fn store(&self) -> &dyn PayrollStore {
        self.store.as_ref()
    }
}
