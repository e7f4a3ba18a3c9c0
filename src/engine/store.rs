//! The payroll store seam.
//!
//! Submitting a period is a single write of the assembled payload to a
//! [`PayrollStore`]. Reads exist for the reporting side.

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::models::PayrollPeriod;

/// Failures reported by a payroll store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store refused or failed the write.
    #[error("Payroll store write failed: {message}")]
    WriteFailed {
        /// A description of the failure.
        message: String,
    },
}

/// Persists finalized payroll periods.
#[async_trait]
pub trait PayrollStore: Send + Sync {
    /// Writes one finalized period.
    async fn save(&self, period: &PayrollPeriod) -> Result<(), StoreError>;

    /// Fetches a period by id.
    async fn get(&self, id: Uuid) -> Option<PayrollPeriod>;

    /// Lists all periods, oldest first.
    async fn list(&self) -> Vec<PayrollPeriod>;
}

/// A process-local store. Saving an id that already exists replaces it.
#[derive(Debug, Default)]
pub struct InMemoryPayrollStore {
    periods: RwLock<Vec<PayrollPeriod>>,
}

impl InMemoryPayrollStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PayrollStore for InMemoryPayrollStore {
    async fn save(&self, period: &PayrollPeriod) -> Result<(), StoreError> {
        let mut periods = self.periods.write().await;
        match periods.iter_mut().find(|p| p.id == period.id) {
            Some(existing) => *existing = period.clone(),
            None => periods.push(period.clone()),
        }
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Option<PayrollPeriod> {
        self.periods
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    async fn list(&self) -> Vec<PayrollPeriod> {
        self.periods.read().await.clone()
    }
}
