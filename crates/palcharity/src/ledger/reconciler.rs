//! Project balance reconciliation.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::store::RecordStore;

/// Decrements a project's remaining amount after a money donation.
#[derive(Debug, Clone)]
pub struct BalanceReconciler {
    store: Arc<dyn RecordStore>,
}

impl BalanceReconciler {
    /// Create a reconciler over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Apply `remaining = max(0, remaining - amount)` to the project.
    ///
    /// The update is a single atomic store operation, so concurrent
    /// reconciliations against one project are all applied. Returns the new
    /// remaining amount, or `None` when no project has this id; a missing
    /// project is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn reconcile(&self, project_id: &str, amount: u32) -> Result<Option<u32>> {
        match self.store.decrement_remaining(project_id, amount).await? {
            Some(remaining) => {
                info!(project_id, amount, remaining, "Reconciled project balance");
                Ok(Some(remaining))
            }
            None => {
                debug!(project_id, "No project with this id, nothing to reconcile");
                Ok(None)
            }
        }
    }
}
