//! The donation ledger.
//!
//! [`Ledger`] owns the record store handle and hands out the components that
//! operate on it. Nothing in the crate reaches for a global backend; every
//! component is built from the store it is given.

mod reconciler;
mod recorder;

use std::sync::Arc;

pub use reconciler::BalanceReconciler;
pub use recorder::{DonationRecorder, DonationRequest, RecordedDonation};

use crate::config::Config;
use crate::directory::{AssociationDirectory, DonorDirectory};
use crate::error::Result;
use crate::projects::ProjectCatalog;
use crate::stats::StatisticsAggregator;
use crate::store::{MemoryStore, RecordStore, SqliteStore};

/// Context shared by all ledger components.
#[derive(Debug, Clone)]
pub struct Ledger {
    store: Arc<dyn RecordStore>,
    max_amount: Option<u32>,
    default_image: String,
}

impl Ledger {
    /// Build a ledger over an existing store with default rules.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self::with_config(store, &Config::default())
    }

    /// Build a ledger over an existing store, taking rules from `config`.
    #[must_use]
    pub fn with_config(store: Arc<dyn RecordStore>, config: &Config) -> Self {
        Self {
            store,
            max_amount: config.max_amount(),
            default_image: config.donations.default_image.clone(),
        }
    }

    /// Open the `SQLite` store configured in `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(config: &Config) -> Result<Self> {
        let store = SqliteStore::open(config.database_path(), config.busy_timeout())?;
        Ok(Self::with_config(Arc::new(store), config))
    }

    /// A ledger over a fresh in-memory store.
    #[must_use]
    pub fn in_memory(config: &Config) -> Self {
        Self::with_config(Arc::new(MemoryStore::new()), config)
    }

    /// The underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Donation recorder.
    #[must_use]
    pub fn recorder(&self) -> DonationRecorder {
        DonationRecorder::new(Arc::clone(&self.store)).with_max_amount(self.max_amount)
    }

    /// Balance reconciler.
    #[must_use]
    pub fn reconciler(&self) -> BalanceReconciler {
        BalanceReconciler::new(Arc::clone(&self.store))
    }

    /// Statistics aggregator.
    #[must_use]
    pub fn stats(&self) -> StatisticsAggregator {
        StatisticsAggregator::new(Arc::clone(&self.store))
    }

    /// Donor directory.
    #[must_use]
    pub fn donors(&self) -> DonorDirectory {
        DonorDirectory::new(Arc::clone(&self.store))
    }

    /// Association directory.
    #[must_use]
    pub fn associations(&self) -> AssociationDirectory {
        AssociationDirectory::new(Arc::clone(&self.store))
    }

    /// Project catalog.
    #[must_use]
    pub fn projects(&self) -> ProjectCatalog {
        ProjectCatalog::new(Arc::clone(&self.store)).with_default_image(self.default_image.clone())
    }
}
