//! `palcharity` - A donation ledger for charitable projects
//!
//! This library records donations made by donors to projects run by
//! associations, keeps each project's remaining balance in step with the
//! money it receives, and summarizes a donor's giving history.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod cli;
pub mod config;
pub mod directory;
pub mod error;
pub mod ledger;
pub mod logging;
pub mod model;
pub mod projects;
pub mod stats;
pub mod store;
pub mod validate;

pub use config::Config;
pub use directory::{AssociationDirectory, DonorDirectory};
pub use error::{Error, Result};
pub use ledger::{BalanceReconciler, DonationRecorder, DonationRequest, Ledger, RecordedDonation};
pub use logging::init_logging;
pub use model::{
    Association, AssociationUpdate, Category, Donation, Donor, DonorUpdate, GeoPoint, NewProject,
    Project,
};
pub use projects::ProjectCatalog;
pub use stats::{DonorStats, ProjectSummary, StatisticsAggregator};
pub use store::{MemoryStore, Presence, RecordStore, SqliteStore, StoreStats};
pub use validate::parse_amount;
