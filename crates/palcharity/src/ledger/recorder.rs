//! Donation recording.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use super::reconciler::BalanceReconciler;
use crate::error::{Error, Result};
use crate::model::{Category, Donation, GeoPoint, Project};
use crate::store::RecordStore;
use crate::validate::require_non_blank;

/// What a donor wants to give.
#[derive(Debug, Clone, PartialEq)]
pub struct DonationRequest {
    /// Donor account identifier.
    pub donor_id: String,
    /// Kind of contribution.
    pub category: Category,
    /// Amount; must be positive for money, ignored otherwise.
    pub amount: u32,
    /// Where the donor is, if shared.
    pub location: Option<GeoPoint>,
}

impl DonationRequest {
    /// A money donation.
    #[must_use]
    pub fn money(donor_id: impl Into<String>, amount: u32) -> Self {
        Self {
            donor_id: donor_id.into(),
            category: Category::Money,
            amount,
            location: None,
        }
    }

    /// An in-kind donation; the amount is always zero.
    #[must_use]
    pub fn in_kind(donor_id: impl Into<String>, category: Category) -> Self {
        Self {
            donor_id: donor_id.into(),
            category,
            amount: 0,
            location: None,
        }
    }

    /// Attach a location.
    #[must_use]
    pub fn at(mut self, location: GeoPoint) -> Self {
        self.location = Some(location);
        self
    }
}

/// Outcome of a successful recording.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedDonation {
    /// The log entry as written, with its assigned id.
    pub donation: Donation,
    /// Project balance after reconciliation; `None` for in-kind donations or
    /// when the project no longer exists.
    pub remaining: Option<u32>,
}

/// Validates and appends donations, then reconciles money donations.
#[derive(Debug, Clone)]
pub struct DonationRecorder {
    store: Arc<dyn RecordStore>,
    reconciler: BalanceReconciler,
    max_amount: Option<u32>,
}

impl DonationRecorder {
    /// Create a recorder over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let reconciler = BalanceReconciler::new(Arc::clone(&store));
        Self {
            store,
            reconciler,
            max_amount: None,
        }
    }

    /// Cap the amount of a single money donation.
    #[must_use]
    pub fn with_max_amount(mut self, max_amount: Option<u32>) -> Self {
        self.max_amount = max_amount;
        self
    }

    /// Record a donation to `project`.
    ///
    /// The project title and association name are copied from `project` as
    /// supplied; the donor name is read from the directory. Money donations
    /// then decrement the project balance as a separate write.
    ///
    /// # Errors
    ///
    /// - [`Error::Validation`] if the request is invalid; nothing is written.
    /// - A store error if the donor read or the append fails; nothing is written.
    /// - [`Error::Reconciliation`] if the donation was appended but the balance
    ///   update failed. The log entry stays; it is not rolled back.
    pub async fn record(
        &self,
        project: &Project,
        request: &DonationRequest,
    ) -> Result<RecordedDonation> {
        let amount = self.validate(request)?;

        let (donor_first_name, donor_last_name) =
            match self.store.get_donor(&request.donor_id).await? {
                Some(donor) => (donor.first_name, donor.last_name),
                None => {
                    warn!(
                        donor_id = %request.donor_id,
                        "Donor profile missing, recording donation without a name"
                    );
                    (String::new(), String::new())
                }
            };

        let mut donation = Donation {
            id: None,
            donor_id: request.donor_id.clone(),
            project_id: project.id.clone(),
            donor_first_name,
            donor_last_name,
            category: request.category,
            amount,
            timestamp: Utc::now().timestamp_millis(),
            project_title: project.title.clone(),
            association_name: project.association_name.clone(),
            location: request.location,
        };

        let donation_id = self.store.append_donation(&donation).await?;
        donation.id = Some(donation_id.clone());
        info!(
            donation_id = %donation_id,
            project_id = %project.id,
            category = %request.category,
            amount,
            "Recorded donation"
        );

        let remaining = if request.category.is_monetary() {
            self.reconciler
                .reconcile(&project.id, amount)
                .await
                .map_err(|source| {
                    warn!(
                        donation_id = %donation_id,
                        project_id = %project.id,
                        "Donation recorded but balance update failed: {source}"
                    );
                    Error::Reconciliation {
                        donation_id: donation_id.clone(),
                        source: Box::new(source),
                    }
                })?
        } else {
            None
        };

        Ok(RecordedDonation {
            donation,
            remaining,
        })
    }

    /// Load the project by id, then [`record`](Self::record) against it.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if the project does not exist, plus
    /// everything [`record`](Self::record) can return.
    pub async fn donate_to(
        &self,
        project_id: &str,
        request: &DonationRequest,
    ) -> Result<RecordedDonation> {
        self.validate(request)?;
        let project = self
            .store
            .get_project(project_id)
            .await?
            .ok_or_else(|| Error::project_not_found(project_id))?;
        self.record(&project, request).await
    }

    /// Returns the amount to store.
    fn validate(&self, request: &DonationRequest) -> Result<u32> {
        require_non_blank("donor id", &request.donor_id)?;

        if !request.category.is_monetary() {
            return Ok(0);
        }
        if request.amount == 0 {
            return Err(Error::validation(
                "amount",
                "must be a positive integer for money donations",
            ));
        }
        if let Some(max) = self.max_amount {
            if request.amount > max {
                return Err(Error::validation(
                    "amount",
                    format!("{} exceeds the per-donation limit of {max}", request.amount),
                ));
            }
        }
        Ok(request.amount)
    }
}
