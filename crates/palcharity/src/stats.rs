//! Statistics over the donation log.
//!
//! Every query fetches the whole log and filters client-side, so cost grows
//! with the total number of donations, not with the donor's share of them.

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use crate::error::Result;
use crate::model::{Category, Donation, Project};
use crate::store::RecordStore;

/// Per-donor summary of the donation log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonorStats {
    /// Number of donations.
    pub donation_count: usize,
    /// Sum of money donation amounts.
    pub total_amount: u64,
    /// Number of money donations.
    pub money_donations: usize,
    /// Number of food donations.
    pub food_donations: usize,
    /// Number of clothes donations.
    pub clothes_donations: usize,
    /// Distinct project titles donated to.
    pub unique_projects: usize,
}

impl DonorStats {
    /// Reduce a set of donations to a summary.
    ///
    /// Projects are told apart by their title snapshot, so two projects that
    /// shared a title count once.
    #[must_use]
    pub fn from_donations<'a>(donations: impl IntoIterator<Item = &'a Donation>) -> Self {
        let mut stats = Self::default();
        let mut titles = HashSet::new();

        for donation in donations {
            stats.donation_count += 1;
            stats.total_amount += donation.counted_amount();
            match donation.category {
                Category::Money => stats.money_donations += 1,
                Category::Food => stats.food_donations += 1,
                Category::Clothes => stats.clothes_donations += 1,
            }
            titles.insert(donation.project_title.as_str());
        }

        stats.unique_projects = titles.len();
        stats
    }

    /// Number of donations in one category.
    #[must_use]
    pub fn count_for(&self, category: Category) -> usize {
        match category {
            Category::Money => self.money_donations,
            Category::Food => self.food_donations,
            Category::Clothes => self.clothes_donations,
        }
    }
}

/// Per-project summary of the donation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectSummary {
    /// The project.
    pub project_id: String,
    /// Log entries referencing the project.
    pub donation_count: usize,
    /// Sum of money donations in the log.
    pub amount_donated: u64,
    /// Distinct donor ids.
    pub distinct_donors: usize,
    /// Funding target.
    pub amount_needed: u32,
    /// Stored remaining balance.
    pub amount_remaining: u32,
    /// Share of the target reached according to the stored balance, 0 to 100.
    pub funded_percent: u8,
}

/// Read-only queries over the donation log.
#[derive(Debug, Clone)]
pub struct StatisticsAggregator {
    store: Arc<dyn RecordStore>,
}

impl StatisticsAggregator {
    /// Create an aggregator over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Summary of one donor's donations.
    ///
    /// A donor with no donations gets all-zero stats.
    ///
    /// # Errors
    ///
    /// Returns an error if the donation log cannot be read.
    pub async fn donor_stats(&self, donor_id: &str) -> Result<DonorStats> {
        let log = self.store.donations().await?;
        let stats = DonorStats::from_donations(log.iter().filter(|d| d.donor_id == donor_id));
        debug!(
            donor_id,
            scanned = log.len(),
            matched = stats.donation_count,
            "Computed donor stats"
        );
        Ok(stats)
    }

    /// One donor's donations, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the donation log cannot be read.
    pub async fn donor_history(&self, donor_id: &str) -> Result<Vec<Donation>> {
        let mut donations: Vec<Donation> = self
            .store
            .donations()
            .await?
            .into_iter()
            .filter(|d| d.donor_id == donor_id)
            .collect();
        // Stable sort keeps append order among equal timestamps; reverse it too.
        donations.reverse();
        donations.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(donations)
    }

    /// Donations made to one project, in append order.
    ///
    /// # Errors
    ///
    /// Returns an error if the donation log cannot be read.
    pub async fn project_donations(&self, project_id: &str) -> Result<Vec<Donation>> {
        Ok(self
            .store
            .donations()
            .await?
            .into_iter()
            .filter(|d| d.project_id == project_id)
            .collect())
    }

    /// Funding summary for a project.
    ///
    /// # Errors
    ///
    /// Returns an error if the donation log cannot be read.
    pub async fn project_summary(&self, project: &Project) -> Result<ProjectSummary> {
        let donations = self.project_donations(&project.id).await?;
        let donors: HashSet<&str> = donations.iter().map(|d| d.donor_id.as_str()).collect();

        Ok(ProjectSummary {
            project_id: project.id.clone(),
            donation_count: donations.len(),
            amount_donated: donations.iter().map(Donation::counted_amount).sum(),
            distinct_donors: donors.len(),
            amount_needed: project.amount_needed,
            amount_remaining: project.amount_remaining,
            funded_percent: funded_percent(project),
        })
    }
}

fn funded_percent(project: &Project) -> u8 {
    if project.amount_needed == 0 {
        return 0;
    }
    let raised = u64::from(project.amount_raised());
    let percent = (raised * 100 / u64::from(project.amount_needed)).min(100);
    u8::try_from(percent).unwrap_or(100)
}
