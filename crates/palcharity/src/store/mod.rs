//! Record store abstraction for palcharity.
//!
//! The ledger components never talk to a database directly; they receive an
//! `Arc<dyn RecordStore>` at construction. Two backends ship with the crate:
//!
//! - [`SqliteStore`]: persistent storage on a local `SQLite` file.
//! - [`MemoryStore`]: process-local storage for tests and dry runs.
//!
//! Collection names match the mobile app's layout: `donors`, `associations`,
//! `projects` and `don_projet` (the donation log).

pub mod memory;
pub mod migrations;
pub mod schema;
pub mod sqlite;

use async_trait::async_trait;

use crate::error::Result;
use crate::model::{
    Association, AssociationUpdate, Donation, Donor, DonorUpdate, NewProject, Project,
};

pub use memory::MemoryStore;
pub use sqlite::{SqliteStore, StoreStats};

/// Result of probing for a record.
///
/// Only a successful read produces a `Presence`; a store failure is an `Err`
/// and is never reported as `Absent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The record exists.
    Present,
    /// The store answered and the record does not exist.
    Absent,
}

impl Presence {
    /// True for [`Presence::Present`].
    #[must_use]
    pub fn is_present(self) -> bool {
        matches!(self, Self::Present)
    }
}

impl From<bool> for Presence {
    fn from(found: bool) -> Self {
        if found {
            Self::Present
        } else {
            Self::Absent
        }
    }
}

/// Backing store for profiles, projects and the donation log.
///
/// Each method is a single store round-trip. Implementations must make
/// [`RecordStore::decrement_remaining`] atomic per project: two concurrent
/// calls against the same project must both be applied.
#[async_trait]
pub trait RecordStore: Send + Sync + std::fmt::Debug {
    /// Short backend name for logging.
    fn name(&self) -> &'static str;

    /// Write a donor profile, replacing any record with the same id.
    async fn put_donor(&self, donor: &Donor) -> Result<()>;

    /// Read a donor profile.
    async fn get_donor(&self, id: &str) -> Result<Option<Donor>>;

    /// Merge supplied fields into a donor profile. Returns `false` if absent.
    async fn update_donor(&self, id: &str, update: &DonorUpdate) -> Result<bool>;

    /// Write an association profile, replacing any record with the same id.
    async fn put_association(&self, association: &Association) -> Result<()>;

    /// Read an association profile.
    async fn get_association(&self, id: &str) -> Result<Option<Association>>;

    /// Merge supplied fields into an association profile. Returns `false` if absent.
    async fn update_association(&self, id: &str, update: &AssociationUpdate) -> Result<bool>;

    /// Create a project under a freshly generated id.
    ///
    /// The stored `amount_remaining` starts at `amount_needed`.
    async fn insert_project(&self, project: &NewProject, image_url: &str) -> Result<Project>;

    /// Read a project by its `id` field.
    async fn get_project(&self, id: &str) -> Result<Option<Project>>;

    /// Every project, in creation order.
    async fn projects(&self) -> Result<Vec<Project>>;

    /// Delete a project. Returns `false` if it did not exist.
    async fn delete_project(&self, id: &str) -> Result<bool>;

    /// Atomically set `amount_remaining = max(0, amount_remaining - amount)`.
    ///
    /// Returns the new remaining amount, or `None` if no project has this id.
    async fn decrement_remaining(&self, project_id: &str, amount: u32) -> Result<Option<u32>>;

    /// Append a donation to the log and return its generated id.
    ///
    /// Any `id` already present on `donation` is ignored.
    async fn append_donation(&self, donation: &Donation) -> Result<String>;

    /// The full donation log, in append order.
    async fn donations(&self) -> Result<Vec<Donation>>;
}

/// Generate a record identifier.
pub(crate) fn new_record_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
pub(crate) mod fault {
    //! A store wrapper that fails selected operations on demand.

    use std::collections::HashSet;
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{MemoryStore, RecordStore};
    use crate::error::{Error, Result};
    use crate::model::{
        Association, AssociationUpdate, Donation, Donor, DonorUpdate, NewProject, Project,
    };

    #[derive(Debug, Default)]
    pub struct FaultyStore {
        pub inner: MemoryStore,
        failing: Mutex<HashSet<&'static str>>,
    }

    impl FaultyStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail(&self, op: &'static str) {
            self.failing.lock().unwrap().insert(op);
        }

        fn check(&self, op: &'static str) -> Result<()> {
            let failing = self.failing.lock().unwrap();
            if failing.contains(op) || failing.contains("*") {
                return Err(Error::store(format!("{op} unavailable")));
            }
            Ok(())
        }
    }

    #[async_trait]
    impl RecordStore for FaultyStore {
        fn name(&self) -> &'static str {
            "faulty"
        }

        async fn put_donor(&self, donor: &Donor) -> Result<()> {
            self.check("put_donor")?;
            self.inner.put_donor(donor).await
        }

        async fn get_donor(&self, id: &str) -> Result<Option<Donor>> {
            self.check("get_donor")?;
            self.inner.get_donor(id).await
        }

        async fn update_donor(&self, id: &str, update: &DonorUpdate) -> Result<bool> {
            self.check("update_donor")?;
            self.inner.update_donor(id, update).await
        }

        async fn put_association(&self, association: &Association) -> Result<()> {
            self.check("put_association")?;
            self.inner.put_association(association).await
        }

        async fn get_association(&self, id: &str) -> Result<Option<Association>> {
            self.check("get_association")?;
            self.inner.get_association(id).await
        }

        async fn update_association(
            &self,
            id: &str,
            update: &AssociationUpdate,
        ) -> Result<bool> {
            self.check("update_association")?;
            self.inner.update_association(id, update).await
        }

        async fn insert_project(&self, project: &NewProject, image_url: &str) -> Result<Project> {
            self.check("insert_project")?;
            self.inner.insert_project(project, image_url).await
        }

        async fn get_project(&self, id: &str) -> Result<Option<Project>> {
            self.check("get_project")?;
            self.inner.get_project(id).await
        }

        async fn projects(&self) -> Result<Vec<Project>> {
            self.check("projects")?;
            self.inner.projects().await
        }

        async fn delete_project(&self, id: &str) -> Result<bool> {
            self.check("delete_project")?;
            self.inner.delete_project(id).await
        }

        async fn decrement_remaining(&self, project_id: &str, amount: u32) -> Result<Option<u32>> {
            self.check("decrement_remaining")?;
            self.inner.decrement_remaining(project_id, amount).await
        }

        async fn append_donation(&self, donation: &Donation) -> Result<String> {
            self.check("append_donation")?;
            self.inner.append_donation(donation).await
        }

        async fn donations(&self) -> Result<Vec<Donation>> {
            self.check("donations")?;
            self.inner.donations().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presence_from_bool() {
        assert_eq!(Presence::from(true), Presence::Present);
        assert_eq!(Presence::from(false), Presence::Absent);
        assert!(Presence::Present.is_present());
        assert!(!Presence::Absent.is_present());
    }

    #[test]
    fn test_new_record_id_is_unique() {
        let a = new_record_id();
        let b = new_record_id();
        assert_ne!(a, b);
        assert_eq!(a.len(), 32);
    }
}
