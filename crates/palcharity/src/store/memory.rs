//! In-process record store.
//!
//! Holds every collection behind one mutex. Used by tests and by the CLI's
//! `--memory` mode.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use tracing::debug;

use super::{new_record_id, RecordStore};
use crate::error::{Error, Result};
use crate::model::{
    Association, AssociationUpdate, Donation, Donor, DonorUpdate, NewProject, Project,
};

#[derive(Debug, Default)]
struct Collections {
    donors: HashMap<String, Donor>,
    associations: HashMap<String, Association>,
    projects: Vec<Project>,
    donations: Vec<Donation>,
}

/// Record store kept entirely in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<Collections>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Collections>> {
        self.collections
            .lock()
            .map_err(|e| Error::internal(format!("memory store lock poisoned: {e}")))
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn put_donor(&self, donor: &Donor) -> Result<()> {
        self.lock()?.donors.insert(donor.id.clone(), donor.clone());
        Ok(())
    }

    async fn get_donor(&self, id: &str) -> Result<Option<Donor>> {
        Ok(self.lock()?.donors.get(id).cloned())
    }

    async fn update_donor(&self, id: &str, update: &DonorUpdate) -> Result<bool> {
        let mut collections = self.lock()?;
        Ok(collections
            .donors
            .get_mut(id)
            .map(|donor| update.apply(donor))
            .is_some())
    }

    async fn put_association(&self, association: &Association) -> Result<()> {
        self.lock()?
            .associations
            .insert(association.id.clone(), association.clone());
        Ok(())
    }

    async fn get_association(&self, id: &str) -> Result<Option<Association>> {
        Ok(self.lock()?.associations.get(id).cloned())
    }

    async fn update_association(&self, id: &str, update: &AssociationUpdate) -> Result<bool> {
        let mut collections = self.lock()?;
        Ok(collections
            .associations
            .get_mut(id)
            .map(|association| update.apply(association))
            .is_some())
    }

    async fn insert_project(&self, project: &NewProject, image_url: &str) -> Result<Project> {
        let stored = Project {
            id: new_record_id(),
            title: project.title.clone(),
            description: project.description.clone(),
            amount_needed: project.amount_needed,
            amount_remaining: project.amount_needed,
            association_name: project.association_name.clone(),
            category: project.category,
            image_url: image_url.to_string(),
        };
        self.lock()?.projects.push(stored.clone());
        debug!("Inserted project {}", stored.id);
        Ok(stored)
    }

    async fn get_project(&self, id: &str) -> Result<Option<Project>> {
        Ok(self.lock()?.projects.iter().find(|p| p.id == id).cloned())
    }

    async fn projects(&self) -> Result<Vec<Project>> {
        Ok(self.lock()?.projects.clone())
    }

    async fn delete_project(&self, id: &str) -> Result<bool> {
        let mut collections = self.lock()?;
        let before = collections.projects.len();
        collections.projects.retain(|p| p.id != id);
        Ok(collections.projects.len() < before)
    }

    async fn decrement_remaining(&self, project_id: &str, amount: u32) -> Result<Option<u32>> {
        let mut collections = self.lock()?;
        Ok(collections
            .projects
            .iter_mut()
            .find(|p| p.id == project_id)
            .map(|project| {
                project.amount_remaining = project.amount_remaining.saturating_sub(amount);
                project.amount_remaining
            }))
    }

    async fn append_donation(&self, donation: &Donation) -> Result<String> {
        let id = new_record_id();
        let mut entry = donation.clone();
        entry.id = Some(id.clone());
        self.lock()?.donations.push(entry);
        debug!("Appended donation {} to project {}", id, donation.project_id);
        Ok(id)
    }

    async fn donations(&self) -> Result<Vec<Donation>> {
        Ok(self.lock()?.donations.clone())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::model::Category;

    fn new_project(amount_needed: u32) -> NewProject {
        NewProject {
            title: "Food parcels".to_string(),
            description: "Monthly parcels".to_string(),
            amount_needed,
            association_name: "Gaza Relief".to_string(),
            category: Category::Food,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_project_lifecycle() {
        let store = MemoryStore::new();
        let project = store.insert_project(&new_project(80), "p.jpg").await.unwrap();

        assert_eq!(store.get_project(&project.id).await.unwrap(), Some(project.clone()));
        assert_eq!(store.decrement_remaining(&project.id, 100).await.unwrap(), Some(0));
        assert!(store.delete_project(&project.id).await.unwrap());
        assert!(store.projects().await.unwrap().is_empty());
        assert_eq!(store.decrement_remaining(&project.id, 1).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_update_missing_profile_returns_false() {
        let store = MemoryStore::new();
        let update = DonorUpdate {
            email: Some("x@example.org".to_string()),
            ..DonorUpdate::default()
        };
        assert!(!store.update_donor("nobody", &update).await.unwrap());
        assert!(store.get_donor("nobody").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_append_assigns_id() {
        let store = MemoryStore::new();
        let donation = Donation {
            id: Some("caller-supplied".to_string()),
            donor_id: "u1".to_string(),
            project_id: "p1".to_string(),
            donor_first_name: String::new(),
            donor_last_name: String::new(),
            category: Category::Clothes,
            amount: 0,
            timestamp: 0,
            project_title: "Coats".to_string(),
            association_name: "Asso".to_string(),
            location: None,
        };

        let id = store.append_donation(&donation).await.unwrap();
        let log = store.donations().await.unwrap();
        assert_eq!(log.len(), 1);
        assert_eq!(log[0].id.as_deref(), Some(id.as_str()));
        assert_ne!(id, "caller-supplied");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_decrements_are_not_lost() {
        let store = Arc::new(MemoryStore::new());
        let project = store.insert_project(&new_project(40), "p.jpg").await.unwrap();

        let a = {
            let store = Arc::clone(&store);
            let id = project.id.clone();
            tokio::spawn(async move { store.decrement_remaining(&id, 30).await })
        };
        let b = {
            let store = Arc::clone(&store);
            let id = project.id.clone();
            tokio::spawn(async move { store.decrement_remaining(&id, 20).await })
        };
        a.await.unwrap().unwrap();
        b.await.unwrap().unwrap();

        let stored = store.get_project(&project.id).await.unwrap().unwrap();
        assert_eq!(stored.amount_remaining, 0);
    }
}
