//! Project catalog: creation, lookup and listing of fundable projects.

use std::sync::Arc;

use tracing::{debug, info};

use crate::config::DEFAULT_PROJECT_IMAGE;
use crate::error::{Error, Result};
use crate::model::{NewProject, Project};
use crate::store::RecordStore;
use crate::validate::require_non_blank;

/// Project operations over a record store.
#[derive(Debug, Clone)]
pub struct ProjectCatalog {
    store: Arc<dyn RecordStore>,
    default_image: String,
}

impl ProjectCatalog {
    /// Create a catalog over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self {
            store,
            default_image: DEFAULT_PROJECT_IMAGE.to_string(),
        }
    }

    /// Image used for projects created without one.
    #[must_use]
    pub fn with_default_image(mut self, image: String) -> Self {
        self.default_image = image;
        self
    }

    /// Create a project. Its remaining amount starts at the amount needed.
    ///
    /// # Errors
    ///
    /// Returns a validation error for blank text fields or a zero target,
    /// or a store error.
    pub async fn add(&self, project: &NewProject) -> Result<Project> {
        require_non_blank("title", &project.title)?;
        require_non_blank("description", &project.description)?;
        require_non_blank("associationName", &project.association_name)?;
        if project.amount_needed == 0 {
            return Err(Error::validation("amountNeeded", "must be greater than zero"));
        }

        let image = project
            .image_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(self.default_image.as_str());

        let created = self.store.insert_project(project, image).await?;
        info!(
            id = %created.id,
            title = %created.title,
            amount_needed = created.amount_needed,
            "Created project"
        );
        Ok(created)
    }

    /// Fetch one project.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProjectNotFound`] if no project has this id.
    pub async fn get(&self, id: &str) -> Result<Project> {
        self.store
            .get_project(id)
            .await?
            .ok_or_else(|| Error::project_not_found(id))
    }

    /// Every project, funded or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_all(&self) -> Result<Vec<Project>> {
        self.store.projects().await
    }

    /// Projects that still need money.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_open(&self) -> Result<Vec<Project>> {
        let projects: Vec<Project> = self
            .store
            .projects()
            .await?
            .into_iter()
            .filter(Project::is_open)
            .collect();
        debug!(count = projects.len(), "Listed open projects");
        Ok(projects)
    }

    /// Projects owned by the named association, open or not.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be read.
    pub async fn list_by_association(&self, association_name: &str) -> Result<Vec<Project>> {
        Ok(self
            .store
            .projects()
            .await?
            .into_iter()
            .filter(|p| p.association_name == association_name)
            .collect())
    }

    /// Delete a project. Existing donations keep their snapshots.
    ///
    /// Returns `false` if the project did not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the store write fails.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let deleted = self.store.delete_project(id).await?;
        if deleted {
            info!(id, "Deleted project");
        }
        Ok(deleted)
    }

    /// Keep projects whose category label contains `text`, ignoring case.
    ///
    /// Blank text keeps everything.
    #[must_use]
    pub fn filter_by_category(projects: Vec<Project>, text: &str) -> Vec<Project> {
        let needle = text.trim().to_lowercase();
        if needle.is_empty() {
            return projects;
        }
        projects
            .into_iter()
            .filter(|p| p.category.as_str().contains(&needle))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Category;
    use crate::store::{MemoryStore, SqliteStore};

    fn new_project(title: &str, needed: u32, association: &str, category: Category) -> NewProject {
        NewProject {
            title: title.to_string(),
            description: format!("{title} description"),
            amount_needed: needed,
            association_name: association.to_string(),
            category,
            image_url: None,
        }
    }

    #[tokio::test]
    async fn test_add_sets_remaining_and_default_image() {
        let catalog = ProjectCatalog::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        let project = catalog
            .add(&new_project("Water", 500, "Relief", Category::Money))
            .await
            .unwrap();

        assert_eq!(project.amount_remaining, 500);
        assert_eq!(project.image_url, DEFAULT_PROJECT_IMAGE);
        assert_eq!(catalog.get(&project.id).await.unwrap(), project);
    }

    #[tokio::test]
    async fn test_add_keeps_given_image() {
        let catalog = ProjectCatalog::new(Arc::new(MemoryStore::new()))
            .with_default_image("fallback.png".to_string());

        let mut with_image = new_project("Water", 5, "Relief", Category::Money);
        with_image.image_url = Some("water.png".to_string());
        assert_eq!(catalog.add(&with_image).await.unwrap().image_url, "water.png");

        let without = catalog
            .add(&new_project("Bread", 5, "Relief", Category::Food))
            .await
            .unwrap();
        assert_eq!(without.image_url, "fallback.png");
    }

    #[tokio::test]
    async fn test_add_rejects_invalid_input() {
        let catalog = ProjectCatalog::new(Arc::new(MemoryStore::new()));

        let zero = catalog.add(&new_project("Water", 0, "Relief", Category::Money)).await;
        assert!(zero.unwrap_err().is_validation());

        let untitled = catalog.add(&new_project(" ", 10, "Relief", Category::Money)).await;
        assert!(untitled.unwrap_err().is_validation());

        assert!(catalog.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_missing_project() {
        let catalog = ProjectCatalog::new(Arc::new(MemoryStore::new()));
        let err = catalog.get("missing").await.unwrap_err();
        assert!(matches!(err, Error::ProjectNotFound { .. }));
    }

    #[tokio::test]
    async fn test_list_open_skips_funded() {
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());
        let catalog = ProjectCatalog::new(Arc::clone(&store));
        let funded = catalog
            .add(&new_project("Done", 10, "Relief", Category::Money))
            .await
            .unwrap();
        let open = catalog
            .add(&new_project("Open", 10, "Relief", Category::Money))
            .await
            .unwrap();
        store.decrement_remaining(&funded.id, 10).await.unwrap();

        let listed = catalog.list_open().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, open.id);
        assert_eq!(catalog.list_all().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_list_by_association() {
        let catalog = ProjectCatalog::new(Arc::new(SqliteStore::open_in_memory().unwrap()));
        catalog.add(&new_project("A", 10, "Relief", Category::Money)).await.unwrap();
        catalog.add(&new_project("B", 10, "Other", Category::Food)).await.unwrap();
        catalog.add(&new_project("C", 10, "Relief", Category::Clothes)).await.unwrap();

        let titles: Vec<String> = catalog
            .list_by_association("Relief")
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.title)
            .collect();
        assert_eq!(titles, vec!["A", "C"]);
    }

    #[tokio::test]
    async fn test_delete() {
        let catalog = ProjectCatalog::new(Arc::new(MemoryStore::new()));
        let project = catalog
            .add(&new_project("A", 10, "Relief", Category::Money))
            .await
            .unwrap();

        assert!(catalog.delete(&project.id).await.unwrap());
        assert!(!catalog.delete(&project.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_filter_by_category() {
        let catalog = ProjectCatalog::new(Arc::new(MemoryStore::new()));
        catalog.add(&new_project("A", 10, "R", Category::Money)).await.unwrap();
        catalog.add(&new_project("B", 10, "R", Category::Food)).await.unwrap();
        catalog.add(&new_project("C", 10, "R", Category::Clothes)).await.unwrap();
        let all = catalog.list_all().await.unwrap();

        let food = ProjectCatalog::filter_by_category(all.clone(), "FOO");
        assert_eq!(food.len(), 1);
        assert_eq!(food[0].title, "B");

        assert_eq!(ProjectCatalog::filter_by_category(all.clone(), "  ").len(), 3);
        assert!(ProjectCatalog::filter_by_category(all, "shoes").is_empty());
    }
}
