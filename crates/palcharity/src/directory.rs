//! Donor and association profiles.
//!
//! Profiles are keyed by the identity-provider user id. Creating a profile
//! that already exists overwrites it.

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::{Error, Result};
use crate::model::{Association, AssociationUpdate, Donor, DonorUpdate};
use crate::store::{Presence, RecordStore};
use crate::validate::{reject_blank_update, require_non_blank};

const DONOR: &str = "donor";
const ASSOCIATION: &str = "association";

/// Donor profile operations.
#[derive(Debug, Clone)]
pub struct DonorDirectory {
    store: Arc<dyn RecordStore>,
}

impl DonorDirectory {
    /// Create a directory over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Write a donor profile. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is blank, or a store error.
    pub async fn create(&self, donor: &Donor) -> Result<()> {
        require_non_blank("uid", &donor.id)?;
        require_non_blank("firstName", &donor.first_name)?;
        require_non_blank("lastName", &donor.last_name)?;
        require_non_blank("email", &donor.email)?;

        self.store.put_donor(donor).await?;
        info!(uid = %donor.id, "Saved donor profile");
        Ok(())
    }

    /// Read a donor profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] if no donor has this id.
    pub async fn get(&self, id: &str) -> Result<Donor> {
        self.store
            .get_donor(id)
            .await?
            .ok_or_else(|| Error::profile_not_found(DONOR, id))
    }

    /// Merge the supplied fields into an existing donor profile.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty update or one that blanks a
    /// field, and [`Error::ProfileNotFound`] if the donor does not exist.
    pub async fn update(&self, id: &str, update: &DonorUpdate) -> Result<Donor> {
        if update.is_empty() {
            return Err(Error::validation("update", "no fields supplied"));
        }
        reject_blank_update("firstName", update.first_name.as_ref())?;
        reject_blank_update("lastName", update.last_name.as_ref())?;
        reject_blank_update("email", update.email.as_ref())?;

        if !self.store.update_donor(id, update).await? {
            return Err(Error::profile_not_found(DONOR, id));
        }
        debug!(uid = id, "Updated donor profile");
        self.get(id).await
    }

    /// Whether a donor profile exists.
    ///
    /// # Errors
    ///
    /// A failed read is an error, never [`Presence::Absent`].
    pub async fn exists(&self, id: &str) -> Result<Presence> {
        Ok(self.store.get_donor(id).await?.is_some().into())
    }
}

/// Association profile operations.
#[derive(Debug, Clone)]
pub struct AssociationDirectory {
    store: Arc<dyn RecordStore>,
}

impl AssociationDirectory {
    /// Create a directory over the given store.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        Self { store }
    }

    /// Write an association profile. Last write wins.
    ///
    /// # Errors
    ///
    /// Returns a validation error if any field is blank, or a store error.
    pub async fn create(&self, association: &Association) -> Result<()> {
        require_non_blank("uid", &association.id)?;
        require_non_blank("name", &association.name)?;
        require_non_blank("email", &association.email)?;

        self.store.put_association(association).await?;
        info!(uid = %association.id, name = %association.name, "Saved association profile");
        Ok(())
    }

    /// Read an association profile.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ProfileNotFound`] if no association has this id.
    pub async fn get(&self, id: &str) -> Result<Association> {
        self.store
            .get_association(id)
            .await?
            .ok_or_else(|| Error::profile_not_found(ASSOCIATION, id))
    }

    /// Merge the supplied fields into an existing association profile.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an empty update or one that blanks a
    /// field, and [`Error::ProfileNotFound`] if the association does not exist.
    pub async fn update(&self, id: &str, update: &AssociationUpdate) -> Result<Association> {
        if update.is_empty() {
            return Err(Error::validation("update", "no fields supplied"));
        }
        reject_blank_update("name", update.name.as_ref())?;
        reject_blank_update("email", update.email.as_ref())?;

        if !self.store.update_association(id, update).await? {
            return Err(Error::profile_not_found(ASSOCIATION, id));
        }
        debug!(uid = id, "Updated association profile");
        self.get(id).await
    }

    /// Whether an association profile exists.
    ///
    /// # Errors
    ///
    /// A failed read is an error, never [`Presence::Absent`].
    pub async fn exists(&self, id: &str) -> Result<Presence> {
        Ok(self.store.get_association(id).await?.is_some().into())
    }
}
