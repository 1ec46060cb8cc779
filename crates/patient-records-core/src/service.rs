//! Patient operations for an authenticated owner.
//!
//! Each operation resolves the caller first, validates second and only then
//! touches the store. An anonymous caller never reaches validation; an
//! invalid record never reaches the store.

use thiserror::Error;
use tracing::{debug, info, warn};

use crate::analytics::PatientAnalytics;
use crate::auth::{Identity, OwnerId};
use crate::db::DbError;
use crate::models::{PatientCandidate, PatientRecord};
use crate::query::PatientQuery;
use crate::store::PatientStore;
use crate::validation::{validate_for_create, validate_for_update, ValidationError};

/// Service errors.
#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Patient not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] DbError),
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Coordinates identity, validation and the record store.
pub struct PatientService<'a, S: PatientStore> {
    store: &'a S,
}

impl<'a, S: PatientStore> PatientService<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Create a patient and return it as stored.
    pub fn create(
        &self,
        identity: &dyn Identity,
        candidate: &PatientCandidate,
    ) -> ServiceResult<PatientRecord> {
        let owner = authorize(identity)?;
        let record = validate_for_create(candidate).map_err(|e| rejected(&owner, e))?;

        let id = self.store.create_patient(&owner, &record)?;
        info!(owner = %owner, patient_id = %id, "patient created");

        self.fetch(&owner, &id)
    }

    /// Replace an existing patient with the candidate (full overwrite).
    pub fn update(
        &self,
        identity: &dyn Identity,
        candidate: &PatientCandidate,
    ) -> ServiceResult<PatientRecord> {
        let owner = authorize(identity)?;
        let record = validate_for_update(candidate).map_err(|e| rejected(&owner, e))?;
        let Some(id) = record.id.clone() else {
            return Err(ValidationError::MissingField("id").into());
        };

        if !self.store.update_patient(&owner, &id, &record)? {
            warn!(owner = %owner, patient_id = %id, "update of unknown patient");
            return Err(ServiceError::NotFound(id));
        }
        info!(owner = %owner, patient_id = %id, "patient updated");

        self.fetch(&owner, &id)
    }

    /// Delete a patient. Irreversible.
    pub fn delete(&self, identity: &dyn Identity, id: &str) -> ServiceResult<()> {
        let owner = authorize(identity)?;

        if !self.store.delete_patient(&owner, id)? {
            return Err(ServiceError::NotFound(id.to_string()));
        }
        info!(owner = %owner, patient_id = %id, "patient deleted");
        Ok(())
    }

    pub fn get(&self, identity: &dyn Identity, id: &str) -> ServiceResult<PatientRecord> {
        let owner = authorize(identity)?;
        self.fetch(&owner, id)
    }

    /// List the owner's patients through the query's filters and sort.
    pub fn list(
        &self,
        identity: &dyn Identity,
        query: &PatientQuery,
    ) -> ServiceResult<Vec<PatientRecord>> {
        let owner = authorize(identity)?;
        let records = self.store.list_patients(&owner)?;
        let total = records.len();

        let listed = query.apply(records, chrono::Utc::now().date_naive());
        debug!(owner = %owner, total, listed = listed.len(), "patients listed");
        Ok(listed)
    }

    pub fn analytics(&self, identity: &dyn Identity) -> ServiceResult<PatientAnalytics> {
        let owner = authorize(identity)?;
        let records = self.store.list_patients(&owner)?;
        Ok(PatientAnalytics::compute(&records))
    }

    fn fetch(&self, owner: &OwnerId, id: &str) -> ServiceResult<PatientRecord> {
        self.store
            .get_patient(owner, id)?
            .ok_or_else(|| ServiceError::NotFound(id.to_string()))
    }
}

fn authorize(identity: &dyn Identity) -> ServiceResult<OwnerId> {
    identity.current_owner_id().ok_or_else(|| {
        warn!("rejected call without an authenticated owner");
        ServiceError::Unauthorized
    })
}

fn rejected(owner: &OwnerId, error: ValidationError) -> ValidationError {
    warn!(owner = %owner, reason = %error, "patient rejected by validation");
    error
}
