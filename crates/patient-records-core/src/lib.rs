//! Patient-Records Core Library
//!
//! Owner-scoped patient record management with a strict validation contract.
//!
//! # Architecture
//!
//! ```text
//!   Authorization: Bearer <token>        candidate (form / request body)
//!               │                                   │
//!       [Identity: owner or none] ──none──▶ Unauthorized
//!               │ owner                             │
//!               └──────────────┬────────────────────┘
//!                              ▼
//!                  validate_for_create / _update
//!                  (first failing rule wins)
//!                              │ normalized PatientRecord
//!                              ▼
//!                PatientStore (SQLite, keyed owner → id)
//!                              │
//!               ┌──────────────┴──────────────┐
//!               ▼                             ▼
//!        PatientQuery                  PatientAnalytics
//!     (filter / sort listing)          (aggregate counts)
//! ```
//!
//! # Core Principle
//!
//! **Nothing reaches the store unvalidated, and nothing reaches validation
//! without an owner.**
//!
//! # Modules
//!
//! - [`validation`]: ordered validation rules and their error taxonomy
//! - [`models`]: domain types (PatientRecord, Address, ExtraField, candidates)
//! - [`auth`]: caller identity and bearer sessions
//! - [`db`]: SQLite record store
//! - [`service`]: identity → validation → store orchestration
//! - [`query`] / [`analytics`]: listing and aggregate counts

pub mod analytics;
pub mod auth;
pub mod config;
pub mod db;
pub mod logging;
pub mod models;
pub mod query;
pub mod service;
pub mod store;
pub mod validation;

// Re-export commonly used types
pub use analytics::{PatientAnalytics, StatusCounts};
pub use auth::{BearerCredential, FixedIdentity, Identity, OwnerId, SessionIdentity};
pub use config::Config;
pub use db::Database;
pub use models::{
    Address, ExtraField, ExtraFieldType, PatientCandidate, PatientRecord, PatientStatus,
};
pub use query::{PatientQuery, SortDirection, SortKey};
pub use service::{PatientService, ServiceError};
pub use store::PatientStore;
pub use validation::{validate_for_create, validate_for_update, ValidationError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum PatientRecordsError {
    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<db::DbError> for PatientRecordsError {
    fn from(e: db::DbError) -> Self {
        PatientRecordsError::DatabaseError(e.to_string())
    }
}

impl From<serde_json::Error> for PatientRecordsError {
    fn from(e: serde_json::Error) -> Self {
        PatientRecordsError::SerializationError(e.to_string())
    }
}

impl From<models::CandidateError> for PatientRecordsError {
    fn from(e: models::CandidateError) -> Self {
        PatientRecordsError::InvalidInput(e.to_string())
    }
}

impl From<ServiceError> for PatientRecordsError {
    fn from(e: ServiceError) -> Self {
        match e {
            ServiceError::Unauthorized => {
                PatientRecordsError::Unauthorized("missing or unknown credential".into())
            }
            ServiceError::Validation(v) => PatientRecordsError::InvalidInput(v.to_string()),
            ServiceError::NotFound(id) => PatientRecordsError::NotFound(id),
            ServiceError::Store(db) => db.into(),
        }
    }
}

impl<T> From<std::sync::PoisonError<T>> for PatientRecordsError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        PatientRecordsError::DatabaseError(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create a database at the given path.
#[uniffi::export]
pub fn open_database(path: String) -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let db = Database::open(&path)?;
    Ok(Arc::new(PatientRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Create an in-memory database (for testing).
#[uniffi::export]
pub fn open_database_in_memory() -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let db = Database::open_in_memory()?;
    Ok(Arc::new(PatientRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

/// Open the database named by `PATIENT_RECORDS_DB` and install logging.
#[uniffi::export]
pub fn open_from_env() -> Result<Arc<PatientRecordsCore>, PatientRecordsError> {
    let config = Config::from_env();
    logging::init(&config);
    let db = config.open_database()?;
    tracing::info!(persistent = config.database_path.is_some(), "patient store opened");
    Ok(Arc::new(PatientRecordsCore {
        db: Arc::new(Mutex::new(db)),
    }))
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe database wrapper for FFI.
///
/// Patient operations take the raw `Authorization` header value
/// (`Bearer <token>`); an absent or unknown token fails with `Unauthorized`.
#[derive(uniffi::Object)]
pub struct PatientRecordsCore {
    db: Arc<Mutex<Database>>,
}

#[uniffi::export]
impl PatientRecordsCore {
    // =========================================================================
    // Session Operations
    // =========================================================================

    /// Issue a bearer token for an owner already authenticated upstream.
    pub fn issue_session(&self, owner_id: String) -> Result<String, PatientRecordsError> {
        let owner = OwnerId::new(owner_id)
            .ok_or_else(|| PatientRecordsError::InvalidInput("owner id is empty".into()))?;
        let db = self.db.lock()?;
        Ok(db.issue_session(&owner)?)
    }

    /// Revoke a bearer token.
    pub fn revoke_session(&self, token: String) -> Result<bool, PatientRecordsError> {
        let db = self.db.lock()?;
        Ok(db.revoke_session(&token)?)
    }

    /// Revoke every bearer token of an owner (sign out everywhere).
    pub fn revoke_owner_sessions(&self, owner_id: String) -> Result<u64, PatientRecordsError> {
        let owner = OwnerId::new(owner_id)
            .ok_or_else(|| PatientRecordsError::InvalidInput("owner id is empty".into()))?;
        let db = self.db.lock()?;
        Ok(db.revoke_owner_sessions(&owner)? as u64)
    }

    /// Drop tokens past their maximum age.
    pub fn purge_expired_sessions(&self) -> Result<u64, PatientRecordsError> {
        let db = self.db.lock()?;
        let purged = db.purge_expired_sessions()?;
        tracing::info!(purged, "expired sessions purged");
        Ok(purged as u64)
    }

    // =========================================================================
    // Patient Operations
    // =========================================================================

    /// Create a patient from form input.
    pub fn create_patient(
        &self,
        authorization: String,
        patient: FfiPatientInput,
    ) -> Result<FfiPatientRecord, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let created = PatientService::new(&*db).create(&identity, &patient.into())?;
        Ok(created.into())
    }

    /// Create a patient from a JSON request body (`{"patient": {...}}`).
    pub fn create_patient_json(
        &self,
        authorization: String,
        body: String,
    ) -> Result<FfiPatientRecord, PatientRecordsError> {
        let candidate = PatientCandidate::from_request_body(&body)?;
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let created = PatientService::new(&*db).create(&identity, &candidate)?;
        Ok(created.into())
    }

    /// Replace an existing patient. `patient.id` selects the record.
    pub fn update_patient(
        &self,
        authorization: String,
        patient: FfiPatientInput,
    ) -> Result<FfiPatientRecord, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let updated = PatientService::new(&*db).update(&identity, &patient.into())?;
        Ok(updated.into())
    }

    /// Replace an existing patient from a JSON request body.
    pub fn update_patient_json(
        &self,
        authorization: String,
        id: String,
        body: String,
    ) -> Result<FfiPatientRecord, PatientRecordsError> {
        let mut candidate = PatientCandidate::from_request_body(&body)?;
        // The path id is authoritative
        candidate.id = Some(id);
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let updated = PatientService::new(&*db).update(&identity, &candidate)?;
        Ok(updated.into())
    }

    /// Delete a patient by ID.
    pub fn delete_patient(
        &self,
        authorization: String,
        id: String,
    ) -> Result<(), PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        PatientService::new(&*db).delete(&identity, &id)?;
        Ok(())
    }

    /// Get a patient by ID.
    pub fn get_patient(
        &self,
        authorization: String,
        id: String,
    ) -> Result<FfiPatientRecord, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let patient = PatientService::new(&*db).get(&identity, &id)?;
        Ok(patient.into())
    }

    /// List patients through filters and sort order.
    pub fn list_patients(
        &self,
        authorization: String,
        query: FfiPatientQuery,
    ) -> Result<Vec<FfiPatientRecord>, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let patients = PatientService::new(&*db).list(&identity, &query.into())?;
        Ok(patients.into_iter().map(|p| p.into()).collect())
    }

    // =========================================================================
    // Analytics Operations
    // =========================================================================

    /// Aggregate counts over the caller's patients.
    pub fn get_analytics(
        &self,
        authorization: String,
    ) -> Result<FfiAnalytics, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let analytics = PatientService::new(&*db).analytics(&identity)?;
        Ok(analytics.into())
    }

    /// Analytics as pretty-printed JSON.
    pub fn export_analytics_json(
        &self,
        authorization: String,
    ) -> Result<String, PatientRecordsError> {
        let db = self.db.lock()?;
        let identity = SessionIdentity::from_header(&db, &authorization);
        let analytics = PatientService::new(&*db).analytics(&identity)?;
        Ok(analytics.to_json()?)
    }
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe patient status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiPatientStatus {
    Inquiry,
    Onboarding,
    Active,
    Churned,
}

impl From<PatientStatus> for FfiPatientStatus {
    fn from(status: PatientStatus) -> Self {
        match status {
            PatientStatus::Inquiry => FfiPatientStatus::Inquiry,
            PatientStatus::Onboarding => FfiPatientStatus::Onboarding,
            PatientStatus::Active => FfiPatientStatus::Active,
            PatientStatus::Churned => FfiPatientStatus::Churned,
        }
    }
}

impl From<FfiPatientStatus> for PatientStatus {
    fn from(status: FfiPatientStatus) -> Self {
        match status {
            FfiPatientStatus::Inquiry => PatientStatus::Inquiry,
            FfiPatientStatus::Onboarding => PatientStatus::Onboarding,
            FfiPatientStatus::Active => PatientStatus::Active,
            FfiPatientStatus::Churned => PatientStatus::Churned,
        }
    }
}

/// FFI-safe address.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAddress {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

impl From<Address> for FfiAddress {
    fn from(address: Address) -> Self {
        Self {
            street: address.street,
            city: address.city,
            state: address.state,
            zip: address.zip,
        }
    }
}

/// FFI-safe extra field. `field_type` is one of `string`, `number`, `date`.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiExtraField {
    pub name: String,
    pub value: String,
    pub field_type: String,
}

impl From<ExtraField> for FfiExtraField {
    fn from(field: ExtraField) -> Self {
        Self {
            name: field.name,
            value: field.value,
            field_type: field.field_type.as_str().to_string(),
        }
    }
}

/// FFI-safe patient form input. Validated before anything is stored.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientInput {
    pub id: Option<String>,
    pub status: String,
    pub name: String,
    /// `YYYY-MM-DD` or RFC 3339
    pub dob: String,
    pub addresses: Vec<FfiAddress>,
    pub notes: Option<String>,
    pub extra: Vec<FfiExtraField>,
}

impl From<FfiPatientInput> for PatientCandidate {
    fn from(input: FfiPatientInput) -> Self {
        PatientCandidate {
            id: input.id,
            status: Some(input.status),
            name: Some(input.name),
            dob: Some(input.dob),
            addresses: Some(
                input
                    .addresses
                    .into_iter()
                    .map(|a| models::AddressCandidate {
                        street: Some(a.street),
                        city: Some(a.city),
                        state: Some(a.state),
                        zip: Some(a.zip),
                    })
                    .collect(),
            ),
            notes: input.notes,
            extra: Some(
                input
                    .extra
                    .into_iter()
                    .map(|f| models::ExtraFieldCandidate {
                        name: Some(f.name),
                        value: Some(f.value),
                        field_type: Some(f.field_type),
                    })
                    .collect(),
            ),
        }
    }
}

/// FFI-safe stored patient.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientRecord {
    pub id: String,
    pub status: FfiPatientStatus,
    pub name: String,
    /// `YYYY-MM-DD`
    pub dob: String,
    pub addresses: Vec<FfiAddress>,
    pub notes: String,
    pub extra: Vec<FfiExtraField>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<PatientRecord> for FfiPatientRecord {
    fn from(record: PatientRecord) -> Self {
        Self {
            id: record.id.unwrap_or_default(),
            status: record.status.into(),
            name: record.name,
            dob: record.dob.format(models::DOB_FORMAT).to_string(),
            addresses: record.addresses.into_iter().map(|a| a.into()).collect(),
            notes: record.notes,
            extra: record
                .extra
                .unwrap_or_default()
                .into_iter()
                .map(|f| f.into())
                .collect(),
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// FFI-safe sort column.
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiSortKey {
    Name,
    Status,
    Age,
    City,
}

impl From<FfiSortKey> for SortKey {
    fn from(key: FfiSortKey) -> Self {
        match key {
            FfiSortKey::Name => SortKey::Name,
            FfiSortKey::Status => SortKey::Status,
            FfiSortKey::Age => SortKey::Age,
            FfiSortKey::City => SortKey::City,
        }
    }
}

/// FFI-safe listing query.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiPatientQuery {
    pub status: Option<FfiPatientStatus>,
    pub city: Option<String>,
    pub name_contains: Option<String>,
    pub sort_key: Option<FfiSortKey>,
    pub descending: bool,
}

impl From<FfiPatientQuery> for PatientQuery {
    fn from(query: FfiPatientQuery) -> Self {
        let direction = if query.descending {
            SortDirection::Descending
        } else {
            SortDirection::Ascending
        };
        PatientQuery {
            status: query.status.map(Into::into),
            city: query.city,
            name_contains: query.name_contains,
            sort: query.sort_key.map(|key| (key.into(), direction)),
        }
    }
}

/// FFI-safe labelled count.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCount {
    pub label: String,
    pub count: u64,
}

/// FFI-safe analytics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiAnalytics {
    pub total: u64,
    pub inquiry: u64,
    pub onboarding: u64,
    pub active: u64,
    pub churned: u64,
    pub with_extra_fields: u64,
    pub city_counts: Vec<FfiCount>,
    pub state_counts: Vec<FfiCount>,
}

impl From<PatientAnalytics> for FfiAnalytics {
    fn from(analytics: PatientAnalytics) -> Self {
        let counts = |map: std::collections::BTreeMap<String, usize>| -> Vec<FfiCount> {
            map.into_iter()
                .map(|(label, count)| FfiCount {
                    label,
                    count: count as u64,
                })
                .collect()
        };
        Self {
            total: analytics.total as u64,
            inquiry: analytics.status_counts.inquiry as u64,
            onboarding: analytics.status_counts.onboarding as u64,
            active: analytics.status_counts.active as u64,
            churned: analytics.status_counts.churned as u64,
            with_extra_fields: analytics.with_extra_fields as u64,
            city_counts: counts(analytics.city_counts),
            state_counts: counts(analytics.state_counts),
        }
    }
}
