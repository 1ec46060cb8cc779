//! Record store contract.
//!
//! Every call is scoped to an owner: a record created by one owner is
//! invisible to every other owner. Callers validate before writing; the store
//! does not re-check record shape.

use crate::auth::OwnerId;
use crate::db::DbResult;
use crate::models::PatientRecord;

pub trait PatientStore {
    /// Persist a validated record and return its newly assigned ID.
    /// Any `id` already on the record is ignored.
    fn create_patient(&self, owner: &OwnerId, record: &PatientRecord) -> DbResult<String>;

    /// Replace the record at `id`. Returns false if the owner has no such record.
    fn update_patient(&self, owner: &OwnerId, id: &str, record: &PatientRecord)
        -> DbResult<bool>;

    /// Delete the record at `id`. Returns false if the owner has no such record.
    fn delete_patient(&self, owner: &OwnerId, id: &str) -> DbResult<bool>;

    fn get_patient(&self, owner: &OwnerId, id: &str) -> DbResult<Option<PatientRecord>>;

    /// All records of the owner, oldest first.
    fn list_patients(&self, owner: &OwnerId) -> DbResult<Vec<PatientRecord>>;
}
