//! Patient record validation.
//!
//! Both entry points run the same ordered rule set and stop at the first
//! failure, so callers can rely on a deterministic message for a given
//! candidate:
//!
//! 1. status is one of the four recognized values
//! 2. name is non-empty
//! 3. dob is present and parses
//! 4. at least one address
//! 5. every address has street, city, state, zip (in that order)
//! 6. every extra field has name, value and a recognized type
//! 7. id: required on update, forbidden on create
//!
//! Validation never touches the store. On success the record is normalized:
//! missing notes become `""` and an empty extra list is dropped.

mod rules;

use std::fmt;

use thiserror::Error;

use crate::models::{PatientCandidate, PatientRecord};

/// Why an extra field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtraFieldProblem {
    MissingName,
    MissingValue,
    InvalidType,
}

impl fmt::Display for ExtraFieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtraFieldProblem::MissingName => f.write_str("name is required"),
            ExtraFieldProblem::MissingValue => f.write_str("value is required"),
            ExtraFieldProblem::InvalidType => f.write_str("type must be string, number or date"),
        }
    }
}

/// Validation errors. All are recoverable and meant for the end user.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid status")]
    InvalidStatus,

    #[error("Missing mandatory field: {0}")]
    MissingField(&'static str),

    #[error("At least one address is required")]
    MissingAddress,

    #[error("Address {} is missing {}", .0 + 1, .1)]
    MissingAddressField(usize, &'static str),

    #[error("Extra field {} is invalid: {}", .0 + 1, .1)]
    InvalidExtraField(usize, ExtraFieldProblem),

    #[error("A new patient cannot carry an id")]
    UnexpectedId,
}

pub type ValidationResult<T> = Result<T, ValidationError>;

/// Validate a candidate that is about to be created.
///
/// The candidate must not carry an id; the store assigns one.
pub fn validate_for_create(candidate: &PatientCandidate) -> ValidationResult<PatientRecord> {
    let record = rules::check_shape(candidate)?;
    if assigned_id(candidate).is_some() {
        return Err(ValidationError::UnexpectedId);
    }
    Ok(record)
}

/// Validate a candidate that replaces an existing record.
///
/// The candidate must carry the non-empty id of the record it replaces.
pub fn validate_for_update(candidate: &PatientCandidate) -> ValidationResult<PatientRecord> {
    let mut record = rules::check_shape(candidate)?;
    let id = assigned_id(candidate).ok_or(ValidationError::MissingField("id"))?;
    record.id = Some(id.to_string());
    Ok(record)
}

/// The candidate's id, if it names a record. A blank id names nothing.
fn assigned_id(candidate: &PatientCandidate) -> Option<&str> {
    candidate.id.as_deref().filter(|id| !id.is_empty())
}
