//! Individual validation rules, applied in order by [`check_shape`].

use chrono::{DateTime, NaiveDate};

use super::{ExtraFieldProblem, ValidationError, ValidationResult};
use crate::models::{
    Address, AddressCandidate, ExtraField, ExtraFieldCandidate, ExtraFieldType, PatientCandidate,
    PatientRecord, PatientStatus, DOB_FORMAT,
};

/// Run rules 1-6 and build the normalized record. The id is left unset.
pub(super) fn check_shape(candidate: &PatientCandidate) -> ValidationResult<PatientRecord> {
    let status = candidate
        .status
        .as_deref()
        .and_then(PatientStatus::parse)
        .ok_or(ValidationError::InvalidStatus)?;

    let name = required(candidate.name.as_deref()).ok_or(ValidationError::MissingField("name"))?;

    let dob = candidate
        .dob
        .as_deref()
        .and_then(parse_dob)
        .ok_or(ValidationError::MissingField("dob"))?;

    let addresses = match candidate.addresses.as_deref() {
        Some(list) if !list.is_empty() => list,
        _ => return Err(ValidationError::MissingAddress),
    };
    let addresses = addresses
        .iter()
        .enumerate()
        .map(|(index, address)| check_address(index, address))
        .collect::<ValidationResult<Vec<_>>>()?;

    let extra = match candidate.extra.as_deref() {
        Some(list) if !list.is_empty() => Some(
            list.iter()
                .enumerate()
                .map(|(index, field)| check_extra_field(index, field))
                .collect::<ValidationResult<Vec<_>>>()?,
        ),
        _ => None,
    };

    Ok(PatientRecord {
        id: None,
        status,
        name: name.to_string(),
        dob,
        addresses,
        notes: candidate.notes.clone().unwrap_or_default(),
        extra,
        created_at: None,
        updated_at: None,
    })
}

fn check_address(index: usize, address: &AddressCandidate) -> ValidationResult<Address> {
    let field = |value: &Option<String>, name: &'static str| {
        required(value.as_deref())
            .map(str::to_string)
            .ok_or(ValidationError::MissingAddressField(index, name))
    };

    Ok(Address {
        street: field(&address.street, "street")?,
        city: field(&address.city, "city")?,
        state: field(&address.state, "state")?,
        zip: field(&address.zip, "zip")?,
    })
}

fn check_extra_field(index: usize, field: &ExtraFieldCandidate) -> ValidationResult<ExtraField> {
    let invalid = |problem| ValidationError::InvalidExtraField(index, problem);

    let name = required(field.name.as_deref()).ok_or(invalid(ExtraFieldProblem::MissingName))?;
    let value = required(field.value.as_deref()).ok_or(invalid(ExtraFieldProblem::MissingValue))?;
    let field_type = field
        .field_type
        .as_deref()
        .and_then(ExtraFieldType::parse)
        .ok_or(invalid(ExtraFieldProblem::InvalidType))?;

    Ok(ExtraField {
        name: name.to_string(),
        value: value.to_string(),
        field_type,
    })
}

/// Present and non-empty. Whitespace counts as content.
fn required(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Accepts a calendar date (`2000-01-01`) or an RFC 3339 timestamp, which is
/// what a serialized JavaScript `Date` looks like.
pub(crate) fn parse_dob(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, DOB_FORMAT)
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive()))
}
