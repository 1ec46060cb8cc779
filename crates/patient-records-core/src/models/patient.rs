//! Patient record models.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::candidate::{AddressCandidate, ExtraFieldCandidate, PatientCandidate};

/// Date format used for `dob` on the wire and in storage.
pub const DOB_FORMAT: &str = "%Y-%m-%d";

/// Lifecycle status of a patient.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum PatientStatus {
    /// First contact, not yet onboarded
    Inquiry,
    /// Intake in progress
    Onboarding,
    /// Currently receiving care
    Active,
    /// No longer a patient
    Churned,
}

impl PatientStatus {
    /// Every recognized status, in lifecycle order.
    pub const ALL: [PatientStatus; 4] = [
        PatientStatus::Inquiry,
        PatientStatus::Onboarding,
        PatientStatus::Active,
        PatientStatus::Churned,
    ];

    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            PatientStatus::Inquiry => "inquiry",
            PatientStatus::Onboarding => "onboarding",
            PatientStatus::Active => "active",
            PatientStatus::Churned => "churned",
        }
    }

    /// Parse a wire name. Matching is exact; `"Active"` is not a status.
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|status| status.as_str() == s)
    }
}

impl std::fmt::Display for PatientStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A postal address. Presence of each part is the only rule.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: String,
}

/// Declared type of an extra field, used as an input hint.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ExtraFieldType {
    String,
    Number,
    Date,
}

impl ExtraFieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtraFieldType::String => "string",
            ExtraFieldType::Number => "number",
            ExtraFieldType::Date => "date",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "string" => Some(ExtraFieldType::String),
            "number" => Some(ExtraFieldType::Number),
            "date" => Some(ExtraFieldType::Date),
            _ => None,
        }
    }
}

/// A user-defined labelled attribute (insurance id, referral source, ...).
///
/// The value is always kept as text. The declared type is never enforced on
/// write; [`ExtraField::typed_value`] interprets it on read.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ExtraField {
    pub name: String,
    pub value: String,
    #[serde(rename = "type")]
    pub field_type: ExtraFieldType,
}

/// An extra field value interpreted according to its declared type.
#[derive(Debug, Clone, PartialEq)]
pub enum ExtraValue {
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl ExtraField {
    /// Interpret the stored text as the declared type.
    ///
    /// Returns `None` when the text does not parse (e.g. a `number` field
    /// holding `"n/a"`).
    pub fn typed_value(&self) -> Option<ExtraValue> {
        match self.field_type {
            ExtraFieldType::String => Some(ExtraValue::Text(self.value.clone())),
            ExtraFieldType::Number => self
                .value
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(ExtraValue::Number),
            ExtraFieldType::Date => NaiveDate::parse_from_str(self.value.trim(), DOB_FORMAT)
                .ok()
                .map(ExtraValue::Date),
        }
    }
}

/// A validated, normalized patient record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatientRecord {
    /// Store-assigned ID - absent until created, never reassigned
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub status: PatientStatus,
    /// Display name (not split into parts)
    pub name: String,
    /// Date of birth
    pub dob: NaiveDate,
    /// At least one address, in entry order
    pub addresses: Vec<Address>,
    #[serde(default)]
    pub notes: String,
    /// Never `Some` with an empty list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extra: Option<Vec<ExtraField>>,
    /// Creation timestamp (set by the store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Last update timestamp (set by the store)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

impl PatientRecord {
    /// Check if this record has been assigned an ID by the store.
    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }

    /// Age in whole years on the given date. Zero for dates before birth.
    pub fn age_on(&self, today: NaiveDate) -> u32 {
        let mut years = today.year() - self.dob.year();
        if (today.month(), today.day()) < (self.dob.month(), self.dob.day()) {
            years -= 1;
        }
        years.max(0) as u32
    }

    /// City of the first address.
    pub fn primary_city(&self) -> Option<&str> {
        self.addresses.first().map(|a| a.city.as_str())
    }

    /// Whether any address is in the given city (case-insensitive).
    pub fn has_city(&self, city: &str) -> bool {
        self.addresses
            .iter()
            .any(|a| a.city.eq_ignore_ascii_case(city))
    }

    /// Number of extra fields attached.
    pub fn extra_count(&self) -> usize {
        self.extra.as_ref().map_or(0, Vec::len)
    }

    /// Convert back into the untrusted candidate shape.
    ///
    /// Validating the result yields this record again (minus store timestamps).
    pub fn to_candidate(&self) -> PatientCandidate {
        PatientCandidate {
            id: self.id.clone(),
            status: Some(self.status.as_str().to_string()),
            name: Some(self.name.clone()),
            dob: Some(self.dob.format(DOB_FORMAT).to_string()),
            addresses: Some(
                self.addresses
                    .iter()
                    .map(|a| AddressCandidate {
                        street: Some(a.street.clone()),
                        city: Some(a.city.clone()),
                        state: Some(a.state.clone()),
                        zip: Some(a.zip.clone()),
                    })
                    .collect(),
            ),
            notes: Some(self.notes.clone()),
            extra: self.extra.as_ref().map(|fields| {
                fields
                    .iter()
                    .map(|f| ExtraFieldCandidate {
                        name: Some(f.name.clone()),
                        value: Some(f.value.clone()),
                        field_type: Some(f.field_type.as_str().to_string()),
                    })
                    .collect()
            }),
        }
    }
}
