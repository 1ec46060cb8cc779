//! Untrusted candidate shapes, as received from a request body or form.
//!
//! Parsing only fails when the body is not JSON at all. A field holding the
//! wrong JSON type is kept as "present but blank" so that the ordered
//! validation rules report it, and numbers in free-text fields are taken as
//! their decimal text.

use serde::de::{DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Candidate payload errors.
#[derive(Error, Debug)]
pub enum CandidateError {
    #[error("Malformed patient payload: {0}")]
    Malformed(#[from] serde_json::Error),
}

pub type CandidateResult<T> = Result<T, CandidateError>;

/// A patient record before validation.
///
/// Every field is optional and enum-like fields stay raw strings, so that
/// an unknown status is reported by validation rather than by the parser.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatientCandidate {
    #[serde(deserialize_with = "text")]
    pub id: Option<String>,
    #[serde(deserialize_with = "text")]
    pub status: Option<String>,
    #[serde(deserialize_with = "text")]
    pub name: Option<String>,
    #[serde(deserialize_with = "text")]
    pub dob: Option<String>,
    #[serde(deserialize_with = "list")]
    pub addresses: Option<Vec<AddressCandidate>>,
    #[serde(deserialize_with = "text_or_number")]
    pub notes: Option<String>,
    #[serde(deserialize_with = "list")]
    pub extra: Option<Vec<ExtraFieldCandidate>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AddressCandidate {
    #[serde(deserialize_with = "text_or_number")]
    pub street: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub city: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub state: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub zip: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExtraFieldCandidate {
    #[serde(deserialize_with = "text_or_number")]
    pub name: Option<String>,
    #[serde(deserialize_with = "text_or_number")]
    pub value: Option<String>,
    #[serde(rename = "type", deserialize_with = "text")]
    pub field_type: Option<String>,
}

/// A string field. Null reads as absent, any other non-string as blank.
fn text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(_) => Some(String::new()),
    })
}

/// Like [`text`], but numbers are kept as their decimal text (`10001`).
fn text_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => Some(String::new()),
    })
}

/// A list of objects. A non-array reads as absent; a non-object entry reads
/// as an entry with every field missing.
fn list<'de, D, T>(deserializer: D) -> Result<Option<Vec<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    Ok(match Option::<Value>::deserialize(deserializer)? {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .map(|item| T::deserialize(item).unwrap_or_default())
                .collect(),
        ),
        _ => None,
    })
}

/// Request envelope: `{ "patient": { ... } }`.
#[derive(Debug, Deserialize)]
struct PatientEnvelope {
    #[serde(default)]
    patient: PatientCandidate,
}

impl PatientCandidate {
    /// Parse a bare candidate object.
    pub fn from_json(json: &str) -> CandidateResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Parse a request body wrapping the candidate under `patient`.
    pub fn from_request_body(json: &str) -> CandidateResult<Self> {
        let envelope: PatientEnvelope = serde_json::from_str(json)?;
        Ok(envelope.patient)
    }
}
