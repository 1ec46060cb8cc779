//! Filtering and sorting for the patient listing.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, PatientStatus};

/// Column to sort the listing by.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Status,
    Age,
    /// City of the first address
    City,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Listing filters and sort order. The default query lists everything in
/// store order.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientQuery {
    /// Exact status, `None` for all
    pub status: Option<PatientStatus>,
    /// Any address in this city (case-insensitive)
    pub city: Option<String>,
    /// Case-insensitive substring of the name
    pub name_contains: Option<String>,
    pub sort: Option<(SortKey, SortDirection)>,
}

impl PatientQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_status(mut self, status: PatientStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_name(mut self, fragment: impl Into<String>) -> Self {
        self.name_contains = Some(fragment.into());
        self
    }

    pub fn sorted_by(mut self, key: SortKey, direction: SortDirection) -> Self {
        self.sort = Some((key, direction));
        self
    }

    /// Check a single record against the filters.
    pub fn matches(&self, record: &PatientRecord) -> bool {
        if let Some(status) = self.status {
            if record.status != status {
                return false;
            }
        }

        if let Some(city) = self.city.as_deref().filter(|c| !c.is_empty()) {
            if !record.has_city(city) {
                return false;
            }
        }

        if let Some(fragment) = self.name_contains.as_deref().filter(|f| !f.is_empty()) {
            if !record
                .name
                .to_lowercase()
                .contains(&fragment.to_lowercase())
            {
                return false;
            }
        }

        true
    }

    /// Filter then sort. Ties keep their incoming order.
    ///
    /// `today` anchors age computation.
    pub fn apply(&self, records: Vec<PatientRecord>, today: NaiveDate) -> Vec<PatientRecord> {
        let mut matched: Vec<PatientRecord> =
            records.into_iter().filter(|r| self.matches(r)).collect();

        if let Some((key, direction)) = self.sort {
            matched.sort_by(|a, b| {
                let ordering = compare(key, a, b, today);
                match direction {
                    SortDirection::Ascending => ordering,
                    SortDirection::Descending => ordering.reverse(),
                }
            });
        }

        matched
    }
}

fn compare(key: SortKey, a: &PatientRecord, b: &PatientRecord, today: NaiveDate) -> Ordering {
    match key {
        SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
        SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
        SortKey::Age => a.age_on(today).cmp(&b.age_on(today)),
        SortKey::City => {
            let city = |r: &PatientRecord| r.primary_city().map(str::to_lowercase);
            city(a).cmp(&city(b))
        }
    }
}
