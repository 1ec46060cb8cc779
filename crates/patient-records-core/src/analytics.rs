//! Aggregate counts over an owner's patients.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::models::{PatientRecord, PatientStatus};

/// Patient count per status. Every status is present, zero-filled.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub inquiry: usize,
    pub onboarding: usize,
    pub active: usize,
    pub churned: usize,
}

impl StatusCounts {
    pub fn get(&self, status: PatientStatus) -> usize {
        match status {
            PatientStatus::Inquiry => self.inquiry,
            PatientStatus::Onboarding => self.onboarding,
            PatientStatus::Active => self.active,
            PatientStatus::Churned => self.churned,
        }
    }

    fn increment(&mut self, status: PatientStatus) {
        let slot = match status {
            PatientStatus::Inquiry => &mut self.inquiry,
            PatientStatus::Onboarding => &mut self.onboarding,
            PatientStatus::Active => &mut self.active,
            PatientStatus::Churned => &mut self.churned,
        };
        *slot += 1;
    }
}

/// Overview numbers for the analytics page.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PatientAnalytics {
    /// Total patients
    pub total: usize,
    pub status_counts: StatusCounts,
    /// Patients with at least one address in the city. Cities differing
    /// only in ASCII case are one city, labelled by its first spelling.
    pub city_counts: BTreeMap<String, usize>,
    /// Patients with at least one address in the state, grouped like cities
    pub state_counts: BTreeMap<String, usize>,
    /// Patients carrying any extra fields
    pub with_extra_fields: usize,
}

impl PatientAnalytics {
    /// Compute analytics over a set of records.
    ///
    /// A patient with two addresses in the same city counts once for it.
    pub fn compute(records: &[PatientRecord]) -> Self {
        let mut analytics = Self {
            total: records.len(),
            ..Self::default()
        };
        let mut cities = Tally::default();
        let mut states = Tally::default();

        for record in records {
            analytics.status_counts.increment(record.status);

            if record.extra_count() > 0 {
                analytics.with_extra_fields += 1;
            }

            cities.add(record.addresses.iter().map(|a| a.city.as_str()));
            states.add(record.addresses.iter().map(|a| a.state.as_str()));
        }

        analytics.city_counts = cities.into_counts();
        analytics.state_counts = states.into_counts();
        analytics
    }

    /// Patients with an address in `city`, ignoring ASCII case.
    pub fn city_count(&self, city: &str) -> usize {
        self.city_counts
            .iter()
            .find(|(label, _)| label.eq_ignore_ascii_case(city))
            .map_or(0, |(_, count)| *count)
    }

    /// Percentage (0-100) of patients with an address in `city`.
    pub fn city_share(&self, city: &str) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.city_count(city) as f64 * 100.0 / self.total as f64
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Distinct-per-patient counts keyed by ASCII-folded name.
#[derive(Default)]
struct Tally {
    /// folded key -> (first spelling seen, patients)
    entries: BTreeMap<String, (String, usize)>,
}

impl Tally {
    fn add<'a>(&mut self, names: impl Iterator<Item = &'a str>) {
        let mut seen = BTreeSet::new();
        for name in names {
            let key = name.to_ascii_lowercase();
            if !seen.insert(key.clone()) {
                continue;
            }
            self.entries
                .entry(key)
                .or_insert_with(|| (name.to_string(), 0))
                .1 += 1;
        }
    }

    fn into_counts(self) -> BTreeMap<String, usize> {
        self.entries.into_values().collect()
    }
}
