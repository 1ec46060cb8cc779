//! Property tests for the validation contract.
//!
//! Each property pins one rule of the ordering: whatever else a candidate
//! carries, the earliest failing rule decides the error.

use patient_records_core::models::{AddressCandidate, ExtraFieldCandidate, PatientCandidate};
use patient_records_core::validation::{
    validate_for_create, validate_for_update, ExtraFieldProblem, ValidationError,
};
use proptest::option;
use proptest::prelude::*;

const STATUSES: [&str; 4] = ["inquiry", "onboarding", "active", "churned"];
const ADDRESS_FIELDS: [&str; 4] = ["street", "city", "state", "zip"];

fn valid_status() -> impl Strategy<Value = String> {
    prop::sample::select(STATUSES.to_vec()).prop_map(String::from)
}

fn invalid_status() -> impl Strategy<Value = Option<String>> {
    option::of(
        "[A-Za-z]{0,12}".prop_filter("must not be a recognized status", |s: &String| {
            !STATUSES.contains(&s.as_str())
        }),
    )
}

fn text() -> impl Strategy<Value = String> {
    "[A-Za-z0-9 .,-]{1,16}"
}

fn maybe_text() -> impl Strategy<Value = Option<String>> {
    option::of("[A-Za-z0-9 ]{0,8}")
}

fn valid_dob() -> impl Strategy<Value = String> {
    (1900i32..2024, 1u32..=12, 1u32..=28)
        .prop_map(|(y, m, d)| format!("{:04}-{:02}-{:02}", y, m, d))
}

fn valid_address() -> impl Strategy<Value = AddressCandidate> {
    (text(), text(), text(), "[0-9]{5}").prop_map(|(street, city, state, zip)| AddressCandidate {
        street: Some(street),
        city: Some(city),
        state: Some(state),
        zip: Some(zip),
    })
}

fn any_address() -> impl Strategy<Value = AddressCandidate> {
    (maybe_text(), maybe_text(), maybe_text(), maybe_text()).prop_map(
        |(street, city, state, zip)| AddressCandidate {
            street,
            city,
            state,
            zip,
        },
    )
}

fn valid_extra() -> impl Strategy<Value = ExtraFieldCandidate> {
    (
        text(),
        text(),
        prop::sample::select(vec!["string", "number", "date"]),
    )
        .prop_map(|(name, value, ty)| ExtraFieldCandidate {
            name: Some(name),
            value: Some(value),
            field_type: Some(ty.to_string()),
        })
}

fn any_extra() -> impl Strategy<Value = ExtraFieldCandidate> {
    (maybe_text(), maybe_text(), maybe_text()).prop_map(|(name, value, field_type)| {
        ExtraFieldCandidate {
            name,
            value,
            field_type,
        }
    })
}

/// Anything at all, except that status is left unset.
fn any_candidate() -> impl Strategy<Value = PatientCandidate> {
    (
        option::of("[a-z0-9]{0,4}"),
        maybe_text(),
        maybe_text(),
        option::of(prop::collection::vec(any_address(), 0..3)),
        maybe_text(),
        option::of(prop::collection::vec(any_extra(), 0..3)),
    )
        .prop_map(|(id, name, dob, addresses, notes, extra)| PatientCandidate {
            id,
            status: None,
            name,
            dob,
            addresses,
            notes,
            extra,
        })
}

fn valid_candidate() -> impl Strategy<Value = PatientCandidate> {
    (
        valid_status(),
        text(),
        valid_dob(),
        prop::collection::vec(valid_address(), 1..4),
        option::of("[A-Za-z ]{0,20}"),
        option::of(prop::collection::vec(valid_extra(), 0..3)),
    )
        .prop_map(|(status, name, dob, addresses, notes, extra)| PatientCandidate {
            id: None,
            status: Some(status),
            name: Some(name),
            dob: Some(dob),
            addresses: Some(addresses),
            notes,
            extra,
        })
}

/// An address whose `missing` field (by position) is blank, earlier ones set.
fn address_missing(missing: usize, blank: Option<String>) -> AddressCandidate {
    let field = |i: usize| {
        if i < missing {
            Some(format!("value-{}", i))
        } else if i == missing {
            blank.clone()
        } else {
            None
        }
    };
    AddressCandidate {
        street: field(0),
        city: field(1),
        state: field(2),
        zip: field(3),
    }
}

proptest! {
    #[test]
    fn unknown_status_is_reported_first(status in invalid_status(), rest in any_candidate()) {
        let candidate = PatientCandidate { status, ..rest };
        prop_assert_eq!(validate_for_create(&candidate), Err(ValidationError::InvalidStatus));
        prop_assert_eq!(validate_for_update(&candidate), Err(ValidationError::InvalidStatus));
    }

    #[test]
    fn empty_name_after_valid_status(
        status in valid_status(),
        name in option::of(Just(String::new())),
        rest in any_candidate(),
    ) {
        let candidate = PatientCandidate { status: Some(status), name, ..rest };
        prop_assert_eq!(
            validate_for_create(&candidate),
            Err(ValidationError::MissingField("name"))
        );
    }

    #[test]
    fn unparseable_dob_after_valid_name(
        status in valid_status(),
        name in text(),
        dob in option::of("[a-z ]{0,10}"),
        rest in any_candidate(),
    ) {
        let candidate = PatientCandidate {
            status: Some(status),
            name: Some(name),
            dob,
            ..rest
        };
        prop_assert_eq!(
            validate_for_create(&candidate),
            Err(ValidationError::MissingField("dob"))
        );
    }

    #[test]
    fn no_addresses_after_valid_dob(
        base in valid_candidate(),
        addresses in option::of(Just(Vec::<AddressCandidate>::new())),
    ) {
        let candidate = PatientCandidate { addresses, ..base };
        prop_assert_eq!(validate_for_create(&candidate), Err(ValidationError::MissingAddress));
    }

    #[test]
    fn first_incomplete_address_is_reported(
        base in valid_candidate(),
        prefix in prop::collection::vec(valid_address(), 0..3),
        missing in 0usize..4,
        blank in option::of(Just(String::new())),
        suffix in prop::collection::vec(any_address(), 0..3),
        extra in option::of(prop::collection::vec(any_extra(), 0..3)),
    ) {
        let index = prefix.len();
        let mut addresses = prefix;
        addresses.push(address_missing(missing, blank));
        addresses.extend(suffix);

        let candidate = PatientCandidate {
            addresses: Some(addresses),
            extra,
            ..base
        };
        prop_assert_eq!(
            validate_for_create(&candidate),
            Err(ValidationError::MissingAddressField(index, ADDRESS_FIELDS[missing]))
        );
    }

    #[test]
    fn extra_field_with_empty_value_is_rejected(
        base in valid_candidate(),
        prefix in prop::collection::vec(valid_extra(), 0..3),
        name in text(),
    ) {
        let index = prefix.len();
        let mut extra = prefix;
        extra.push(ExtraFieldCandidate {
            name: Some(name),
            value: Some(String::new()),
            field_type: Some("string".into()),
        });

        let candidate = PatientCandidate { extra: Some(extra), ..base };
        prop_assert_eq!(
            validate_for_create(&candidate),
            Err(ValidationError::InvalidExtraField(index, ExtraFieldProblem::MissingValue))
        );
    }

    #[test]
    fn valid_candidates_normalize(candidate in valid_candidate()) {
        let record = validate_for_create(&candidate).unwrap();

        prop_assert_eq!(&record.notes, &candidate.notes.clone().unwrap_or_default());
        prop_assert!(record.extra.as_ref().map_or(true, |e| !e.is_empty()));
        prop_assert_eq!(record.addresses.len(), candidate.addresses.as_ref().map_or(0, Vec::len));
    }

    #[test]
    fn revalidation_is_idempotent(candidate in valid_candidate()) {
        let first = validate_for_create(&candidate).unwrap();
        let second = validate_for_create(&first.to_candidate()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn update_keeps_the_given_id(candidate in valid_candidate(), id in "[a-z0-9-]{1,20}") {
        let candidate = PatientCandidate { id: Some(id.clone()), ..candidate };
        let record = validate_for_update(&candidate).unwrap();
        prop_assert_eq!(record.id.as_deref(), Some(id.as_str()));

        let again = validate_for_update(&record.to_candidate()).unwrap();
        prop_assert_eq!(again, record);
    }
}
