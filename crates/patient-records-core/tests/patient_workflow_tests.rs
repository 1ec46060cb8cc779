//! End-to-end patient workflows: session -> validation -> store.

use patient_records_core::auth::{FixedIdentity, OwnerId, SessionIdentity};
use patient_records_core::db::Database;
use patient_records_core::models::{PatientCandidate, PatientStatus};
use patient_records_core::query::{PatientQuery, SortDirection, SortKey};
use patient_records_core::service::{PatientService, ServiceError};
use patient_records_core::validation::{validate_for_create, ValidationError};

const MINIMAL: &str = r#"{
    "status": "inquiry",
    "name": "Jane Doe",
    "dob": "2000-01-01",
    "addresses": [
        {"street": "1 Main St", "city": "Metropolis", "state": "NY", "zip": "10001"}
    ]
}"#;

fn owner(id: &str) -> OwnerId {
    OwnerId::new(id).unwrap()
}

#[test]
fn test_minimal_record_round_trip() {
    let candidate = PatientCandidate::from_json(MINIMAL).unwrap();
    let record = validate_for_create(&candidate).unwrap();

    assert_eq!(record.notes, "");
    assert!(record.extra.is_none());

    let json = serde_json::to_value(&record).unwrap();
    assert!(json.get("extra").is_none());
    assert_eq!(json["notes"], "");
    assert_eq!(json["status"], "inquiry");
}

#[test]
fn test_second_address_missing_city() {
    let body = r#"{"patient": {
        "status": "active",
        "name": "John Smith",
        "dob": "1975-05-20",
        "addresses": [
            {"street": "1 Main St", "city": "Metropolis", "state": "NY", "zip": "10001"},
            {"street": "9 Harbor Rd", "state": "NJ", "zip": "07030"}
        ]
    }}"#;

    let candidate = PatientCandidate::from_request_body(body).unwrap();
    assert_eq!(
        validate_for_create(&candidate),
        Err(ValidationError::MissingAddressField(1, "city"))
    );
}

#[test]
fn test_session_scoped_crud() {
    let db = Database::open_in_memory().unwrap();
    let service = PatientService::new(&db);

    let token = db.issue_session(&owner("uid-1")).unwrap();
    let header = format!("Bearer {}", token);
    let identity = SessionIdentity::from_header(&db, &header);

    let created = service
        .create(&identity, &PatientCandidate::from_json(MINIMAL).unwrap())
        .unwrap();
    let id = created.id.clone().unwrap();

    // Another owner cannot see or touch it
    let intruder = FixedIdentity::signed_in(owner("uid-2"));
    assert!(matches!(service.get(&intruder, &id), Err(ServiceError::NotFound(_))));
    assert!(matches!(service.delete(&intruder, &id), Err(ServiceError::NotFound(_))));

    // Edit through the same session
    let mut edit = created.to_candidate();
    edit.status = Some("onboarding".into());
    let updated = service.update(&identity, &edit).unwrap();
    assert_eq!(updated.status, PatientStatus::Onboarding);
    assert_eq!(updated.id.as_deref(), Some(id.as_str()));

    // Revoked session loses access
    db.revoke_session(&token).unwrap();
    let stale = SessionIdentity::from_header(&db, &header);
    assert!(matches!(service.get(&stale, &id), Err(ServiceError::Unauthorized)));

    // Data is still there for the owner
    let fresh = FixedIdentity::signed_in(owner("uid-1"));
    assert!(service.get(&fresh, &id).is_ok());
}

#[test]
fn test_unauthorized_precedes_validation() {
    let db = Database::open_in_memory().unwrap();
    let service = PatientService::new(&db);
    let anonymous = SessionIdentity::from_header(&db, "");

    let result = service.create(&anonymous, &PatientCandidate::default());
    assert!(matches!(result, Err(ServiceError::Unauthorized)));
}

#[test]
fn test_update_clears_extra_fields() {
    let db = Database::open_in_memory().unwrap();
    let service = PatientService::new(&db);
    let identity = FixedIdentity::signed_in(owner("uid-1"));

    let mut candidate = PatientCandidate::from_json(MINIMAL).unwrap();
    candidate.extra = PatientCandidate::from_json(
        r#"{"extra": [{"name": "Insurer", "value": "Acme", "type": "string"}]}"#,
    )
    .unwrap()
    .extra;
    let created = service.create(&identity, &candidate).unwrap();
    assert_eq!(created.extra_count(), 1);

    let mut edit = created.to_candidate();
    edit.extra = Some(vec![]);
    let updated = service.update(&identity, &edit).unwrap();
    assert!(updated.extra.is_none());
}

#[test]
fn test_listing_filters_and_sorts() {
    let db = Database::open_in_memory().unwrap();
    let service = PatientService::new(&db);
    let identity = FixedIdentity::signed_in(owner("uid-1"));

    let people = [
        ("Zoe Park", "active", "Boston"),
        ("Adam Lee", "churned", "Boston"),
        ("Mia Chen", "active", "Denver"),
    ];
    for (name, status, city) in people {
        let mut candidate = PatientCandidate::from_json(MINIMAL).unwrap();
        candidate.name = Some(name.into());
        candidate.status = Some(status.into());
        if let Some(addresses) = candidate.addresses.as_mut() {
            addresses[0].city = Some(city.into());
        }
        service.create(&identity, &candidate).unwrap();
    }

    let active_by_name = service
        .list(
            &identity,
            &PatientQuery::new()
                .with_status(PatientStatus::Active)
                .sorted_by(SortKey::Name, SortDirection::Ascending),
        )
        .unwrap();
    let names: Vec<&str> = active_by_name.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, ["Mia Chen", "Zoe Park"]);

    let in_boston = service
        .list(&identity, &PatientQuery::new().with_city("boston"))
        .unwrap();
    assert_eq!(in_boston.len(), 2);

    let analytics = service.analytics(&identity).unwrap();
    assert_eq!(analytics.total, 3);
    assert_eq!(analytics.status_counts.active, 2);
    assert_eq!(analytics.city_counts["Boston"], 2);
}

#[test]
fn test_records_survive_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("records.db");
    let identity = FixedIdentity::signed_in(owner("uid-1"));

    let id = {
        let db = Database::open(&path).unwrap();
        let service = PatientService::new(&db);
        let created = service
            .create(&identity, &PatientCandidate::from_json(MINIMAL).unwrap())
            .unwrap();
        created.id.unwrap()
    };

    let db = Database::open(&path).unwrap();
    let service = PatientService::new(&db);
    let reloaded = service.get(&identity, &id).unwrap();
    assert_eq!(reloaded.name, "Jane Doe");
    assert_eq!(reloaded.dob.to_string(), "2000-01-01");
}
