//! Submission, activation, login and re-activation across a store reload.

use std::sync::Arc;

use aqary_registry::{
    Clock, JsonFileBackend, LoginGate, LoginRejection, ManualClock, RecordStatus, RegistryStore,
    StoreConfig, Submission,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 5, 4, 8, 0, 0).unwrap()
}

#[test]
fn test_jane_window_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    let clock = Arc::new(ManualClock::new(t0()));
    let gate = LoginGate::default();

    let store = RegistryStore::open_with(
        JsonFileBackend::new(&path),
        clock.clone(),
        StoreConfig::default(),
    );

    let jane = store.submit(Submission::email("jane@x.com")).unwrap();
    assert_eq!(jane.status, RecordStatus::Pending);
    assert_eq!(
        gate.login(&store.records(), "jane@x.com", clock.now())
            .unwrap_err(),
        LoginRejection::PendingApproval
    );

    store.activate(&jane.id).unwrap();

    clock.set(t0() + Duration::hours(23));
    let session = gate
        .login(&store.records(), "Jane@X.com", t0() + Duration::hours(23))
        .unwrap();
    assert_eq!(session.record().id, jane.id);

    // A restart past the window reconciles the record to Expired.
    clock.set(t0() + Duration::hours(25));
    let reopened = RegistryStore::open_with(
        JsonFileBackend::new(&path),
        clock.clone(),
        StoreConfig::default(),
    );
    assert_eq!(
        reopened.get(&jane.id).unwrap().status,
        RecordStatus::Expired
    );
    assert_eq!(
        gate.login(&reopened.records(), "jane@x.com", t0() + Duration::hours(25))
            .unwrap_err(),
        LoginRejection::WindowExpired
    );
    assert!(session.check(t0() + Duration::hours(25)).is_err());

    let renewed = reopened.activate(&jane.id).unwrap().unwrap();
    assert_eq!(renewed.activated_at, Some(t0() + Duration::hours(25)));
    assert!(gate
        .login(&reopened.records(), "jane@x.com", t0() + Duration::hours(25))
        .is_ok());
    assert!(gate
        .login(&reopened.records(), "jane@x.com", t0() + Duration::hours(48))
        .is_ok());
}

#[test]
fn test_retention_purge_across_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    let clock = Arc::new(ManualClock::new(t0()));

    let store = RegistryStore::open_with(
        JsonFileBackend::new(&path),
        clock.clone(),
        StoreConfig::default(),
    );
    store.submit(Submission::email("early@x.com")).unwrap();
    clock.advance(Duration::days(2));
    store.submit(Submission::email("later@x.com")).unwrap();

    clock.advance(Duration::days(6));
    let reopened = RegistryStore::open_with(
        JsonFileBackend::new(&path),
        clock.clone(),
        StoreConfig::default(),
    );
    let emails: Vec<String> = reopened.records().into_iter().map(|r| r.email).collect();
    assert_eq!(emails, vec!["later@x.com".to_string()]);
}

#[test]
fn test_corrupt_file_is_not_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("registry.json");
    std::fs::write(&path, "[{\"id\": 1,").unwrap();

    let store = RegistryStore::open(JsonFileBackend::new(&path));
    assert!(store.records().is_empty());

    store.submit(Submission::email("fresh@x.com")).unwrap();
    let reopened = RegistryStore::open(JsonFileBackend::new(&path));
    assert_eq!(reopened.records().len(), 1);
}
