//! Command flows over an in-memory registry and a scripted analysis backend.

use std::sync::Arc;

use aqary_agent::{AnalysisClient, BackendError, MockBackend, RecordingSleeper};
use aqary_gateway::{AdminCommands, AnalyzeCommands, Commands, Gateway, SubmitArgs};
use aqary_registry::{
    AdminEmail, LoginGate, ManualClock, MemoryBackend, RecordStatus, RegistryStore, StoreConfig,
};
use chrono::{Duration, TimeZone, Utc};

const ADMIN: &str = "admin@aqarytrust.com";

struct Fixture {
    gateway: Gateway<MemoryBackend>,
    clock: Arc<ManualClock>,
    backend: Arc<MockBackend>,
}

fn fixture(backend: MockBackend) -> Fixture {
    let clock = Arc::new(ManualClock::new(Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap()));
    let store = RegistryStore::open_with(MemoryBackend::new(), clock.clone(), StoreConfig::default());
    let backend = Arc::new(backend);
    let client = AnalysisClient::new(backend.clone()).with_sleeper(Arc::new(RecordingSleeper::new()));
    Fixture {
        gateway: Gateway::new(store, LoginGate::new(AdminEmail::default()), Some(client)),
        clock,
        backend,
    }
}

fn submit(email: &str) -> Commands {
    Commands::Submit(SubmitArgs {
        email: email.to_string(),
        full_name: "Jane Doe".to_string(),
        ..SubmitArgs::default()
    })
}

fn unit_analysis() -> Commands {
    Commands::Analyze(AnalyzeCommands::Unit {
        description: "2BR, 120 sqm, delivery soon".to_string(),
    })
}

#[tokio::test]
async fn test_submit_activate_analyze() {
    let f = fixture(MockBackend::default().with_text(r#"{"score": 70, "summary": "Decent"}"#));

    let out = f.gateway.execute(None, submit("Jane@X.com"), None).await.unwrap();
    assert!(out.contains("pending approval"));

    let err = f
        .gateway
        .execute(Some("jane@x.com"), unit_analysis(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("login.pending_approval"));

    let id = f.gateway.store().find_by_email("jane@x.com").unwrap().id;
    f.gateway
        .execute(Some(ADMIN), Commands::Admin(AdminCommands::Activate { id }), None)
        .await
        .unwrap();

    let login = f
        .gateway
        .execute(None, Commands::Login { email: " JANE@x.com ".into() }, None)
        .await
        .unwrap();
    assert!(login.contains("24h 0m"));

    let report = f
        .gateway
        .execute(Some("jane@x.com"), unit_analysis(), None)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_str(&report).unwrap();
    assert_eq!(json["score"], 70.0);
    assert_eq!(json["summary"], "Decent");
    assert_eq!(json["lowConfidence"], true);
    assert_eq!(f.backend.call_count(), 1);

    f.clock.advance(Duration::hours(24) + Duration::minutes(6));
    let err = f
        .gateway
        .execute(Some("jane@x.com"), unit_analysis(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("login.window_expired"));
    assert_eq!(f.backend.call_count(), 1);
}

#[tokio::test]
async fn test_admin_commands_require_superuser() {
    let f = fixture(MockBackend::default());
    f.gateway.execute(None, submit("jane@x.com"), None).await.unwrap();

    assert!(f
        .gateway
        .execute(None, Commands::Admin(AdminCommands::List), None)
        .await
        .is_err());
    assert!(f
        .gateway
        .execute(Some("jane@x.com"), Commands::Admin(AdminCommands::List), None)
        .await
        .is_err());

    let list = f
        .gateway
        .execute(Some(ADMIN), Commands::Admin(AdminCommands::List), None)
        .await
        .unwrap();
    assert!(list.contains("jane@x.com"));
    assert!(list.contains("Jane Doe"));
}

#[tokio::test]
async fn test_status_edit_cannot_grant_access() {
    let f = fixture(MockBackend::default());
    f.gateway.execute(None, submit("jane@x.com"), None).await.unwrap();
    let id = f.gateway.store().find_by_email("jane@x.com").unwrap().id;

    let err = f
        .gateway
        .execute(
            Some(ADMIN),
            Commands::Admin(AdminCommands::Status {
                id: id.clone(),
                status: "authorized".into(),
            }),
            None,
        )
        .await;
    assert!(err.is_err());

    f.gateway
        .execute(
            Some(ADMIN),
            Commands::Admin(AdminCommands::Status {
                id: id.clone(),
                status: "contacted".into(),
            }),
            None,
        )
        .await
        .unwrap();
    assert_eq!(f.gateway.store().get(&id).unwrap().status, RecordStatus::Contacted);
}

#[tokio::test]
async fn test_payload_moves_a_record_between_registries() {
    let device = fixture(MockBackend::default());
    let out = device.gateway.execute(None, submit("sam@y.com"), None).await.unwrap();
    let payload = out.lines().last().unwrap().to_string();

    let office = fixture(MockBackend::default());
    office
        .gateway
        .execute(
            Some(ADMIN),
            Commands::Admin(AdminCommands::ImportPayload { payload }),
            None,
        )
        .await
        .unwrap();

    let record = office.gateway.store().find_by_email("sam@y.com").unwrap();
    assert_eq!(record.profile.full_name, "Jane Doe");
}

#[tokio::test]
async fn test_superuser_analysis_surfaces_fatal_errors() {
    let f = fixture(
        MockBackend::default().then_fail(BackendError::RequestFailed("HTTP 403: forbidden".into())),
    );

    let err = f
        .gateway
        .execute(Some(ADMIN), unit_analysis(), None)
        .await
        .unwrap_err();

    assert!(err.to_string().contains("failed on attempt 1"));
    assert_eq!(f.backend.call_count(), 1);
}

#[tokio::test]
async fn test_analysis_without_client_is_refused() {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let store = RegistryStore::open_with(MemoryBackend::new(), clock, StoreConfig::default());
    let gateway = Gateway::new(store, LoginGate::default(), None);

    let err = gateway
        .execute(Some(ADMIN), unit_analysis(), None)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("GEMINI_API_KEY"));
}
