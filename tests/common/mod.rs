// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use glucose_bridge::config::Config;
use glucose_bridge::db::{FirestoreDb, MemoryStore};
use glucose_bridge::error::SyncError;
use glucose_bridge::models::{AuthTicket, StoredSession, UserProfile};
use glucose_bridge::routes::create_router;
use glucose_bridge::services::companion::DataMap;
use glucose_bridge::services::{
    CompanionChannel, CompanionRelay, HealthWriter, LinkUpClient, SyncOrchestrator,
};
use glucose_bridge::AppState;
use serde_json::json;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

pub const TEST_EMAIL: &str = "jane@example.com";
pub const TEST_PASSWORD: &str = "hunter2";
pub const TEST_USER_ID: &str = "user-1";

/// Profile matching [`login_body`].
#[allow(dead_code)]
pub fn test_profile() -> UserProfile {
    UserProfile {
        id: TEST_USER_ID.to_string(),
        first_name: "Jane".to_string(),
        last_name: "Doe".to_string(),
        email: TEST_EMAIL.to_string(),
    }
}

/// Ticket that stays valid for the rest of the test run.
#[allow(dead_code)]
pub fn valid_ticket(token: &str) -> AuthTicket {
    AuthTicket {
        token: token.to_string(),
        expires: chrono::Utc::now().timestamp() + 3600,
        duration: 3_600_000,
    }
}

/// Stored session pointing at the given API base URL.
#[allow(dead_code)]
pub fn stored_session(version: u64, ticket: AuthTicket, api_base_url: &str) -> StoredSession {
    StoredSession {
        version,
        ticket,
        profile: test_profile(),
        api_base_url: api_base_url.to_string(),
    }
}

/// Successful `/llu/auth/login` body.
#[allow(dead_code)]
pub fn login_body(token: &str) -> serde_json::Value {
    json!({
        "status": 0,
        "data": {
            "user": {
                "id": TEST_USER_ID,
                "firstName": "Jane",
                "lastName": "Doe",
                "email": TEST_EMAIL
            },
            "authTicket": {
                "token": token,
                "expires": chrono::Utc::now().timestamp() + 3600,
                "duration": 3_600_000
            }
        }
    })
}

/// Measurement as LibreLinkUp sends it.
#[allow(dead_code)]
pub fn measurement_json(factory_timestamp: &str, value: f64, units: i32) -> serde_json::Value {
    json!({
        "FactoryTimestamp": factory_timestamp,
        "Timestamp": factory_timestamp,
        "Value": value,
        "ValueInMgPerDl": value,
        "MeasurementColor": 1,
        "GlucoseUnits": units,
        "TrendArrow": 3,
        "isHigh": false,
        "isLow": false
    })
}

/// `/llu/connections` body with one patient, optionally with a rotated ticket.
#[allow(dead_code)]
pub fn connections_body(
    measurement: Option<serde_json::Value>,
    rotated: Option<&str>,
) -> serde_json::Value {
    let mut connection = json!({
        "patientId": "patient-1",
        "firstName": "Pat",
        "lastName": "Doe"
    });
    if let Some(m) = measurement {
        connection["glucoseMeasurement"] = m;
    }

    let mut body = json!({"status": 0, "data": [connection]});
    if let Some(token) = rotated {
        body["ticket"] = json!({
            "token": token,
            "expires": chrono::Utc::now().timestamp() + 7200,
            "duration": 7_200_000
        });
    }
    body
}

/// Companion that records every pushed data item.
#[derive(Default)]
pub struct RecordingCompanion {
    pub pushed: Mutex<Vec<(String, DataMap)>>,
    pub fail: bool,
}

#[async_trait]
impl CompanionChannel for RecordingCompanion {
    async fn is_installed(&self) -> bool {
        true
    }

    async fn put_data_item(&self, path: &str, data: &DataMap) -> Result<(), SyncError> {
        if self.fail {
            return Err(SyncError::Relay("companion rejected item".to_string()));
        }
        self.pushed
            .lock()
            .unwrap()
            .push((path.to_string(), data.clone()));
        Ok(())
    }
}

/// Orchestrator wired to in-memory stores and a LibreLinkUp mock.
pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub companion: Option<Arc<RecordingCompanion>>,
    pub orchestrator: SyncOrchestrator,
}

/// Build an orchestrator against `api_url`.
///
/// The same [`MemoryStore`] backs both the session slot and the health
/// store so tests can inspect everything in one place.
#[allow(dead_code)]
pub fn harness(
    api_url: &str,
    store: MemoryStore,
    with_credentials: bool,
    companion: Option<RecordingCompanion>,
) -> Harness {
    let mut config = Config::test_default();
    config.api_url = api_url.to_string();
    if with_credentials {
        config.credentials = Some(glucose_bridge::config::Credentials {
            email: TEST_EMAIL.to_string(),
            password: TEST_PASSWORD.to_string().into(),
        });
    }
    harness_for(&config, store, companion)
}

/// Build an orchestrator from a full config.
#[allow(dead_code)]
pub fn harness_for(
    config: &Config,
    store: MemoryStore,
    companion: Option<RecordingCompanion>,
) -> Harness {
    let store = Arc::new(store);
    let companion = companion.map(Arc::new);
    let relay = match &companion {
        Some(c) => {
            let channel: Arc<dyn CompanionChannel> = c.clone();
            CompanionRelay::new(Some(channel), Duration::from_secs(2))
        }
        None => CompanionRelay::disabled(),
    };

    let orchestrator = SyncOrchestrator::new(
        test_client(config),
        store.clone(),
        HealthWriter::new(store.clone()),
        relay,
        config.credentials.clone(),
        config.data_origin.clone(),
    );

    Harness {
        store,
        companion,
        orchestrator,
    }
}

/// LibreLinkUp client configured the way `main` builds it.
pub fn test_client(config: &Config) -> LinkUpClient {
    LinkUpClient::new(&config.api_url)
        .expect("Failed to build LibreLinkUp client")
        .with_regional_template(config.regional_url_template.clone())
}

/// Create a test app with in-memory dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app_with(config: Config, store: Arc<MemoryStore>) -> (axum::Router, Arc<AppState>) {
    let orchestrator = SyncOrchestrator::new(
        test_client(&config),
        store.clone(),
        HealthWriter::new(store),
        CompanionRelay::disabled(),
        config.credentials.clone(),
        config.data_origin.clone(),
    );

    let state = Arc::new(AppState {
        config,
        orchestrator,
    });

    (create_router(state.clone()), state)
}

/// Test app that talks to an unreachable LibreLinkUp host.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with(Config::test_default(), Arc::new(MemoryStore::new()))
}

/// `Authorization` header value the test app accepts.
#[allow(dead_code)]
pub fn trigger_auth(config: &Config) -> String {
    format!("Bearer {}", config.trigger_token)
}
