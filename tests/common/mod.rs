// SPDX-License-Identifier: MIT

use grindzone_api::config::Config;
use grindzone_api::db::FirestoreDb;
use grindzone_api::routes::create_router;
use grindzone_api::services::{AssistantService, BookingService, GoogleIdentityVerifier};
use grindzone_api::AppState;
use std::sync::Arc;

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
            eprintln!("Skipping: FIRESTORE_EMULATOR_HOST not set");
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

/// Create a mock database connection (offline).
#[allow(dead_code)]
pub fn test_db_offline() -> FirestoreDb {
    FirestoreDb::new_mock()
}

/// Create a session JWT for tests.
#[allow(dead_code)]
pub fn create_test_jwt(user_id: &str, signing_key: &[u8]) -> String {
    grindzone_api::middleware::auth::create_jwt(user_id, signing_key)
        .expect("Failed to create test JWT")
}

/// Build the AppState for a given database connection.
#[allow(dead_code)]
pub fn test_state(db: FirestoreDb) -> Arc<AppState> {
    let config = Config::test_default();

    let identity_verifier = Arc::new(
        GoogleIdentityVerifier::new_with_static_key(
            &config,
            "test-kid",
            jsonwebtoken::DecodingKey::from_secret(b"test-static-key"),
        )
        .expect("Failed to build test verifier"),
    );

    let booking_service = BookingService::new(db.clone());
    let assistant_service = AssistantService::new(
        config.gemini_api_key.clone(),
        config.tts_api_key.clone(),
    );

    Arc::new(AppState {
        config,
        db,
        booking_service,
        identity_verifier,
        assistant_service,
    })
}

/// Create a test app with offline mock dependencies.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db_offline());
    (create_router(state.clone()), state)
}

/// Create a test app backed by the Firestore emulator.
#[allow(dead_code)]
pub async fn create_emulator_app() -> (axum::Router, Arc<AppState>) {
    let state = test_state(test_db().await);
    (create_router(state.clone()), state)
}
