// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use calple_api::config::Config;
use calple_api::db::FirestoreDb;
use calple_api::middleware::auth::create_jwt;
use calple_api::models::{Sex, User};
use calple_api::routes::create_router;
use calple_api::AppState;
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

/// Create a test app with an offline mock database.
/// Returns the router and the shared state.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<AppState>) {
    create_test_app_with_config(Config::test_default())
}

#[allow(dead_code)]
pub fn create_test_app_with_config(config: Config) -> (axum::Router, Arc<AppState>) {
    let state = Arc::new(AppState::new(config, FirestoreDb::new_mock()));
    (create_router(state.clone()), state)
}

/// Session token for `uid`, signed with the app's key.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str, signing_key: &[u8]) -> String {
    create_jwt(uid, signing_key).expect("JWT creation")
}

/// Unique suffix for test isolation against a shared emulator.
#[allow(dead_code)]
pub fn unique_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// A stored user with a unique uid and email.
#[allow(dead_code)]
pub fn test_user(label: &str) -> User {
    let id = unique_id();
    let now = chrono::Utc::now().to_rfc3339();
    User {
        uid: format!("{}-{}", label, id),
        email: format!("{}-{}@example.com", label, id),
        name: label.to_string(),
        picture: None,
        sex: Sex::Female,
        started_dating: None,
        tokens: None,
        returning_user: false,
        created_at: now.clone(),
        last_login_at: now.clone(),
        updated_at: now,
    }
}
