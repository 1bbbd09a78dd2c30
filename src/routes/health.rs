// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Liveness and datastore probes.

use crate::error::Result;
use crate::time_utils::now_rfc3339;
use crate::AppState;
use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/health/firebase", get(firebase_health))
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct HealthResponse {
    pub status: String,
    pub environment: String,
    pub timestamp: String,
}

/// Health check response
async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        environment: state.config.environment.as_str().to_string(),
        timestamp: now_rfc3339(),
    })
}

#[derive(Serialize)]
pub struct DatastoreHealth {
    pub status: String,
    pub firestore: String,
}

/// Round-trip to Firestore. Failures surface as a 500 `database_error`.
async fn firebase_health(State(state): State<Arc<AppState>>) -> Result<Json<DatastoreHealth>> {
    state.db.ping().await?;
    Ok(Json(DatastoreHealth {
        status: "ok".to_string(),
        firestore: "connected".to_string(),
    }))
}
