// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Partner pairing routes.

use super::current_user;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Connection, UserProfile};
use crate::services::PendingInvitation;
use crate::validation::normalize_email;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/connection", get(get_connection))
        .route("/api/connection/invite", post(invite))
        .route("/api/connection/pending", get(pending))
        .route("/api/connection/{id}/accept", post(accept))
        .route("/api/connection/{id}/reject", post(reject))
        .route("/api/debug/connection", get(debug_connection))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionResponse {
    pub connected: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connection_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner: Option<UserProfile>,
}

async fn get_connection(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<ConnectionResponse>> {
    let response = match state.pairing.current(&auth.uid).await? {
        Some((connection, partner)) => ConnectionResponse {
            connected: true,
            connection_id: Some(connection.id),
            partner: partner.as_ref().map(UserProfile::from),
        },
        None => ConnectionResponse {
            connected: false,
            connection_id: None,
            partner: None,
        },
    };
    Ok(Json(response))
}

#[derive(Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "A valid email address is required"))]
    pub email: String,
}

#[derive(Serialize)]
pub struct ConnectionEnvelope {
    pub connection: Connection,
}

async fn invite(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<InviteRequest>, AppError>,
) -> Result<(StatusCode, Json<ConnectionEnvelope>)> {
    let body = InviteRequest {
        email: normalize_email(&body.email),
    };
    body.validate()?;

    let caller = current_user(&state, &auth).await?;
    let connection = state.pairing.invite(&caller, &body.email).await?;
    Ok((StatusCode::CREATED, Json(ConnectionEnvelope { connection })))
}

#[derive(Serialize)]
pub struct PendingResponse {
    pub invitations: Vec<PendingInvitation>,
}

async fn pending(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PendingResponse>> {
    let caller = current_user(&state, &auth).await?;
    let invitations = state.pairing.pending(&caller).await?;
    Ok(Json(PendingResponse { invitations }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptResponse {
    pub connection: Connection,
    pub already_active: bool,
    pub events_updated: usize,
    pub events_failed: usize,
}

async fn accept(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<AcceptResponse>> {
    let caller = current_user(&state, &auth).await?;
    let outcome = state.pairing.accept(&caller, &id).await?;
    Ok(Json(AcceptResponse {
        connection: outcome.connection,
        already_active: outcome.already_active,
        events_updated: outcome.fan_out.updated,
        events_failed: outcome.fan_out.failed,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RejectResponse {
    pub success: bool,
    pub events_updated: usize,
    pub events_failed: usize,
}

async fn reject(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<Json<RejectResponse>> {
    let caller = current_user(&state, &auth).await?;
    let fan_out = state.pairing.reject(&caller, &id).await?;
    Ok(Json(RejectResponse {
        success: true,
        events_updated: fan_out.updated,
        events_failed: fan_out.failed,
    }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugConnectionResponse {
    pub uid: String,
    pub email: String,
    pub connections: Vec<Connection>,
    pub active: Option<Connection>,
}

/// Raw connection documents for support requests.
async fn debug_connection(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<DebugConnectionResponse>> {
    let caller = current_user(&state, &auth).await?;
    let connections = state.db.list_connections(&caller.uid).await?;
    let active = connections.iter().find(|c| c.is_active()).cloned();

    tracing::debug!(uid = %caller.uid, count = connections.len(), "Connection debug requested");

    Ok(Json(DebugConnectionResponse {
        uid: caller.uid,
        email: caller.email,
        connections,
        active,
    }))
}
