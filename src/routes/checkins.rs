// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Daily check-in routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Checkin, Sex};
use crate::time_utils::now_rfc3339;
use crate::validation::{parse_iso_date, require_text};
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

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/checkin", post(save_checkin))
        .route("/api/checkin/{date}", get(get_checkin).delete(delete_checkin))
        .route("/api/checkin/partner/{date}", get(partner_checkin))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckinInput {
    pub date: String,
    pub mood: String,
    pub energy: String,
    pub period_status: Option<String>,
    pub sexual_mood: Option<String>,
    pub note: Option<String>,
}

/// One check-in per day; saving again replaces it but keeps `createdAt`.
async fn save_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<CheckinInput>, AppError>,
) -> Result<Json<Checkin>> {
    parse_iso_date(&input.date)?;
    require_text("mood", &input.mood)?;
    require_text("energy", &input.energy)?;

    let now = now_rfc3339();
    let created_at = state
        .db
        .get_checkin(&auth.uid, &input.date)
        .await?
        .map(|existing| existing.created_at)
        .unwrap_or_else(|| now.clone());

    let checkin = Checkin {
        date: input.date,
        mood: input.mood,
        energy: input.energy,
        period_status: input.period_status,
        sexual_mood: input.sexual_mood,
        note: input.note,
        created_at,
        updated_at: now,
    };
    state.db.set_checkin(&auth.uid, &checkin).await?;

    tracing::debug!(uid = %auth.uid, date = %checkin.date, "Check-in saved");
    Ok(Json(checkin))
}

#[derive(Serialize)]
pub struct CheckinResponse {
    pub checkin: Option<Checkin>,
}

async fn get_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<CheckinResponse>> {
    parse_iso_date(&date)?;
    let checkin = state.db.get_checkin(&auth.uid, &date).await?;
    Ok(Json(CheckinResponse { checkin }))
}

async fn delete_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<StatusCode> {
    parse_iso_date(&date)?;

    if state.db.get_checkin(&auth.uid, &date).await?.is_none() {
        return Err(AppError::NotFound(format!("No check-in for {}", date)));
    }
    state.db.delete_checkin(&auth.uid, &date).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerCheckin {
    pub checkin: Option<Checkin>,
    pub partner_name: String,
    pub partner_email: String,
    pub partner_sex: Sex,
}

async fn partner_checkin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<Json<PartnerCheckin>> {
    parse_iso_date(&date)?;

    let partner = state
        .pairing
        .active_partner(&auth.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("No active partner".to_string()))?;

    let checkin = state.db.get_checkin(&partner.uid, &date).await?;
    Ok(Json(PartnerCheckin {
        checkin,
        partner_name: partner.name,
        partner_email: partner.email,
        partner_sex: partner.sex,
    }))
}
