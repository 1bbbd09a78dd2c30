// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map pin routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Pin;
use crate::time_utils::now_rfc3339;
use crate::validation::{parse_iso_date, require_text};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/pins", get(list_pins).post(create_pin))
        .route("/api/pins/{id}", put(update_pin).delete(delete_pin))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PinsResponse {
    pub pins: Vec<Pin>,
    pub partner_pins: Vec<Pin>,
}

/// The caller's pins and, when paired, the partner's.
async fn list_pins(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PinsResponse>> {
    let (pins, partner) = tokio::try_join!(
        state.db.list_pins(&auth.uid),
        state.pairing.active_partner(&auth.uid),
    )?;

    let partner_pins = match partner {
        Some(partner) => state.db.list_pins(&partner.uid).await?,
        None => Vec::new(),
    };

    Ok(Json(PinsResponse { pins, partner_pins }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PinInput {
    pub lat: f64,
    pub lng: f64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub location: String,
    pub date: String,
}

impl PinInput {
    fn validate(&self) -> Result<()> {
        require_text("title", &self.title)?;
        parse_iso_date(&self.date)?;
        if !(-90.0..=90.0).contains(&self.lat) {
            return Err(AppError::BadRequest(
                "lat must be between -90 and 90".to_string(),
            ));
        }
        if !(-180.0..=180.0).contains(&self.lng) {
            return Err(AppError::BadRequest(
                "lng must be between -180 and 180".to_string(),
            ));
        }
        Ok(())
    }
}

async fn create_pin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<PinInput>, AppError>,
) -> Result<(StatusCode, Json<Pin>)> {
    input.validate()?;

    let now = now_rfc3339();
    let pin = Pin {
        id: uuid::Uuid::new_v4().to_string(),
        lat: input.lat,
        lng: input.lng,
        title: input.title.trim().to_string(),
        description: input.description,
        location: input.location,
        date: input.date,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.set_pin(&auth.uid, &pin).await?;

    tracing::debug!(uid = %auth.uid, pin_id = %pin.id, "Pin created");
    Ok((StatusCode::CREATED, Json(pin)))
}

async fn update_pin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<PinInput>, AppError>,
) -> Result<Json<Pin>> {
    input.validate()?;

    let existing = state
        .db
        .get_pin(&auth.uid, &id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Pin {} not found", id)))?;

    let pin = Pin {
        lat: input.lat,
        lng: input.lng,
        title: input.title.trim().to_string(),
        description: input.description,
        location: input.location,
        date: input.date,
        updated_at: now_rfc3339(),
        ..existing
    };
    state.db.set_pin(&auth.uid, &pin).await?;
    Ok(Json(pin))
}

async fn delete_pin(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.get_pin(&auth.uid, &id).await?.is_none() {
        return Err(AppError::NotFound(format!("Pin {} not found", id)));
    }
    state.db.delete_pin(&auth.uid, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pin(lat: f64, lng: f64, date: &str) -> PinInput {
        PinInput {
            lat,
            lng,
            title: "Cafe".to_string(),
            description: String::new(),
            location: String::new(),
            date: date.to_string(),
        }
    }

    #[test]
    fn test_pin_bounds() {
        assert!(pin(90.0, 180.0, "2024-01-01").validate().is_ok());
        assert!(pin(-90.0, -180.0, "2024-01-01").validate().is_ok());
        assert!(pin(90.5, 0.0, "2024-01-01").validate().is_err());
        assert!(pin(0.0, -180.5, "2024-01-01").validate().is_err());
        assert!(pin(f64::NAN, 0.0, "2024-01-01").validate().is_err());
    }

    #[test]
    fn test_pin_requires_iso_date_and_title() {
        assert!(pin(0.0, 0.0, "20240101").validate().is_err());
        let mut untitled = pin(0.0, 0.0, "2024-01-01");
        untitled.title = String::new();
        assert!(untitled.validate().is_err());
    }
}
