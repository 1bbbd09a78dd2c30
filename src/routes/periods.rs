// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Cycle tracking routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{CycleSettings, PeriodDay, Sex};
use crate::time_utils::now_rfc3339;
use crate::validation::parse_iso_date;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_CRAMP_INTENSITY: i64 = 10;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/periods/days", get(list_days).post(save_day))
        .route("/api/periods/days/{date}", delete(delete_day))
        .route("/api/periods/partner/days", get(partner_days))
        .route(
            "/api/periods/settings",
            get(get_settings).put(save_settings),
        )
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDays {
    pub period_days: Vec<PeriodDay>,
}

async fn list_days(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PeriodDays>> {
    let period_days = state.db.list_period_days(&auth.uid).await?;
    Ok(Json(PeriodDays { period_days }))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PartnerPeriodDays {
    pub period_days: Vec<PeriodDay>,
    pub partner_sex: Sex,
}

async fn partner_days(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<PartnerPeriodDays>> {
    let partner = state
        .pairing
        .active_partner(&auth.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("No active partner".to_string()))?;

    let period_days = state.db.list_period_days(&partner.uid).await?;
    Ok(Json(PartnerPeriodDays {
        period_days,
        partner_sex: partner.sex,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodDayInput {
    pub date: String,
    #[serde(default)]
    pub is_period: bool,
    #[serde(default)]
    pub symptoms: Vec<String>,
    #[serde(default)]
    pub cramp_intensity: i64,
    #[serde(default)]
    pub mood: Vec<String>,
    #[serde(default)]
    pub activities: Vec<String>,
    #[serde(default)]
    pub sex_activity: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

impl PeriodDayInput {
    fn validate(&self) -> Result<()> {
        parse_iso_date(&self.date)?;
        if !(0..=MAX_CRAMP_INTENSITY).contains(&self.cramp_intensity) {
            return Err(AppError::BadRequest(format!(
                "crampIntensity must be between 0 and {}",
                MAX_CRAMP_INTENSITY
            )));
        }
        Ok(())
    }
}

/// Create or replace the entry for one day.
async fn save_day(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<PeriodDayInput>, AppError>,
) -> Result<Json<PeriodDay>> {
    input.validate()?;

    let now = now_rfc3339();
    let created_at = state
        .db
        .get_period_day(&auth.uid, &input.date)
        .await?
        .map(|existing| existing.created_at)
        .unwrap_or_else(|| now.clone());

    let day = PeriodDay {
        date: input.date,
        is_period: input.is_period,
        symptoms: input.symptoms,
        cramp_intensity: input.cramp_intensity,
        mood: input.mood,
        activities: input.activities,
        sex_activity: input.sex_activity,
        notes: input.notes,
        created_at,
        updated_at: now,
    };
    state.db.set_period_day(&auth.uid, &day).await?;

    tracing::debug!(uid = %auth.uid, date = %day.date, "Period day saved");
    Ok(Json(day))
}

async fn delete_day(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(date): Path<String>,
) -> Result<StatusCode> {
    parse_iso_date(&date)?;

    if state.db.get_period_day(&auth.uid, &date).await?.is_none() {
        return Err(AppError::NotFound(format!("No entry for {}", date)));
    }
    state.db.delete_period_day(&auth.uid, &date).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<CycleSettings>> {
    let settings = state
        .db
        .get_cycle_settings(&auth.uid)
        .await?
        .unwrap_or_default();
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSettingsInput {
    pub cycle_length: i64,
    pub period_length: i64,
}

fn check_range(field: &str, value: i64, (min, max): (i64, i64)) -> Result<()> {
    if value < min || value > max {
        return Err(AppError::BadRequest(format!(
            "{} must be between {} and {}",
            field, min, max
        )));
    }
    Ok(())
}

async fn save_settings(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<CycleSettingsInput>, AppError>,
) -> Result<Json<CycleSettings>> {
    check_range("cycleLength", input.cycle_length, CycleSettings::CYCLE_LENGTH_RANGE)?;
    check_range("periodLength", input.period_length, CycleSettings::PERIOD_LENGTH_RANGE)?;

    let now = now_rfc3339();
    let created_at = state
        .db
        .get_cycle_settings(&auth.uid)
        .await?
        .and_then(|s| s.created_at)
        .unwrap_or_else(|| now.clone());

    let settings = CycleSettings {
        cycle_length: input.cycle_length,
        period_length: input.period_length,
        created_at: Some(created_at),
        updated_at: Some(now),
    };
    state.db.set_cycle_settings(&auth.uid, &settings).await?;

    tracing::info!(
        uid = %auth.uid,
        cycle_length = settings.cycle_length,
        period_length = settings.period_length,
        "Cycle settings saved"
    );
    Ok(Json(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(date: &str, cramps: i64) -> PeriodDayInput {
        serde_json::from_value(serde_json::json!({
            "date": date,
            "crampIntensity": cramps
        }))
        .unwrap()
    }

    #[test]
    fn test_period_day_validation() {
        assert!(input("2024-05-01", 0).validate().is_ok());
        assert!(input("2024-05-01", 10).validate().is_ok());
        assert!(input("2024-05-01", 11).validate().is_err());
        assert!(input("2024-05-01", -1).validate().is_err());
        assert!(input("05/01/2024", 3).validate().is_err());
    }

    #[test]
    fn test_settings_ranges() {
        assert!(check_range("cycleLength", 20, CycleSettings::CYCLE_LENGTH_RANGE).is_ok());
        assert!(check_range("cycleLength", 45, CycleSettings::CYCLE_LENGTH_RANGE).is_ok());
        assert!(check_range("cycleLength", 19, CycleSettings::CYCLE_LENGTH_RANGE).is_err());
        assert!(check_range("periodLength", 0, CycleSettings::PERIOD_LENGTH_RANGE).is_err());
        assert!(check_range("periodLength", 11, CycleSettings::PERIOD_LENGTH_RANGE).is_err());
    }
}
