// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User profile metadata and account deletion.

use super::current_user;
use crate::error::{AppError, Result};
use crate::middleware::auth::{expired_session_cookie, AuthUser};
use crate::models::{DDay, Sex, User, UserProfile};
use crate::time_utils::now_rfc3339;
use crate::validation::{parse_iso_date, to_compact_date};
use crate::AppState;
use axum::{
    extract::State,
    routing::{delete, get},
    Extension, Json, Router,
};
use axum_extra::extract::{cookie::CookieJar, WithRejection};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/user/metadata", get(get_metadata).put(update_metadata))
        .route("/api/user/partner/metadata", get(partner_metadata))
        .route("/api/user", delete(delete_account))
}

// ─── Metadata ────────────────────────────────────────────────

async fn get_metadata(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let user = current_user(&state, &auth).await?;
    Ok(Json(UserProfile::from(&user)))
}

async fn partner_metadata(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<UserProfile>> {
    let partner = state
        .pairing
        .active_partner(&auth.uid)
        .await?
        .ok_or_else(|| AppError::NotFound("No active partner".to_string()))?;
    Ok(Json(UserProfile::from(&partner)))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetadataUpdate {
    pub sex: Option<String>,
    pub started_dating: Option<String>,
}

fn parse_sex(value: &str) -> Result<Sex> {
    match value {
        "male" => Ok(Sex::Male),
        "female" => Ok(Sex::Female),
        other => Err(AppError::BadRequest(format!(
            "Invalid sex '{}': expected male or female",
            other
        ))),
    }
}

/// Create the anniversary event, or move the existing one to `started`.
fn anniversary_event(
    existing: Option<DDay>,
    owner: &User,
    partner_email: Option<&str>,
    started: chrono::NaiveDate,
    now: &str,
) -> DDay {
    let date = to_compact_date(started);
    match existing {
        Some(event) => DDay {
            date,
            updated_at: now.to_string(),
            ..event
        },
        None => DDay {
            id: uuid::Uuid::new_v4().to_string(),
            title: DDay::ANNIVERSARY_TITLE.to_string(),
            date,
            group: "important".to_string(),
            description: "The day everything started".to_string(),
            is_annual: true,
            created_by: owner.email.clone(),
            connected_users: DDay::initial_visibility(partner_email),
            editable: false,
            created_at: now.to_string(),
            updated_at: now.to_string(),
            ..Default::default()
        },
    }
}

async fn update_metadata(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(update), _): WithRejection<Json<MetadataUpdate>, AppError>,
) -> Result<Json<UserProfile>> {
    let sex = update.sex.as_deref().map(parse_sex).transpose()?;
    let started = update
        .started_dating
        .as_deref()
        .map(parse_iso_date)
        .transpose()?;

    let mut user = current_user(&state, &auth).await?;
    let now = now_rfc3339();

    if let Some(sex) = sex {
        user.sex = sex;
    }

    let dating_changed =
        update.started_dating.is_some() && update.started_dating != user.started_dating;
    if let Some(started) = started.filter(|_| dating_changed) {
        user.started_dating = update.started_dating.clone();

        let partner = state.pairing.active_partner(&user.uid).await?;
        let existing = state.db.find_anniversary(&user.email).await?;
        let event = anniversary_event(
            existing,
            &user,
            partner.as_ref().map(|p| p.email.as_str()),
            started,
            &now,
        );
        state.db.set_dday(&event).await?;

        if let Some(mut partner) = partner {
            partner.started_dating = user.started_dating.clone();
            partner.updated_at = now.clone();
            state.db.upsert_user(&partner).await?;
            tracing::debug!(uid = %user.uid, partner_uid = %partner.uid, "Synced startedDating to partner");
        }
    }

    user.updated_at = now;
    state.db.upsert_user(&user).await?;

    tracing::info!(uid = %user.uid, dating_changed, "User metadata updated");
    Ok(Json(UserProfile::from(&user)))
}

// ─── Account Deletion ────────────────────────────────────────

/// Response for account deletion.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct DeleteAccountResponse {
    pub success: bool,
    pub deleted_count: usize,
}

/// Delete the caller's account and everything they own, then log them out.
async fn delete_account(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<DeleteAccountResponse>)> {
    let user = current_user(&state, &auth).await?;
    tracing::info!(uid = %user.uid, "User-initiated account deletion");

    state.pairing.disconnect_all(&user).await?;
    let deleted_count = state.db.delete_user_data(&user.uid, &user.email).await?;

    let jar = jar.add(expired_session_cookie(&state.config));
    Ok((
        jar,
        Json(DeleteAccountResponse {
            success: true,
            deleted_count,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn owner() -> User {
        User {
            uid: "u1".to_string(),
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            picture: None,
            sex: Sex::Female,
            started_dating: None,
            tokens: None,
            returning_user: true,
            created_at: "t0".to_string(),
            last_login_at: "t0".to_string(),
            updated_at: "t0".to_string(),
        }
    }

    #[test]
    fn test_parse_sex() {
        assert_eq!(parse_sex("male").unwrap(), Sex::Male);
        assert_eq!(parse_sex("female").unwrap(), Sex::Female);
        assert!(parse_sex("Male").is_err());
        assert!(parse_sex("").is_err());
    }

    #[test]
    fn test_new_anniversary_is_annual_and_locked() {
        let started = NaiveDate::from_ymd_opt(2021, 6, 12).unwrap();
        let event = anniversary_event(None, &owner(), Some("b@example.com"), started, "t1");

        assert_eq!(event.title, DDay::ANNIVERSARY_TITLE);
        assert_eq!(event.date, "20210612");
        assert_eq!(event.group, "important");
        assert_eq!(event.description, "The day everything started");
        assert!(event.is_annual);
        assert!(!event.editable);
        assert_eq!(event.created_by, "a@example.com");
        assert_eq!(event.connected_users, vec!["b@example.com".to_string()]);
    }

    #[test]
    fn test_existing_anniversary_is_moved() {
        let first = NaiveDate::from_ymd_opt(2021, 6, 12).unwrap();
        let original = anniversary_event(None, &owner(), None, first, "t1");
        let id = original.id.clone();

        let moved = NaiveDate::from_ymd_opt(2020, 1, 3).unwrap();
        let event = anniversary_event(Some(original), &owner(), Some("b@example.com"), moved, "t2");

        assert_eq!(event.id, id);
        assert_eq!(event.date, "20200103");
        assert_eq!(event.created_at, "t1");
        assert_eq!(event.updated_at, "t2");
        // Visibility is maintained by pairing transitions, not here
        assert!(event.connected_users.is_empty());
    }
}
