// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared calendar ("D-Day") routes.

use super::current_user;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::DDay;
use crate::services::{merge_month_view, MonthWindow, PresignedUpload};
use crate::time_utils::now_rfc3339;
use crate::validation::{parse_compact_date, require_text};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Extension, Json, Router,
};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ddays", get(list_ddays).post(create_dday))
        .route("/api/ddays/upload-url", post(upload_url))
        .route("/api/ddays/{id}", put(update_dday).delete(delete_dday))
}

#[derive(Deserialize)]
struct ViewQuery {
    view: Option<String>,
}

#[derive(Serialize)]
pub struct DDayList {
    pub ddays: Vec<DDay>,
}

/// Events visible to the caller in one month.
async fn list_ddays(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Query(query): Query<ViewQuery>,
) -> Result<Json<DDayList>> {
    let view = query
        .view
        .ok_or_else(|| AppError::BadRequest("Missing view parameter (YYYYMM)".to_string()))?;
    let window = MonthWindow::parse(&view)?;

    let caller = current_user(&state, &auth).await?;
    let batches = state.db.month_candidates(&caller.email, &window.end).await?;
    let ddays = merge_month_view(batches, &window);

    tracing::debug!(uid = %caller.uid, view = %view, count = ddays.len(), "Month view");
    Ok(Json(DDayList { ddays }))
}

/// Editable fields of an event. Absent fields are left unchanged on update.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DDayInput {
    pub title: Option<String>,
    pub group: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub end_date: Option<String>,
    pub image_url: Option<String>,
    pub is_annual: Option<bool>,
}

impl DDayInput {
    /// Copy the provided fields onto `event`.
    fn apply(self, event: &mut DDay) {
        if let Some(title) = self.title {
            event.title = title.trim().to_string();
        }
        if let Some(group) = self.group {
            event.group = group;
        }
        if let Some(description) = self.description {
            event.description = description;
        }
        if let Some(date) = self.date {
            event.date = date;
        }
        if let Some(end_date) = self.end_date {
            event.end_date = end_date;
        }
        if let Some(image_url) = self.image_url {
            event.image_url = image_url;
        }
        if let Some(is_annual) = self.is_annual {
            event.is_annual = is_annual;
        }
    }
}

/// Title present, dates well formed, range not inverted.
fn validate_event(event: &DDay) -> Result<()> {
    require_text("title", &event.title)?;

    let start = (!event.date.is_empty())
        .then(|| parse_compact_date(&event.date))
        .transpose()?;
    let end = (!event.end_date.is_empty())
        .then(|| parse_compact_date(&event.end_date))
        .transpose()?;

    match (start, end) {
        (None, Some(_)) => Err(AppError::BadRequest(
            "endDate requires a start date".to_string(),
        )),
        (Some(start), Some(end)) if end < start => Err(AppError::BadRequest(
            "endDate must not be before date".to_string(),
        )),
        _ => Ok(()),
    }
}

async fn create_dday(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<DDayInput>, AppError>,
) -> Result<(StatusCode, Json<DDay>)> {
    let now = now_rfc3339();
    let mut event = DDay {
        id: uuid::Uuid::new_v4().to_string(),
        editable: true,
        created_at: now.clone(),
        updated_at: now,
        ..Default::default()
    };
    input.apply(&mut event);
    validate_event(&event)?;

    let caller = current_user(&state, &auth).await?;
    let partner = state.pairing.active_partner(&caller.uid).await?;
    event.created_by = caller.email;
    event.connected_users = DDay::initial_visibility(partner.as_ref().map(|p| p.email.as_str()));

    state.db.set_dday(&event).await?;
    tracing::info!(uid = %auth.uid, dday_id = %event.id, "D-Day created");

    Ok((StatusCode::CREATED, Json(event)))
}

/// Load an event the caller may modify.
async fn owned_event(state: &AppState, email: &str, id: &str) -> Result<DDay> {
    let event = state
        .db
        .get_dday(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("D-Day {} not found", id)))?;

    if event.created_by != email {
        return Err(AppError::Forbidden(
            "Only the creator can modify this event".to_string(),
        ));
    }
    Ok(event)
}

async fn update_dday(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<DDayInput>, AppError>,
) -> Result<Json<DDay>> {
    // Shape checks first; the merged event is validated again below
    for date in [&input.date, &input.end_date].into_iter().flatten() {
        if !date.is_empty() {
            parse_compact_date(date)?;
        }
    }
    if let Some(title) = &input.title {
        require_text("title", title)?;
    }

    let caller = current_user(&state, &auth).await?;
    let mut event = owned_event(&state, &caller.email, &id).await?;
    if !event.editable {
        return Err(AppError::Forbidden("This event cannot be edited".to_string()));
    }

    input.apply(&mut event);
    validate_event(&event)?;
    event.updated_at = now_rfc3339();

    state.db.set_dday(&event).await?;
    tracing::info!(uid = %caller.uid, dday_id = %id, "D-Day updated");

    Ok(Json(event))
}

async fn delete_dday(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    let caller = current_user(&state, &auth).await?;
    owned_event(&state, &caller.email, &id).await?;

    state.db.delete_dday(&id).await?;
    tracing::info!(uid = %caller.uid, dday_id = %id, "D-Day deleted");

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadRequest {
    file_size: u64,
}

/// Presigned PUT URL for an event image.
async fn upload_url(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(body), _): WithRejection<Json<UploadRequest>, AppError>,
) -> Result<Json<PresignedUpload>> {
    let upload = state.uploads.presign_dday_image(body.file_size)?;
    tracing::debug!(uid = %auth.uid, key = %upload.key, "Issued upload URL");
    Ok(Json(upload))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(date: &str, end_date: &str) -> DDay {
        DDay {
            title: "Trip".to_string(),
            date: date.to_string(),
            end_date: end_date.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_validate_event_dates() {
        assert!(validate_event(&event("", "")).is_ok());
        assert!(validate_event(&event("20240301", "")).is_ok());
        assert!(validate_event(&event("20240301", "20240301")).is_ok());
        assert!(validate_event(&event("20240301", "20240305")).is_ok());

        assert!(validate_event(&event("20240305", "20240301")).is_err());
        assert!(validate_event(&event("", "20240301")).is_err());
        assert!(validate_event(&event("2024-03-01", "")).is_err());
        assert!(validate_event(&event("20240230", "")).is_err());
    }

    #[test]
    fn test_validate_event_requires_title() {
        let mut untitled = event("20240301", "");
        untitled.title = "   ".to_string();
        assert!(matches!(validate_event(&untitled), Err(AppError::BadRequest(_))));
    }

    #[test]
    fn test_apply_leaves_protected_fields() {
        let mut existing = DDay {
            id: "e1".to_string(),
            title: "Old".to_string(),
            created_by: "a@example.com".to_string(),
            connected_users: vec!["b@example.com".to_string()],
            editable: true,
            ..Default::default()
        };

        // Unknown keys such as connectedUsers are ignored by the input type
        let input: DDayInput = serde_json::from_value(serde_json::json!({
            "title": " New ",
            "isAnnual": true,
            "connectedUsers": ["mallory@example.com"],
            "createdBy": "mallory@example.com"
        }))
        .unwrap();
        input.apply(&mut existing);

        assert_eq!(existing.title, "New");
        assert!(existing.is_annual);
        assert_eq!(existing.created_by, "a@example.com");
        assert_eq!(existing.connected_users, vec!["b@example.com".to_string()]);
    }
}
