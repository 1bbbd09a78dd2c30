// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User feedback routes.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::Feedback;
use crate::time_utils::now_rfc3339;
use crate::validation::require_text;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::get, Extension, Json, Router};
use axum_extra::extract::WithRejection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/feedback", get(list_feedback).post(submit_feedback))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackInput {
    pub feedback_text: String,
    pub category: String,
}

async fn submit_feedback(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<FeedbackInput>, AppError>,
) -> Result<(StatusCode, Json<Feedback>)> {
    require_text("feedbackText", &input.feedback_text)?;
    require_text("category", &input.category)?;

    let feedback = Feedback {
        id: uuid::Uuid::new_v4().to_string(),
        feedback_text: input.feedback_text,
        category: input.category,
        admin_comment: None,
        submitted_at: now_rfc3339(),
    };
    state.db.set_feedback(&auth.uid, &feedback).await?;

    tracing::info!(uid = %auth.uid, category = %feedback.category, "Feedback submitted");
    Ok((StatusCode::CREATED, Json(feedback)))
}

#[derive(Serialize)]
pub struct FeedbackList {
    pub feedback: Vec<Feedback>,
}

async fn list_feedback(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<FeedbackList>> {
    let feedback = state.db.list_feedback(&auth.uid).await?;
    Ok(Json(FeedbackList { feedback }))
}
