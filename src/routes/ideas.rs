// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Idea board and date roulette routes.

use super::current_user;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Idea, RouletteIdea};
use crate::time_utils::now_rfc3339;
use crate::validation::require_text;
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

/// Routes readable without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/ideas/all", get(all_ideas))
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/ideas", get(my_ideas).post(create_idea))
        .route("/api/ideas/{id}", put(update_idea).delete(delete_idea))
        .route("/api/roulette", get(list_roulette).post(create_roulette))
        .route(
            "/api/roulette/{id}",
            put(update_roulette).delete(delete_roulette),
        )
}

// ─── Ideas ───────────────────────────────────────────────────

#[derive(Serialize)]
pub struct IdeaList {
    pub ideas: Vec<Idea>,
}

async fn all_ideas(State(state): State<Arc<AppState>>) -> Result<Json<IdeaList>> {
    let ideas = state.db.list_ideas().await?;
    Ok(Json(IdeaList { ideas }))
}

async fn my_ideas(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
) -> Result<Json<IdeaList>> {
    let ideas = state.db.ideas_by_author(&auth.uid).await?;
    Ok(Json(IdeaList { ideas }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdeaInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

async fn create_idea(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<IdeaInput>, AppError>,
) -> Result<(StatusCode, Json<Idea>)> {
    require_text("title", &input.title)?;
    let caller = current_user(&state, &auth).await?;

    let now = now_rfc3339();
    let idea = Idea {
        id: uuid::Uuid::new_v4().to_string(),
        title: input.title.trim().to_string(),
        description: input.description,
        author: caller.name,
        author_uid: caller.uid,
        likes: 0,
        tags: input.tags,
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.set_idea(&idea).await?;

    tracing::info!(uid = %auth.uid, idea_id = %idea.id, "Idea posted");
    Ok((StatusCode::CREATED, Json(idea)))
}

/// An idea owned by `uid`. Other authors' ideas look missing.
async fn owned_idea(state: &AppState, uid: &str, id: &str) -> Result<Idea> {
    state
        .db
        .get_idea(id)
        .await?
        .filter(|idea| idea.author_uid == uid)
        .ok_or_else(|| AppError::NotFound(format!("Idea {} not found", id)))
}

async fn update_idea(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<IdeaInput>, AppError>,
) -> Result<Json<Idea>> {
    require_text("title", &input.title)?;
    let existing = owned_idea(&state, &auth.uid, &id).await?;

    let idea = Idea {
        title: input.title.trim().to_string(),
        description: input.description,
        tags: input.tags,
        updated_at: now_rfc3339(),
        ..existing
    };
    state.db.set_idea(&idea).await?;
    Ok(Json(idea))
}

async fn delete_idea(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    owned_idea(&state, &auth.uid, &id).await?;
    state.db.delete_idea(&id).await?;
    tracing::info!(uid = %auth.uid, idea_id = %id, "Idea deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Roulette ────────────────────────────────────────────────

#[derive(Serialize)]
pub struct RouletteList {
    pub ideas: Vec<RouletteIdea>,
}

async fn list_roulette(State(state): State<Arc<AppState>>) -> Result<Json<RouletteList>> {
    let ideas = state.db.list_roulette().await?;
    Ok(Json(RouletteList { ideas }))
}

#[derive(Debug, Deserialize)]
pub struct RouletteInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
}

async fn create_roulette(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    WithRejection(Json(input), _): WithRejection<Json<RouletteInput>, AppError>,
) -> Result<(StatusCode, Json<RouletteIdea>)> {
    require_text("title", &input.title)?;

    let now = now_rfc3339();
    let idea = RouletteIdea {
        id: uuid::Uuid::new_v4().to_string(),
        title: input.title.trim().to_string(),
        description: input.description,
        created_by: Some(auth.uid),
        created_at: now.clone(),
        updated_at: now,
    };
    state.db.set_roulette(&idea).await?;
    Ok((StatusCode::CREATED, Json(idea)))
}

async fn update_roulette(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    WithRejection(Json(input), _): WithRejection<Json<RouletteInput>, AppError>,
) -> Result<Json<RouletteIdea>> {
    require_text("title", &input.title)?;

    let existing = state
        .db
        .get_roulette(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("Roulette idea {} not found", id)))?;

    let idea = RouletteIdea {
        title: input.title.trim().to_string(),
        description: input.description,
        updated_at: now_rfc3339(),
        ..existing
    };
    state.db.set_roulette(&idea).await?;
    Ok(Json(idea))
}

async fn delete_roulette(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    if state.db.get_roulette(&id).await?.is_none() {
        return Err(AppError::NotFound(format!("Roulette idea {} not found", id)));
    }
    state.db.delete_roulette(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
