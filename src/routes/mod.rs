// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.

pub mod auth;
pub mod checkins;
pub mod connections;
pub mod ddays;
pub mod feedback;
pub mod health;
pub mod ideas;
pub mod periods;
pub mod pins;
pub mod user;

use crate::error::{AppError, Result};
use crate::middleware::auth::{require_auth, AuthUser};
use crate::middleware::security::add_security_headers;
use crate::models::User;
use crate::AppState;
use axum::http::{header, Method};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Load the profile behind a session.
///
/// A valid token whose user was deleted is treated as logged out.
pub(crate) async fn current_user(state: &AppState, auth: &AuthUser) -> Result<User> {
    state.db.get_user(&auth.uid).await?.ok_or_else(|| {
        tracing::warn!(uid = %auth.uid, "Session refers to a missing user");
        AppError::Unauthorized
    })
}

fn cors_layer(state: &AppState) -> CorsLayer {
    // Frontend URL, configured extras, and localhost in development
    let mut allowed = vec![state.config.frontend_url.clone()];
    allowed.extend(state.config.allowed_origins.iter().cloned());
    let development = state.config.is_development();

    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(
            move |origin: &axum::http::HeaderValue, _request_parts: &axum::http::request::Parts| {
                let origin_str = origin.to_str().unwrap_or("");
                allowed.iter().any(|o| o == origin_str)
                    || (development
                        && (origin_str.starts_with("http://localhost")
                            || origin_str.starts_with("http://127.0.0.1")))
            },
        ))
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT])
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .merge(health::routes())
        .merge(auth::routes())
        .merge(ideas::public_routes());

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .merge(connections::routes())
        .merge(ddays::routes())
        .merge(periods::routes())
        .merge(checkins::routes())
        .merge(pins::routes())
        .merge(ideas::routes())
        .merge(feedback::routes())
        .merge(user::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(middleware::from_fn_with_state(
            state.clone(),
            add_security_headers,
        ))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}
