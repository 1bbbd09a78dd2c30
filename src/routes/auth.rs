// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth authentication routes.

use axum::{
    extract::{Query, State},
    http::HeaderMap,
    response::Redirect,
    routing::get,
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use subtle::ConstantTimeEq;

use crate::config::Config;
use crate::error::{AppError, Result};
use crate::middleware::auth::{
    create_jwt, expired_session_cookie, session_cookie, session_token, verify_jwt,
};
use crate::models::{OAuthTokens, Sex, User, UserProfile};
use crate::services::GoogleUserInfo;
use crate::time_utils::now_rfc3339;
use crate::validation::normalize_email;
use crate::AppState;

// Type alias for HMAC-SHA256
type HmacSha256 = Hmac<Sha256>;

const CALLBACK_PATH: &str = "/google/oauth/callback";
const NONCE_COOKIE: &str = "calple_oauth_nonce";
/// How long a login attempt may take between redirect and callback.
const STATE_MAX_AGE_MS: u128 = 10 * 60 * 1000;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/google/oauth/login", get(login))
        .route(CALLBACK_PATH, get(callback))
        .route("/google/oauth/logout", get(logout))
        .route("/api/auth/status", get(status))
}

fn now_millis() -> Result<u128> {
    Ok(SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("System time error: {}", e)))?
        .as_millis())
}

fn generate_nonce() -> Result<String> {
    use ring::rand::{SecureRandom, SystemRandom};

    let mut bytes = [0u8; 16];
    SystemRandom::new()
        .fill(&mut bytes)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Failed to generate OAuth nonce")))?;
    Ok(hex::encode(bytes))
}

fn sign(payload: &str, secret: &[u8]) -> Result<String> {
    let mut mac = HmacSha256::new_from_slice(secret)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("HMAC init failed: {}", e)))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Build the OAuth `state`: base64url of "nonce|timestamp_hex|signature_hex".
fn sign_state(nonce: &str, timestamp_ms: u128, secret: &[u8]) -> Result<String> {
    let payload = format!("{}|{:x}", nonce, timestamp_ms);
    let signature = sign(&payload, secret)?;
    Ok(URL_SAFE_NO_PAD.encode(format!("{}|{}", payload, signature)))
}

/// Verify the state signature and age, returning the embedded nonce.
fn verify_state(state: &str, secret: &[u8], now_ms: u128) -> Option<String> {
    let bytes = URL_SAFE_NO_PAD.decode(state).ok()?;
    let state_str = String::from_utf8(bytes).ok()?;

    let parts: Vec<&str> = state_str.splitn(3, '|').collect();
    if parts.len() != 3 {
        return None;
    }
    let (nonce, timestamp_hex, signature_hex) = (parts[0], parts[1], parts[2]);

    let expected = sign(&format!("{}|{}", nonce, timestamp_hex), secret).ok()?;
    if !bool::from(expected.as_bytes().ct_eq(signature_hex.as_bytes())) {
        tracing::error!("OAuth state signature mismatch! Potential tampering.");
        return None;
    }

    let issued = u128::from_str_radix(timestamp_hex, 16).ok()?;
    if now_ms < issued || now_ms - issued > STATE_MAX_AGE_MS {
        tracing::warn!("OAuth state expired");
        return None;
    }

    Some(nonce.to_string())
}

/// Nonce cookie binding the state to this browser, scoped to the callback.
fn nonce_cookie(config: &Config, value: String, max_age: time::Duration) -> Cookie<'static> {
    Cookie::build((NONCE_COOKIE, value))
        .path(CALLBACK_PATH)
        .http_only(true)
        .secure(!config.is_development())
        .same_site(SameSite::Lax)
        .max_age(max_age)
        .build()
}

/// Start OAuth flow - redirect to Google's consent screen.
async fn login(State(state): State<Arc<AppState>>, jar: CookieJar) -> Result<(CookieJar, Redirect)> {
    let nonce = generate_nonce()?;
    let oauth_state = sign_state(&nonce, now_millis()?, &state.config.oauth_state_key)?;
    let auth_url = state.google_oauth.authorization_url(&oauth_state);

    let jar = jar.add(nonce_cookie(
        &state.config,
        nonce,
        time::Duration::milliseconds(STATE_MAX_AGE_MS as i64),
    ));

    tracing::info!("Starting OAuth flow, redirecting to Google");
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// OAuth callback - exchange code for tokens, upsert the user, start a session.
async fn callback(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let config = &state.config;
    let cookie_nonce = jar.get(NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.add(nonce_cookie(config, String::new(), time::Duration::ZERO));

    if let Some(error) = params.error {
        tracing::warn!(error = %error, "OAuth error from Google");
        let redirect = format!("{}?error={}", config.frontend_url, urlencoding::encode(&error));
        return Ok((jar, Redirect::temporary(&redirect)));
    }

    let oauth_state = params
        .state
        .ok_or_else(|| AppError::BadRequest("Missing state parameter".to_string()))?;
    let nonce = verify_state(&oauth_state, &config.oauth_state_key, now_millis()?)
        .ok_or_else(|| AppError::BadRequest("Invalid or expired state parameter".to_string()))?;

    let nonce_matches = cookie_nonce
        .map(|c| bool::from(c.as_bytes().ct_eq(nonce.as_bytes())))
        .unwrap_or(false);
    if !nonce_matches {
        tracing::warn!("OAuth nonce cookie missing or mismatched");
        return Err(AppError::BadRequest(
            "Login session mismatch, please try again".to_string(),
        ));
    }

    let code = params
        .code
        .ok_or_else(|| AppError::BadRequest("Missing authorization code".to_string()))?;

    tracing::info!("Exchanging authorization code for tokens");
    let tokens = state.google_oauth.exchange_code(&code).await?;
    let info = state.google_oauth.fetch_user_info(&tokens.access_token).await?;

    // Partners find each other by email
    if !info.verified_email {
        tracing::warn!(uid = %info.id, "Login with unverified Google email refused");
        return Err(AppError::Forbidden(
            "Google account email is not verified".to_string(),
        ));
    }

    let existing = state.db.get_user(&info.id).await?;
    let returning = existing.is_some();
    let user = merge_login(existing, info, tokens.into_stored(), &now_rfc3339());
    state.db.upsert_user(&user).await?;

    tracing::info!(uid = %user.uid, returning, "OAuth successful, user stored");

    let jwt = create_jwt(&user.uid, &config.jwt_signing_key)
        .map_err(|e| AppError::Internal(anyhow::anyhow!("JWT creation failed: {}", e)))?;
    let jar = jar.add(session_cookie(config, jwt));

    Ok((jar, Redirect::temporary(&config.frontend_url)))
}

/// Apply a successful login to the stored profile, creating it if needed.
fn merge_login(
    existing: Option<User>,
    info: GoogleUserInfo,
    mut tokens: OAuthTokens,
    now: &str,
) -> User {
    let email = normalize_email(&info.email);

    match existing {
        Some(mut user) => {
            // Google omits the refresh token on repeat consent
            if tokens.refresh_token.is_none() {
                tokens.refresh_token = user.tokens.and_then(|t| t.refresh_token);
            }
            user.email = email;
            user.name = info.name;
            user.picture = info.picture;
            user.tokens = Some(tokens);
            user.returning_user = true;
            user.last_login_at = now.to_string();
            user.updated_at = now.to_string();
            user
        }
        None => User {
            uid: info.id,
            email,
            name: info.name,
            picture: info.picture,
            sex: Sex::default(),
            started_dating: None,
            tokens: Some(tokens),
            returning_user: false,
            created_at: now.to_string(),
            last_login_at: now.to_string(),
            updated_at: now.to_string(),
        },
    }
}

#[derive(Serialize)]
pub struct AuthStatus {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<UserProfile>,
}

/// Report whether the request carries a valid session.
async fn status(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Result<Json<AuthStatus>> {
    let uid = session_token(&jar, &headers)
        .and_then(|token| verify_jwt(&token, &state.config.jwt_signing_key).ok());

    let user = match uid {
        Some(uid) => state.db.get_user(&uid).await?,
        None => None,
    };

    Ok(Json(AuthStatus {
        authenticated: user.is_some(),
        user: user.as_ref().map(UserProfile::from),
    }))
}

/// Logout - expire the session cookie and return to the frontend.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, Redirect) {
    let jar = jar.add(expired_session_cookie(&state.config));
    (jar, Redirect::temporary(&state.config.frontend_url))
}
