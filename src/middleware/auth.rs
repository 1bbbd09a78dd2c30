// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication: JWT in an HttpOnly cookie, Bearer as fallback.

use crate::config::Config;
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "calple_session";
/// Session lifetime.
pub const SESSION_TTL_HOURS: i64 = 12;

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (Google account id)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub uid: String,
}

/// Session token from the cookie, else from `Authorization: Bearer`.
pub fn session_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(SESSION_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(|t| t.to_string())
}

/// Decode and validate a session token, returning the uid.
pub fn verify_jwt(token: &str, signing_key: &[u8]) -> Result<String, AppError> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|_| AppError::InvalidToken)?;

    if token_data.claims.sub.is_empty() {
        return Err(AppError::InvalidToken);
    }
    Ok(token_data.claims.sub)
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = session_token(&jar, request.headers()).ok_or(AppError::Unauthorized)?;
    let uid = verify_jwt(&token, &state.config.jwt_signing_key)?;

    request.extensions_mut().insert(AuthUser { uid });

    Ok(next.run(request).await)
}

/// Create a JWT for a user session.
pub fn create_jwt(uid: &str, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: uid.to_string(),
        iat: now,
        exp: now + (SESSION_TTL_HOURS as usize) * 60 * 60,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}

/// Session cookie carrying `token`.
///
/// Production serves the API and frontend from different origins, so the
/// cookie must be `SameSite=None; Secure` there.
pub fn session_cookie(config: &Config, token: String) -> Cookie<'static> {
    build_session_cookie(config, token, time::Duration::hours(SESSION_TTL_HOURS))
}

/// Expired session cookie for logout.
pub fn expired_session_cookie(config: &Config) -> Cookie<'static> {
    build_session_cookie(config, String::new(), time::Duration::ZERO)
}

fn build_session_cookie(config: &Config, value: String, max_age: time::Duration) -> Cookie<'static> {
    let development = config.is_development();
    let mut builder = Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!development)
        .same_site(if development {
            SameSite::Lax
        } else {
            SameSite::None
        })
        .max_age(max_age);

    if let Some(domain) = &config.cookie_domain {
        builder = builder.domain(domain.clone());
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Environment;

    #[test]
    fn test_jwt_round_trip() {
        let key = b"test_key_32_bytes_minimum_length!";
        let token = create_jwt("google-123", key).unwrap();
        assert_eq!(verify_jwt(&token, key).unwrap(), "google-123");
        assert!(matches!(
            verify_jwt(&token, b"another_key_32_bytes_minimum_len"),
            Err(AppError::InvalidToken)
        ));
    }

    #[test]
    fn test_development_cookie_attributes() {
        let config = Config::test_default();
        let cookie = session_cookie(&config, "tok".to_string()).to_string();

        assert!(cookie.starts_with("calple_session=tok"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(cookie.contains("Path=/"));
        assert!(cookie.contains("Max-Age=43200"));
        assert!(!cookie.contains("Secure"));
        assert!(!cookie.contains("Domain="));
    }

    #[test]
    fn test_production_cookie_attributes() {
        let mut config = Config::test_default();
        config.environment = Environment::Production;
        config.cookie_domain = Some(".calple.date".to_string());

        let cookie = session_cookie(&config, "tok".to_string()).to_string();
        assert!(cookie.contains("SameSite=None"));
        assert!(cookie.contains("Secure"));
        assert!(cookie.contains("Domain=calple.date") || cookie.contains("Domain=.calple.date"));

        let expired = expired_session_cookie(&config).to_string();
        assert!(expired.starts_with("calple_session=;"));
        assert!(expired.contains("Max-Age=0"));
    }
}
