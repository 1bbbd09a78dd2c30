// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! Signing keys for sessions and OAuth state are derived once at startup
//! from `SECRET_KEY` so that neither key can be used to forge the other.

use hkdf::Hkdf;
use sha2::Sha256;
use std::env;

/// Deployment environment. Controls cookie and CORS strictness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "local" => Environment::Development,
            _ => Environment::Production,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }
}

/// Cloudflare R2 credentials for presigned uploads.
#[derive(Debug, Clone)]
pub struct R2Config {
    pub account_id: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket: String,
    /// Id of the public `pub-<id>.r2.dev` bucket domain
    pub public_bucket_id: String,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub environment: Environment,
    /// Server port
    pub port: u16,
    /// Frontend URL for OAuth redirects
    pub frontend_url: String,
    /// Extra origins allowed by CORS, besides the frontend URL
    pub allowed_origins: Vec<String>,
    /// Domain attribute for the session cookie (host-only when unset)
    pub cookie_domain: Option<String>,
    /// GCP project ID
    pub gcp_project_id: String,

    /// Google OAuth client ID
    pub oauth_client_id: String,
    /// Google OAuth client secret
    pub oauth_client_secret: String,
    /// Callback URL registered with Google
    pub oauth_redirect_url: String,

    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,

    /// Object storage for D-Day images; uploads are disabled when absent.
    pub r2: Option<R2Config>,
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let secret_key = required("SECRET_KEY")?;
        let (jwt_signing_key, oauth_state_key) = derive_keys(secret_key.as_bytes())?;

        Ok(Self {
            environment: Environment::parse(&env::var("ENV").unwrap_or_default()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "5000".to_string())
                .parse()
                .unwrap_or(5000),
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            allowed_origins: env::var("ALLOWED_ORIGINS")
                .map(|v| parse_origins(&v))
                .unwrap_or_default(),
            cookie_domain: env::var("COOKIE_DOMAIN")
                .ok()
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            gcp_project_id: env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string()),

            oauth_client_id: required("OAUTH2_CLIENT_ID")?,
            oauth_client_secret: required("OAUTH2_CLIENT_SECRET")?,
            oauth_redirect_url: env::var("OAUTH2_REDIRECT_URL").unwrap_or_else(|_| {
                "http://localhost:5000/google/oauth/callback".to_string()
            }),

            jwt_signing_key,
            oauth_state_key,
            r2: r2_from_env(),
        })
    }

    /// Deterministic configuration for tests.
    pub fn test_default() -> Self {
        let (jwt_signing_key, oauth_state_key) =
            derive_keys(b"test_secret_key_32_bytes_minimum!!").unwrap_or_default();

        Self {
            environment: Environment::Development,
            port: 5000,
            frontend_url: "http://localhost:3000".to_string(),
            allowed_origins: Vec::new(),
            cookie_domain: None,
            gcp_project_id: "test-project".to_string(),
            oauth_client_id: "test_client_id".to_string(),
            oauth_client_secret: "test_client_secret".to_string(),
            oauth_redirect_url: "http://localhost:5000/google/oauth/callback".to_string(),
            jwt_signing_key,
            oauth_state_key,
            r2: Some(R2Config {
                account_id: "test-account".to_string(),
                access_key_id: "test-access-key".to_string(),
                secret_access_key: "test-secret-access-key".to_string(),
                bucket: "calple".to_string(),
                public_bucket_id: "test-public".to_string(),
            }),
        }
    }

    pub fn is_development(&self) -> bool {
        self.environment == Environment::Development
    }
}

fn required(name: &'static str) -> Result<String, ConfigError> {
    env::var(name)
        .map(|v| v.trim().to_string())
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or(ConfigError::Missing(name))
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().trim_end_matches('/').to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

fn r2_from_env() -> Option<R2Config> {
    Some(R2Config {
        account_id: required("R2_ACCOUNT_ID").ok()?,
        access_key_id: required("R2_ACCESS_KEY_ID").ok()?,
        secret_access_key: required("R2_ACCESS_KEY_SECRET").ok()?,
        bucket: required("R2_BUCKET_NAME").ok()?,
        public_bucket_id: required("R2_PUBLIC_BUCKET_ID").ok()?,
    })
}

/// Derive the session and OAuth-state keys from the master secret.
fn derive_keys(secret: &[u8]) -> Result<(Vec<u8>, Vec<u8>), ConfigError> {
    let hk = Hkdf::<Sha256>::new(Some(b"calple-api"), secret);
    let mut session = vec![0u8; 32];
    let mut state = vec![0u8; 32];
    hk.expand(b"session-jwt", &mut session)
        .map_err(|e| ConfigError::KeyDerivation(e.to_string()))?;
    hk.expand(b"oauth-state", &mut state)
        .map_err(|e| ConfigError::KeyDerivation(e.to_string()))?;
    Ok((session, state))
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Key derivation failed: {0}")]
    KeyDerivation(String),
}
