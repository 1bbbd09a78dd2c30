// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use serde::{Deserialize, Serialize};
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "lowercase")]
pub enum Sex {
    Male,
    #[default]
    Female,
}

/// Google OAuth tokens, kept server-side only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OAuthTokens {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// When the access token expires (RFC3339)
    pub expires_at: String,
}

/// User profile stored in Firestore at `users/{uid}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Google account id (also used as document ID)
    pub uid: String,
    /// Lowercased email address
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
    #[serde(default)]
    pub sex: Sex,
    /// Start of the relationship (YYYY-MM-DD)
    #[serde(default)]
    pub started_dating: Option<String>,
    #[serde(default)]
    pub tokens: Option<OAuthTokens>,
    #[serde(default)]
    pub returning_user: bool,
    pub created_at: String,
    pub last_login_at: String,
    pub updated_at: String,
}

/// User as returned by the API. Never carries tokens.
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: String,
    pub email: String,
    pub name: String,
    pub picture: Option<String>,
    pub sex: Sex,
    pub started_dating: Option<String>,
    pub returning_user: bool,
    pub created_at: String,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            uid: user.uid.clone(),
            email: user.email.clone(),
            name: user.name.clone(),
            picture: user.picture.clone(),
            sex: user.sex,
            started_dating: user.started_dating.clone(),
            returning_user: user.returning_user,
            created_at: user.created_at.clone(),
        }
    }
}
