// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth2 client for the authorization-code login flow.

use crate::config::Config;
use crate::error::AppError;
use crate::models::OAuthTokens;
use crate::time_utils::format_utc_rfc3339;
use serde::Deserialize;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";
const SCOPES: &str = "openid https://www.googleapis.com/auth/userinfo.email https://www.googleapis.com/auth/userinfo.profile";

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    client_id: String,
    client_secret: String,
    redirect_url: String,
    token_url: String,
    userinfo_url: String,
}

/// Token endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires
    pub expires_in: i64,
}

impl TokenResponse {
    /// Convert to the stored form with an absolute expiry.
    pub fn into_stored(self) -> OAuthTokens {
        let expires_at = chrono::Utc::now() + chrono::Duration::seconds(self.expires_in);
        OAuthTokens {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: format_utc_rfc3339(expires_at),
        }
    }
}

/// Userinfo endpoint response.
#[derive(Debug, Clone, Deserialize)]
pub struct GoogleUserInfo {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub verified_email: bool,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub picture: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(config: &Config) -> Self {
        Self {
            http: reqwest::Client::new(),
            client_id: config.oauth_client_id.clone(),
            client_secret: config.oauth_client_secret.clone(),
            redirect_url: config.oauth_redirect_url.clone(),
            token_url: TOKEN_URL.to_string(),
            userinfo_url: USERINFO_URL.to_string(),
        }
    }

    /// URL of Google's consent screen for the given signed state.
    pub fn authorization_url(&self, state: &str) -> String {
        format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&access_type=offline&state={}",
            AUTHORIZE_URL,
            urlencoding::encode(&self.client_id),
            urlencoding::encode(&self.redirect_url),
            urlencoding::encode(SCOPES),
            urlencoding::encode(state)
        )
    }

    /// Exchange an authorization code for tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Token request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Fetch the profile of the account that granted `access_token`.
    pub async fn fetch_user_info(&self, access_token: &str) -> Result<GoogleUserInfo, AppError> {
        let response = self
            .http
            .get(&self.userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Userinfo request failed: {}", e)))?;

        self.check_response_json(response).await
    }

    /// Check response and parse JSON body.
    async fn check_response_json<T: for<'de> Deserialize<'de>>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, AppError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::IdentityProvider(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        response
            .json()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("JSON parse error: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authorization_url_encodes_params() {
        let client = GoogleOAuthClient::new(&Config::test_default());
        let url = client.authorization_url("abc/def");

        assert!(url.starts_with(AUTHORIZE_URL));
        assert!(url.contains("client_id=test_client_id"));
        assert!(url.contains(
            "redirect_uri=http%3A%2F%2Flocalhost%3A5000%2Fgoogle%2Foauth%2Fcallback"
        ));
        assert!(url.contains("scope=openid%20https%3A%2F%2Fwww.googleapis.com%2Fauth%2Fuserinfo.email"));
        assert!(url.contains("access_type=offline"));
        assert!(url.ends_with("state=abc%2Fdef"));
    }

    #[test]
    fn test_token_response_into_stored() {
        let tokens = TokenResponse {
            access_token: "at".to_string(),
            refresh_token: None,
            expires_in: 3600,
        }
        .into_stored();

        assert_eq!(tokens.access_token, "at");
        assert!(tokens.refresh_token.is_none());
        assert!(tokens.expires_at.ends_with('Z'));
    }
}
