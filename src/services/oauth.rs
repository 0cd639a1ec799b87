// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Google OAuth token endpoint client.
//!
//! Handles:
//! - Authorization code exchange at sign-in
//! - Access token refresh before sending mail

use crate::config::OAuthConfig;
use crate::error::AppError;
use crate::models::OAuthToken;
use chrono::{Duration, Utc};
use serde::Deserialize;

const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Google reports token lifetimes that do not always hold, so every token is
/// treated as valid for this many minutes from receipt.
const TOKEN_LIFETIME_MINUTES: i64 = 55;

/// Google OAuth client.
#[derive(Clone)]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    token_url: String,
    client_id: String,
    client_secret: String,
    redirect_url: String,
}

impl GoogleOAuthClient {
    /// Create a new client with OAuth credentials.
    pub fn new(config: &OAuthConfig) -> Self {
        Self::with_token_url(config, TOKEN_URL)
    }

    /// Create a client against a different token endpoint (used by tests).
    pub fn with_token_url(config: &OAuthConfig, token_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            token_url: token_url.into(),
            client_id: config.client_id.clone(),
            client_secret: config.client_secret.clone(),
            redirect_url: config.redirect_url.clone(),
        }
    }

    /// Exchange an authorization code for access and refresh tokens.
    pub async fn exchange_code(&self, code: &str) -> Result<OAuthToken, AppError> {
        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("code", code),
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("redirect_uri", self.redirect_url.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token exchange request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::BAD_REQUEST {
            // Google puts the reason in the body; it is not shown to clients.
            let body = response.text().await.unwrap_or_default();
            tracing::warn!(body = %body, "Authorization code rejected");
            return Err(AppError::Upstream("could not exchange token".to_string()));
        }

        let token: TokenResponse = check_response_json(response).await?;
        tracing::info!("Authorization code exchanged");
        Ok(token.into_token(None))
    }

    /// Refresh an expired access token.
    ///
    /// Google usually omits the refresh token on refresh, in which case the
    /// existing one is kept.
    pub async fn refresh(&self, token: &OAuthToken) -> Result<OAuthToken, AppError> {
        if token.refresh_token.is_empty() {
            return Err(AppError::Upstream("no refresh token stored".to_string()));
        }

        let response = self
            .http
            .post(&self.token_url)
            .form(&[
                ("client_id", self.client_id.as_str()),
                ("client_secret", self.client_secret.as_str()),
                ("refresh_token", token.refresh_token.as_str()),
                ("grant_type", "refresh_token"),
            ])
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Token refresh request failed: {}", e)))?;

        let refreshed: TokenResponse = check_response_json(response).await?;
        tracing::debug!("Access token refreshed");
        Ok(refreshed.into_token(Some(&token.refresh_token)))
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::Upstream(format!("HTTP {}: {}", status, body)));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::Upstream(format!("JSON parse error: {}", e)))
}

/// Token response from Google's token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh: Option<&str>) -> OAuthToken {
        OAuthToken {
            access_token: self.access_token,
            refresh_token: self
                .refresh_token
                .or_else(|| previous_refresh.map(str::to_string))
                .unwrap_or_default(),
            token_type: self.token_type.unwrap_or_else(|| "Bearer".to_string()),
            expiry: Utc::now() + Duration::minutes(TOKEN_LIFETIME_MINUTES),
        }
    }
}
