// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! User model for storage and API.

use crate::db::Record;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Refresh access tokens this long before they actually expire.
const TOKEN_REFRESH_MARGIN_SECS: i64 = 60;

/// User profile stored in Firestore, keyed by the identity provider uid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    #[serde(default)]
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    /// Shown on invoice headers when present.
    #[serde(default)]
    pub phone: String,
    /// Google account subject the uid was first bound to.
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub google_sub: String,
    /// Google OAuth token used to send mail on the user's behalf.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub oauth_token: Option<OAuthToken>,
}

impl User {
    /// Build a new user from identity-token claims and an OAuth token.
    pub fn from_claims(uid: &str, info: &UserInfo, token: OAuthToken) -> Self {
        Self {
            id: uid.to_string(),
            first_name: info.given_name.clone(),
            last_name: info.family_name.clone(),
            email: info.email.clone(),
            phone: String::new(),
            google_sub: info.sub.clone(),
            oauth_token: Some(token),
        }
    }

    /// Whether a verified ID token belongs to this user's Google account.
    ///
    /// Records created before the subject was stored fall back to the
    /// account email.
    pub fn matches_identity(&self, info: &UserInfo) -> bool {
        if !self.google_sub.is_empty() {
            return self.google_sub == info.sub;
        }
        !self.email.is_empty() && self.email.eq_ignore_ascii_case(&info.email)
    }

    /// Copy of the user safe to return to clients (no OAuth material).
    pub fn sanitize(&self) -> Self {
        Self {
            google_sub: String::new(),
            oauth_token: None,
            ..self.clone()
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for User {
    fn id(&self) -> &str {
        &self.id
    }

    fn set_id(&mut self, id: String) {
        self.id = id;
    }
}

/// OAuth 2.0 token as returned by Google's token endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    pub expiry: DateTime<Utc>,
}

fn default_token_type() -> String {
    "Bearer".to_string()
}

impl OAuthToken {
    /// True when the access token is expired or about to expire.
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.expiry - Duration::seconds(TOKEN_REFRESH_MARGIN_SECS) <= now
    }
}

/// Profile claims taken from a verified Google ID token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    /// Stable Google account id (`sub` claim).
    #[serde(default)]
    pub sub: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub name: String,
}

/// Aggregate invoice amounts for a user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub invoice_total: f64,
    pub invoice_paid: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> OAuthToken {
        OAuthToken {
            access_token: "ya29.access".to_string(),
            refresh_token: "1//refresh".to_string(),
            token_type: "Bearer".to_string(),
            expiry: Utc::now() + Duration::minutes(55),
        }
    }

    #[test]
    fn sanitize_strips_oauth_token() {
        let info = UserInfo {
            sub: "1098".to_string(),
            email: "kiri@example.com".to_string(),
            family_name: "Tane".to_string(),
            given_name: "Kiri".to_string(),
            name: "Kiri Tane".to_string(),
        };
        let user = User::from_claims("uid-1", &info, token());

        assert_eq!(user.google_sub, "1098");

        let clean = user.sanitize();
        assert!(clean.oauth_token.is_none());
        assert!(clean.google_sub.is_empty());
        assert_eq!(clean.id, "uid-1");
        assert_eq!(clean.full_name(), "Kiri Tane");

        let json = serde_json::to_value(&clean).unwrap();
        assert!(json.get("oauth_token").is_none());
        assert!(!json.to_string().contains("ya29"));
    }

    #[test]
    fn identity_checks_subject_then_email() {
        let info = UserInfo {
            sub: "sub-a".to_string(),
            email: "Kiri@Example.com".to_string(),
            ..Default::default()
        };
        let mut user = User::from_claims("uid-1", &info, token());
        assert!(user.matches_identity(&info));

        let other = UserInfo {
            sub: "sub-b".to_string(),
            email: "kiri@example.com".to_string(),
            ..Default::default()
        };
        assert!(!user.matches_identity(&other));

        // Stored before subjects were recorded.
        user.google_sub.clear();
        assert!(user.matches_identity(&other));
        assert!(!user.matches_identity(&UserInfo {
            sub: "sub-a".to_string(),
            email: "someone@evil.example".to_string(),
            ..Default::default()
        }));
    }

    #[test]
    fn token_refresh_margin() {
        let now = Utc::now();
        let mut t = token();
        assert!(!t.needs_refresh(now));

        t.expiry = now + Duration::seconds(30);
        assert!(t.needs_refresh(now));

        t.expiry = now - Duration::minutes(1);
        assert!(t.needs_refresh(now));
    }
}
