// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in: verify the ID token, then get or create the user.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{User, UserInfo};
use crate::services::google_oidc::IdTokenVerifier;
use crate::services::oauth::GoogleOAuthClient;

/// Sign-in flow over the user store and Google.
pub struct AuthService<'a> {
    pub db: &'a FirestoreDb,
    pub oauth: &'a GoogleOAuthClient,
    pub id_tokens: &'a IdTokenVerifier,
}

impl AuthService<'_> {
    /// Return the user for `uid`, creating it on first sign-in.
    ///
    /// The authorization code is only exchanged for a new user; returning
    /// users keep the token stored at their first sign-in.
    pub async fn login(&self, uid: &str, code: &str, id_token: &str) -> Result<User, AppError> {
        let info = self.id_tokens.verify(id_token).await?;

        match self.db.get_user(uid).await {
            Ok(user) => return self.returning_user(user, &info).await,
            Err(e) if e.is_not_found() => {}
            Err(e) => return Err(e),
        }

        let token = self.oauth.exchange_code(code).await?;
        let user = User::from_claims(uid, &info, token);
        self.db.set_user(&user).await?;
        tracing::info!(uid, "New user created");

        self.db.get_user(uid).await
    }

    /// Admit a returning user only if the token is for the same Google
    /// account. Older records get the token's subject recorded.
    async fn returning_user(&self, mut user: User, info: &UserInfo) -> Result<User, AppError> {
        if !user.matches_identity(info) {
            tracing::warn!(uid = %user.id, "ID token does not belong to this user");
            return Err(AppError::Forbidden);
        }

        if user.google_sub.is_empty() && !info.sub.is_empty() {
            user.google_sub = info.sub.clone();
            self.db.set_user(&user).await?;
            tracing::info!(uid = %user.id, "Recorded Google subject for user");
        }

        tracing::info!(uid = %user.id, "Existing user signed in");
        Ok(user)
    }
}
