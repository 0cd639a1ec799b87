// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in and sign-out routes.

use crate::config::SessionConfig;
use crate::error::Result;
use crate::middleware::auth::session_id_from;
use crate::models::User;
use crate::routes::extract::ValidJson;
use crate::routes::Reply;
use crate::AppState;
use axum::{
    extract::{Request, State},
    routing::post,
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use validator::Validate;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth", post(login))
        .route("/logout", post(logout))
}

/// Body of `POST /auth`, as produced by the frontend's Google sign-in.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    #[validate(length(min = 1, max = 128))]
    pub uid: String,
    #[validate(length(min = 1))]
    pub code: String,
    #[validate(length(min = 1))]
    pub id_token: String,
}

fn session_cookie(config: &SessionConfig, session_id: String) -> Cookie<'static> {
    // The frontend lives on another origin, so a secure cookie must be
    // SameSite=None to be sent with credentialed requests.
    let same_site = if config.secure {
        SameSite::None
    } else {
        SameSite::Lax
    };

    Cookie::build((config.cookie_name.clone(), session_id))
        .path("/")
        .http_only(true)
        .secure(config.secure)
        .same_site(same_site)
        .max_age(time::Duration::seconds(config.ttl_secs as i64))
        .build()
}

/// Sign in: verify the ID token, get or create the user, start a session.
async fn login(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    ValidJson(req): ValidJson<AuthRequest>,
) -> Result<(CookieJar, Reply<User>)> {
    let user = state
        .auth()
        .login(&req.uid, &req.code, &req.id_token)
        .await?;

    let session_id = state
        .sessions
        .create(&user.id, Duration::from_secs(state.config.session.ttl_secs))
        .await?;

    let jar = jar.add(session_cookie(&state.config.session, session_id));
    Ok((jar, Reply::Json(user.sanitize())))
}

/// Sign out: end the session (if any) and clear the cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    request: Request,
) -> Result<(CookieJar, Reply<()>)> {
    let config = &state.config.session;

    if let Some(session_id) = session_id_from(&jar, &request, &config.cookie_name) {
        state.sessions.destroy(&session_id).await?;
        tracing::info!("Session ended");
    }

    let jar = jar.remove(Cookie::build((config.cookie_name.clone(), "")).path("/"));
    Ok((jar, Reply::NoContent))
}
