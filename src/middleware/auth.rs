// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session authentication middleware.

use crate::error::AppError;
use crate::models::User;
use crate::services::UserSession;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;

/// The signed-in user, resolved from the session.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Session ID from the session cookie, or a `Bearer` header for
/// non-browser clients.
pub fn session_id_from(jar: &CookieJar, request: &Request, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

/// Middleware that requires a live session and loads its user.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session_id = session_id_from(&jar, &request, &state.config.session.cookie_name)
        .ok_or(AppError::Unauthorized)?;

    let user = state.get_user(&session_id).await?;
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
