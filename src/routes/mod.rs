// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! HTTP route handlers.
//!
//! Handlers return [`Reply`]: a body becomes `200` JSON, no body becomes
//! `204`. Errors map to a status through [`AppError`](crate::error::AppError).

pub mod auth;
pub mod contact;
pub mod extract;
pub mod invoice;
pub mod pdf;
pub mod user;

use crate::middleware::require_user;
use crate::AppState;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::{middleware, routing::get, Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Handler outcome: a JSON body, or nothing.
#[derive(Debug)]
pub enum Reply<T> {
    Json(T),
    NoContent,
}

impl<T: Serialize> IntoResponse for Reply<T> {
    fn into_response(self) -> Response {
        match self {
            Reply::Json(body) => (StatusCode::OK, Json(body)).into_response(),
            Reply::NoContent => StatusCode::NO_CONTENT.into_response(),
        }
    }
}

/// Liveness check.
async fn health_check() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// CORS for the configured frontend origin, with credentials.
fn cors_layer(allow_origin: &str) -> CorsLayer {
    match HeaderValue::from_str(allow_origin) {
        Ok(origin) => CorsLayer::new().allow_origin(AllowOrigin::exact(origin)),
        Err(e) => {
            tracing::warn!(error = %e, origin = %allow_origin, "Unusable CORS origin; cross-origin requests will be refused");
            CorsLayer::new()
        }
    }
    .allow_credentials(true)
    .allow_methods([
        Method::DELETE,
        Method::GET,
        Method::POST,
        Method::PUT,
        Method::OPTIONS,
    ])
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::CONTENT_LENGTH,
        header::ORIGIN,
    ])
}

/// Layers shared by every route. Panics are caught innermost so their
/// 500 still carries CORS and security headers.
fn with_common_layers(router: Router, allow_origin: &str) -> Router {
    router
        .layer(CatchPanicLayer::new())
        .layer(middleware::from_fn(
            crate::middleware::security::add_security_headers,
        ))
        .layer(cors_layer(allow_origin))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

/// Build the complete router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    let allow_origin = state.config.allow_origin.clone();

    // Public routes (no session required)
    let public_routes = Router::new()
        .route("/", get(health_check))
        .merge(auth::routes())
        .merge(pdf::routes());

    // Protected routes (session required). Resource lookups inside these
    // run after the user is resolved.
    let protected_routes = Router::new()
        .merge(invoice::routes(&state))
        .merge(contact::routes(&state))
        .merge(user::routes())
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user));

    let router = Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state);

    with_common_layers(router, &allow_origin)
}
