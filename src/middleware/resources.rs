// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Resource lookup middleware for `{invoice_id}` and `{contact_id}` routes.
//!
//! Each loads the record named in the path, checks that the signed-in user
//! owns it, and stores it in the request extensions for the handler.
//! Must run inside [`require_user`](super::auth::require_user).

use crate::error::AppError;
use crate::middleware::auth::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
    Extension,
};
use std::sync::Arc;

fn ensure_owner(owner_id: &str, user: &CurrentUser) -> Result<(), AppError> {
    if owner_id != user.0.id {
        tracing::warn!(user_id = %user.0.id, "Blocked access to another user's record");
        return Err(AppError::Forbidden);
    }
    Ok(())
}

pub async fn ensure_invoice(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(invoice_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let invoice = state.db.get_invoice(&invoice_id).await?;
    ensure_owner(&invoice.user_id, &user)?;
    request.extensions_mut().insert(invoice);
    Ok(next.run(request).await)
}

pub async fn ensure_contact(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<CurrentUser>,
    Path(contact_id): Path<String>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let contact = state.db.get_contact(&contact_id).await?;
    ensure_owner(&contact.user_id, &user)?;
    request.extensions_mut().insert(contact);
    Ok(next.run(request).await)
}
