// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Routes scoped to the signed-in user.

use crate::error::Result;
use crate::middleware::CurrentUser;
use crate::models::{Contact, InvoiceView, User, UserSummary};
use crate::routes::Reply;
use crate::AppState;
use axum::{extract::State, routing::get, Extension, Router};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/user/me", get(get_me))
        .route("/user/invoices", get(get_invoices))
        .route("/user/contacts", get(get_contacts))
        .route("/user/summary", get(get_summary))
}

async fn get_me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Reply<User> {
    Reply::Json(user.sanitize())
}

async fn get_invoices(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Reply<Vec<InvoiceView>>> {
    let invoices = state.db.invoices_for_user(&user.id).await?;
    Ok(Reply::Json(invoices.into_iter().map(InvoiceView::from).collect()))
}

async fn get_contacts(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Reply<Vec<Contact>>> {
    let contacts = state.db.contacts_for_user(&user.id).await?;
    Ok(Reply::Json(contacts))
}

/// Invoice totals; no content until the user has billed something.
async fn get_summary(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Reply<UserSummary>> {
    let summary = state.db.invoice_totals_for_user(&user.id).await?;
    if summary.invoice_total == 0.0 {
        return Ok(Reply::NoContent);
    }
    Ok(Reply::Json(summary))
}
