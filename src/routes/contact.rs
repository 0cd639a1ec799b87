// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact routes.

use crate::error::Result;
use crate::middleware::{ensure_contact, CurrentUser};
use crate::models::{Address, Contact};
use crate::routes::extract::ValidJson;
use crate::routes::Reply;
use crate::AppState;
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let by_id = Router::new()
        .route("/contact/get/{contact_id}", get(get_contact))
        .route("/contact/delete/{contact_id}", delete(delete_contact))
        .route_layer(middleware::from_fn_with_state(state.clone(), ensure_contact));

    Router::new()
        .route("/contact/new", post(new_contact))
        .merge(by_id)
}

/// Body of `POST /contact/new`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewContactRequest {
    #[validate(length(min = 1, max = 100))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[serde(default)]
    #[validate(length(max = 40))]
    pub phone: String,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub company: String,
    #[serde(default)]
    #[validate(nested)]
    pub address: Address,
}

async fn get_contact(Extension(contact): Extension<Contact>) -> Reply<Contact> {
    Reply::Json(contact)
}

async fn delete_contact(
    State(state): State<Arc<AppState>>,
    Extension(contact): Extension<Contact>,
) -> Result<Reply<()>> {
    state.db.delete_contact(&contact.id).await?;
    tracing::info!(contact_id = %contact.id, "Contact deleted");
    Ok(Reply::NoContent)
}

async fn new_contact(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(req): ValidJson<NewContactRequest>,
) -> Result<Reply<Contact>> {
    let mut contact = Contact {
        id: String::new(),
        user_id: user.id,
        first_name: req.first_name,
        last_name: req.last_name,
        phone: req.phone,
        email: req.email,
        company: req.company,
        address: req.address,
    };

    let id = state.db.add_contact(&mut contact).await?;
    tracing::info!(contact_id = %id, "Contact created");

    Ok(Reply::Json(contact))
}
