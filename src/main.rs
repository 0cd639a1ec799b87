// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Wham API Server
//!
//! Invoicing backend: contacts, invoices, PDF rendering and email
//! delivery for signed-in Google users.

use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use wham_invoice::{
    config::Config,
    db::FirestoreDb,
    services::{GmailClient, GoogleOAuthClient, IdTokenVerifier, PdfStorage, SessionStore},
    AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging for GCP
    init_logging();

    let config = Config::load()?;
    tracing::info!(address = %config.address, "Starting Wham API");

    let db = FirestoreDb::new(&config.project_id).await?;

    let sessions = SessionStore::connect(&config.redis.url).await?;

    let storage = PdfStorage::gcs(&config.bucket)?;
    tokio::fs::create_dir_all(&config.pdf_dir).await?;

    let oauth = GoogleOAuthClient::new(&config.oauth2);
    let id_tokens = IdTokenVerifier::new(&config)?;
    let gmail = GmailClient::new(oauth.clone(), &config.invoice_url);

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        sessions,
        storage,
        oauth,
        id_tokens,
        gmail,
    });

    let app = wham_invoice::routes::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.address).await?;
    tracing::info!(address = %config.address, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging (GCP-compliant).
fn init_logging() {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wham_invoice=debug,info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(format)
        .init();
}
