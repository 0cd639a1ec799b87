// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Wham: invoicing for sole traders.
//!
//! This crate provides the backend API for managing contacts and invoices,
//! rendering invoice PDFs and emailing them to clients.

pub mod config;
pub mod db;
pub mod error;
pub mod ids;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::{AuthService, GmailClient, GoogleOAuthClient, IdTokenVerifier, PdfStorage, SessionStore};

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub sessions: SessionStore,
    pub storage: PdfStorage,
    pub oauth: GoogleOAuthClient,
    pub id_tokens: IdTokenVerifier,
    pub gmail: GmailClient,
}

impl AppState {
    pub fn auth(&self) -> AuthService<'_> {
        AuthService {
            db: &self.db,
            oauth: &self.oauth,
            id_tokens: &self.id_tokens,
        }
    }
}
