// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Adapters over external services.

pub mod auth;
pub mod gmail;
pub mod google_oidc;
pub mod oauth;
pub mod pdf;
pub mod session;
pub mod storage;

pub use auth::AuthService;
pub use gmail::GmailClient;
pub use google_oidc::IdTokenVerifier;
pub use oauth::GoogleOAuthClient;
pub use session::{SessionStore, UserSession};
pub use storage::PdfStorage;
