// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Middleware modules (sessions, resource lookup, security headers).

pub mod auth;
pub mod resources;
pub mod security;

pub use auth::{require_user, CurrentUser};
pub use resources::{ensure_contact, ensure_invoice};
