// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod contact;
pub mod invoice;
pub mod user;

pub use contact::{Address, Contact};
pub use invoice::{Invoice, InvoiceDetail, InvoiceView, GST_RATE};
pub use user::{OAuthToken, User, UserInfo, UserSummary};
