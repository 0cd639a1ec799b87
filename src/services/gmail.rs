// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invoice emails sent through the Gmail API as the signed-in user.

use crate::db::FirestoreDb;
use crate::error::AppError;
use crate::models::{Contact, Invoice, OAuthToken, User};
use crate::services::oauth::GoogleOAuthClient;
use base64::{engine::general_purpose::URL_SAFE, Engine as _};
use chrono::Utc;

const SEND_URL: &str = "https://gmail.googleapis.com/gmail/v1/users/me/messages/send";
const SUBJECT: &str = "Invoice";
/// Gmail resolves "me" to the authenticated account.
const FROM: &str = "me";

/// Build the raw RFC 2822 message Gmail expects, base64url encoded.
pub fn compose_message(from: &str, to: &str, subject: &str, body: &str) -> String {
    let message = format!(
        "From: {} \r\nTo: {} \r\nSubject: {}\r\n\r\n{}",
        from, to, subject, body
    );
    URL_SAFE.encode(message)
}

/// Body of the "your invoice is ready" email.
pub fn invoice_email_body(invoice_url: &str, invoice: &Invoice, user: &User, contact: &Contact) -> String {
    format!(
        "Hi {},\n\nYour invoice is ready.\n\nTo view and download it please visit: {}/{} Thanks.\n{}",
        contact.first_name,
        invoice_url.trim_end_matches('/'),
        invoice.pdf_id,
        user.first_name
    )
}

/// Gmail API client.
#[derive(Clone)]
pub struct GmailClient {
    http: reqwest::Client,
    send_url: String,
    invoice_url: String,
    oauth: GoogleOAuthClient,
}

impl GmailClient {
    pub fn new(oauth: GoogleOAuthClient, invoice_url: &str) -> Self {
        Self::with_send_url(oauth, invoice_url, SEND_URL)
    }

    /// Client against a different send endpoint (used by tests).
    pub fn with_send_url(
        oauth: GoogleOAuthClient,
        invoice_url: &str,
        send_url: impl Into<String>,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            send_url: send_url.into(),
            invoice_url: invoice_url.to_string(),
            oauth,
        }
    }

    /// Email the invoice link to the contact, from the user's mailbox.
    pub async fn send_invoice_email(
        &self,
        db: &FirestoreDb,
        user: &User,
        invoice: &Invoice,
        contact: &Contact,
    ) -> Result<(), AppError> {
        if contact.email.is_empty() {
            return Err(AppError::BadRequest("contact has no email address".to_string()));
        }

        let token = self.access_token(db, user).await?;
        let body = invoice_email_body(&self.invoice_url, invoice, user, contact);
        let raw = compose_message(FROM, &contact.email, SUBJECT, &body);

        let response = self
            .http
            .post(&self.send_url)
            .bearer_auth(&token.access_token)
            .json(&serde_json::json!({ "raw": raw }))
            .send()
            .await
            .map_err(|e| AppError::Upstream(format!("Gmail send request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::Upstream(format!("Gmail HTTP {}: {}", status, body)));
        }

        tracing::info!(
            invoice_id = %invoice.id,
            contact_id = %contact.id,
            "Invoice email sent"
        );
        Ok(())
    }

    /// The user's access token, refreshed and persisted first if stale.
    async fn access_token(&self, db: &FirestoreDb, user: &User) -> Result<OAuthToken, AppError> {
        let token = user
            .oauth_token
            .as_ref()
            .ok_or_else(|| AppError::BadRequest("user has not granted mail access".to_string()))?;

        if !token.needs_refresh(Utc::now()) {
            return Ok(token.clone());
        }

        let refreshed = self.oauth.refresh(token).await?;
        let mut updated = user.clone();
        updated.oauth_token = Some(refreshed.clone());
        db.set_user(&updated).await?;

        Ok(refreshed)
    }
}
