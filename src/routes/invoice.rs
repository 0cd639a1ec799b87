// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Invoice routes.

use crate::error::{AppError, Result};
use crate::middleware::{ensure_invoice, CurrentUser};
use crate::models::{Invoice, InvoiceDetail, InvoiceView};
use crate::routes::extract::ValidJson;
use crate::routes::Reply;
use crate::services::pdf::create_invoice_pdf;
use crate::services::PdfStorage;
use crate::AppState;
use axum::{
    extract::State,
    middleware,
    routing::{delete, get, post},
    Extension, Router,
};
use chrono::{Days, NaiveDate, Utc};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

pub fn routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    let by_id = Router::new()
        .route("/invoice/get/{invoice_id}", get(get_invoice))
        .route("/invoice/view/{invoice_id}", get(view_invoice))
        .route("/invoice/delete/{invoice_id}", delete(delete_invoice))
        .route_layer(middleware::from_fn_with_state(state.clone(), ensure_invoice));

    Router::new()
        .route("/invoice/new", post(new_invoice))
        .route("/invoice/email", post(email_invoice))
        .merge(by_id)
}

/// Body of `POST /invoice/new`.
#[derive(Debug, Deserialize, Validate)]
pub struct NewInvoiceRequest {
    #[validate(length(min = 1))]
    pub contact_id: String,
    #[validate(length(min = 1, max = 500))]
    pub description: String,
    #[validate(range(min = 0.0))]
    pub hours: f64,
    #[validate(range(min = 0.0))]
    pub rate: f64,
    /// Defaults to the configured number of days after today.
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
}

/// Body of `POST /invoice/email`.
#[derive(Debug, Deserialize, Validate)]
pub struct EmailInvoiceRequest {
    #[validate(length(min = 1))]
    pub invoice_id: String,
}

async fn get_invoice(Extension(invoice): Extension<Invoice>) -> Reply<InvoiceView> {
    Reply::Json(invoice.into())
}

/// Invoice with the (sanitized) biller and the billed contact.
async fn view_invoice(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Extension(invoice): Extension<Invoice>,
) -> Result<Reply<InvoiceDetail>> {
    let contact = state.db.get_contact(&invoice.contact_id).await?;
    Ok(Reply::Json(InvoiceDetail::new(invoice, &user, contact)))
}

async fn delete_invoice(
    State(state): State<Arc<AppState>>,
    Extension(invoice): Extension<Invoice>,
) -> Result<Reply<()>> {
    state.db.delete_invoice(&invoice.id).await?;
    if !invoice.pdf_id.is_empty() {
        state.storage.delete(&invoice.pdf_id).await?;
    }
    tracing::info!(invoice_id = %invoice.id, "Invoice deleted");
    Ok(Reply::NoContent)
}

/// Create an invoice: render and store its PDF, then save the record.
async fn new_invoice(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(req): ValidJson<NewInvoiceRequest>,
) -> Result<Reply<InvoiceView>> {
    if !req.hours.is_finite() || !req.rate.is_finite() {
        return Err(AppError::BadRequest("hours and rate must be finite".to_string()));
    }

    let contact = state.db.get_contact(&req.contact_id).await?;
    if contact.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let issue_date = Utc::now().date_naive();
    let due_date = match req.due_date {
        Some(date) => date,
        None => issue_date
            .checked_add_days(Days::new(state.config.invoice_due_days.unsigned_abs()))
            .ok_or_else(|| AppError::BadRequest("due date out of range".to_string()))?,
    };
    if due_date < issue_date {
        return Err(AppError::BadRequest(
            "due date must not be before the issue date".to_string(),
        ));
    }

    let number = next_invoice_number(&state.db.invoices_for_user(&user.id).await?);

    let mut invoice = Invoice {
        id: String::new(),
        user_id: user.id.clone(),
        contact_id: contact.id.clone(),
        pdf_id: String::new(),
        number,
        rate: req.rate,
        hours: req.hours,
        description: req.description,
        issue_date,
        due_date,
        paid: false,
        url_code: None,
    };

    invoice.pdf_id = create_invoice_pdf(
        &state.storage,
        &state.config.pdf_dir,
        &invoice,
        &user,
        &contact,
    )
    .await?;

    let saved = state.db.add_invoice(&mut invoice).await;
    let id = discard_pdf_on_error(&state.storage, &invoice.pdf_id, saved).await?;
    tracing::info!(invoice_id = %id, number, "Invoice created");

    Ok(Reply::Json(invoice.into()))
}

/// Email the invoice link to its contact.
async fn email_invoice(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    ValidJson(req): ValidJson<EmailInvoiceRequest>,
) -> Result<Reply<()>> {
    let invoice = state.db.get_invoice(&req.invoice_id).await?;
    if invoice.user_id != user.id {
        return Err(AppError::Forbidden);
    }

    let contact = state.db.get_contact(&invoice.contact_id).await?;
    state
        .gmail
        .send_invoice_email(&state.db, &user, &invoice, &contact)
        .await?;

    Ok(Reply::NoContent)
}

/// Remove an uploaded PDF whose invoice record could not be saved.
async fn discard_pdf_on_error<T>(storage: &PdfStorage, pdf_id: &str, result: Result<T>) -> Result<T> {
    if result.is_err() {
        if let Err(e) = storage.delete(pdf_id).await {
            tracing::warn!(pdf_id, error = %e, "Could not remove orphaned PDF");
        }
    }
    result
}

/// One past the highest number the user has issued.
fn next_invoice_number(existing: &[Invoice]) -> u32 {
    existing.iter().map(|inv| inv.number).max().unwrap_or(0) + 1
}
