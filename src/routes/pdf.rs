// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public PDF download, linked from invoice emails.

use crate::error::{AppError, Result};
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use std::sync::Arc;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/pdf/{pdf_id}", get(get_pdf))
}

/// PDF ids are UUIDs; anything else cannot name a stored object.
fn valid_pdf_id(pdf_id: &str) -> bool {
    !pdf_id.is_empty()
        && pdf_id.len() <= 64
        && pdf_id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

async fn get_pdf(State(state): State<Arc<AppState>>, Path(pdf_id): Path<String>) -> Result<Response> {
    if !valid_pdf_id(&pdf_id) {
        return Err(AppError::NotFound(format!("pdf {}", pdf_id)));
    }

    let bytes = state.storage.download(&pdf_id).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename={}.pdf", pdf_id),
            ),
            (
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                header::CONTENT_DISPOSITION.to_string(),
            ),
        ],
        bytes,
    )
        .into_response())
}
