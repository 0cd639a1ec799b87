// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Public PDF download tests.

use axum::http::{header, Method, StatusCode};
use tower::ServiceExt;

mod common;
use common::{body_bytes, create_test_app, request};

#[tokio::test]
async fn test_unknown_pdf_is_not_found() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request(
            Method::GET,
            "/pdf/0f8fad5b-d9cb-469f-a165-70867728950e",
            None,
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stored_pdf_downloads_without_session() {
    let (app, state) = create_test_app();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("upload.pdf");
    tokio::fs::write(&path, b"%PDF-1.3 fake").await.unwrap();
    state.storage.upload("abc-123", &path).await.unwrap();

    let response = app
        .oneshot(request(Method::GET, "/pdf/abc-123", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers.get(header::CONTENT_TYPE).unwrap(), "application/pdf");
    assert_eq!(
        headers.get(header::CONTENT_DISPOSITION).unwrap(),
        "attachment; filename=abc-123.pdf"
    );
    assert_eq!(
        headers.get(header::ACCESS_CONTROL_EXPOSE_HEADERS).unwrap(),
        "content-disposition"
    );
    assert_eq!(body_bytes(response).await, b"%PDF-1.3 fake");
}

#[tokio::test]
async fn test_malformed_pdf_id_is_not_found() {
    let (app, _) = create_test_app();

    let response = app
        .oneshot(request(Method::GET, "/pdf/bad%2Fid", None, None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
