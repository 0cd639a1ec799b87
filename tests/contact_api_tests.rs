// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact endpoint tests: creation, lookup, ownership and deletion.

use axum::http::{Method, StatusCode};
use serde_json::json;
use tower::ServiceExt;

mod common;
use common::{body_json, create_test_app, login_cookie, request, seed_contact, seed_user};

#[tokio::test]
async fn test_create_then_get_contact() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    let cookie = login_cookie(&state, "owner").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::POST,
            "/contact/new",
            Some(&cookie),
            Some(json!({
                "first_name": "Sam",
                "last_name": "Ng",
                "email": "sam@example.com",
                "phone": "09 555 0199",
                "company": "Ng Plumbing",
                "address": {
                    "address_first_line": "1 Queen St",
                    "address_suburb": "Auckland CBD",
                    "address_postcode": "1010",
                    "address_country": "New Zealand"
                }
            })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let created = body_json(response).await;
    let id = created["id"].as_str().unwrap().to_string();
    assert_eq!(id.len(), 20);
    assert_eq!(created["user_id"], "owner");

    let response = app
        .oneshot(request(
            Method::GET,
            &format!("/contact/get/{}", id),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let fetched = body_json(response).await;
    assert_eq!(fetched, created);
    assert_eq!(fetched["first_name"], "Sam");
    assert_eq!(fetched["company"], "Ng Plumbing");
    assert_eq!(fetched["address"]["address_postcode"], "1010");
    assert_eq!(fetched["address"]["address_second_line"], "");
}

#[tokio::test]
async fn test_create_contact_rejects_bad_email() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    let cookie = login_cookie(&state, "owner").await;

    let response = app
        .oneshot(request(
            Method::POST,
            "/contact/new",
            Some(&cookie),
            Some(json!({ "first_name": "Sam", "last_name": "Ng", "email": "not-an-email" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(state.db.contacts_for_user("owner").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_create_contact_missing_field() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    let cookie = login_cookie(&state, "owner").await;

    let response = app
        .oneshot(request(
            Method::POST,
            "/contact/new",
            Some(&cookie),
            Some(json!({ "first_name": "Sam", "email": "sam@example.com" })),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_contact_is_not_found() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    let cookie = login_cookie(&state, "owner").await;

    let response = app
        .oneshot(request(Method::GET, "/contact/get/missing", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_other_users_contact_is_forbidden() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    seed_user(&state, "intruder").await;
    let contact = seed_contact(&state, "owner").await;
    let cookie = login_cookie(&state, "intruder").await;

    let response = app
        .clone()
        .oneshot(request(
            Method::GET,
            &format!("/contact/get/{}", contact.id),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = app
        .oneshot(request(
            Method::DELETE,
            &format!("/contact/delete/{}", contact.id),
            Some(&cookie),
            None,
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert!(state.db.get_contact(&contact.id).await.is_ok());
}

#[tokio::test]
async fn test_delete_contact() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    let contact = seed_contact(&state, "owner").await;
    let cookie = login_cookie(&state, "owner").await;
    let uri = format!("/contact/delete/{}", contact.id);

    let response = app
        .clone()
        .oneshot(request(Method::DELETE, &uri, Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(state.db.get_contact(&contact.id).await.unwrap_err().is_not_found());

    let response = app
        .oneshot(request(Method::DELETE, &uri, Some(&cookie), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_list_contacts_only_own() {
    let (app, state) = create_test_app();
    seed_user(&state, "owner").await;
    seed_contact(&state, "owner").await;
    seed_contact(&state, "owner").await;
    seed_contact(&state, "someone-else").await;
    let cookie = login_cookie(&state, "owner").await;

    let response = app
        .oneshot(request(Method::GET, "/user/contacts", Some(&cookie), None))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let contacts = body.as_array().unwrap();
    assert_eq!(contacts.len(), 2);
    assert!(contacts.iter().all(|c| c["user_id"] == "owner"));
}
