// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

#![allow(dead_code)]

use axum::body::Body;
use axum::http::{header, Method, Request, Response};
use axum::routing::post;
use axum::{Json, Router};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, DecodingKey, EncodingKey, Header};
use serde::Serialize;
use serde_json::Value;
use std::sync::{Arc, Mutex};
use wham_invoice::config::Config;
use wham_invoice::db::FirestoreDb;
use wham_invoice::models::{Address, Contact, Invoice, OAuthToken, User};
use wham_invoice::routes::create_router;
use wham_invoice::services::{
    GmailClient, GoogleOAuthClient, IdTokenVerifier, PdfStorage, SessionStore,
};
use wham_invoice::AppState;

/// Key ID of the test signing key in `tests/fixtures`.
pub const TEST_KID: &str = "test-key-1";
const TEST_PRIVATE_KEY: &[u8] = include_bytes!("../fixtures/test_rsa.pem");
const TEST_PUBLIC_KEY: &[u8] = include_bytes!("../fixtures/test_rsa_pub.pem");

/// Nothing listens here; requests to it fail fast.
const UNREACHABLE: &str = "http://127.0.0.1:9";

/// Check if emulator is available via environment variable.
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Create a test app with in-memory storage whose Google endpoints are
/// unreachable. Returns the router and the shared state.
pub fn create_test_app() -> (Router, Arc<AppState>) {
    create_test_app_with(&format!("{}/token", UNREACHABLE), &format!("{}/send", UNREACHABLE))
}

/// Create a test app whose token and Gmail send endpoints are the given URLs.
pub fn create_test_app_with(token_url: &str, send_url: &str) -> (Router, Arc<AppState>) {
    let config = Config::test_default();

    let decoding_key = DecodingKey::from_rsa_pem(TEST_PUBLIC_KEY).expect("test public key");
    let id_tokens = IdTokenVerifier::new_with_static_key(&config, TEST_KID, decoding_key)
        .expect("static key verifier");
    let oauth = GoogleOAuthClient::with_token_url(&config.oauth2, token_url);
    let gmail = GmailClient::with_send_url(oauth.clone(), &config.invoice_url, send_url);

    let state = Arc::new(AppState {
        config,
        db: FirestoreDb::new_in_memory(),
        sessions: SessionStore::in_memory(),
        storage: PdfStorage::in_memory(),
        oauth,
        id_tokens,
        gmail,
    });

    (create_router(state.clone()), state)
}

#[derive(Serialize)]
struct IdTokenClaims<'a> {
    iss: &'a str,
    aud: &'a str,
    sub: &'a str,
    exp: i64,
    iat: i64,
    email: &'a str,
    email_verified: bool,
    given_name: &'a str,
    family_name: &'a str,
    name: &'a str,
}

/// Subject of tokens from [`sign_id_token`].
pub const TEST_SUBJECT: &str = "google-subject-1";

/// Sign a Google-shaped ID token with the test key.
pub fn sign_id_token(audience: &str, email: &str) -> String {
    sign_id_token_for(audience, TEST_SUBJECT, email)
}

/// Sign an ID token for a specific Google account subject.
pub fn sign_id_token_for(audience: &str, subject: &str, email: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = IdTokenClaims {
        iss: "https://accounts.google.com",
        aud: audience,
        sub: subject,
        exp: now + 3600,
        iat: now,
        email,
        email_verified: true,
        given_name: "Ana",
        family_name: "Lee",
        name: "Ana Lee",
    };

    let mut header = Header::new(Algorithm::RS256);
    header.kid = Some(TEST_KID.to_string());
    encode(
        &header,
        &claims,
        &EncodingKey::from_rsa_pem(TEST_PRIVATE_KEY).expect("test private key"),
    )
    .expect("sign test ID token")
}

/// A user with a still-valid OAuth token.
pub fn test_user(uid: &str) -> User {
    User {
        id: uid.to_string(),
        first_name: "Ana".to_string(),
        last_name: "Lee".to_string(),
        email: format!("{}@example.com", uid),
        phone: "021 555 0100".to_string(),
        google_sub: String::new(),
        oauth_token: Some(OAuthToken {
            access_token: "stored-access".to_string(),
            refresh_token: "stored-refresh".to_string(),
            token_type: "Bearer".to_string(),
            expiry: Utc::now() + Duration::minutes(30),
        }),
    }
}

pub async fn seed_user(state: &AppState, uid: &str) -> User {
    let user = test_user(uid);
    state.db.set_user(&user).await.unwrap();
    user
}

pub async fn seed_contact(state: &AppState, uid: &str) -> Contact {
    let mut contact = Contact {
        id: String::new(),
        user_id: uid.to_string(),
        first_name: "Sam".to_string(),
        last_name: "Ng".to_string(),
        phone: "09 555 0199".to_string(),
        email: "sam@example.com".to_string(),
        company: "Ng Plumbing".to_string(),
        address: Address {
            first_line: "1 Queen St".to_string(),
            second_line: String::new(),
            suburb: "Auckland CBD".to_string(),
            postcode: "1010".to_string(),
            country: "New Zealand".to_string(),
        },
    };
    state.db.add_contact(&mut contact).await.unwrap();
    contact
}

/// Store an invoice directly (no PDF rendering).
pub async fn seed_invoice(state: &AppState, uid: &str, contact_id: &str, number: u32, hours: f64, rate: f64) -> Invoice {
    let mut invoice = Invoice {
        id: String::new(),
        user_id: uid.to_string(),
        contact_id: contact_id.to_string(),
        pdf_id: format!("pdf-{}", number),
        number,
        rate,
        hours,
        description: "Consulting".to_string(),
        issue_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
        due_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
        paid: false,
        url_code: None,
    };
    state.db.add_invoice(&mut invoice).await.unwrap();
    invoice
}

/// `Cookie` header value for a fresh session belonging to `uid`.
pub async fn login_cookie(state: &AppState, uid: &str) -> String {
    let session_id = state
        .sessions
        .create(uid, std::time::Duration::from_secs(600))
        .await
        .unwrap();
    format!("{}={}", state.config.session.cookie_name, session_id)
}

/// Build a request, optionally with a session cookie and a JSON body.
pub fn request(method: Method, uri: &str, cookie: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    match body {
        Some(json) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Stand-in for Google's token and Gmail endpoints.
pub struct FakeGoogle {
    pub base_url: String,
    /// JSON bodies posted to the send endpoint.
    pub sent: Arc<Mutex<Vec<Value>>>,
}

impl FakeGoogle {
    pub fn token_url(&self) -> String {
        format!("{}/token", self.base_url)
    }

    /// Token endpoint that rejects every code.
    pub fn rejecting_token_url(&self) -> String {
        format!("{}/token-rejected", self.base_url)
    }

    pub fn send_url(&self) -> String {
        format!("{}/send", self.base_url)
    }
}

pub async fn spawn_fake_google() -> FakeGoogle {
    let sent: Arc<Mutex<Vec<Value>>> = Arc::new(Mutex::new(Vec::new()));
    let recorder = sent.clone();

    let app = Router::new()
        .route(
            "/token",
            post(|| async {
                Json(serde_json::json!({
                    "access_token": "fresh-access",
                    "refresh_token": "fresh-refresh",
                    "token_type": "Bearer",
                    "expires_in": 3599
                }))
            }),
        )
        .route(
            "/token-rejected",
            post(|| async {
                (
                    axum::http::StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "invalid_grant" })),
                )
            }),
        )
        .route(
            "/send",
            post(move |Json(body): Json<Value>| {
                let recorder = recorder.clone();
                async move {
                    recorder.lock().unwrap().push(body);
                    Json(serde_json::json!({ "id": "msg-1", "labelIds": ["SENT"] }))
                }
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeGoogle {
        base_url: format!("http://{}", addr),
        sent,
    }
}
