// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Server-side sessions.
//!
//! The browser only holds an opaque session ID in a cookie. The payload
//! (which user the session belongs to) lives in Redis under
//! `session:<id>` with a TTL. Payloads carry an explicit schema version;
//! anything with an unknown version is treated as no session at all.

use crate::error::AppError;
use crate::ids;
use crate::models::User;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use dashmap::DashMap;
use redis::AsyncCommands;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Current session payload schema.
pub const SESSION_SCHEMA_VERSION: u32 = 1;

const KEY_PREFIX: &str = "session:";

/// What a session stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionPayload {
    pub version: u32,
    pub user_id: String,
    pub created_at: String,
}

impl SessionPayload {
    pub fn new(user_id: &str) -> Self {
        Self {
            version: SESSION_SCHEMA_VERSION,
            user_id: user_id.to_string(),
            created_at: format_utc_rfc3339(chrono::Utc::now()),
        }
    }

    /// Decode a stored payload. Unreadable or foreign-version payloads yield `None`.
    pub fn decode(raw: &str) -> Option<Self> {
        let payload: Self = serde_json::from_str(raw).ok()?;
        if payload.version != SESSION_SCHEMA_VERSION {
            tracing::warn!(version = payload.version, "Ignoring session with unknown schema version");
            return None;
        }
        Some(payload)
    }
}

/// Session storage backend.
#[derive(Clone)]
pub enum SessionStore {
    Redis(redis::aio::ConnectionManager),
    Memory(Arc<DashMap<String, (String, Instant)>>),
}

fn redis_err(e: redis::RedisError) -> AppError {
    AppError::Database(format!("Session store error: {}", e))
}

impl SessionStore {
    /// Connect to Redis. The connection manager reconnects on its own.
    pub async fn connect(url: &str) -> Result<Self, AppError> {
        let client = redis::Client::open(url).map_err(redis_err)?;
        let manager = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(redis_err)?;
        tracing::info!("Connected to Redis session store");
        Ok(Self::Redis(manager))
    }

    pub fn in_memory() -> Self {
        Self::Memory(Arc::new(DashMap::new()))
    }

    /// Start a session for `user_id` and return its ID.
    pub async fn create(&self, user_id: &str, ttl: Duration) -> Result<String, AppError> {
        let session_id = ids::session_id()?;
        let payload = serde_json::to_string(&SessionPayload::new(user_id))
            .map_err(|e| AppError::Internal(e.into()))?;

        match self {
            Self::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn
                    .set_ex(session_key(&session_id), payload, ttl.as_secs().max(1))
                    .await
                    .map_err(redis_err)?;
            }
            Self::Memory(map) => {
                let now = Instant::now();
                map.retain(|_, (_, expires_at)| *expires_at > now);
                map.insert(session_id.clone(), (payload, now + ttl));
            }
        }

        tracing::info!(user_id, "Session created");
        Ok(session_id)
    }

    /// Load a live session payload.
    pub async fn load(&self, session_id: &str) -> Result<Option<SessionPayload>, AppError> {
        let raw: Option<String> = match self {
            Self::Redis(manager) => {
                let mut conn = manager.clone();
                conn.get(session_key(session_id)).await.map_err(redis_err)?
            }
            Self::Memory(map) => {
                let live = map
                    .get(session_id)
                    .filter(|entry| entry.value().1 > Instant::now())
                    .map(|entry| entry.value().0.clone());
                if live.is_none() {
                    map.remove(session_id);
                }
                live
            }
        };

        Ok(raw.as_deref().and_then(SessionPayload::decode))
    }

    /// End a session. Unknown IDs are ignored.
    pub async fn destroy(&self, session_id: &str) -> Result<(), AppError> {
        match self {
            Self::Redis(manager) => {
                let mut conn = manager.clone();
                let _: () = conn.del(session_key(session_id)).await.map_err(redis_err)?;
            }
            Self::Memory(map) => {
                map.remove(session_id);
            }
        }
        Ok(())
    }
}

fn session_key(session_id: &str) -> String {
    format!("{}{}", KEY_PREFIX, session_id)
}

/// Resolves a session ID to the signed-in user.
pub trait UserSession {
    /// `Unauthorized` when there is no live session, `NotFound` when the
    /// session points at a user that no longer exists.
    fn get_user(&self, session_id: &str) -> impl Future<Output = Result<User, AppError>> + Send;
}

impl UserSession for AppState {
    async fn get_user(&self, session_id: &str) -> Result<User, AppError> {
        let payload = self
            .sessions
            .load(session_id)
            .await?
            .ok_or(AppError::Unauthorized)?;
        self.db.get_user(&payload.user_id).await
    }
}
