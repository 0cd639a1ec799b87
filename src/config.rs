// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from a YAML file and environment variables.
//!
//! The YAML file carries the OAuth client credentials and deployment
//! settings. A handful of environment variables override individual keys
//! so secrets can be injected without editing the file.

use serde::Deserialize;
use std::env;
use std::path::{Path, PathBuf};

/// Default location of the YAML config file.
pub const DEFAULT_CONFIG_PATH: &str = "./secrets/config.yaml";

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Socket address the server binds to.
    #[serde(default = "default_address")]
    pub address: String,
    /// Origin allowed by CORS (the web frontend).
    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,
    /// GCP project holding the Firestore database.
    #[serde(default)]
    pub project_id: String,
    /// Cloud Storage bucket for generated PDFs.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Public URL prefix used in invoice emails.
    #[serde(default = "default_invoice_url")]
    pub invoice_url: String,
    /// Directory where PDFs are rendered before upload.
    #[serde(default = "env::temp_dir")]
    pub pdf_dir: PathBuf,
    /// Days between issue and due date when a request does not give one.
    #[serde(default = "default_invoice_due_days")]
    pub invoice_due_days: i64,
    #[serde(default)]
    pub redis: RedisConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub oauth2: OAuthConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
}

/// Session cookie settings.
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
    /// Session lifetime in seconds (Redis TTL and cookie max-age).
    #[serde(default = "default_session_ttl")]
    pub ttl_secs: u64,
    /// Mark the cookie `Secure`. Disable only for plain-http local dev.
    #[serde(default = "default_true")]
    pub secure: bool,
}

/// Google OAuth client credentials.
#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
    #[serde(default = "default_redirect_url")]
    pub redirect_url: String,
}

fn default_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_allow_origin() -> String {
    "http://localhost:3000".to_string()
}

fn default_bucket() -> String {
    "wham-ad61b.appspot.com".to_string()
}

fn default_invoice_url() -> String {
    "https://whaminvoice.co.nz/invoice".to_string()
}

fn default_invoice_due_days() -> i64 {
    14
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_cookie_name() -> String {
    "wham_session".to_string()
}

fn default_session_ttl() -> u64 {
    7 * 24 * 60 * 60
}

fn default_true() -> bool {
    true
}

fn default_redirect_url() -> String {
    "https://wham-ad61b.firebaseapp.com/__/auth/handler".to_string()
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            ttl_secs: default_session_ttl(),
            secure: true,
        }
    }
}

impl Default for OAuthConfig {
    fn default() -> Self {
        Self {
            client_id: String::new(),
            client_secret: String::new(),
            redirect_url: default_redirect_url(),
        }
    }
}

impl Config {
    /// Load configuration from the YAML file named by `WHAM_CONFIG`
    /// (or [`DEFAULT_CONFIG_PATH`]) and apply environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let path = env::var("WHAM_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
        let mut config = Self::from_file(&path)?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Parse a YAML config file without validating it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("OAUTH_CLIENT_ID") {
            self.oauth2.client_id = v.trim().to_string();
        }
        if let Ok(v) = env::var("OAUTH_CLIENT_SECRET") {
            self.oauth2.client_secret = v.trim().to_string();
        }
        if let Ok(v) = env::var("REDIS_URL") {
            self.redis.url = v;
        }
        if let Ok(v) = env::var("ALLOW_ORIGIN") {
            self.allow_origin = v;
        }
        if let Ok(port) = env::var("PORT") {
            self.address = with_port(&self.address, &port);
        }
    }

    /// Reject configurations the server cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.allow_origin.trim().is_empty() {
            return Err(ConfigError::Invalid("allow_origin must not be blank".into()));
        }
        if self.project_id.trim().is_empty() {
            return Err(ConfigError::Missing("project_id"));
        }
        if self.oauth2.client_id.trim().is_empty() {
            return Err(ConfigError::Missing("oauth2.client_id"));
        }
        if self.oauth2.client_secret.trim().is_empty() {
            return Err(ConfigError::Missing("oauth2.client_secret"));
        }
        if self.invoice_due_days < 0 {
            return Err(ConfigError::Invalid(
                "invoice_due_days must not be negative".into(),
            ));
        }
        Ok(())
    }

    /// Config for testing only.
    pub fn test_default() -> Self {
        Self {
            address: "127.0.0.1:0".to_string(),
            allow_origin: "http://localhost:3000".to_string(),
            project_id: "test-project".to_string(),
            bucket: "test-bucket".to_string(),
            invoice_url: default_invoice_url(),
            pdf_dir: env::temp_dir(),
            invoice_due_days: default_invoice_due_days(),
            redis: RedisConfig::default(),
            session: SessionConfig {
                secure: false,
                ..SessionConfig::default()
            },
            oauth2: OAuthConfig {
                client_id: "test-client-id.apps.googleusercontent.com".to_string(),
                client_secret: "test_secret".to_string(),
                redirect_url: default_redirect_url(),
            },
        }
    }
}

/// Replace the port of a `host:port` address.
fn with_port(address: &str, port: &str) -> String {
    let host = address
        .rsplit_once(':')
        .map(|(host, _)| host)
        .unwrap_or(address);
    format!("{}:{}", host, port.trim())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Missing required config value: {0}")]
    Missing(&'static str),

    #[error("Invalid config: {0}")]
    Invalid(String),
}
