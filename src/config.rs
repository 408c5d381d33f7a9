// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! LibreLinkUp credentials are optional: without them the service still
//! runs cycles against a stored ticket, but cannot re-login on its own.

use secrecy::SecretString;
use std::env;
use std::path::PathBuf;

/// Default LibreLinkUp API endpoint (global region).
pub const DEFAULT_API_URL: &str = "https://api.libreview.io";

/// Provenance tag written into every health record.
pub const DEFAULT_DATA_ORIGIN: &str = "glucose-bridge";

/// Which health store backend to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HealthStoreBackend {
    Firestore,
    Memory,
}

/// Email/password pair used for background re-login.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub email: String,
    pub password: SecretString,
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server port
    pub port: u16,
    /// Bearer token required on trigger and login routes
    pub trigger_token: String,
    /// LibreLinkUp API base URL
    pub api_url: String,
    /// Regional API URL with a `{region}` placeholder, used after a login redirect
    pub regional_url_template: Option<String>,
    /// Credentials for transparent re-login (optional)
    pub credentials: Option<Credentials>,
    /// Where the session (ticket + profile) is persisted
    pub session_file: PathBuf,
    /// Health store backend
    pub health_store: HealthStoreBackend,
    /// GCP project ID (Firestore backend only)
    pub gcp_project_id: String,
    /// Companion data-layer endpoint; relay is skipped when unset
    pub companion_url: Option<String>,
    /// How long a companion push may wait for acknowledgment
    pub companion_timeout_secs: u64,
    /// Provenance tag for health records
    pub data_origin: String,
    /// Run one sync cycle right after a successful login
    pub sync_on_login: bool,
}

impl Config {
    /// Config for tests only.
    pub fn test_default() -> Self {
        Self {
            port: 8080,
            trigger_token: "test_trigger_token".to_string(),
            api_url: "http://127.0.0.1:9".to_string(),
            regional_url_template: None,
            credentials: None,
            session_file: PathBuf::from("data/test-session.json"),
            health_store: HealthStoreBackend::Memory,
            gcp_project_id: "test-project".to_string(),
            companion_url: None,
            companion_timeout_secs: 2,
            data_origin: DEFAULT_DATA_ORIGIN.to_string(),
            sync_on_login: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        let credentials = match (env::var("LIBRELINK_EMAIL"), env::var("LIBRELINK_PASSWORD")) {
            (Ok(email), Ok(password)) if !email.trim().is_empty() && !password.is_empty() => {
                Some(Credentials {
                    email: email.trim().to_string(),
                    password: SecretString::from(password),
                })
            }
            (Ok(_), Err(_)) => return Err(ConfigError::Missing("LIBRELINK_PASSWORD")),
            (Err(_), Ok(_)) => return Err(ConfigError::Missing("LIBRELINK_EMAIL")),
            _ => None,
        };

        let health_store = match env::var("HEALTH_STORE").as_deref() {
            Ok("firestore") => HealthStoreBackend::Firestore,
            Ok("memory") | Err(_) => HealthStoreBackend::Memory,
            Ok(other) => {
                return Err(ConfigError::Invalid("HEALTH_STORE", other.to_string()));
            }
        };

        let regional_url_template = match env::var("LIBRELINK_REGIONAL_URL") {
            Ok(v) if v.trim().is_empty() => None,
            Ok(v) if !v.contains("{region}") => {
                return Err(ConfigError::Invalid("LIBRELINK_REGIONAL_URL", v));
            }
            Ok(v) => Some(v.trim().to_string()),
            Err(_) => None,
        };

        let gcp_project_id = env::var("GCP_PROJECT_ID").unwrap_or_else(|_| "local-dev".to_string());
        if health_store == HealthStoreBackend::Firestore && gcp_project_id == "local-dev" {
            tracing::warn!("HEALTH_STORE=firestore without GCP_PROJECT_ID, using local-dev");
        }

        Ok(Self {
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            trigger_token: env::var("TRIGGER_TOKEN")
                .map(|v| v.trim().to_string())
                .map_err(|_| ConfigError::Missing("TRIGGER_TOKEN"))?,
            api_url: env::var("LIBRELINK_API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| DEFAULT_API_URL.to_string()),
            regional_url_template,
            credentials,
            session_file: env::var("SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("data/session.json")),
            health_store,
            gcp_project_id,
            companion_url: env::var("COMPANION_URL")
                .ok()
                .map(|v| v.trim_end_matches('/').to_string())
                .filter(|v| !v.is_empty()),
            companion_timeout_secs: env::var("COMPANION_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            data_origin: env::var("DATA_ORIGIN")
                .unwrap_or_else(|_| DEFAULT_DATA_ORIGIN.to_string()),
            sync_on_login: env::var("SYNC_ON_LOGIN")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
        })
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}
