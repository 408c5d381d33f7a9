// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LibreLinkUp API client.
//!
//! Handles:
//! - Credential login (with regional redirect)
//! - Connections fetch with the latest measurement per patient
//! - Ticket rotation: every authenticated response may carry a new ticket
//! - Mapping HTTP failures onto [`SyncError`] kinds

use crate::error::SyncError;
use crate::models::{AuthTicket, Connection, UserProfile};
use anyhow::Context;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::time::Duration;

/// Client identity LibreLinkUp expects on every request.
const PRODUCT: &str = "llu.android";
const CLIENT_VERSION: &str = "4.16.0";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Successful login.
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub profile: UserProfile,
    pub ticket: AuthTicket,
    /// Base URL the ticket is valid for (differs after a regional redirect)
    pub api_base_url: String,
}

/// Successful connections fetch.
#[derive(Debug, Clone)]
pub struct ConnectionsOutcome {
    /// Server-defined order; the primary patient comes first
    pub connections: Vec<Connection>,
    /// Rotated ticket, when the server issued one
    pub ticket: Option<AuthTicket>,
}

/// LibreLinkUp HTTP client.
#[derive(Clone)]
pub struct LinkUpClient {
    http: reqwest::Client,
    base_url: String,
    /// Regional base URL with a `{region}` placeholder
    regional_template: Option<String>,
}

impl LinkUpClient {
    /// Create a client for the given API base URL.
    pub fn new(base_url: impl Into<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .context("Failed to build LibreLinkUp HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            regional_template: None,
        })
    }

    /// Where to send a login after a regional redirect, e.g.
    /// `https://api-{region}.libreview.io`.
    pub fn with_regional_template(mut self, template: Option<String>) -> Self {
        self.regional_template = template;
        self
    }

    /// Same HTTP client, pointed at another (regional) base URL.
    pub fn at(&self, base_url: &str) -> Self {
        Self {
            http: self.http.clone(),
            base_url: base_url.trim_end_matches('/').to_string(),
            regional_template: self.regional_template.clone(),
        }
    }

    /// Log in with email and password.
    ///
    /// Never panics on bad input or network trouble: every failure comes
    /// back as a [`SyncError`] so the caller can decide whether to keep the
    /// ticket it already has.
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, SyncError> {
        let (session, api_base_url) = match self.login_at(&self.base_url, email, password).await? {
            LoginData::Session(data) => (data, self.base_url.clone()),
            LoginData::Redirect { region } => {
                let regional = self.regional_base_url(&region)?;
                tracing::info!(region = %region, url = %regional, "LibreLinkUp login redirected");
                match self.login_at(&regional, email, password).await? {
                    LoginData::Session(data) => (data, regional),
                    LoginData::Redirect { .. } => {
                        return Err(SyncError::MalformedResponse(
                            "Login redirected twice".to_string(),
                        ))
                    }
                }
            }
        };

        if session.auth_ticket.token.is_empty() {
            return Err(SyncError::MalformedResponse(
                "Login succeeded without a ticket".to_string(),
            ));
        }
        if session.user.email.trim().is_empty() {
            return Err(SyncError::MalformedResponse(
                "Login succeeded without an account email".to_string(),
            ));
        }

        Ok(LoginOutcome {
            profile: session.user,
            ticket: session.auth_ticket,
            api_base_url,
        })
    }

    async fn login_at(
        &self,
        base_url: &str,
        email: &str,
        password: &str,
    ) -> Result<LoginData, SyncError> {
        let url = format!("{}/llu/auth/login", base_url);
        let body = serde_json::json!({
            "email": email,
            "password": password,
        });

        let response = self
            .with_client_headers(self.http.post(&url))
            .json(&body)
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Login request failed: {}", e)))?;

        // The login endpoint reports bad credentials with an HTTP 401 on some regions.
        if matches!(
            response.status(),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            let message = response.text().await.unwrap_or_default();
            return Err(SyncError::Credential {
                status: 2,
                message: upstream_message(&message),
            });
        }

        let envelope: Envelope<serde_json::Value> = check_response_json(response).await?;

        if envelope.status != 0 {
            let message = envelope
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| "Login rejected".to_string());
            tracing::warn!(status = envelope.status, message = %message, "LibreLinkUp login failed");
            return Err(SyncError::Credential {
                status: envelope.status,
                message,
            });
        }

        let data = envelope
            .data
            .ok_or_else(|| SyncError::MalformedResponse("Login response missing data".to_string()))?;

        if data.get("redirect").and_then(|v| v.as_bool()) == Some(true) {
            let region = data
                .get("region")
                .and_then(|v| v.as_str())
                .filter(|r| !r.is_empty() && r.chars().all(|c| c.is_ascii_alphanumeric()))
                .ok_or_else(|| {
                    SyncError::MalformedResponse("Redirect without a valid region".to_string())
                })?;
            return Ok(LoginData::Redirect {
                region: region.to_string(),
            });
        }

        serde_json::from_value(data)
            .map(LoginData::Session)
            .map_err(|e| SyncError::MalformedResponse(format!("Login data: {}", e)))
    }

    /// Fetch the account's connections using a ticket.
    ///
    /// An HTTP 401 maps to [`SyncError::Authorization`] so the caller can
    /// re-login instead of retrying with the same ticket.
    pub async fn connections(
        &self,
        ticket: &AuthTicket,
        profile: &UserProfile,
    ) -> Result<ConnectionsOutcome, SyncError> {
        if ticket.token.is_empty() {
            return Err(SyncError::Authorization("No ticket".to_string()));
        }

        let url = format!("{}/llu/connections", self.base_url);

        let mut request = self
            .with_client_headers(self.http.get(&url))
            .bearer_auth(&ticket.token);
        if !profile.id.is_empty() {
            request = request.header("account-id", account_id(&profile.id));
        }

        let response = request
            .send()
            .await
            .map_err(|e| SyncError::Transport(format!("Connections request failed: {}", e)))?;

        if response.status() == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            return Err(SyncError::Authorization(upstream_message(&body)));
        }

        let envelope: Envelope<Vec<Connection>> = check_response_json(response).await?;

        if envelope.status != 0 {
            let message = envelope
                .error
                .map(|e| e.message)
                .unwrap_or_else(|| format!("status {}", envelope.status));
            return Err(SyncError::MalformedResponse(format!(
                "Connections rejected: {}",
                message
            )));
        }

        Ok(ConnectionsOutcome {
            connections: envelope.data.unwrap_or_default(),
            ticket: envelope.ticket.filter(|t| !t.token.is_empty()),
        })
    }

    /// Base URL for `region`, derived from the configured host.
    ///
    /// Uses the regional template when set, otherwise rewrites an `api.`
    /// host to `api-{region}.` with the same scheme and domain. Any other
    /// host has no known regional form and the redirect fails.
    fn regional_base_url(&self, region: &str) -> Result<String, SyncError> {
        if region.is_empty() || !region.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(SyncError::MalformedResponse(format!(
                "Login redirected to invalid region {:?}",
                region
            )));
        }

        if let Some(template) = &self.regional_template {
            return Ok(template
                .replace("{region}", region)
                .trim_end_matches('/')
                .to_string());
        }

        match self.base_url.find("://api.") {
            Some(idx) => {
                let (scheme, rest) = self.base_url.split_at(idx + 3);
                Ok(format!("{}api-{}.{}", scheme, region, &rest[4..]))
            }
            None => Err(SyncError::MalformedResponse(format!(
                "Login redirected to region {:?} but {} has no regional form",
                region, self.base_url
            ))),
        }
    }

    fn with_client_headers(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        request
            .header("product", PRODUCT)
            .header("version", CLIENT_VERSION)
            .header("cache-control", "no-cache")
            .header("accept", "application/json")
    }
}

/// `Account-Id` header value: hex-encoded SHA-256 of the account ID.
pub fn account_id(user_id: &str) -> String {
    hex::encode(Sha256::digest(user_id.as_bytes()))
}

/// Pull `message` out of an error body, falling back to the raw text.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.pointer("/error/message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.chars().take(200).collect())
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, SyncError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();

        if status == StatusCode::TOO_MANY_REQUESTS {
            tracing::warn!("LibreLinkUp rate limit hit (429)");
            return Err(SyncError::Transport("Rate limited (429)".to_string()));
        }

        if status.is_server_error() {
            return Err(SyncError::Transport(format!("HTTP {}", status)));
        }

        return Err(SyncError::MalformedResponse(format!(
            "HTTP {}: {}",
            status,
            upstream_message(&body)
        )));
    }

    response
        .json()
        .await
        .map_err(|e| SyncError::MalformedResponse(format!("JSON parse error: {}", e)))
}

/// Common response wrapper: `{status, data, ticket, error}`.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: i32,
    #[serde(default)]
    data: Option<T>,
    #[serde(default)]
    ticket: Option<AuthTicket>,
    #[serde(default)]
    error: Option<UpstreamError>,
}

#[derive(Debug, Deserialize)]
struct UpstreamError {
    #[serde(default)]
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SessionData {
    user: UserProfile,
    auth_ticket: AuthTicket,
}

enum LoginData {
    Session(SessionData),
    Redirect { region: String },
}
