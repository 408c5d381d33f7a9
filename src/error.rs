// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application error types with consistent API responses.
//!
//! Two layers:
//! - [`SyncError`]: typed failures of the sync pipeline (clients, mapper, store, relay)
//! - [`AppError`]: HTTP-facing errors for the route handlers

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

/// Failure of one step of the sync pipeline.
///
/// Every client-facing component returns one of these instead of panicking;
/// the orchestrator decides between re-login and abort.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SyncError {
    /// Email/password rejected. Terminal until new credentials are supplied.
    #[error("Credentials rejected (status {status}): {message}")]
    Credential { status: i32, message: String },

    /// Ticket missing, expired or rejected by the remote service.
    #[error("Unauthorized: {0}")]
    Authorization(String),

    /// Network failure, timeout, rate limit or upstream 5xx.
    #[error("Transport error: {0}")]
    Transport(String),

    /// Response body did not have the expected shape.
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Measurement timestamp did not match `M/d/y h:m:s a`.
    #[error("Unparseable timestamp {timestamp:?}: {reason}")]
    Parse { timestamp: String, reason: String },

    /// Measurement reported in a unit the health store cannot take as-is.
    #[error("Unsupported glucose unit code {0}")]
    UnsupportedUnit(i32),

    /// No connection or no measurement to synchronize.
    #[error("No glucose measurement available")]
    NoMeasurement,

    /// Health or session store rejected the operation.
    #[error("Store error: {0}")]
    Store(String),

    /// Companion push failed or timed out.
    #[error("Companion relay error: {0}")]
    Relay(String),
}

impl SyncError {
    /// Whether the external scheduler has a reason to retry the whole cycle.
    pub fn is_retryable(&self) -> bool {
        matches!(self, SyncError::Transport(_))
    }

    /// Short machine-readable kind for logs and task responses.
    pub fn kind(&self) -> &'static str {
        match self {
            SyncError::Credential { .. } => "credential_error",
            SyncError::Authorization(_) => "authorization_error",
            SyncError::Transport(_) => "transport_error",
            SyncError::MalformedResponse(_) => "malformed_response",
            SyncError::Parse { .. } => "parse_error",
            SyncError::UnsupportedUnit(_) => "unsupported_unit",
            SyncError::NoMeasurement => "no_measurement",
            SyncError::Store(_) => "store_error",
            SyncError::Relay(_) => "relay_error",
        }
    }
}

/// Application error type that converts to HTTP responses.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Login failed. Check your username and password.")]
    LoginFailed,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("LibreLinkUp error: {0}")]
    Upstream(String),

    #[error("Store error: {0}")]
    Store(String),
}

impl From<SyncError> for AppError {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::Credential { .. } | SyncError::Authorization(_) => AppError::LoginFailed,
            SyncError::Store(msg) => AppError::Store(msg),
            other => AppError::Upstream(other.to_string()),
        }
    }
}

/// JSON error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error, details) = match &self {
            AppError::LoginFailed => (
                StatusCode::UNAUTHORIZED,
                "login_failed",
                Some(self.to_string()),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", Some(msg.clone())),
            AppError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "bad_request", Some(msg.clone()))
            }
            AppError::Upstream(msg) => {
                (StatusCode::BAD_GATEWAY, "upstream_error", Some(msg.clone()))
            }
            AppError::Store(msg) => {
                tracing::error!(error = %msg, "Store error");
                (StatusCode::INTERNAL_SERVER_ERROR, "store_error", None)
            }
        };

        let body = ErrorResponse {
            error: error.to_string(),
            details,
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias for handlers
pub type Result<T> = std::result::Result<T, AppError>;
