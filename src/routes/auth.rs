// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! LibreLinkUp login routes (user-initiated).

use axum::{
    extract::{Json, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

use crate::error::{AppError, Result};
use crate::models::UserProfile;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/status", get(status))
        .route("/auth/logout", post(logout))
}

/// Login form.
#[derive(Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 254))]
    pub email: String,
    #[validate(length(min = 1, max = 1024))]
    pub password: String,
}

/// Logged-in account, as shown to the user.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct AccountResponse {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    /// e.g. "Logged in as Jane Doe"
    pub status: String,
}

impl From<UserProfile> for AccountResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            status: format!("Logged in as {}", profile.display_name()),
            email: profile.email,
            first_name: profile.first_name,
            last_name: profile.last_name,
        }
    }
}

/// Log in and store the new ticket.
async fn login(
    State(state): State<Arc<AppState>>,
    Json(form): Json<LoginRequest>,
) -> Result<Json<AccountResponse>> {
    form.validate()
        .map_err(|_| AppError::BadRequest("Email and password are required".to_string()))?;

    let session = match state
        .orchestrator
        .login(form.email.trim(), &form.password)
        .await
    {
        Ok(s) => s,
        Err(e) => {
            tracing::warn!(kind = e.kind(), error = %e, "Login failed");
            // Details stay in the log; the user only sees the fixed message.
            return Err(AppError::LoginFailed);
        }
    };

    if state.config.sync_on_login {
        let state = state.clone();
        tokio::spawn(async move {
            // Outcome is logged by the orchestrator.
            let _ = state.orchestrator.run_sync_cycle().await;
        });
    }

    Ok(Json(session.profile.into()))
}

/// Who is logged in.
async fn status(State(state): State<Arc<AppState>>) -> Result<Json<AccountResponse>> {
    let profile = state
        .orchestrator
        .profile()
        .await?
        .ok_or_else(|| AppError::NotFound("Not logged in".to_string()))?;

    Ok(Json(profile.into()))
}

/// Forget the stored ticket.
async fn logout(State(state): State<Arc<AppState>>) -> Result<StatusCode> {
    state.orchestrator.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
