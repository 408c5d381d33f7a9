// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Task handler routes for the external scheduler.
//!
//! The scheduler owns cadence and retry policy: 200 means the cycle
//! succeeded, anything else means it failed and may be retried.

use crate::services::{RelayOutcome, SyncReport, WriteOutcome};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Serialize;
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Task handler routes (called by the scheduler).
pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/tasks/sync", post(sync))
}

/// Cycle outcome returned to the scheduler.
#[derive(Debug, Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(feature = "binding-generation", ts(export))]
pub struct SyncResponse {
    /// "success" or "failed"
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub write: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub relay: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub retryable: bool,
}

impl From<SyncReport> for SyncResponse {
    fn from(report: SyncReport) -> Self {
        let write = match report.write {
            WriteOutcome::Inserted => "inserted",
            WriteOutcome::Duplicate => "duplicate",
        };
        let relay = match report.relay {
            RelayOutcome::Relayed => "relayed",
            RelayOutcome::Skipped => "skipped",
            RelayOutcome::Failed(_) => "failed",
        };

        Self {
            status: "success".to_string(),
            record_time: Some(format_utc_rfc3339(report.record_time)),
            write: Some(write.to_string()),
            relay: Some(relay.to_string()),
            error: None,
            retryable: false,
        }
    }
}

/// Run one sync cycle.
async fn sync(State(state): State<Arc<AppState>>) -> (StatusCode, Json<SyncResponse>) {
    match state.orchestrator.run_sync_cycle().await {
        Ok(report) => (StatusCode::OK, Json(report.into())),
        Err(e) => {
            // Details are already logged by the orchestrator.
            let body = SyncResponse {
                status: "failed".to_string(),
                record_time: None,
                write: None,
                relay: None,
                error: Some(e.kind().to_string()),
                retryable: e.is_retryable(),
            };
            let status = if e.is_retryable() {
                StatusCode::SERVICE_UNAVAILABLE
            } else {
                StatusCode::INTERNAL_SERVER_ERROR
            };
            (status, Json(body))
        }
    }
}
