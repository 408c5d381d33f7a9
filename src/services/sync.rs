// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sync orchestrator.
//!
//! One cycle:
//! 1. Load the stored session; log in first if there is none or it expired
//! 2. Fetch connections (one re-login on 401, never more)
//! 3. Store the rotated ticket
//! 4. Map the primary connection's latest measurement
//! 5. Write to the health store and relay to the companion, concurrently
//!
//! The relay never fails a cycle; the health write does.

use crate::config::Credentials;
use crate::db::SessionStore;
use crate::error::SyncError;
use crate::models::{StoredSession, UserProfile};
use crate::services::companion::{CompanionRelay, RelayOutcome};
use crate::services::health::{HealthWriter, WriteOutcome};
use crate::services::librelinkup::{ConnectionsOutcome, LinkUpClient};
use crate::services::record::to_record;
use chrono::{DateTime, Utc};
use secrecy::ExposeSecret;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of a successful cycle.
#[derive(Debug, Clone)]
pub struct SyncReport {
    /// Version of the session after the cycle
    pub session_version: u64,
    /// Whether the cycle had to log in again
    pub relogged_in: bool,
    pub record_time: DateTime<Utc>,
    pub mg_per_dl: f64,
    pub write: WriteOutcome,
    pub relay: RelayOutcome,
}

/// Composes the LibreLinkUp client, mapper, writer and relay.
pub struct SyncOrchestrator {
    client: LinkUpClient,
    sessions: Arc<dyn SessionStore>,
    writer: HealthWriter,
    relay: CompanionRelay,
    credentials: Option<Credentials>,
    data_origin: String,
    /// Serializes cycles so overlapping triggers cannot double-write.
    cycle_lock: Mutex<()>,
}

impl SyncOrchestrator {
    pub fn new(
        client: LinkUpClient,
        sessions: Arc<dyn SessionStore>,
        writer: HealthWriter,
        relay: CompanionRelay,
        credentials: Option<Credentials>,
        data_origin: impl Into<String>,
    ) -> Self {
        Self {
            client,
            sessions,
            writer,
            relay,
            credentials,
            data_origin: data_origin.into(),
            cycle_lock: Mutex::new(()),
        }
    }

    // ─── Session Management ──────────────────────────────────────────────────

    /// User-initiated login.
    ///
    /// On success the new session replaces the stored one. On failure the
    /// stored session is left untouched, so a still-valid ticket survives a
    /// transient outage.
    pub async fn login(&self, email: &str, password: &str) -> Result<StoredSession, SyncError> {
        let previous = self.sessions.load().await.ok().flatten();
        let session = self
            .login_with(email, password, previous.map(|s| s.version))
            .await?;
        self.sessions.save(&session).await?;

        tracing::info!(
            version = session.version,
            name = %session.profile.display_name(),
            "Logged in to LibreLinkUp"
        );
        Ok(session)
    }

    /// Forget the stored session.
    pub async fn logout(&self) -> Result<(), SyncError> {
        self.sessions.clear().await?;
        tracing::info!("Session cleared");
        Ok(())
    }

    /// Profile of the logged-in account, if any.
    pub async fn profile(&self) -> Result<Option<UserProfile>, SyncError> {
        Ok(self.sessions.load().await?.map(|s| s.profile))
    }

    async fn login_with(
        &self,
        email: &str,
        password: &str,
        previous_version: Option<u64>,
    ) -> Result<StoredSession, SyncError> {
        let outcome = self.client.login(email, password).await?;

        Ok(StoredSession {
            version: previous_version.unwrap_or(0) + 1,
            ticket: outcome.ticket,
            profile: outcome.profile,
            api_base_url: outcome.api_base_url,
        })
    }

    /// Background re-login with configured credentials.
    async fn relogin(&self, previous_version: Option<u64>) -> Result<StoredSession, SyncError> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            SyncError::Authorization("No valid ticket and no credentials configured".to_string())
        })?;

        tracing::info!("Logging in again with configured credentials");
        let session = self
            .login_with(
                &credentials.email,
                credentials.password.expose_secret(),
                previous_version,
            )
            .await?;

        self.persist(&session).await;
        Ok(session)
    }

    /// Save the session; a failed save only costs a re-login later.
    async fn persist(&self, session: &StoredSession) {
        if let Err(e) = self.sessions.save(session).await {
            tracing::warn!(
                error = %e,
                version = session.version,
                "Failed to persist session, continuing with in-memory ticket"
            );
        }
    }

    // ─── Sync Cycle ──────────────────────────────────────────────────────────

    /// Run one sync cycle to completion.
    ///
    /// Concurrent calls are queued, not interleaved.
    pub async fn run_sync_cycle(&self) -> Result<SyncReport, SyncError> {
        let _guard = self.cycle_lock.lock().await;
        tracing::info!("Sync cycle started");

        let result = self.cycle().await;
        match &result {
            Ok(report) => tracing::info!(
                version = report.session_version,
                relogged_in = report.relogged_in,
                record_time = %report.record_time,
                mg_per_dl = report.mg_per_dl,
                write = ?report.write,
                relay = ?report.relay,
                "Sync cycle done"
            ),
            Err(e) => tracing::error!(
                kind = e.kind(),
                retryable = e.is_retryable(),
                error = %e,
                "Sync cycle failed"
            ),
        }
        result
    }

    async fn cycle(&self) -> Result<SyncReport, SyncError> {
        let mut relogged_in = false;

        let mut session = match self.sessions.load().await? {
            Some(s) if !s.ticket.is_expired(Utc::now()) => s,
            stored => {
                tracing::info!(
                    has_session = stored.is_some(),
                    "No usable ticket, logging in before fetch"
                );
                relogged_in = true;
                self.relogin(stored.map(|s| s.version)).await?
            }
        };

        let fetched = loop {
            match self.fetch_connections(&session).await {
                Ok(fetched) => break fetched,
                Err(SyncError::Authorization(reason)) if !relogged_in => {
                    tracing::warn!(reason = %reason, "Ticket rejected, logging in again");
                    relogged_in = true;
                    session = self.relogin(Some(session.version)).await?;
                }
                Err(e) => return Err(e),
            }
        };

        // The service may rotate the ticket on every call; keep the latest.
        if let Some(ticket) = fetched.ticket {
            session = session.with_ticket(ticket);
            self.persist(&session).await;
            tracing::debug!(version = session.version, "Stored renewed ticket");
        }

        let measurement = fetched
            .connections
            .into_iter()
            .next()
            .and_then(|c| c.glucose_measurement)
            .ok_or(SyncError::NoMeasurement)?;

        let record = to_record(&measurement, &self.data_origin)?;

        let (write, relay) = tokio::join!(
            self.writer.insert(&record),
            self.relay.relay(&measurement)
        );

        Ok(SyncReport {
            session_version: session.version,
            relogged_in,
            record_time: record.time,
            mg_per_dl: record.level.value,
            write: write?,
            relay,
        })
    }

    async fn fetch_connections(
        &self,
        session: &StoredSession,
    ) -> Result<ConnectionsOutcome, SyncError> {
        self.client
            .at(&session.api_base_url)
            .connections(&session.ticket, &session.profile)
            .await
    }
}
