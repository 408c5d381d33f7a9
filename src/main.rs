// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Glucose-Bridge API Server
//!
//! Pulls the latest glucose reading from LibreLinkUp whenever the
//! scheduler calls `/tasks/sync`, and stores it as a health record.

use glucose_bridge::{
    config::{Config, HealthStoreBackend},
    db::{FileSessionStore, FirestoreDb, HealthStore, MemoryStore},
    services::{
        CompanionChannel, CompanionRelay, HealthWriter, HttpCompanionChannel, LinkUpClient,
        SyncOrchestrator,
    },
    AppState,
};
use anyhow::Context;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured JSON logging
    init_logging()?;

    // Load configuration from environment
    let config = Config::from_env().context("Failed to load configuration")?;
    tracing::info!(port = config.port, "Starting Glucose-Bridge API");

    let client = LinkUpClient::new(&config.api_url)?
        .with_regional_template(config.regional_url_template.clone());
    tracing::info!(api_url = %config.api_url, "LibreLinkUp client initialized");

    let sessions = Arc::new(FileSessionStore::new(config.session_file.clone()));
    tracing::info!(path = %config.session_file.display(), "Session store initialized");

    let health_store: Arc<dyn HealthStore> = match config.health_store {
        HealthStoreBackend::Firestore => {
            let db = FirestoreDb::new(&config.gcp_project_id)
                .await
                .context("Failed to connect to Firestore")?;
            tracing::info!(project = %config.gcp_project_id, "Firestore health store initialized");
            Arc::new(db)
        }
        HealthStoreBackend::Memory => {
            tracing::warn!("Using in-memory health store; records are lost on restart");
            Arc::new(MemoryStore::new())
        }
    };

    let relay = match &config.companion_url {
        Some(url) => {
            let timeout = Duration::from_secs(config.companion_timeout_secs);
            tracing::info!(url = %url, "Companion relay enabled");
            let channel: Arc<dyn CompanionChannel> =
                Arc::new(HttpCompanionChannel::new(url.clone(), timeout)?);
            CompanionRelay::new(Some(channel), timeout)
        }
        None => {
            tracing::info!("No companion configured; relay disabled");
            CompanionRelay::disabled()
        }
    };

    if config.credentials.is_none() {
        tracing::info!("No LibreLinkUp credentials configured; expired tickets need a manual login");
    }

    let orchestrator = SyncOrchestrator::new(
        client,
        sessions,
        HealthWriter::new(health_store),
        relay,
        config.credentials.clone(),
        config.data_origin.clone(),
    );

    // Build shared state
    let state = Arc::new(AppState {
        config: config.clone(),
        orchestrator,
    });

    // Build router
    let app = glucose_bridge::routes::create_router(state);

    // Start server
    let addr = format!("0.0.0.0:{}", config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!(address = %addr, "Server listening");

    axum::serve(listener, app).await?;
    Ok(())
}

/// Initialize structured JSON logging.
fn init_logging() -> anyhow::Result<()> {
    let format = tracing_subscriber::fmt::layer()
        .json()
        .with_target(false)
        .with_current_span(true)
        .flatten_event(true);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("glucose_bridge=debug".parse()?)
                .add_directive("info".parse()?),
        )
        .with(format)
        .init();
    Ok(())
}
