// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Glucose-Bridge: relay LibreLinkUp glucose readings into a health store
//!
//! This crate provides the sync pipeline (LibreLinkUp client, record
//! mapping, health store writer, companion relay) and the small HTTP
//! surface that triggers it.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use services::SyncOrchestrator;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub orchestrator: SyncOrchestrator,
}
