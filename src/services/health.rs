// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Health store writer.
//!
//! Inserts a normalized record unless one with the same dedup key
//! (instant + provenance) is already stored.

use crate::db::HealthStore;
use crate::error::SyncError;
use crate::models::GlucoseRecord;
use std::sync::Arc;

/// What happened to a record handed to the writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Inserted,
    /// Same reading was stored by an earlier cycle.
    Duplicate,
}

/// Writes glucose records into the health store.
#[derive(Clone)]
pub struct HealthWriter {
    store: Arc<dyn HealthStore>,
}

impl HealthWriter {
    pub fn new(store: Arc<dyn HealthStore>) -> Self {
        Self { store }
    }

    /// Insert a record, reporting duplicates instead of writing them twice.
    pub async fn insert(&self, record: &GlucoseRecord) -> Result<WriteOutcome, SyncError> {
        let key = record.dedup_key();

        if self.store.contains(&key).await? {
            tracing::debug!(key = %key, "Glucose record already stored (idempotent skip)");
            return Ok(WriteOutcome::Duplicate);
        }

        self.store.insert(&key, record).await?;
        tracing::info!(
            key = %key,
            mg_per_dl = record.level.value,
            "Glucose record inserted"
        );
        Ok(WriteOutcome::Inserted)
    }
}
