// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process store used for offline mode and tests.

use crate::db::{HealthStore, SessionStore};
use crate::error::SyncError;
use crate::models::{GlucoseRecord, StoredSession};
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Session slot plus an ordered list of inserted records.
#[derive(Default)]
pub struct MemoryStore {
    session: Mutex<Option<StoredSession>>,
    records: Mutex<Vec<(String, GlucoseRecord)>>,
    /// When set, every insert fails as if write permission was revoked.
    reject_inserts: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a session already stored.
    pub fn with_session(session: StoredSession) -> Self {
        let store = Self::default();
        *store.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session);
        store
    }

    /// Make subsequent inserts fail (or succeed again).
    pub fn set_reject_inserts(&self, reject: bool) {
        self.reject_inserts.store(reject, Ordering::SeqCst);
    }

    /// Snapshot of inserted records, oldest first.
    pub fn records(&self) -> Vec<GlucoseRecord> {
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .map(|(_, r)| r.clone())
            .collect()
    }

    /// Current session without going through the trait.
    pub fn session(&self) -> Option<StoredSession> {
        self.session.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load(&self) -> Result<Option<StoredSession>, SyncError> {
        Ok(self.session())
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SyncError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = Some(session.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        *self.session.lock().unwrap_or_else(|e| e.into_inner()) = None;
        Ok(())
    }
}

#[async_trait]
impl HealthStore for MemoryStore {
    async fn contains(&self, key: &str) -> Result<bool, SyncError> {
        Ok(self
            .records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|(k, _)| k == key))
    }

    async fn insert(&self, key: &str, record: &GlucoseRecord) -> Result<(), SyncError> {
        if self.reject_inserts.load(Ordering::SeqCst) {
            return Err(SyncError::Store(
                "write permission for blood glucose revoked".to_string(),
            ));
        }
        self.records
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((key.to_string(), record.clone()));
        Ok(())
    }
}
