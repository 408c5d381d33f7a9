// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Persistence layer.
//!
//! Two seams, each an injected capability:
//! - [`SessionStore`]: the single-slot ticket + profile record
//! - [`HealthStore`]: append/query access to normalized glucose records

pub mod file;
pub mod firestore;
pub mod memory;

pub use file::FileSessionStore;
pub use firestore::FirestoreDb;
pub use memory::MemoryStore;

use crate::error::SyncError;
use crate::models::{GlucoseRecord, StoredSession};
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    pub const GLUCOSE_RECORDS: &str = "glucose_records";
}

/// Durable storage for the current session.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load the stored session, if any.
    async fn load(&self) -> Result<Option<StoredSession>, SyncError>;

    /// Overwrite the stored session (last writer wins).
    async fn save(&self, session: &StoredSession) -> Result<(), SyncError>;

    /// Forget the stored session.
    async fn clear(&self) -> Result<(), SyncError>;
}

/// Platform-owned store of health records.
#[async_trait]
pub trait HealthStore: Send + Sync {
    /// Whether a record with this dedup key was already stored.
    async fn contains(&self, key: &str) -> Result<bool, SyncError>;

    /// Insert one record under its dedup key.
    async fn insert(&self, key: &str, record: &GlucoseRecord) -> Result<(), SyncError>;
}
