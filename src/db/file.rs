// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JSON-file session store that survives restarts.

use crate::db::SessionStore;
use crate::error::SyncError;
use crate::models::StoredSession;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::PathBuf;

/// Stores the session as a single JSON document on local disk.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<StoredSession>, SyncError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SyncError::Store(format!(
                    "Failed to read {}: {}",
                    self.path.display(),
                    e
                )))
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(session) => Ok(Some(session)),
            Err(e) => {
                // A corrupt file is treated like no session; the next login rewrites it.
                tracing::warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Ignoring unreadable session file"
                );
                Ok(None)
            }
        }
    }

    async fn save(&self, session: &StoredSession) -> Result<(), SyncError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| SyncError::Store(format!("Failed to create {}: {}", parent.display(), e)))?;
        }

        let json = serde_json::to_vec_pretty(session)
            .map_err(|e| SyncError::Store(format!("Failed to encode session: {}", e)))?;

        // Write-then-rename so a crash never leaves a half-written file.
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, &json)
            .await
            .map_err(|e| SyncError::Store(format!("Failed to write {}: {}", tmp.display(), e)))?;
        tokio::fs::rename(&tmp, &self.path)
            .await
            .map_err(|e| SyncError::Store(format!("Failed to replace {}: {}", self.path.display(), e)))?;

        tracing::debug!(version = session.version, "Session saved");
        Ok(())
    }

    async fn clear(&self) -> Result<(), SyncError> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SyncError::Store(format!(
                "Failed to remove {}: {}",
                self.path.display(),
                e
            ))),
        }
    }
}
