// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore-backed health store.
//!
//! Records live in `glucose_records`, keyed by their dedup key so the same
//! reading never produces two documents.

use crate::db::{collections, HealthStore};
use crate::error::SyncError;
use crate::models::GlucoseRecord;
use async_trait::async_trait;

/// Firestore database client.
#[derive(Clone)]
pub struct FirestoreDb {
    client: Option<firestore::FirestoreDb>,
}

impl FirestoreDb {
    /// Create a new Firestore client.
    ///
    /// For local development with emulator, set FIRESTORE_EMULATOR_HOST.
    pub async fn new(project_id: &str) -> Result<Self, SyncError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| SyncError::Store(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, SyncError> {
        tracing::info!("Using unauthenticated connection for Firestore Emulator");

        let token_source = gcloud_sdk::ExternalJwtFunctionSource::new(|| async {
            Ok(gcloud_sdk::Token {
                token_type: "Bearer".to_string(),
                token: gcloud_sdk::SecretValue::new(
                    "eyJhbGciOiJub25lIn0.eyJ1aWQiOiJ0ZXN0In0."
                        .to_string()
                        .into(),
                ),
                expiry: chrono::Utc::now() + chrono::Duration::hours(1),
            })
        });

        let options = firestore::FirestoreDbOptions::new(project_id.to_string());

        let client = firestore::FirestoreDb::with_options_token_source(
            options,
            gcloud_sdk::GCP_DEFAULT_SCOPES.clone(),
            gcloud_sdk::TokenSourceType::ExternalSource(Box::new(token_source)),
        )
        .await
        .map_err(|e| SyncError::Store(format!("Failed to connect to Firestore Emulator: {}", e)))?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create an offline client for testing.
    ///
    /// All operations return a store error.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, SyncError> {
        self.client
            .as_ref()
            .ok_or_else(|| SyncError::Store("Database not connected (offline mode)".to_string()))
    }

    /// Get a stored record by dedup key.
    pub async fn get_record(&self, key: &str) -> Result<Option<GlucoseRecord>, SyncError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::GLUCOSE_RECORDS)
            .obj()
            .one(key)
            .await
            .map_err(|e| SyncError::Store(e.to_string()))
    }

    /// Delete a stored record (test cleanup).
    pub async fn delete_record(&self, key: &str) -> Result<(), SyncError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::GLUCOSE_RECORDS)
            .document_id(key)
            .execute()
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl HealthStore for FirestoreDb {
    async fn contains(&self, key: &str) -> Result<bool, SyncError> {
        Ok(self.get_record(key).await?.is_some())
    }

    async fn insert(&self, key: &str, record: &GlucoseRecord) -> Result<(), SyncError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::GLUCOSE_RECORDS)
            .document_id(key)
            .object(record)
            .execute()
            .await
            .map_err(|e| SyncError::Store(e.to_string()))?;
        Ok(())
    }
}
