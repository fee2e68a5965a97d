// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Firestore client wrapper with typed operations.
//!
//! Provides high-level operations for:
//! - Workout completions (per-user history)
//! - Admin permission grants (read by the permission resolver, written by
//!   super-admins)

use crate::db::{collections, GrantStore};
use crate::error::AppError;
use crate::models::{CompletionRecord, Permission, PermissionGrant};
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
    pub async fn new(project_id: &str) -> Result<Self, AppError> {
        if std::env::var("FIRESTORE_EMULATOR_HOST").is_ok() {
            return Self::create_emulator_client(project_id).await;
        }

        let client = firestore::FirestoreDb::new(project_id)
            .await
            .map_err(|e| AppError::Database(format!("Failed to connect to Firestore: {}", e)))?;

        tracing::info!(project = project_id, "Connected to Firestore");

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a Firestore client for the emulator with unauthenticated access.
    async fn create_emulator_client(project_id: &str) -> Result<Self, AppError> {
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
        .map_err(|e| {
            AppError::Database(format!("Failed to connect to Firestore Emulator: {}", e))
        })?;

        tracing::info!(
            project = project_id,
            "Connected to Firestore (Emulator/Unauthenticated)"
        );

        Ok(Self {
            client: Some(client),
        })
    }

    /// Create a mock Firestore client for testing (offline mode).
    ///
    /// All database operations will return an error if called.
    pub fn new_mock() -> Self {
        Self { client: None }
    }

    fn get_client(&self) -> Result<&firestore::FirestoreDb, AppError> {
        self.client
            .as_ref()
            .ok_or_else(|| AppError::Database("Database not connected (offline mode)".to_string()))
    }

    // ─── Completion Operations ───────────────────────────────────

    /// Get a completion by ID.
    pub async fn get_completion(
        &self,
        completion_id: &str,
    ) -> Result<Option<CompletionRecord>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .by_id_in(collections::WORKOUT_COMPLETIONS)
            .obj()
            .one(completion_id)
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Get completions for a user, newest first.
    ///
    /// `limit` of `None` returns the full history (needed for streaks).
    pub async fn get_completions_for_user(
        &self,
        user_id: &str,
        limit: Option<u32>,
    ) -> Result<Vec<CompletionRecord>, AppError> {
        let query = self
            .get_client()?
            .fluent()
            .select()
            .from(collections::WORKOUT_COMPLETIONS)
            .filter(|q| q.for_all([q.field("user_id").eq(user_id)]))
            .order_by([(
                "completed_at",
                firestore::FirestoreQueryDirection::Descending,
            )]);

        let query = match limit {
            Some(limit) => query.limit(limit),
            None => query,
        };

        query
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Store a completion.
    pub async fn insert_completion(&self, record: &CompletionRecord) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::WORKOUT_COMPLETIONS)
            .document_id(&record.id)
            .object(record)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;

        tracing::debug!(
            completion_id = %record.id,
            user_id = %record.user_id,
            "Stored workout completion"
        );
        Ok(())
    }

    /// Delete a completion.
    pub async fn delete_completion(&self, completion_id: &str) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::WORKOUT_COMPLETIONS)
            .document_id(completion_id)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    // ─── Permission Grant Operations ─────────────────────────────

    /// Get all grant rows for an admin.
    pub async fn get_grants_for_admin(
        &self,
        admin_id: &str,
    ) -> Result<Vec<PermissionGrant>, AppError> {
        self.get_client()?
            .fluent()
            .select()
            .from(collections::ADMIN_PERMISSIONS)
            .filter(|q| q.for_all([q.field("admin_id").eq(admin_id)]))
            .obj()
            .query()
            .await
            .map_err(|e| AppError::Database(e.to_string()))
    }

    /// Create or replace a grant.
    pub async fn set_grant(
        &self,
        permission: Permission,
        grant: &PermissionGrant,
    ) -> Result<(), AppError> {
        let _: () = self
            .get_client()?
            .fluent()
            .update()
            .in_col(collections::ADMIN_PERMISSIONS)
            .document_id(PermissionGrant::document_id(&grant.admin_id, permission))
            .object(grant)
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }

    /// Remove a grant. Removing a grant that does not exist is not an error.
    pub async fn delete_grant(&self, admin_id: &str, permission: Permission) -> Result<(), AppError> {
        self.get_client()?
            .fluent()
            .delete()
            .from(collections::ADMIN_PERMISSIONS)
            .document_id(PermissionGrant::document_id(admin_id, permission))
            .execute()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl GrantStore for FirestoreDb {
    async fn grants_for_admin(&self, admin_id: &str) -> Result<Vec<PermissionGrant>, AppError> {
        self.get_grants_for_admin(admin_id).await
    }
}
