//! Database layer (Firestore).

pub mod firestore;

pub use firestore::FirestoreDb;

use crate::error::AppError;
use crate::models::PermissionGrant;
use async_trait::async_trait;

/// Collection names as constants.
pub mod collections {
    /// Workout completions (keyed by completion id)
    pub const WORKOUT_COMPLETIONS: &str = "workout_completions";
    /// Admin permission grants (keyed by `{admin_id}_{permission}`)
    pub const ADMIN_PERMISSIONS: &str = "admin_permissions";
}

/// Read side of the permission-grant relation.
#[async_trait]
pub trait GrantStore: Send + Sync {
    /// All grant rows for one admin.
    async fn grants_for_admin(&self, admin_id: &str) -> Result<Vec<PermissionGrant>, AppError>;
}
