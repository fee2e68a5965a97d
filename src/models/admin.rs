//! Admin identity and permission grant models.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named capabilities that can be granted to a plain admin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ManageWorkouts,
    ManageExercises,
    ManageCategories,
    ManageProducts,
    ManageUsers,
    ManageAppointments,
    ManagePayments,
    ReviewGymPhotos,
}

impl Permission {
    /// Every permission, in display order.
    pub const ALL: [Permission; 8] = [
        Permission::ManageWorkouts,
        Permission::ManageExercises,
        Permission::ManageCategories,
        Permission::ManageProducts,
        Permission::ManageUsers,
        Permission::ManageAppointments,
        Permission::ManagePayments,
        Permission::ReviewGymPhotos,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Permission::ManageWorkouts => "manage_workouts",
            Permission::ManageExercises => "manage_exercises",
            Permission::ManageCategories => "manage_categories",
            Permission::ManageProducts => "manage_products",
            Permission::ManageUsers => "manage_users",
            Permission::ManageAppointments => "manage_appointments",
            Permission::ManagePayments => "manage_payments",
            Permission::ReviewGymPhotos => "review_gym_photos",
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown permission: {0}")]
pub struct UnknownPermission(pub String);

impl FromStr for Permission {
    type Err = UnknownPermission;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Permission::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| UnknownPermission(s.to_string()))
    }
}

/// Administrative role derived from identity flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AdminRole {
    None,
    Admin,
    SuperAdmin,
}

/// Identity of the current session as supplied by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminIdentity {
    /// Session owner
    pub user_id: String,
    /// Admin record ID, if this user is an admin
    pub admin_id: Option<String>,
    pub is_admin: bool,
    pub is_super_admin: bool,
}

impl AdminIdentity {
    /// A regular (non-admin) user.
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin_id: None,
            is_admin: false,
            is_super_admin: false,
        }
    }

    /// A plain admin whose capabilities come from grants.
    pub fn admin(user_id: impl Into<String>, admin_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin_id: Some(admin_id.into()),
            is_admin: true,
            is_super_admin: false,
        }
    }

    pub fn super_admin(user_id: impl Into<String>, admin_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            admin_id: Some(admin_id.into()),
            is_admin: true,
            is_super_admin: true,
        }
    }

    pub fn role(&self) -> AdminRole {
        if self.is_super_admin {
            AdminRole::SuperAdmin
        } else if self.is_admin {
            AdminRole::Admin
        } else {
            AdminRole::None
        }
    }
}

/// One capability granted to one admin.
///
/// Stored at: `admin_permissions/{admin_id}_{permission}`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermissionGrant {
    pub admin_id: String,
    /// Permission name; rows may predate the current enumeration
    pub permission: String,
    /// Who created the grant (super-admin user ID)
    #[serde(default)]
    pub granted_by: Option<String>,
    /// When the grant was created (ISO 8601)
    #[serde(default)]
    pub granted_at: Option<String>,
}

impl PermissionGrant {
    /// Document ID for this grant.
    pub fn document_id(admin_id: &str, permission: Permission) -> String {
        format!("{}_{}", urlencoding::encode(admin_id), permission)
    }
}
