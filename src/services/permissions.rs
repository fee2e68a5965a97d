// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin permission resolution.
//!
//! Resolution never fails from the caller's point of view: if the grant
//! store cannot be read, or no identity is available, the answer degrades to
//! least privilege (super-admins keep everything, everyone else gets
//! nothing) and a warning is logged.

use crate::db::GrantStore;
use crate::error::AppError;
use crate::models::{AdminIdentity, Permission};
use std::collections::BTreeSet;

/// Permissions held by one identity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PermissionSet {
    /// Every permission, including names added after the grant rows were written
    All,
    Granted(BTreeSet<Permission>),
    Empty,
}

/// Why a resolution fell back to least privilege.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FallbackReason {
    /// The grant store read failed
    StoreUnavailable(String),
    /// No identity context was available to resolve against
    ContextUnavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionOutcome {
    Resolved,
    Fallback(FallbackReason),
}

/// Result of resolving one identity snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPermissions {
    set: PermissionSet,
    outcome: ResolutionOutcome,
}

impl ResolvedPermissions {
    fn resolved(set: PermissionSet) -> Self {
        Self {
            set,
            outcome: ResolutionOutcome::Resolved,
        }
    }

    /// Least-privilege answer used whenever resolution cannot complete.
    pub fn fallback(is_super_admin: bool, reason: FallbackReason) -> Self {
        Self {
            set: if is_super_admin {
                PermissionSet::All
            } else {
                PermissionSet::Empty
            },
            outcome: ResolutionOutcome::Fallback(reason),
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        match &self.set {
            PermissionSet::All => true,
            PermissionSet::Granted(granted) => granted.contains(&permission),
            PermissionSet::Empty => false,
        }
    }

    /// Check a permission by name. Unknown names are only held by super-admins.
    pub fn has_permission_named(&self, name: &str) -> bool {
        match name.parse::<Permission>() {
            Ok(permission) => self.has_permission(permission),
            Err(_) => self.set == PermissionSet::All,
        }
    }

    /// Held permissions in display order.
    pub fn granted(&self) -> Vec<Permission> {
        Permission::ALL
            .into_iter()
            .filter(|p| self.has_permission(*p))
            .collect()
    }

    pub fn outcome(&self) -> &ResolutionOutcome {
        &self.outcome
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self.outcome, ResolutionOutcome::Fallback(_))
    }
}

/// Resolve the permissions held by `identity`.
///
/// Super-admins never consult the store. Identities without an admin ID hold
/// nothing. Everyone else holds exactly their grant rows.
pub async fn resolve(identity: &AdminIdentity, store: &dyn GrantStore) -> ResolvedPermissions {
    if identity.is_super_admin {
        return ResolvedPermissions::resolved(PermissionSet::All);
    }

    let Some(admin_id) = identity.admin_id.as_deref() else {
        return ResolvedPermissions::resolved(PermissionSet::Empty);
    };

    match store.grants_for_admin(admin_id).await {
        Ok(grants) => {
            let mut granted = BTreeSet::new();
            for grant in grants.into_iter().filter(|g| g.admin_id == admin_id) {
                match grant.permission.parse::<Permission>() {
                    Ok(permission) => {
                        granted.insert(permission);
                    }
                    Err(e) => {
                        tracing::warn!(admin_id, error = %e, "Ignoring unrecognized grant");
                    }
                }
            }

            tracing::debug!(admin_id, count = granted.len(), "Resolved admin permissions");
            ResolvedPermissions::resolved(PermissionSet::Granted(granted))
        }
        Err(e) => {
            tracing::warn!(
                admin_id,
                error = %e,
                "Permission grant store unavailable, falling back to least privilege"
            );
            ResolvedPermissions::fallback(false, FallbackReason::StoreUnavailable(e.to_string()))
        }
    }
}

/// Answer for a request that reached permission checks without an identity.
pub fn resolve_without_context() -> ResolvedPermissions {
    tracing::warn!("Permission context unavailable, falling back to least privilege");
    ResolvedPermissions::fallback(false, FallbackReason::ContextUnavailable)
}

/// Per-resource authorization check.
pub fn require_permission(
    permissions: &ResolvedPermissions,
    permission: Permission,
) -> Result<(), AppError> {
    if permissions.has_permission(permission) {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("missing permission {permission}")))
    }
}

/// Grant administration is reserved for super-admins.
pub fn require_super_admin(identity: &AdminIdentity) -> Result<(), AppError> {
    if identity.is_super_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("super-admin required".to_string()))
    }
}

/// Resolution progress for one identity snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResolutionState {
    Unresolved,
    Resolving,
    Resolved(ResolvedPermissions),
    Fallback(ResolvedPermissions),
}

/// Tracks resolution of a single identity snapshot.
///
/// This is the library entry point for a caller that holds one session and
/// needs to answer checks while resolution is pending. The HTTP server
/// resolves per request through [`PermissionCache`] instead.
///
/// [`PermissionCache`]: crate::services::PermissionCache
///
/// `Resolved` and `Fallback` are terminal for the snapshot; calling
/// [`PermissionResolver::resolve`] again restarts from `Resolving`. If the
/// resolve future is dropped mid-flight the state stays `Resolving` and
/// checks keep answering with least privilege.
#[derive(Debug, Clone)]
pub struct PermissionResolver {
    identity: AdminIdentity,
    state: ResolutionState,
}

impl PermissionResolver {
    pub fn new(identity: AdminIdentity) -> Self {
        Self {
            identity,
            state: ResolutionState::Unresolved,
        }
    }

    pub fn state(&self) -> &ResolutionState {
        &self.state
    }

    pub async fn resolve(&mut self, store: &dyn GrantStore) -> &ResolutionState {
        self.state = ResolutionState::Resolving;
        let permissions = resolve(&self.identity, store).await;
        self.state = if permissions.is_fallback() {
            ResolutionState::Fallback(permissions)
        } else {
            ResolutionState::Resolved(permissions)
        };
        &self.state
    }

    /// Last resolved answer; while pending only super-admins pass.
    pub fn has_permission(&self, permission: Permission) -> bool {
        match &self.state {
            ResolutionState::Resolved(p) | ResolutionState::Fallback(p) => {
                p.has_permission(permission)
            }
            ResolutionState::Unresolved | ResolutionState::Resolving => {
                self.identity.is_super_admin
            }
        }
    }
}
