// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-session cache of resolved permission sets.

use crate::db::GrantStore;
use crate::models::AdminIdentity;
use crate::services::permissions::{resolve, ResolvedPermissions};
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identity fields a cached answer depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
struct IdentitySnapshot {
    admin_id: Option<String>,
    is_admin: bool,
    is_super_admin: bool,
}

impl From<&AdminIdentity> for IdentitySnapshot {
    fn from(identity: &AdminIdentity) -> Self {
        Self {
            admin_id: identity.admin_id.clone(),
            is_admin: identity.is_admin,
            is_super_admin: identity.is_super_admin,
        }
    }
}

#[derive(Clone)]
struct CachedPermissions {
    snapshot: IdentitySnapshot,
    permissions: ResolvedPermissions,
    resolved_at: DateTime<Utc>,
}

/// Resolved permissions keyed by session user ID.
///
/// Entries are reused until the identity snapshot changes or the TTL
/// expires. Fallback answers are never stored, so the next request retries
/// the grant store. Expired entries are swept whenever a new answer is
/// stored.
///
/// Every invalidation bumps a single epoch: a resolution that started before
/// the bump still answers its own caller but is not written back.
pub struct PermissionCache {
    entries: DashMap<String, CachedPermissions>,
    epoch: AtomicU64,
    ttl: Duration,
}

impl PermissionCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            epoch: AtomicU64::new(0),
            ttl,
        }
    }

    fn lookup(&self, identity: &AdminIdentity, now: DateTime<Utc>) -> Option<ResolvedPermissions> {
        let cached = self.entries.get(&identity.user_id)?;
        let fresh = now < cached.resolved_at + self.ttl;
        (fresh && cached.snapshot == IdentitySnapshot::from(identity))
            .then(|| cached.permissions.clone())
    }

    fn sweep_expired(&self, now: DateTime<Utc>) {
        let ttl = self.ttl;
        self.entries.retain(|_, cached| now < cached.resolved_at + ttl);
    }

    /// Resolve `identity`, reusing a cached answer when still valid.
    pub async fn resolve(
        &self,
        identity: &AdminIdentity,
        store: &dyn GrantStore,
    ) -> ResolvedPermissions {
        let now = Utc::now();
        if let Some(hit) = self.lookup(identity, now) {
            return hit;
        }

        let epoch = self.epoch.load(Ordering::SeqCst);
        let permissions = resolve(identity, store).await;

        if permissions.is_fallback() {
            return permissions;
        }

        if self.epoch.load(Ordering::SeqCst) != epoch {
            tracing::debug!(
                user_id = %identity.user_id,
                "Discarding permission resolution started before invalidation"
            );
            return permissions;
        }

        self.sweep_expired(now);
        self.entries.insert(
            identity.user_id.clone(),
            CachedPermissions {
                snapshot: IdentitySnapshot::from(identity),
                permissions: permissions.clone(),
                resolved_at: now,
            },
        );
        permissions
    }

    /// Forget a session's permissions (logout, role change).
    pub fn invalidate(&self, user_id: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries.remove(user_id);
        tracing::debug!(user_id, "Invalidated cached permissions");
    }

    /// Forget every session resolved for `admin_id` (grant changes).
    pub fn invalidate_admin(&self, admin_id: &str) {
        self.epoch.fetch_add(1, Ordering::SeqCst);
        self.entries
            .retain(|_, cached| cached.snapshot.admin_id.as_deref() != Some(admin_id));
        tracing::debug!(admin_id, "Invalidated cached permissions for admin");
    }

    /// Currently cached answer for a session, if any.
    pub fn cached(&self, user_id: &str) -> Option<ResolvedPermissions> {
        self.entries.get(user_id).map(|c| c.permissions.clone())
    }
}
