// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - business logic layer.

pub mod permission_cache;
pub mod permissions;
pub mod progress;

pub use permission_cache::PermissionCache;
pub use permissions::{
    require_permission, require_super_admin, resolve, resolve_without_context, FallbackReason,
    PermissionResolver, PermissionSet, ResolutionOutcome, ResolutionState, ResolvedPermissions,
};
pub use progress::{
    classify_day, classify_day_in, compute_stats, compute_stats_from_records, month_calendar,
};
