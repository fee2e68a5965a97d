// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Physio-Tracker: workout progress and admin permissions
//!
//! This crate provides the backend API for logging workout completions,
//! computing streak and attendance statistics, and resolving what each
//! administrator is allowed to manage.

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod time_utils;

use config::Config;
use db::FirestoreDb;
use services::PermissionCache;

/// Shared application state.
pub struct AppState {
    pub config: Config,
    pub db: FirestoreDb,
    pub permissions: PermissionCache,
}
