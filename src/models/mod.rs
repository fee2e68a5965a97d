// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Data models for the application.

pub mod admin;
pub mod completion;
pub mod progress;

pub use admin::{AdminIdentity, AdminRole, Permission, PermissionGrant};
pub use completion::{CompletionRecord, DayBucket, MalformedCompletion, WorkoutCompletion};
pub use progress::{CalendarCell, CalendarMonth, DayClass, DayFlags, ProgressStats};
