// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API routes for authenticated users.

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{
    AdminRole, CalendarCell, CalendarMonth, CompletionRecord, DayClass, ProgressStats,
    WorkoutCompletion,
};
use crate::services::progress::{compute_stats_from_records, month_calendar};
use crate::time_utils::{format_utc_rfc3339, parse_rfc3339_utc};
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;
use validator::Validate;

const DEFAULT_COMPLETIONS_LIMIT: u32 = 50;
const MAX_COMPLETIONS_LIMIT: u32 = 200;

/// API routes (require authentication via JWT).
/// The auth middleware is applied in routes/mod.rs for these routes.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/me", get(get_me))
        .route(
            "/api/completions",
            get(list_completions).post(create_completion),
        )
        .route("/api/completions/{id}", delete(delete_completion))
        .route("/api/progress", get(get_progress))
        .route("/api/progress/calendar", get(get_calendar))
}

/// Resolve the timezone named in a request, or the configured default.
pub(crate) fn request_timezone(name: Option<&str>, default: Tz) -> Result<Tz> {
    match name {
        None => Ok(default),
        Some(raw) => raw
            .parse::<Tz>()
            .map_err(|_| AppError::BadRequest(format!("Unknown timezone: {raw}"))),
    }
}

/// Load a user's full history and aggregate it.
pub(crate) async fn progress_for_user(
    state: &AppState,
    user_id: &str,
    now: DateTime<Utc>,
    tz: Tz,
) -> Result<ProgressStats> {
    let records = state.db.get_completions_for_user(user_id, None).await?;
    let stats = compute_stats_from_records(records, now, tz);

    if stats.skipped_records > 0 {
        tracing::warn!(
            user_id,
            skipped = stats.skipped_records,
            "Progress computed without malformed completion records"
        );
    }

    Ok(stats)
}

// ─── User Profile ────────────────────────────────────────────

/// Current identity and the permissions it resolves to.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MeResponse {
    pub user_id: String,
    pub admin_id: Option<String>,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub role: AdminRole,
    pub permissions: Vec<String>,
    /// "resolved", or "fallback" when grants could not be read
    pub resolution: String,
}

async fn get_me(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Json<MeResponse> {
    let permissions = state.permissions.resolve(&user.identity, &state.db).await;

    Json(MeResponse {
        user_id: user.identity.user_id.clone(),
        admin_id: user.identity.admin_id.clone(),
        role: user.identity.role(),
        permissions: permissions
            .granted()
            .into_iter()
            .map(|p| p.to_string())
            .collect(),
        resolution: if permissions.is_fallback() {
            "fallback".to_string()
        } else {
            "resolved".to_string()
        },
    })
}

// ─── Completions ─────────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionSummary {
    pub id: String,
    pub workout_id: String,
    pub completed_at: String,
}

impl From<&WorkoutCompletion> for CompletionSummary {
    fn from(completion: &WorkoutCompletion) -> Self {
        Self {
            id: completion.id.clone(),
            workout_id: completion.workout_id.clone(),
            completed_at: format_utc_rfc3339(completion.completed_at),
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CompletionsResponse {
    pub completions: Vec<CompletionSummary>,
    pub skipped_records: u32,
}

#[derive(Deserialize)]
struct CompletionsQuery {
    #[serde(default = "default_limit")]
    limit: u32,
}

fn default_limit() -> u32 {
    DEFAULT_COMPLETIONS_LIMIT
}

/// List the caller's completions, newest first.
async fn list_completions(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CompletionsQuery>,
) -> Result<Json<CompletionsResponse>> {
    if params.limit == 0 {
        return Err(AppError::BadRequest(
            "Limit must be greater than 0".to_string(),
        ));
    }
    let limit = params.limit.min(MAX_COMPLETIONS_LIMIT);

    let records = state
        .db
        .get_completions_for_user(user.user_id(), Some(limit))
        .await?;
    let (completions, skipped) = crate::services::progress::partition_records(records);

    Ok(Json(CompletionsResponse {
        completions: completions.iter().map(CompletionSummary::from).collect(),
        skipped_records: skipped,
    }))
}

/// Body for logging a finished workout.
#[derive(Deserialize, Validate)]
pub struct NewCompletion {
    #[validate(length(min = 1, max = 100))]
    pub workout_id: String,
    /// RFC 3339; defaults to now
    pub completed_at: Option<String>,
}

async fn create_completion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<NewCompletion>,
) -> Result<(StatusCode, Json<CompletionSummary>)> {
    body.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let completed_at = match body.completed_at.as_deref() {
        Some(raw) => parse_rfc3339_utc(raw).ok_or_else(|| {
            AppError::BadRequest("Invalid 'completed_at': must be RFC3339 datetime".to_string())
        })?,
        None => Utc::now(),
    };

    let completion = WorkoutCompletion {
        id: uuid::Uuid::new_v4().to_string(),
        user_id: user.user_id().to_string(),
        workout_id: body.workout_id,
        completed_at,
    };

    state
        .db
        .insert_completion(&CompletionRecord::from(&completion))
        .await?;

    tracing::info!(
        user_id = %completion.user_id,
        workout_id = %completion.workout_id,
        "Workout completion logged"
    );

    Ok((StatusCode::CREATED, Json(CompletionSummary::from(&completion))))
}

/// Delete one of the caller's completions.
///
/// Completions owned by someone else are reported as missing.
async fn delete_completion(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Path(completion_id): Path<String>,
) -> Result<StatusCode> {
    let record = state
        .db
        .get_completion(&completion_id)
        .await?
        .filter(|r| r.user_id == user.user_id())
        .ok_or_else(|| AppError::NotFound(format!("Completion {completion_id}")))?;

    state.db.delete_completion(&record.id).await?;

    tracing::info!(user_id = %user.user_id(), completion_id = %record.id, "Workout completion deleted");
    Ok(StatusCode::NO_CONTENT)
}

// ─── Progress ────────────────────────────────────────────────

#[derive(Deserialize)]
struct ProgressQuery {
    /// IANA timezone for day bucketing
    tz: Option<String>,
}

/// Streak and attendance stats.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct ProgressResponse {
    /// Local days with a completion ("YYYY-MM-DD", ascending)
    pub completed_dates: Vec<String>,
    pub current_streak: u32,
    pub total_this_month: u32,
    pub this_week_count: u32,
    pub skipped_records: u32,
    pub timezone: String,
    pub reference_date: String,
}

impl ProgressResponse {
    pub(crate) fn new(stats: ProgressStats, now: DateTime<Utc>, tz: Tz) -> Self {
        Self {
            completed_dates: stats
                .completed_date_keys
                .iter()
                .map(|day| day.date().to_string())
                .collect(),
            current_streak: stats.current_streak,
            total_this_month: stats.total_this_month,
            this_week_count: stats.this_week_count,
            skipped_records: stats.skipped_records,
            timezone: tz.name().to_string(),
            reference_date: now.with_timezone(&tz).date_naive().to_string(),
        }
    }
}

async fn get_progress(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<ProgressQuery>,
) -> Result<Json<ProgressResponse>> {
    let tz = request_timezone(params.tz.as_deref(), state.config.default_timezone)?;
    let now = Utc::now();

    let stats = progress_for_user(&state, user.user_id(), now, tz).await?;

    Ok(Json(ProgressResponse::new(stats, now, tz)))
}

#[derive(Deserialize)]
struct CalendarQuery {
    year: Option<i32>,
    month: Option<u32>,
    tz: Option<String>,
}

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarCellResponse {
    pub date: String,
    #[cfg_attr(feature = "binding-generation", ts(type = "string"))]
    pub class: DayClass,
}

impl From<&CalendarCell> for CalendarCellResponse {
    fn from(cell: &CalendarCell) -> Self {
        Self {
            date: cell.date.to_string(),
            class: cell.class,
        }
    }
}

/// One month of calendar cells, Sunday-first.
#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct CalendarResponse {
    pub year: i32,
    pub month: u32,
    pub weeks: Vec<Vec<CalendarCellResponse>>,
    pub current_streak: u32,
}

async fn get_calendar(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Query(params): Query<CalendarQuery>,
) -> Result<Json<CalendarResponse>> {
    let tz = request_timezone(params.tz.as_deref(), state.config.default_timezone)?;
    let now = Utc::now();
    let current = CalendarMonth::containing(now.with_timezone(&tz).date_naive());

    let displayed = CalendarMonth::new(
        params.year.unwrap_or(current.year),
        params.month.unwrap_or(current.month),
    )
    .ok_or_else(|| AppError::BadRequest("Invalid 'year' or 'month'".to_string()))?;

    let stats = progress_for_user(&state, user.user_id(), now, tz).await?;
    let weeks = month_calendar(displayed, &stats, now, tz)
        .iter()
        .map(|week| week.iter().map(CalendarCellResponse::from).collect())
        .collect();

    Ok(Json(CalendarResponse {
        year: displayed.year,
        month: displayed.month,
        weeks,
        current_streak: stats.current_streak,
    }))
}
