// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Admin routes: permission introspection, user progress and grant management.

use crate::error::{AppError, Result};
use crate::middleware::auth::{decode_identity, extract_token, AuthUser};
use crate::models::{Permission, PermissionGrant};
use crate::routes::api::{progress_for_user, request_timezone, ProgressResponse};
use crate::services::permissions::{require_permission, require_super_admin, resolve_without_context};
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{get, put},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::CookieJar;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

/// Admin routes that answer without a session.
pub fn public_routes() -> Router<Arc<AppState>> {
    Router::new().route("/api/admin/permissions", get(get_permissions))
}

/// Admin routes behind `require_auth`.
pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/admin/users/{user_id}/progress", get(get_user_progress))
        .route("/api/admin/admins/{admin_id}/grants", get(list_grants))
        .route(
            "/api/admin/admins/{admin_id}/grants/{permission}",
            put(put_grant).delete(delete_grant),
        )
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct PermissionsResponse {
    pub permissions: Vec<String>,
    pub fallback: bool,
}

/// Effective permissions of the caller.
///
/// Always answers; without a valid session the answer is the least-privilege
/// fallback.
async fn get_permissions(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: HeaderMap,
) -> Json<PermissionsResponse> {
    let identity = extract_token(&jar, &headers)
        .and_then(|token| decode_identity(&token, &state.config.jwt_signing_key));

    let permissions = match identity {
        Some(identity) => state.permissions.resolve(&identity, &state.db).await,
        None => resolve_without_context(),
    };

    Json(PermissionsResponse {
        permissions: permissions
            .granted()
            .into_iter()
            .map(|p| p.to_string())
            .collect(),
        fallback: permissions.is_fallback(),
    })
}

#[derive(Deserialize)]
struct UserProgressQuery {
    tz: Option<String>,
}

/// Progress of any user, for admins holding `manage_users`.
async fn get_user_progress(
    State(state): State<Arc<AppState>>,
    Extension(admin): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Query(params): Query<UserProgressQuery>,
) -> Result<Json<ProgressResponse>> {
    let permissions = state.permissions.resolve(&admin.identity, &state.db).await;
    require_permission(&permissions, Permission::ManageUsers)?;

    let tz = request_timezone(params.tz.as_deref(), state.config.default_timezone)?;
    let now = Utc::now();
    let stats = progress_for_user(&state, &user_id, now, tz).await?;

    tracing::info!(admin_user = %admin.user_id(), user_id = %user_id, "Admin viewed user progress");
    Ok(Json(ProgressResponse::new(stats, now, tz)))
}

// ─── Grant Management ────────────────────────────────────────

#[derive(Serialize, Clone, Debug)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GrantSummary {
    pub permission: String,
    pub granted_by: Option<String>,
    pub granted_at: Option<String>,
    /// False for rows naming a permission this server does not know
    pub recognized: bool,
}

impl From<PermissionGrant> for GrantSummary {
    fn from(grant: PermissionGrant) -> Self {
        Self {
            recognized: grant.permission.parse::<Permission>().is_ok(),
            permission: grant.permission,
            granted_by: grant.granted_by,
            granted_at: grant.granted_at,
        }
    }
}

#[derive(Serialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct GrantsResponse {
    pub admin_id: String,
    pub grants: Vec<GrantSummary>,
}

fn parse_permission(raw: &str) -> Result<Permission> {
    raw.parse::<Permission>()
        .map_err(|e| AppError::BadRequest(e.to_string()))
}

async fn list_grants(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(admin_id): Path<String>,
) -> Result<Json<GrantsResponse>> {
    require_super_admin(&caller.identity)?;

    let grants = state.db.get_grants_for_admin(&admin_id).await?;

    Ok(Json(GrantsResponse {
        admin_id,
        grants: grants.into_iter().map(GrantSummary::from).collect(),
    }))
}

async fn put_grant(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path((admin_id, permission)): Path<(String, String)>,
) -> Result<(StatusCode, Json<GrantSummary>)> {
    require_super_admin(&caller.identity)?;
    let permission = parse_permission(&permission)?;

    let grant = PermissionGrant {
        admin_id: admin_id.clone(),
        permission: permission.to_string(),
        granted_by: Some(caller.user_id().to_string()),
        granted_at: Some(format_utc_rfc3339(Utc::now())),
    };
    state.db.set_grant(permission, &grant).await?;
    state.permissions.invalidate_admin(&admin_id);

    tracing::info!(
        granted_by = %caller.user_id(),
        admin_id = %admin_id,
        permission = %permission,
        "Permission granted"
    );

    Ok((StatusCode::OK, Json(GrantSummary::from(grant))))
}

async fn delete_grant(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path((admin_id, permission)): Path<(String, String)>,
) -> Result<StatusCode> {
    require_super_admin(&caller.identity)?;
    let permission = parse_permission(&permission)?;

    state.db.delete_grant(&admin_id, permission).await?;
    state.permissions.invalidate_admin(&admin_id);

    tracing::info!(
        revoked_by = %caller.user_id(),
        admin_id = %admin_id,
        permission = %permission,
        "Permission revoked"
    );

    Ok(StatusCode::NO_CONTENT)
}
