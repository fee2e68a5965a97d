// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session routes.

use axum::{extract::State, http::StatusCode, routing::post, Router};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use std::sync::Arc;

use crate::middleware::auth::{decode_identity, extract_token, AUTH_COOKIE};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/auth/logout", post(logout))
}

/// End the session: clear the auth cookie and drop cached permissions.
///
/// Public so an expired session can still clear its cookie.
async fn logout(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    headers: axum::http::HeaderMap,
) -> (CookieJar, StatusCode) {
    if let Some(identity) = extract_token(&jar, &headers)
        .and_then(|token| decode_identity(&token, &state.config.jwt_signing_key))
    {
        state.permissions.invalidate(&identity.user_id);
        tracing::info!(user_id = %identity.user_id, "User logged out");
    }

    let secure = state.config.frontend_url.starts_with("https://");
    let removal = Cookie::build((AUTH_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);

    (jar.remove(removal), StatusCode::NO_CONTENT)
}
