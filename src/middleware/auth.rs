// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! JWT authentication middleware.
//!
//! Tokens are issued by the identity provider and carry the session's admin
//! role flags alongside the user ID.

use crate::models::AdminIdentity;
use crate::AppState;
use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Session cookie name.
pub const AUTH_COOKIE: &str = "physio_token";

/// JWT claims structure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: String,
    /// Expiration time (Unix timestamp)
    pub exp: usize,
    /// Issued at (Unix timestamp)
    pub iat: usize,
    /// Admin record ID, present only for admins
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub admin_id: Option<String>,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub is_super_admin: bool,
}

impl From<Claims> for AdminIdentity {
    fn from(claims: Claims) -> Self {
        Self {
            user_id: claims.sub,
            admin_id: claims.admin_id.filter(|id| !id.is_empty()),
            is_admin: claims.is_admin || claims.is_super_admin,
            is_super_admin: claims.is_super_admin,
        }
    }
}

/// Authenticated user extracted from JWT.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub identity: AdminIdentity,
}

impl AuthUser {
    pub fn user_id(&self) -> &str {
        &self.identity.user_id
    }
}

/// Pull the session token from the cookie, falling back to the bearer header.
pub fn extract_token(jar: &CookieJar, headers: &axum::http::HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get(AUTH_COOKIE) {
        return Some(cookie.value().to_string());
    }

    headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::to_string)
}

/// Verify a session token and return the identity it carries.
pub fn decode_identity(token: &str, signing_key: &[u8]) -> Option<AdminIdentity> {
    let key = DecodingKey::from_secret(signing_key);
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<Claims>(token, &key, &validation).ok()?;
    if token_data.claims.sub.is_empty() {
        return None;
    }
    Some(token_data.claims.into())
}

/// Middleware that requires valid JWT authentication.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_token(&jar, request.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let identity =
        decode_identity(&token, &state.config.jwt_signing_key).ok_or(StatusCode::UNAUTHORIZED)?;

    request.extensions_mut().insert(AuthUser { identity });

    Ok(next.run(request).await)
}

/// Create a JWT for a session.
///
/// Production tokens come from the identity provider; this is used for local
/// tooling and tests.
pub fn create_jwt(identity: &AdminIdentity, signing_key: &[u8]) -> anyhow::Result<String> {
    use jsonwebtoken::{encode, EncodingKey, Header};
    use std::time::{SystemTime, UNIX_EPOCH};

    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as usize;

    let claims = Claims {
        sub: identity.user_id.clone(),
        iat: now,
        exp: now + 24 * 60 * 60, // 1 day
        admin_id: identity.admin_id.clone(),
        is_admin: identity.is_admin,
        is_super_admin: identity.is_super_admin,
    };

    Ok(encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(signing_key),
    )?)
}
