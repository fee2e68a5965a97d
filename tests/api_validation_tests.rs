// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Bad input must be rejected before any database access, so these all run
//! against the offline database.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use physio_tracker::models::AdminIdentity;
use std::sync::Arc;
use tower::ServiceExt;

mod common;

fn token(state: &Arc<physio_tracker::AppState>) -> String {
    common::create_test_jwt(
        &AdminIdentity::user("member-1"),
        &state.config.jwt_signing_key,
    )
}

async fn get_status(uri: &str) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = token(&state);

    app.oneshot(
        Request::builder()
            .method("GET")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

async fn post_completion(body: serde_json::Value) -> StatusCode {
    let (app, state) = common::create_test_app();
    let token = token(&state);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/completions")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
    .status()
}

#[tokio::test]
async fn test_unknown_timezone() {
    assert_eq!(
        get_status("/api/progress?tz=Mars/Olympus_Mons").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_calendar_invalid_month() {
    assert_eq!(
        get_status("/api/progress/calendar?year=2024&month=13").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get_status("/api/progress/calendar?year=2024&month=0").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_calendar_year_out_of_range() {
    assert_eq!(
        get_status("/api/progress/calendar?year=-262143&month=1").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get_status("/api/progress/calendar?year=262142&month=12").await,
        StatusCode::BAD_REQUEST
    );
    assert_eq!(
        get_status("/api/progress/calendar?year=0&month=6").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_calendar_unknown_timezone() {
    assert_eq!(
        get_status("/api/progress/calendar?tz=Nowhere/Special").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_completions_zero_limit() {
    assert_eq!(
        get_status("/api/completions?limit=0").await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_empty_workout_id() {
    assert_eq!(
        post_completion(serde_json::json!({ "workout_id": "" })).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_workout_id_too_long() {
    assert_eq!(
        post_completion(serde_json::json!({ "workout_id": "w".repeat(101) })).await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_invalid_completed_at() {
    assert_eq!(
        post_completion(serde_json::json!({
            "workout_id": "squats",
            "completed_at": "yesterday-ish",
        }))
        .await,
        StatusCode::BAD_REQUEST
    );
}

#[tokio::test]
async fn test_valid_request_reaches_database() {
    // Offline database: validation passes, then the store read fails
    assert_eq!(
        get_status("/api/progress?tz=America/New_York").await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
    assert_eq!(
        post_completion(serde_json::json!({
            "workout_id": "squats",
            "completed_at": "2024-03-10T08:00:00Z",
        }))
        .await,
        StatusCode::INTERNAL_SERVER_ERROR
    );
}
