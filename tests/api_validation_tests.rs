// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! API input validation tests.
//!
//! Every request here is malformed, so it must be rejected before the
//! (offline) database is touched; a 500 would mean validation ran too late.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
};
use serde_json::{json, Value};
use tower::ServiceExt;

mod common;

async fn send(method: &str, uri: &str, body: Option<Value>) -> Response {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);

    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token));

    let body = match body {
        Some(json) => {
            builder = builder.header(header::CONTENT_TYPE, "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    app.oneshot(builder.body(body).unwrap()).await.unwrap()
}

async fn assert_bad_request(method: &str, uri: &str, body: Option<Value>) {
    let response = send(method, uri, body.clone()).await;
    assert_eq!(
        response.status(),
        StatusCode::BAD_REQUEST,
        "{} {} with {:?}",
        method,
        uri,
        body
    );

    let bytes = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["error"], "bad_request");
}

#[tokio::test]
async fn test_month_view_parameter() {
    assert_bad_request("GET", "/api/ddays", None).await;
    assert_bad_request("GET", "/api/ddays?view=2024", None).await;
    assert_bad_request("GET", "/api/ddays?view=202413", None).await;
    assert_bad_request("GET", "/api/ddays?view=2024-01", None).await;
}

#[tokio::test]
async fn test_dday_dates() {
    assert_bad_request("POST", "/api/ddays", Some(json!({ "title": "" }))).await;
    assert_bad_request(
        "POST",
        "/api/ddays",
        Some(json!({ "title": "Trip", "date": "2024-03-01" })),
    )
    .await;
    assert_bad_request(
        "POST",
        "/api/ddays",
        Some(json!({ "title": "Trip", "date": "20240305", "endDate": "20240301" })),
    )
    .await;
    assert_bad_request(
        "PUT",
        "/api/ddays/some-id",
        Some(json!({ "date": "20240231" })),
    )
    .await;
}

#[tokio::test]
async fn test_invite_requires_email() {
    assert_bad_request(
        "POST",
        "/api/connection/invite",
        Some(json!({ "email": "not-an-email" })),
    )
    .await;
    assert_bad_request("POST", "/api/connection/invite", Some(json!({ "email": "" }))).await;
}

#[tokio::test]
async fn test_period_inputs() {
    assert_bad_request(
        "POST",
        "/api/periods/days",
        Some(json!({ "date": "03/01/2024" })),
    )
    .await;
    assert_bad_request(
        "POST",
        "/api/periods/days",
        Some(json!({ "date": "2024-03-01", "crampIntensity": 11 })),
    )
    .await;
    assert_bad_request("DELETE", "/api/periods/days/20240301", None).await;
    assert_bad_request(
        "PUT",
        "/api/periods/settings",
        Some(json!({ "cycleLength": 50, "periodLength": 5 })),
    )
    .await;
    assert_bad_request(
        "PUT",
        "/api/periods/settings",
        Some(json!({ "cycleLength": 28, "periodLength": 0 })),
    )
    .await;
}

#[tokio::test]
async fn test_checkin_inputs() {
    assert_bad_request(
        "POST",
        "/api/checkin",
        Some(json!({ "date": "2024-03-01", "mood": "", "energy": "high" })),
    )
    .await;
    assert_bad_request("GET", "/api/checkin/2024-13-01", None).await;
    assert_bad_request("GET", "/api/checkin/partner/yesterday", None).await;
}

#[tokio::test]
async fn test_pin_inputs() {
    assert_bad_request(
        "POST",
        "/api/pins",
        Some(json!({ "lat": 91.0, "lng": 0.0, "title": "Cafe", "date": "2024-03-01" })),
    )
    .await;
    assert_bad_request(
        "PUT",
        "/api/pins/p1",
        Some(json!({ "lat": 0.0, "lng": 181.0, "title": "Cafe", "date": "2024-03-01" })),
    )
    .await;
}

#[tokio::test]
async fn test_text_fields_required() {
    assert_bad_request("POST", "/api/ideas", Some(json!({ "title": "  " }))).await;
    assert_bad_request("POST", "/api/roulette", Some(json!({ "title": "" }))).await;
    assert_bad_request(
        "POST",
        "/api/feedback",
        Some(json!({ "feedbackText": "Nice", "category": "" })),
    )
    .await;
}

#[tokio::test]
async fn test_user_metadata_inputs() {
    assert_bad_request("PUT", "/api/user/metadata", Some(json!({ "sex": "other" }))).await;
    assert_bad_request(
        "PUT",
        "/api/user/metadata",
        Some(json!({ "startedDating": "06/12/2021" })),
    )
    .await;
}

#[tokio::test]
async fn test_malformed_bodies_are_bad_requests() {
    // Missing required fields
    assert_bad_request(
        "POST",
        "/api/checkin",
        Some(json!({ "date": "2024-03-01", "energy": "high" })),
    )
    .await;
    assert_bad_request("POST", "/api/feedback", Some(json!({ "feedbackText": "Nice" }))).await;
    assert_bad_request("POST", "/api/connection/invite", Some(json!({}))).await;

    // Wrong types
    assert_bad_request("POST", "/api/ddays/upload-url", Some(json!({ "fileSize": -1 }))).await;
    assert_bad_request(
        "POST",
        "/api/pins",
        Some(json!({ "lat": "x", "lng": 0.0, "title": "Cafe", "date": "2024-03-01" })),
    )
    .await;
    assert_bad_request(
        "POST",
        "/api/periods/days",
        Some(json!({ "date": "2024-03-01", "crampIntensity": 2.5 })),
    )
    .await;
}

#[tokio::test]
async fn test_unparseable_body_is_json_error() {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt("user-1", &state.config.jwt_signing_key);
    let request = Request::builder()
        .method("POST")
        .uri("/api/ideas")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"title\": "))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
}

#[tokio::test]
async fn test_upload_url_size_limit() {
    let response = send(
        "POST",
        "/api/ddays/upload-url",
        Some(json!({ "fileSize": 5 * 1024 * 1024 + 1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
}

#[tokio::test]
async fn test_upload_url_issued() {
    let response = send(
        "POST",
        "/api/ddays/upload-url",
        Some(json!({ "fileSize": 1024 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let bytes = axum::body::to_bytes(response.into_body(), 4096)
        .await
        .unwrap();
    let json: Value = serde_json::from_slice(&bytes).unwrap();
    let key = json["key"].as_str().unwrap();
    assert!(key.starts_with("ddays/"));
    assert!(json["uploadUrl"]
        .as_str()
        .unwrap()
        .contains("X-Amz-Signature="));
    assert_eq!(
        json["publicUrl"],
        format!("https://pub-test-public.r2.dev/{}", key)
    );
    assert_eq!(json["expiresIn"], 900);
}
