// SPDX-License-Identifier: MIT

//! Booking endpoint validation tests (offline store).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use serde_json::json;
use tower::ServiceExt;

mod common;

fn booking_body() -> serde_json::Value {
    json!({
        "userId": "u1",
        "type": "equipment",
        "itemId": "eq1",
        "itemName": "Treadmill",
        "zoneId": "z1",
        "bookingDate": "2030-03-05",
        "startTime": "09:00",
        "endTime": "10:00",
        "duration": 60,
        "bookerPhone": "555-0100"
    })
}

async fn post_booking(
    body: serde_json::Value,
    as_user: &str,
) -> axum::http::Response<axum::body::Body> {
    let (app, state) = common::create_test_app();
    let token = common::create_test_jwt(as_user, &state.config.jwt_signing_key);

    app.oneshot(
        Request::builder()
            .method("POST")
            .uri("/api/bookings")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body.to_string()))
            .unwrap(),
    )
    .await
    .unwrap()
}

#[tokio::test]
async fn test_booking_for_another_user_is_rejected() {
    let response = post_booking(booking_body(), "someone-else").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_empty_item_id_is_400() {
    let mut body = booking_body();
    body["itemId"] = json!("");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_booking_date_is_400() {
    let mut body = booking_body();
    body["bookingDate"] = json!("next tuesday");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_bad_start_time_is_400() {
    let mut body = booking_body();
    body["startTime"] = json!("9am");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_end_before_start_is_400() {
    let mut body = booking_body();
    body["startTime"] = json!("10:00");
    body["endTime"] = json!("09:00");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_equipment_without_duration_is_400() {
    let mut body = booking_body();
    body.as_object_mut().unwrap().remove("duration");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_zero_duration_is_400() {
    let mut body = booking_body();
    body["duration"] = json!(0);
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_request_id_with_path_separator_is_400() {
    // The request ID becomes the stored document ID, so path characters
    // are rejected up front instead of failing at the store
    let mut body = booking_body();
    body["requestId"] = json!("bookings/evil");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut body = booking_body();
    body["requestId"] = json!("..");
    let response = post_booking(body, "u1").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_valid_booking_with_offline_store_is_503() {
    // Validation passes; the equipment lookup then hits the offline store
    let response = post_booking(booking_body(), "u1").await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_error_body_carries_message() {
    let mut body = booking_body();
    body["bookingDate"] = json!("not-a-date");
    let response = post_booking(body, "u1").await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let parsed: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(parsed["error"], "bad_request");
    assert!(parsed["message"]
        .as_str()
        .unwrap()
        .contains("bookingDate"));
}
