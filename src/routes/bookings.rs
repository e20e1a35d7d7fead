// SPDX-License-Identifier: MIT

//! Booking routes.

use axum::{
    extract::State,
    http::StatusCode,
    routing::post,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::db::BookingOutcome;
use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::{Booking, BookingStatus, BookingType};
use crate::services::BookingRequest;
use crate::time_utils::format_utc_rfc3339;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/bookings", post(create_booking).get(list_bookings))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingRequest {
    user_id: String,
    #[serde(rename = "type")]
    booking_type: BookingType,
    item_id: String,
    item_name: String,
    zone_id: String,
    booking_date: String,
    start_time: String,
    end_time: String,
    #[serde(default)]
    duration: Option<u32>,
    booker_phone: String,
    /// Optional idempotency key; retries with the same key do not create
    /// a second booking
    #[serde(default)]
    request_id: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingResponse {
    pub booking_id: String,
    pub booking_details: BookingView,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingView {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub item_id: String,
    pub item_name: String,
    pub zone_id: String,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: u32,
    pub status: BookingStatus,
    pub created_at: String,
}

impl From<Booking> for BookingView {
    fn from(b: Booking) -> Self {
        Self {
            id: b.id,
            user_id: b.user_id,
            booking_type: b.booking_type,
            item_id: b.item_id,
            item_name: b.item_name,
            zone_id: b.zone_id,
            booking_date: format_utc_rfc3339(b.booking_date),
            start_time: b.start_time,
            end_time: b.end_time,
            duration_minutes: b.duration_minutes,
            status: b.status,
            created_at: format_utc_rfc3339(b.created_at),
        }
    }
}

/// Create a booking for the authenticated user.
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<CreateBookingResponse>)> {
    if body.user_id != user.user_id {
        return Err(AppError::Unauthorized);
    }

    tracing::debug!(
        user_id = %user.user_id,
        item_id = %body.item_id,
        booking_type = ?body.booking_type,
        date = %body.booking_date,
        "Creating booking"
    );

    let outcome = state
        .booking_service
        .create_booking(BookingRequest {
            user_id: body.user_id,
            booking_type: body.booking_type,
            item_id: body.item_id,
            item_name: body.item_name,
            zone_id: body.zone_id,
            booking_date: body.booking_date,
            start_time: body.start_time,
            end_time: body.end_time,
            duration_minutes: body.duration,
            booker_phone: body.booker_phone,
            request_id: body.request_id,
        })
        .await?;

    // A replayed request ID returns the original booking with the same
    // shape and status code, so retries are indistinguishable to clients.
    let booking = match outcome {
        BookingOutcome::Created { booking, .. } => booking,
        BookingOutcome::Replayed { booking } => booking,
    };

    Ok((
        StatusCode::CREATED,
        Json(CreateBookingResponse {
            booking_id: booking.id.clone(),
            booking_details: booking.into(),
        }),
    ))
}

#[derive(Serialize)]
pub struct BookingsListResponse {
    pub bookings: Vec<BookingView>,
}

/// List the authenticated user's bookings, newest first.
async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Extension(user): Extension<AuthUser>,
) -> Result<Json<BookingsListResponse>> {
    let bookings = state.db.get_bookings_for_user(&user.user_id).await?;

    Ok(Json(BookingsListResponse {
        bookings: bookings.into_iter().map(BookingView::from).collect(),
    }))
}
