// SPDX-License-Identifier: MIT

//! Booking creation service.
//!
//! Handles the core workflow:
//! 1. Validate the request fields
//! 2. Check equipment slot conflicts or class availability
//! 3. Normalize the booking date to a day key
//! 4. Commit booking + class roster + XP counters in one transaction

use crate::db::{BookingOutcome, FirestoreDb};
use crate::error::{AppError, Result};
use crate::models::{Booking, BookingStatus, BookingType};
use crate::time_utils::{parse_day, parse_hhmm};
use chrono::{DateTime, Utc};

/// A booking request, already deserialized but not yet validated.
#[derive(Debug, Clone)]
pub struct BookingRequest {
    pub user_id: String,
    pub booking_type: BookingType,
    pub item_id: String,
    pub item_name: String,
    pub zone_id: String,
    pub booking_date: String,
    pub start_time: String,
    pub end_time: String,
    /// Required for equipment; derived from the class for class bookings
    pub duration_minutes: Option<u32>,
    pub booker_phone: String,
    /// Optional idempotency key; retries with the same key replay the
    /// original booking instead of creating a duplicate
    pub request_id: Option<String>,
}

/// Creates bookings against the document store.
pub struct BookingService {
    db: FirestoreDb,
}

impl BookingService {
    pub fn new(db: FirestoreDb) -> Self {
        Self { db }
    }

    /// Validate and persist a booking request.
    pub async fn create_booking(&self, req: BookingRequest) -> Result<BookingOutcome> {
        let (day, start_minutes, end_minutes) = validate_request(&req)?;

        let duration_minutes = match req.booking_type {
            BookingType::Equipment => {
                let duration = req.duration_minutes.ok_or_else(|| {
                    AppError::Validation("duration is required for equipment bookings".to_string())
                })?;
                if duration == 0 {
                    return Err(AppError::Validation(
                        "duration must be a positive number of minutes".to_string(),
                    ));
                }

                self.db.get_equipment(&req.item_id).await?.ok_or_else(|| {
                    AppError::NotFound(format!("Equipment {} not found", req.item_id))
                })?;

                self.check_equipment_conflict(&req.item_id, day, start_minutes, end_minutes)
                    .await?;

                duration
            }
            BookingType::Class => {
                let class = self
                    .db
                    .get_class(&req.item_id)
                    .await?
                    .ok_or_else(|| AppError::NotFound(format!("Class {} not found", req.item_id)))?;

                // Fast-fail checks; the booking transaction re-reads the
                // roster and is the authoritative gate.
                if class.has_member(&req.user_id) {
                    return Err(AppError::Conflict(format!(
                        "You are already booked into \"{}\"",
                        class.title
                    )));
                }
                if class.is_full() {
                    return Err(AppError::Conflict(format!(
                        "Class \"{}\" is full ({} of {} spots taken)",
                        class.title,
                        class.booked_user_ids.len(),
                        class.max_capacity
                    )));
                }

                class.duration_minutes
            }
        };

        let booking = Booking {
            id: req
                .request_id
                .clone()
                .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
            user_id: req.user_id,
            booking_type: req.booking_type,
            item_id: req.item_id,
            item_name: req.item_name,
            zone_id: req.zone_id,
            booking_date: day,
            start_time: req.start_time,
            end_time: req.end_time,
            duration_minutes,
            booker_phone: req.booker_phone,
            status: BookingStatus::Confirmed,
            request_id: req.request_id,
            created_at: Utc::now(),
        };

        self.db.create_booking_atomic(&booking).await
    }

    /// Scan confirmed bookings for the same item and day for an overlap
    /// with the requested window.
    async fn check_equipment_conflict(
        &self,
        item_id: &str,
        day: DateTime<Utc>,
        start_minutes: u32,
        end_minutes: u32,
    ) -> Result<()> {
        let existing = self.db.get_confirmed_bookings_for_item(item_id, day).await?;

        for other in &existing {
            let (Some(other_start), Some(other_end)) =
                (parse_hhmm(&other.start_time), parse_hhmm(&other.end_time))
            else {
                continue;
            };

            if intervals_overlap(start_minutes, end_minutes, other_start, other_end) {
                return Err(AppError::Conflict(format!(
                    "\"{}\" is already booked {}-{} on this day",
                    other.item_name, other.start_time, other.end_time
                )));
            }
        }

        Ok(())
    }
}

/// Half-open interval overlap: `[a_start, a_end)` vs `[b_start, b_end)`.
/// A booking ending at 10:00 does not conflict with one starting at 10:00.
fn intervals_overlap(a_start: u32, a_end: u32, b_start: u32, b_end: u32) -> bool {
    a_start < b_end && b_start < a_end
}

/// Presence and format checks. Returns the normalized day key and the
/// requested window in minutes since midnight.
fn validate_request(req: &BookingRequest) -> Result<(DateTime<Utc>, u32, u32)> {
    for (field, value) in [
        ("userId", &req.user_id),
        ("itemId", &req.item_id),
        ("itemName", &req.item_name),
        ("zoneId", &req.zone_id),
        ("bookerPhone", &req.booker_phone),
    ] {
        if value.trim().is_empty() {
            return Err(AppError::Validation(format!("{} is required", field)));
        }
    }

    let day = parse_day(&req.booking_date).ok_or_else(|| {
        AppError::Validation(format!("Invalid bookingDate: {}", req.booking_date))
    })?;

    let start_minutes = parse_hhmm(&req.start_time).ok_or_else(|| {
        AppError::Validation(format!("Invalid startTime: {}", req.start_time))
    })?;
    let end_minutes = parse_hhmm(&req.end_time)
        .ok_or_else(|| AppError::Validation(format!("Invalid endTime: {}", req.end_time)))?;

    if end_minutes <= start_minutes {
        return Err(AppError::Validation(
            "endTime must be after startTime".to_string(),
        ));
    }

    // The request ID becomes the booking document ID, so it has to be a
    // legal Firestore document ID: non-empty, no path separators, not a
    // reserved name, within the ID size limit.
    if let Some(request_id) = req.request_id.as_deref() {
        let reserved = request_id == "."
            || request_id == ".."
            || (request_id.starts_with("__") && request_id.ends_with("__"));
        if request_id.trim().is_empty()
            || request_id.len() > 1500
            || request_id.contains('/')
            || reserved
        {
            return Err(AppError::Validation(
                "requestId must be a valid document ID (no '/', not empty or reserved)"
                    .to_string(),
            ));
        }
    }

    Ok((day, start_minutes, end_minutes))
}
