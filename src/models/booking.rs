//! Booking document and its enums.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// What kind of resource a booking reserves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingType {
    Equipment,
    Class,
}

/// Booking lifecycle status.
///
/// Bookings are created `Confirmed`. The transition to `Completed` or
/// `Cancelled` is administrative and happens outside this service; the
/// achievement and streak logic reads the status to distinguish actual
/// attendance from a mere reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookingStatus {
    Confirmed,
    Completed,
    Cancelled,
}

/// A reservation of equipment or a group-class seat.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    /// Document ID (client request ID if supplied, UUIDv4 otherwise)
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub booking_type: BookingType,
    pub item_id: String,
    pub item_name: String,
    pub zone_id: String,
    /// Day key (midnight UTC)
    pub booking_date: DateTime<Utc>,
    /// "HH:mm"
    pub start_time: String,
    /// "HH:mm"
    pub end_time: String,
    pub duration_minutes: u32,
    pub booker_phone: String,
    pub status: BookingStatus,
    /// Client-supplied idempotency key, if any
    #[serde(default)]
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
