// SPDX-License-Identifier: MIT

//! Achievement unlock rule engine.
//!
//! A pure function of the user's current state and booking history. Every
//! predicate is evaluated independently (no early exit); the result is the
//! set of badge IDs that are newly satisfied and not yet unlocked. Unlocks
//! are monotonic unions, so re-running the evaluator is always safe.

use crate::models::{Booking, BookingStatus, BookingType, User, Zone};
use crate::time_utils::{day_key, hour_of};
use chrono::{DateTime, Utc};
use std::collections::HashSet;

const EARLY_BIRD_HOUR: u32 = 7;
const NIGHT_OWL_HOUR: u32 = 22;
const STREAK_DAYS: u32 = 30;
const FAST_STARTER_WINDOW_DAYS: i64 = 3;

/// Evaluate all predicates against the user's booking history.
///
/// `bookings` is the full history (all statuses); `today` is a day key.
/// Returns the IDs newly unlocked, in catalog order.
pub fn evaluate(
    user: &User,
    bookings: &[Booking],
    zones: &[Zone],
    today: DateTime<Utc>,
) -> Vec<&'static str> {
    let completed: Vec<&Booking> = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Completed)
        .collect();

    let early_starts = completed
        .iter()
        .filter(|b| hour_of(&b.start_time).is_some_and(|h| h < EARLY_BIRD_HOUR))
        .count();

    let late_starts = completed
        .iter()
        .filter(|b| hour_of(&b.start_time).is_some_and(|h| h >= NIGHT_OWL_HOUR))
        .count();

    let class_bookings = bookings
        .iter()
        .filter(|b| b.booking_type == BookingType::Class)
        .count();

    let upcoming_confirmed = bookings
        .iter()
        .filter(|b| b.status == BookingStatus::Confirmed && b.booking_date >= today)
        .count();

    let visited_all_zones = !zones.is_empty() && {
        let visited: HashSet<&str> = completed.iter().map(|b| b.zone_id.as_str()).collect();
        zones.iter().all(|z| visited.contains(z.id.as_str()))
    };

    let fast_start = completed
        .iter()
        .map(|b| b.booking_date)
        .min()
        .is_some_and(|earliest| {
            let joined = day_key(user.created_at);
            (earliest - joined).num_days() <= FAST_STARTER_WINDOW_DAYS
        });

    let streak = user.gamification.consecutive_activity_days;

    let satisfied: [(&'static str, bool); 11] = [
        ("ach01", !completed.is_empty()),
        ("ach02", streak >= STREAK_DAYS),
        ("ach03", early_starts >= 20),
        ("ach04", completed.len() >= 100),
        ("ach05", visited_all_zones),
        ("ach06", class_bookings >= 5),
        ("ach07", late_starts >= 10),
        ("ach08", user.profile.is_complete()),
        ("ach09", upcoming_confirmed >= 7),
        ("ach10", fast_start),
        // Shares ach02's trigger: two badges, one condition.
        ("ach11", streak >= STREAK_DAYS),
    ];

    satisfied
        .into_iter()
        .filter(|(id, ok)| *ok && !user.unlocked_achievements.contains(*id))
        .map(|(id, _)| id)
        .collect()
}
