//! User document: identity, profile, and gamification state.
//!
//! The gamification aggregate is mutated in memory and committed together
//! with the triggering write via Firestore transactions, so these methods
//! stay pure with respect to the database.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// XP needed per level. `level = xp / XP_PER_LEVEL + 1`.
pub const XP_PER_LEVEL: u64 = 1000;
/// Flat XP awarded for any completed training event.
pub const FIXED_EVENT_BONUS: u64 = 100;
/// Per-minute XP rate is 10/6 (kept as integer math: `minutes * 10 / 6`).
pub const PER_MINUTE_RATE_NUM: u64 = 10;
pub const PER_MINUTE_RATE_DEN: u64 = 6;

/// User profile + gamification stored in Firestore.
///
/// Document ID is the user ID. Serde defaults let documents written before
/// a field existed deserialize with defined defaults applied here, once,
/// rather than per call site.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub email: String,
    /// None for Google-only accounts
    #[serde(default)]
    pub password_hash: Option<String>,
    /// Google subject claim, None for password accounts
    #[serde(default)]
    pub google_id: Option<String>,
    /// When the user joined (ISO 8601)
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub profile: Profile,
    #[serde(default)]
    pub gamification: Gamification,
    /// One-way-unlockable badge IDs; grows only
    #[serde(default)]
    pub unlocked_achievements: HashSet<String>,
}

impl User {
    /// Create a fresh user from a verified Google identity.
    pub fn from_google_identity(
        sub: &str,
        email: &str,
        name: &str,
        picture: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: format!("g{}", sub),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: None,
            google_id: Some(sub.to_string()),
            created_at: now,
            profile: Profile {
                avatar: picture,
                ..Profile::default()
            },
            gamification: Gamification::default(),
            unlocked_achievements: HashSet::new(),
        }
    }
}

/// Editable profile fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub birth_date: Option<String>,
    #[serde(default)]
    pub height_cm: Option<f64>,
    #[serde(default)]
    pub weight_kg: Option<f64>,
    #[serde(default)]
    pub goal: Option<String>,
    #[serde(default)]
    pub goal_tags: Vec<String>,
    #[serde(default)]
    pub diet_type: Option<String>,
    #[serde(default)]
    pub activity_level: Option<String>,
    #[serde(default)]
    pub daily_schedule: DailySchedule,
    /// How many times the profile has been edited
    #[serde(default)]
    pub profile_updates: u32,
    #[serde(default)]
    pub goal_updated_at: Option<DateTime<Utc>>,
}

impl Profile {
    /// Whether every field the "complete profile" badge requires is set.
    pub fn is_complete(&self) -> bool {
        self.birth_date.is_some()
            && self.height_cm.is_some()
            && self.weight_kg.is_some()
            && self.goal.as_deref().is_some_and(|g| !g.is_empty())
            && self.diet_type.is_some()
            && self.activity_level.is_some()
    }
}

/// Seven named time-of-day slots ("HH:mm" strings).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailySchedule {
    #[serde(default)]
    pub wake_up: Option<String>,
    #[serde(default)]
    pub breakfast: Option<String>,
    #[serde(default)]
    pub lunch: Option<String>,
    #[serde(default)]
    pub dinner: Option<String>,
    #[serde(default)]
    pub workout: Option<String>,
    #[serde(default)]
    pub snack: Option<String>,
    #[serde(default)]
    pub sleep: Option<String>,
}

/// Cumulative progress counters and the streak state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Gamification {
    /// Derived tier, always `xp / 1000 + 1`
    #[serde(default = "default_level")]
    pub level: u32,
    /// Cumulative, never reset on level-up
    #[serde(default)]
    pub experience_points: u64,
    #[serde(default)]
    pub trainings_completed: u32,
    #[serde(default)]
    pub total_time_spent_minutes: u32,
    #[serde(default)]
    pub consecutive_activity_days: u32,
    /// Day key (midnight UTC) of the last recorded activity
    #[serde(default)]
    pub last_activity_day: Option<DateTime<Utc>>,
}

fn default_level() -> u32 {
    1
}

impl Default for Gamification {
    fn default() -> Self {
        Self {
            level: 1,
            experience_points: 0,
            trainings_completed: 0,
            total_time_spent_minutes: 0,
            consecutive_activity_days: 0,
            last_activity_day: None,
        }
    }
}

/// Outcome of an XP award.
#[derive(Debug, Clone, Copy)]
pub struct XpAward {
    pub gained_xp: u64,
    pub leveled_up: bool,
    pub level: u32,
}

impl Gamification {
    /// Award XP for a completed activity and recompute the level.
    ///
    /// `gained = FIXED_EVENT_BONUS + floor(minutes * 10 / 6)`. Also bumps
    /// the trainings counter and total time. The caller persists the whole
    /// struct in one write so the counters stay consistent with each other.
    pub fn award_xp(&mut self, duration_minutes: u32) -> XpAward {
        let gained_xp = FIXED_EVENT_BONUS
            + (duration_minutes as u64 * PER_MINUTE_RATE_NUM) / PER_MINUTE_RATE_DEN;

        self.experience_points += gained_xp;
        self.trainings_completed += 1;
        self.total_time_spent_minutes += duration_minutes;

        let new_level = (self.experience_points / XP_PER_LEVEL) as u32 + 1;
        let leveled_up = new_level > self.level;
        self.level = new_level;

        XpAward {
            gained_xp,
            leveled_up,
            level: new_level,
        }
    }

    /// Advance the consecutive-activity-day streak for `today` (a day key).
    ///
    /// Same day: no change. Exactly one day later: increment. Any longer
    /// gap, or no prior activity: reset to 1. Returns whether the state
    /// changed (so callers can skip the write when it did not).
    pub fn advance_streak(&mut self, today: DateTime<Utc>) -> bool {
        match self.last_activity_day {
            Some(last) if last == today => false,
            Some(last) if (today - last).num_days() == 1 => {
                self.consecutive_activity_days += 1;
                self.last_activity_day = Some(today);
                true
            }
            _ => {
                self.consecutive_activity_days = 1;
                self.last_activity_day = Some(today);
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time_utils::parse_day;

    #[test]
    fn test_award_xp_sixty_minutes() {
        let mut g = Gamification::default();
        let award = g.award_xp(60);

        // 100 fixed + floor(60 * 10 / 6) = 200
        assert_eq!(award.gained_xp, 200);
        assert!(!award.leveled_up);
        assert_eq!(g.experience_points, 200);
        assert_eq!(g.level, 1);
        assert_eq!(g.trainings_completed, 1);
        assert_eq!(g.total_time_spent_minutes, 60);
    }

    #[test]
    fn test_award_xp_rounds_down() {
        let mut g = Gamification::default();
        let award = g.award_xp(45);

        // floor(45 * 10 / 6) = 75
        assert_eq!(award.gained_xp, 175);
    }

    #[test]
    fn test_level_is_derived_from_cumulative_xp() {
        let mut g = Gamification::default();
        for _ in 0..5 {
            g.award_xp(60); // 200 XP each
        }

        assert_eq!(g.experience_points, 1000);
        assert_eq!(g.level, 2);

        // XP is never reset on level-up
        let award = g.award_xp(60);
        assert!(!award.leveled_up);
        assert_eq!(g.experience_points, 1200);
        assert_eq!(g.level, 2);
    }

    #[test]
    fn test_level_up_flag() {
        let mut g = Gamification {
            experience_points: 950,
            ..Gamification::default()
        };
        let award = g.award_xp(10); // +116 XP crosses 1000

        assert!(award.leveled_up);
        assert_eq!(award.level, 2);
    }

    #[test]
    fn test_xp_invariant_over_random_durations() {
        let mut g = Gamification::default();
        for minutes in [5u32, 90, 17, 120, 33, 61] {
            let before = g.experience_points;
            g.award_xp(minutes);
            assert!(g.experience_points > before);
            assert_eq!(g.level as u64, g.experience_points / XP_PER_LEVEL + 1);
        }
    }

    #[test]
    fn test_streak_same_day_no_change() {
        let day = parse_day("2024-03-05").unwrap();
        let mut g = Gamification {
            consecutive_activity_days: 4,
            last_activity_day: Some(day),
            ..Gamification::default()
        };

        assert!(!g.advance_streak(day));
        assert_eq!(g.consecutive_activity_days, 4);
        assert_eq!(g.last_activity_day, Some(day));
    }

    #[test]
    fn test_streak_next_day_increments() {
        let mut g = Gamification {
            consecutive_activity_days: 4,
            last_activity_day: parse_day("2024-03-05"),
            ..Gamification::default()
        };
        let tomorrow = parse_day("2024-03-06").unwrap();

        assert!(g.advance_streak(tomorrow));
        assert_eq!(g.consecutive_activity_days, 5);
        assert_eq!(g.last_activity_day, Some(tomorrow));
    }

    #[test]
    fn test_streak_gap_resets() {
        let mut g = Gamification {
            consecutive_activity_days: 4,
            last_activity_day: parse_day("2024-03-05"),
            ..Gamification::default()
        };
        let three_days_later = parse_day("2024-03-08").unwrap();

        assert!(g.advance_streak(three_days_later));
        assert_eq!(g.consecutive_activity_days, 1);
    }

    #[test]
    fn test_streak_first_activity() {
        let mut g = Gamification::default();
        let today = parse_day("2024-03-05").unwrap();

        assert!(g.advance_streak(today));
        assert_eq!(g.consecutive_activity_days, 1);
        assert_eq!(g.last_activity_day, Some(today));
    }

    #[test]
    fn test_profile_completeness() {
        let mut profile = Profile::default();
        assert!(!profile.is_complete());

        profile.birth_date = Some("1990-06-15".to_string());
        profile.height_cm = Some(180.0);
        profile.weight_kg = Some(75.0);
        profile.goal = Some("build muscle".to_string());
        profile.diet_type = Some("balanced".to_string());
        assert!(!profile.is_complete());

        profile.activity_level = Some("moderate".to_string());
        assert!(profile.is_complete());

        profile.goal = Some(String::new());
        assert!(!profile.is_complete());
    }
}
