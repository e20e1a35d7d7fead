// SPDX-License-Identifier: MIT

//! Profile routes.
//!
//! Fetching your own profile doubles as the daily check-in: the streak
//! tracker and the achievement evaluator both run as side effects of the
//! GET, and again (evaluator only) after a profile update.

use axum::{
    extract::{Path, State},
    routing::get,
    Extension, Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{AppError, Result};
use crate::middleware::auth::AuthUser;
use crate::models::achievement;
use crate::models::user::DailySchedule;
use crate::models::User;
use crate::time_utils::{day_key, format_utc_rfc3339};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route(
        "/api/profile/{user_id}",
        get(get_profile).put(update_profile),
    )
}

/// Flattened profile + gamification + achievements view.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: Option<String>,
    pub birth_date: Option<String>,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub goal: Option<String>,
    pub goal_tags: Vec<String>,
    pub diet_type: Option<String>,
    pub activity_level: Option<String>,
    pub daily_schedule: DailySchedule,
    pub profile_updates: u32,
    pub level: u32,
    pub experience_points: u64,
    pub trainings_completed: u32,
    pub total_time_spent_minutes: u32,
    pub consecutive_activity_days: u32,
    pub last_activity_day: Option<String>,
    pub achievements: Vec<AchievementView>,
}

#[derive(Serialize)]
pub struct AchievementView {
    pub id: String,
    pub name: String,
    pub description: String,
}

impl From<User> for ProfileResponse {
    fn from(user: User) -> Self {
        let mut achievements: Vec<AchievementView> = achievement::CATALOG
            .iter()
            .filter(|a| user.unlocked_achievements.contains(a.id))
            .map(|a| AchievementView {
                id: a.id.to_string(),
                name: a.name.to_string(),
                description: a.description.to_string(),
            })
            .collect();
        achievements.sort_by(|a, b| a.id.cmp(&b.id));

        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            avatar: user.profile.avatar,
            birth_date: user.profile.birth_date,
            height_cm: user.profile.height_cm,
            weight_kg: user.profile.weight_kg,
            goal: user.profile.goal,
            goal_tags: user.profile.goal_tags,
            diet_type: user.profile.diet_type,
            activity_level: user.profile.activity_level,
            daily_schedule: user.profile.daily_schedule,
            profile_updates: user.profile.profile_updates,
            level: user.gamification.level,
            experience_points: user.gamification.experience_points,
            trainings_completed: user.gamification.trainings_completed,
            total_time_spent_minutes: user.gamification.total_time_spent_minutes,
            consecutive_activity_days: user.gamification.consecutive_activity_days,
            last_activity_day: user.gamification.last_activity_day.map(format_utc_rfc3339),
            achievements,
        }
    }
}

/// Get the authenticated user's profile.
///
/// Side effects: advances the activity streak for today and re-evaluates
/// achievement unlocks against the full booking history.
async fn get_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>> {
    if user_id != auth.user_id {
        return Err(AppError::Unauthorized);
    }

    // Independent reads; achievement evaluation needs both
    let (bookings, zones) = tokio::try_join!(
        state.db.get_bookings_for_user(&user_id),
        state.db.get_zones(),
    )?;

    let today = day_key(chrono::Utc::now());
    let user = state
        .db
        .refresh_profile_atomic(&user_id, &bookings, &zones, today)
        .await?;

    Ok(Json(user.into()))
}

/// Editable profile fields. Absent fields are left unchanged.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[serde(default)]
    avatar: Option<String>,
    #[serde(default)]
    birth_date: Option<String>,
    #[serde(default)]
    height_cm: Option<f64>,
    #[serde(default)]
    weight_kg: Option<f64>,
    #[serde(default)]
    goal: Option<String>,
    #[serde(default)]
    goal_tags: Option<Vec<String>>,
    #[serde(default)]
    diet_type: Option<String>,
    #[serde(default)]
    activity_level: Option<String>,
    #[serde(default)]
    daily_schedule: Option<DailySchedule>,
}

/// Update the authenticated user's profile and re-run the achievement
/// evaluator (the profile-completeness badge can unlock here).
async fn update_profile(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<String>,
    Json(body): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>> {
    if user_id != auth.user_id {
        return Err(AppError::Unauthorized);
    }

    let (bookings, zones) = tokio::try_join!(
        state.db.get_bookings_for_user(&user_id),
        state.db.get_zones(),
    )?;

    // The field edits are applied to the user document as read inside the
    // transaction, so a concurrently committed XP award is never clobbered
    // by a stale snapshot.
    let today = day_key(chrono::Utc::now());
    let user = state
        .db
        .update_profile_atomic(
            &user_id,
            |user| apply_profile_edits(user, &body),
            &bookings,
            &zones,
            today,
        )
        .await?;

    Ok(Json(user.into()))
}

/// Copy the supplied fields onto the profile. Absent fields stay as read;
/// a changed goal stamps `goal_updated_at`.
fn apply_profile_edits(user: &mut User, body: &UpdateProfileRequest) {
    if let Some(avatar) = &body.avatar {
        user.profile.avatar = Some(avatar.clone());
    }
    if let Some(birth_date) = &body.birth_date {
        user.profile.birth_date = Some(birth_date.clone());
    }
    if let Some(height_cm) = body.height_cm {
        user.profile.height_cm = Some(height_cm);
    }
    if let Some(weight_kg) = body.weight_kg {
        user.profile.weight_kg = Some(weight_kg);
    }
    if let Some(goal) = &body.goal {
        if user.profile.goal.as_deref() != Some(goal.as_str()) {
            user.profile.goal_updated_at = Some(chrono::Utc::now());
        }
        user.profile.goal = Some(goal.clone());
    }
    if let Some(goal_tags) = &body.goal_tags {
        user.profile.goal_tags = goal_tags.clone();
    }
    if let Some(diet_type) = &body.diet_type {
        user.profile.diet_type = Some(diet_type.clone());
    }
    if let Some(activity_level) = &body.activity_level {
        user.profile.activity_level = Some(activity_level.clone());
    }
    if let Some(daily_schedule) = &body.daily_schedule {
        user.profile.daily_schedule = daily_schedule.clone();
    }
    user.profile.profile_updates += 1;
}
