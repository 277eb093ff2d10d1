// src/models/user.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::Validate;

/// Represents the 'users' table: the authoritative per-user ledger state.
/// Mutated only through the ledger operations, never by handlers directly.
#[derive(Debug, Clone, FromRow)]
pub struct UserProfile {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,

    /// Raw age band from onboarding: 'under13', '13-17', '18-25', '26-40', '40+'.
    pub age_group: String,

    /// 'beginner', 'intermediate' or 'advanced'.
    pub skill_level: String,

    pub selected_topics: Json<Vec<String>>,
    pub interests: Json<Vec<String>>,

    pub xp: i64,

    /// Derived from xp via the level curve; cached and persisted together
    /// with xp mutations.
    pub level: i64,

    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_active_date: Option<NaiveDate>,
    pub streak_freezes: i64,

    pub hearts_remaining: i64,
    /// Set when hearts hit 0, cleared on regeneration.
    pub hearts_regen_at: Option<DateTime<Utc>>,

    pub lessons_completed: i64,
    pub perfect_lessons: i64,
    pub daily_xp: i64,
    pub weekly_xp: i64,

    pub created_at: DateTime<Utc>,
}

/// Represents one row of 'topic_progress': per-user progress in one topic.
/// Sparse, created on first lesson completion in the topic.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicProgress {
    pub topic_id: String,
    pub completed_lessons: i64,
    pub unlocked_lessons: i64,
    pub best_score: i64,
    pub total_xp_earned: i64,
    pub last_played: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Preferences {
    pub selected_topics: Vec<String>,
    pub interests: Vec<String>,
}

/// DTO for bootstrapping a profile on first sign-in. The uid comes from the
/// verified token, never from the body.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateProfileRequest {
    #[validate(length(
        min = 1,
        max = 50,
        message = "Display name length must be between 1 and 50 characters."
    ))]
    pub display_name: String,

    #[validate(email(message = "Invalid email address."))]
    pub email: String,

    #[validate(custom(function = validate_age_band))]
    pub age_group: String,

    #[validate(custom(function = validate_skill_level))]
    pub skill_level: String,

    pub preferences: Preferences,
}

fn validate_age_band(band: &str) -> Result<(), validator::ValidationError> {
    match band {
        "under13" | "13-17" | "18-25" | "26-40" | "40+" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_age_band")),
    }
}

fn validate_skill_level(level: &str) -> Result<(), validator::ValidationError> {
    match level {
        "beginner" | "intermediate" | "advanced" => Ok(()),
        _ => Err(validator::ValidationError::new("unknown_skill_level")),
    }
}

/// Aggregated read model for the current user: ledger state plus per-topic
/// progress, in the shape clients subscribe to.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub uid: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: String,
    pub age_group: String,
    pub skill_level: String,
    pub preferences: Preferences,
    pub xp: i64,
    pub level: i64,
    pub level_title: &'static str,
    pub current_streak: i64,
    pub longest_streak: i64,
    pub last_active_date: Option<NaiveDate>,
    pub streak_freezes: i64,
    pub hearts_remaining: i64,
    pub hearts_regen_at: Option<DateTime<Utc>>,
    pub lessons_completed: i64,
    pub perfect_lessons: i64,
    pub daily_xp: i64,
    pub weekly_xp: i64,
    pub created_at: DateTime<Utc>,
    pub progress: Vec<TopicProgress>,
}
