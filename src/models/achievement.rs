// src/models/achievement.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::prelude::FromRow;

use crate::models::user::UserProfile;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementCategory {
    Learning,
    Streak,
    Mastery,
    Level,
    Xp,
}

/// Profile counter an achievement condition is checked against. Exhaustive:
/// a new counter means a new variant and a new arm in `value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StatField {
    Xp,
    Level,
    LessonsCompleted,
    PerfectLessons,
    CurrentStreak,
    LongestStreak,
}

impl StatField {
    pub fn value(&self, profile: &UserProfile) -> i64 {
        match self {
            StatField::Xp => profile.xp,
            StatField::Level => profile.level,
            StatField::LessonsCompleted => profile.lessons_completed,
            StatField::PerfectLessons => profile.perfect_lessons,
            StatField::CurrentStreak => profile.current_streak,
            StatField::LongestStreak => profile.longest_streak,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct AchievementCondition {
    pub field: StatField,
    pub threshold: i64,
}

/// One entry of the static achievement catalog.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementDef {
    pub id: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub category: AchievementCategory,
    pub xp_reward: i64,
    pub condition: AchievementCondition,
}

/// Represents one row of 'user_achievements': a grant record. Existence is
/// the "already granted" invariant; rows are append-only.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserAchievement {
    pub achievement_id: String,
    pub unlocked_at: DateTime<Utc>,
    pub xp_rewarded: i64,
}
