// src/models/leaderboard.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};

/// Leaderboard window. Each period ranks a different XP counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LeaderboardPeriod {
    Daily,
    Weekly,
    Alltime,
}

impl LeaderboardPeriod {
    pub const ALL: [LeaderboardPeriod; 3] = [
        LeaderboardPeriod::Alltime,
        LeaderboardPeriod::Daily,
        LeaderboardPeriod::Weekly,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "daily" => Some(LeaderboardPeriod::Daily),
            "weekly" => Some(LeaderboardPeriod::Weekly),
            "alltime" => Some(LeaderboardPeriod::Alltime),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LeaderboardPeriod::Daily => "daily",
            LeaderboardPeriod::Weekly => "weekly",
            LeaderboardPeriod::Alltime => "alltime",
        }
    }

    /// Users column ranked for this period.
    pub fn xp_column(&self) -> &'static str {
        match self {
            LeaderboardPeriod::Daily => "daily_xp",
            LeaderboardPeriod::Weekly => "weekly_xp",
            LeaderboardPeriod::Alltime => "xp",
        }
    }
}

/// One ranked row of a leaderboard snapshot.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub uid: String,
    pub display_name: String,
    pub avatar_url: String,
    pub xp: i64,
    pub level: i64,
}

/// Database row for 'leaderboard_snapshots'; rankings live in a JSONB
/// column and are fully replaced on every computation.
#[derive(Debug, FromRow)]
pub struct SnapshotRow {
    pub updated_at: DateTime<Utc>,
    pub rankings: Json<Vec<LeaderboardEntry>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardResponse {
    pub period: LeaderboardPeriod,
    pub updated_at: DateTime<Utc>,
    pub rankings: Vec<LeaderboardEntry>,
}

/// Represents one row of 'daily_challenges': the single bonus lesson
/// offered for one calendar date.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyChallenge {
    pub date: NaiveDate,
    pub topic_id: String,
    pub topic_name: String,
    pub lesson_id: String,
    pub title: String,
    pub description: String,
    pub xp_bonus: i64,
    pub created_at: DateTime<Utc>,
}
