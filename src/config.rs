// src/config.rs

use dotenvy::dotenv;
use std::env;

/// XP awarded for each correct answer during a lesson.
pub const XP_PER_CORRECT_ANSWER: i64 = 10;

/// Bonus XP for finishing a lesson with every answer correct.
pub const PERFECT_LESSON_BONUS: i64 = 50;

/// Bonus XP for completing the daily challenge lesson.
pub const DAILY_CHALLENGE_BONUS: i64 = 50;

/// Streak bonus accrues per consecutive day, capped.
pub const STREAK_BONUS_PER_DAY: i64 = 5;
pub const STREAK_BONUS_CAP: i64 = 50;

/// Cost of one streak freeze, paid in XP.
pub const STREAK_FREEZE_COST: i64 = 200;

/// Hearts (lives) per user and the regeneration delay once depleted.
pub const MAX_HEARTS: i64 = 5;
pub const HEART_REGEN_MINUTES: i64 = 30;

/// Upper bound on users mutated per committed batch in population sweeps.
pub const SWEEP_BATCH_SIZE: usize = 500;

/// Entries kept per leaderboard snapshot.
pub const LEADERBOARD_SIZE: i64 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub rust_log: String,

    /// Endpoint of the external lesson-generation service. When unset,
    /// generation endpoints and the daily-challenge job report the provider
    /// as unavailable instead of fabricating content.
    pub content_provider_url: Option<String>,
    pub content_provider_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let jwt_secret = env::var("JWT_SECRET").expect("JWT_SECRET must be set");

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        let content_provider_url = env::var("CONTENT_PROVIDER_URL").ok();
        let content_provider_token = env::var("CONTENT_PROVIDER_TOKEN").ok();

        Self {
            database_url,
            jwt_secret,
            rust_log,
            content_provider_url,
            content_provider_token,
        }
    }
}
