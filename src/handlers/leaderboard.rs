// src/handlers/leaderboard.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    error::AppError,
    ledger,
    models::leaderboard::{DailyChallenge, LeaderboardPeriod, LeaderboardResponse, SnapshotRow},
    utils::{dates, jwt::Claims},
};

/// The most recent snapshot for a period. Snapshots are materialized by the
/// scheduled job; this read never ranks users on the fly.
pub async fn get_leaderboard(
    State(pool): State<PgPool>,
    Path(period): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let period = LeaderboardPeriod::parse(&period)
        .ok_or_else(|| AppError::BadRequest("Unknown leaderboard period".to_string()))?;

    let row = sqlx::query_as::<_, SnapshotRow>(
        "SELECT updated_at, rankings FROM leaderboard_snapshots WHERE period = $1",
    )
    .bind(period.as_str())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Leaderboard not computed yet".to_string()))?;

    Ok(Json(LeaderboardResponse {
        period,
        updated_at: row.updated_at,
        rankings: row.rankings.0,
    }))
}

/// Today's challenge, if the generation job has produced one.
pub async fn get_daily_challenge(
    State(pool): State<PgPool>,
) -> Result<impl IntoResponse, AppError> {
    let challenge = sqlx::query_as::<_, DailyChallenge>(
        r#"
        SELECT date, topic_id, topic_name, lesson_id, title, description,
               xp_bonus, created_at
        FROM daily_challenges
        WHERE date = $1
        "#,
    )
    .bind(dates::today_utc())
    .fetch_optional(&pool)
    .await?
    .ok_or_else(|| AppError::NotFound("No daily challenge available".to_string()))?;

    Ok(Json(challenge))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CompleteChallengeRequest {
    pub lesson_id: String,

    #[validate(range(min = 0, max = 10_000))]
    pub xp_earned: i64,
}

/// Records the user's completion of today's challenge and awards the bonus
/// XP exactly once; a repeat call reports `completed: false`.
pub async fn complete_daily_challenge(
    State(pool): State<PgPool>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CompleteChallengeRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let today = dates::today_utc();

    let challenge_lesson: Option<String> =
        sqlx::query_scalar("SELECT lesson_id FROM daily_challenges WHERE date = $1")
            .bind(today)
            .fetch_optional(&pool)
            .await?;
    let challenge_lesson = challenge_lesson
        .ok_or_else(|| AppError::NotFound("No daily challenge available".to_string()))?;

    if challenge_lesson != req.lesson_id {
        return Err(AppError::BadRequest(
            "Lesson is not today's challenge".to_string(),
        ));
    }

    let completed =
        ledger::complete_daily_challenge(&pool, &claims.sub, today, &req.lesson_id, req.xp_earned)
            .await?;

    Ok(Json(serde_json::json!({
        "completed": completed,
        "xpBonus": crate::config::DAILY_CHALLENGE_BONUS,
    })))
}
