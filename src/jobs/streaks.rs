// src/jobs/streaks.rs

use chrono::NaiveDate;
use sqlx::PgPool;

use crate::config::SWEEP_BATCH_SIZE;
use crate::error::AppError;
use crate::utils::dates;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreakSweepStats {
    pub frozen: usize,
    pub reset: usize,
}

/// Daily sweep over users who let their streak lapse: anyone with an active
/// streak whose last activity predates yesterday either spends a streak
/// freeze or loses the streak.
///
/// The qualifying set is selected up front and mutated in chunks of at most
/// `SWEEP_BATCH_SIZE`, one transaction per chunk, so an interrupted run
/// leaves committed chunks durably applied and a re-run only picks up
/// still-qualifying users.
pub async fn reset_broken_streaks(
    pool: &PgPool,
    today: NaiveDate,
) -> Result<StreakSweepStats, AppError> {
    let yesterday = dates::yesterday(today);

    let lapsed: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT uid, streak_freezes
        FROM users
        WHERE current_streak > 0
          AND last_active_date IS NOT NULL
          AND last_active_date < $1
        ORDER BY uid
        "#,
    )
    .bind(yesterday)
    .fetch_all(pool)
    .await?;

    if lapsed.is_empty() {
        tracing::info!("no broken streaks to process");
        return Ok(StreakSweepStats::default());
    }

    let mut stats = StreakSweepStats::default();

    for chunk in lapsed.chunks(SWEEP_BATCH_SIZE) {
        let with_freeze: Vec<String> = chunk
            .iter()
            .filter(|(_, freezes)| *freezes > 0)
            .map(|(uid, _)| uid.clone())
            .collect();
        let without_freeze: Vec<String> = chunk
            .iter()
            .filter(|(_, freezes)| *freezes <= 0)
            .map(|(uid, _)| uid.clone())
            .collect();

        let mut tx = pool.begin().await?;

        if !with_freeze.is_empty() {
            let res = sqlx::query(
                r#"
                UPDATE users SET streak_freezes = streak_freezes - 1
                WHERE uid = ANY($1) AND streak_freezes > 0
                "#,
            )
            .bind(&with_freeze)
            .execute(&mut *tx)
            .await?;
            stats.frozen += res.rows_affected() as usize;
        }

        if !without_freeze.is_empty() {
            let res = sqlx::query(
                r#"
                UPDATE users SET current_streak = 0
                WHERE uid = ANY($1) AND streak_freezes = 0 AND current_streak > 0
                "#,
            )
            .bind(&without_freeze)
            .execute(&mut *tx)
            .await?;
            stats.reset += res.rows_affected() as usize;
        }

        tx.commit().await?;
    }

    tracing::info!(
        frozen = stats.frozen,
        reset = stats.reset,
        total = lapsed.len(),
        "streak sweep complete"
    );

    Ok(stats)
}
