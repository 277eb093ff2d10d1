// src/jobs/leaderboard.rs

use sqlx::{PgPool, types::Json};

use crate::config::LEADERBOARD_SIZE;
use crate::error::AppError;
use crate::models::leaderboard::{LeaderboardEntry, LeaderboardPeriod};

/// Recomputes every leaderboard snapshot: top users per period, ranked by
/// that period's XP counter. Each snapshot document is fully replaced —
/// never incrementally edited — so the operation is idempotent and safe to
/// re-run at any time.
pub async fn compute_leaderboards(pool: &PgPool) -> Result<(), AppError> {
    for period in LeaderboardPeriod::ALL {
        let field = period.xp_column();

        let rankings: Vec<LeaderboardEntry> = sqlx::query_as(&format!(
            r#"
            SELECT uid, display_name, avatar_url, {field} AS xp, level
            FROM users
            ORDER BY {field} DESC
            LIMIT $1
            "#
        ))
        .bind(LEADERBOARD_SIZE)
        .fetch_all(pool)
        .await?;

        sqlx::query(
            r#"
            INSERT INTO leaderboard_snapshots (period, updated_at, rankings)
            VALUES ($1, now(), $2)
            ON CONFLICT (period) DO UPDATE SET
                updated_at = EXCLUDED.updated_at,
                rankings = EXCLUDED.rankings
            "#,
        )
        .bind(period.as_str())
        .bind(Json(&rankings))
        .execute(pool)
        .await?;

        tracing::info!(
            period = period.as_str(),
            entries = rankings.len(),
            "leaderboard updated"
        );
    }

    Ok(())
}
