// src/jobs/xp_reset.rs

use sqlx::PgPool;

use crate::config::SWEEP_BATCH_SIZE;
use crate::error::AppError;

/// Which periodic XP counter a reset sweep clears.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XpWindow {
    Daily,
    Weekly,
}

impl XpWindow {
    fn column(&self) -> &'static str {
        match self {
            XpWindow::Daily => "daily_xp",
            XpWindow::Weekly => "weekly_xp",
        }
    }
}

/// Zeroes one periodic XP counter across the population. Only users with a
/// non-zero counter qualify, which is what makes a re-run (or a resumed
/// partial run) a no-op for everyone already reset. Writes go out in
/// chunks of at most `SWEEP_BATCH_SIZE` users, each its own atomic
/// statement.
pub async fn reset_xp(pool: &PgPool, window: XpWindow) -> Result<usize, AppError> {
    let column = window.column();

    let uids: Vec<String> =
        sqlx::query_scalar(&format!("SELECT uid FROM users WHERE {column} > 0 ORDER BY uid"))
            .fetch_all(pool)
            .await?;

    if uids.is_empty() {
        tracing::info!(column, "no xp counters to reset");
        return Ok(0);
    }

    let mut affected = 0usize;
    for chunk in uids.chunks(SWEEP_BATCH_SIZE) {
        let res = sqlx::query(&format!("UPDATE users SET {column} = 0 WHERE uid = ANY($1)"))
            .bind(chunk.to_vec())
            .execute(pool)
            .await?;
        affected += res.rows_affected() as usize;
    }

    tracing::info!(column, affected, "xp reset complete");
    Ok(affected)
}
