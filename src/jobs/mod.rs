// src/jobs/mod.rs

//! In-process schedulers for the population-wide maintenance jobs.
//!
//! Each job runs on its own tokio task: compute the next UTC fire time,
//! sleep until it, run, log failures and go back to sleep. The jobs
//! themselves are idempotent, so a missed or doubled firing is harmless.

pub mod daily_challenge;
pub mod leaderboard;
pub mod streaks;
pub mod xp_reset;

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};
use std::sync::Arc;

use crate::content::ContentProvider;
use crate::state::AppState;
use xp_reset::XpWindow;

const LEADERBOARD_EVERY_HOURS: u32 = 4;

pub fn spawn_schedulers(state: &AppState) {
    tokio::spawn(streak_sweep_loop(state.pool.clone()));
    tokio::spawn(daily_xp_loop(state.pool.clone()));
    tokio::spawn(weekly_xp_loop(state.pool.clone()));
    tokio::spawn(leaderboard_loop(state.pool.clone()));
    tokio::spawn(daily_challenge_loop(
        state.pool.clone(),
        state.provider.clone(),
    ));
    tracing::info!("maintenance job schedulers started");
}

/// Streak sweep runs shortly after midnight so the "yesterday" cutoff is
/// stable while it scans.
async fn streak_sweep_loop(pool: sqlx::PgPool) {
    loop {
        sleep_until(next_daily_run(Utc::now(), 0, 5)).await;
        let today = Utc::now().date_naive();
        if let Err(e) = streaks::reset_broken_streaks(&pool, today).await {
            tracing::error!(error = %e, "streak sweep failed");
        }
    }
}

async fn daily_xp_loop(pool: sqlx::PgPool) {
    loop {
        sleep_until(next_daily_run(Utc::now(), 0, 0)).await;
        if let Err(e) = xp_reset::reset_xp(&pool, XpWindow::Daily).await {
            tracing::error!(error = %e, "daily xp reset failed");
        }
    }
}

async fn weekly_xp_loop(pool: sqlx::PgPool) {
    loop {
        sleep_until(next_weekly_run(Utc::now())).await;
        if let Err(e) = xp_reset::reset_xp(&pool, XpWindow::Weekly).await {
            tracing::error!(error = %e, "weekly xp reset failed");
        }
    }
}

async fn leaderboard_loop(pool: sqlx::PgPool) {
    loop {
        sleep_until(next_interval_run(Utc::now(), LEADERBOARD_EVERY_HOURS)).await;
        if let Err(e) = leaderboard::compute_leaderboards(&pool).await {
            tracing::error!(error = %e, "leaderboard computation failed");
        }
    }
}

async fn daily_challenge_loop(pool: sqlx::PgPool, provider: Option<Arc<dyn ContentProvider>>) {
    loop {
        sleep_until(next_daily_run(Utc::now(), 0, 0)).await;
        let today = Utc::now().date_naive();
        if let Err(e) =
            daily_challenge::generate_daily_challenge(&pool, provider.as_deref(), today).await
        {
            // Re-raised so the failure is visible; the existence check makes
            // the next firing safe.
            tracing::error!(error = %e, "daily challenge generation failed");
        }
    }
}

async fn sleep_until(when: DateTime<Utc>) {
    let wait = (when - Utc::now()).to_std().unwrap_or_default();
    tokio::time::sleep(wait).await;
}

/// Next occurrence of `hour:minute` UTC strictly after `after`.
fn next_daily_run(after: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let candidate = after
        .date_naive()
        .and_hms_opt(hour, minute, 0)
        .unwrap()
        .and_utc();
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(1)
    }
}

/// Next Monday 00:00 UTC strictly after `after`.
fn next_weekly_run(after: DateTime<Utc>) -> DateTime<Utc> {
    let days_ahead = (7 - after.weekday().num_days_from_monday()) % 7;
    let candidate = (after.date_naive() + Duration::days(days_ahead as i64))
        .and_hms_opt(0, 0, 0)
        .unwrap()
        .and_utc();
    if candidate > after {
        candidate
    } else {
        candidate + Duration::days(7)
    }
}

/// Next multiple-of-`every_hours` boundary strictly after `after`.
fn next_interval_run(after: DateTime<Utc>, every_hours: u32) -> DateTime<Utc> {
    let next_block = (after.hour() / every_hours + 1) * every_hours;
    if next_block >= 24 {
        (after.date_naive() + Duration::days(1))
            .and_hms_opt(0, 0, 0)
            .unwrap()
            .and_utc()
    } else {
        after
            .date_naive()
            .and_hms_opt(next_block, 0, 0)
            .unwrap()
            .and_utc()
    }
}
