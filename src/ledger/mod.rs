// src/ledger/mod.rs

//! The progression ledger: the single authority for mutating persisted user
//! numeric state (XP, level, streak, hearts, per-topic progress).
//!
//! Every mutation is a single atomic statement or transaction and uses
//! server-side increments (`SET xp = xp + $n`), never a client-side
//! read-modify-write, so concurrent sessions on multiple devices cannot lose
//! updates. Level recomputation is the one read-then-write exception: level
//! is derived from XP, and a few milliseconds of staleness there only risks
//! a duplicated or skipped level-up notification.

pub mod achievements;
pub mod levels;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use sqlx::PgPool;

use crate::config::{
    DAILY_CHALLENGE_BONUS, HEART_REGEN_MINUTES, MAX_HEARTS, STREAK_FREEZE_COST,
};
use crate::error::AppError;
use crate::models::achievement::AchievementDef;
use crate::models::lesson::LessonResult;
use crate::models::user::{CreateProfileRequest, TopicProgress, UserProfile};
use crate::utils::dates;

/// What a completed lesson did to the ledger.
#[derive(Debug, Clone)]
pub struct LessonOutcome {
    pub xp_earned: i64,
    pub new_level: i64,
    pub level_up: bool,
    pub unlocked: Vec<&'static AchievementDef>,
}

/// Result of a daily streak check; exactly one branch fires per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreakStatus {
    pub current_streak: i64,
    pub is_new_day: bool,
    pub streak_broken: bool,
    pub used_freeze: bool,
}

pub async fn fetch_profile(pool: &PgPool, uid: &str) -> Result<UserProfile, AppError> {
    sqlx::query_as::<_, UserProfile>("SELECT * FROM users WHERE uid = $1")
        .bind(uid)
        .fetch_optional(pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

pub async fn fetch_topic_progress(
    pool: &PgPool,
    uid: &str,
) -> Result<Vec<TopicProgress>, AppError> {
    let rows = sqlx::query_as::<_, TopicProgress>(
        r#"
        SELECT topic_id, completed_lessons, unlocked_lessons, best_score,
               total_xp_earned, last_played
        FROM topic_progress
        WHERE uid = $1
        ORDER BY last_played DESC
        "#,
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Creates the profile document for a first sign-in. Returns Conflict when
/// the uid already has one.
pub async fn create_profile(
    pool: &PgPool,
    uid: &str,
    req: &CreateProfileRequest,
) -> Result<(), AppError> {
    let res = sqlx::query(
        r#"
        INSERT INTO users (uid, display_name, email, age_group, skill_level,
                           selected_topics, interests)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (uid) DO NOTHING
        "#,
    )
    .bind(uid)
    .bind(&req.display_name)
    .bind(&req.email)
    .bind(&req.age_group)
    .bind(&req.skill_level)
    .bind(sqlx::types::Json(&req.preferences.selected_topics))
    .bind(sqlx::types::Json(&req.preferences.interests))
    .execute(pool)
    .await?;

    if res.rows_affected() == 0 {
        return Err(AppError::Conflict("Profile already exists".to_string()));
    }
    Ok(())
}

/// Applies a completed lesson atomically: XP counters, lesson counters,
/// activity date and the per-topic progress upsert commit together, then the
/// derived level is refreshed and achievements are evaluated against the new
/// stats.
pub async fn apply_lesson_result(
    pool: &PgPool,
    uid: &str,
    result: &LessonResult,
    today: NaiveDate,
) -> Result<LessonOutcome, AppError> {
    let mut tx = pool.begin().await?;

    let updated = sqlx::query(
        r#"
        UPDATE users SET
            xp = xp + $2,
            daily_xp = daily_xp + $2,
            weekly_xp = weekly_xp + $2,
            lessons_completed = lessons_completed + 1,
            perfect_lessons = perfect_lessons + CASE WHEN $3 THEN 1 ELSE 0 END,
            last_active_date = $4
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(result.xp_earned)
    .bind(result.perfect_lesson)
    .bind(today)
    .execute(&mut *tx)
    .await?;

    if updated.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    sqlx::query(
        r#"
        INSERT INTO topic_progress (uid, topic_id, completed_lessons, unlocked_lessons,
                                    best_score, total_xp_earned, last_played)
        VALUES ($1, $2, 1, 1, $3, $4, now())
        ON CONFLICT (uid, topic_id) DO UPDATE SET
            completed_lessons = topic_progress.completed_lessons + 1,
            unlocked_lessons = topic_progress.unlocked_lessons + 1,
            best_score = GREATEST(topic_progress.best_score, EXCLUDED.best_score),
            total_xp_earned = topic_progress.total_xp_earned + EXCLUDED.total_xp_earned,
            last_played = now()
        "#,
    )
    .bind(uid)
    .bind(&result.topic_id)
    .bind(result.score)
    .bind(result.xp_earned)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    let (new_level, level_up) = refresh_level(pool, uid).await?;
    let unlocked = achievements::check_achievements(pool, uid).await?;

    tracing::info!(
        uid,
        lesson = %result.lesson_id,
        xp = result.xp_earned,
        score = result.score,
        perfect = result.perfect_lesson,
        level_up,
        "lesson result applied"
    );

    Ok(LessonOutcome {
        xp_earned: result.xp_earned,
        new_level,
        level_up,
        unlocked,
    })
}

/// Recomputes the derived level from the stored XP total and persists it on
/// change. Every XP mutation path funnels through this so the cached level
/// never drifts from the curve. The read-then-write is the one tolerated
/// race: worst case a level-up notification is skipped or doubled.
pub(crate) async fn refresh_level(pool: &PgPool, uid: &str) -> Result<(i64, bool), AppError> {
    let (xp, level): (i64, i64) = sqlx::query_as("SELECT xp, level FROM users WHERE uid = $1")
        .bind(uid)
        .fetch_one(pool)
        .await?;

    let new_level = levels::calculate_level(xp);
    if new_level != level {
        sqlx::query("UPDATE users SET level = $2 WHERE uid = $1")
            .bind(uid)
            .bind(new_level)
            .execute(pool)
            .await?;
    }
    Ok((new_level, new_level > level))
}

/// Removes one heart, floored at 0. The regeneration timer is armed by the
/// same statement that performs the deduction, exactly when the count
/// reaches 0; deducting at 0 keeps both the count and an armed timer as
/// they are. Returns the remaining hearts.
pub async fn deduct_heart(
    pool: &PgPool,
    uid: &str,
    now: DateTime<Utc>,
) -> Result<i64, AppError> {
    let regen_at = now + Duration::minutes(HEART_REGEN_MINUTES);

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE users SET
            hearts_remaining = hearts_remaining - 1,
            hearts_regen_at = CASE WHEN hearts_remaining = 1 THEN $2
                                   ELSE hearts_regen_at END
        WHERE uid = $1 AND hearts_remaining > 0
        RETURNING hearts_remaining
        "#,
    )
    .bind(uid)
    .bind(regen_at)
    .fetch_optional(pool)
    .await?;

    match remaining {
        Some(hearts) => Ok(hearts),
        // Already at zero; report the stored value unchanged.
        None => {
            let current: Option<i64> =
                sqlx::query_scalar("SELECT hearts_remaining FROM users WHERE uid = $1")
                    .bind(uid)
                    .fetch_optional(pool)
                    .await?;
            current.ok_or_else(|| AppError::NotFound("User not found".to_string()))
        }
    }
}

/// Restores hearts to the maximum once the regeneration instant has passed.
/// Safe to call redundantly and concurrently: the guarded UPDATE fires for
/// at most one caller, everyone else just reads the current value.
pub async fn check_heart_regen(pool: &PgPool, uid: &str) -> Result<i64, AppError> {
    let restored: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE users SET
            hearts_remaining = $2,
            hearts_regen_at = NULL
        WHERE uid = $1
          AND hearts_remaining < $2
          AND hearts_regen_at IS NOT NULL
          AND hearts_regen_at <= now()
        RETURNING hearts_remaining
        "#,
    )
    .bind(uid)
    .bind(MAX_HEARTS)
    .fetch_optional(pool)
    .await?;

    if let Some(hearts) = restored {
        return Ok(hearts);
    }

    let current: Option<i64> =
        sqlx::query_scalar("SELECT hearts_remaining FROM users WHERE uid = $1")
            .bind(uid)
            .fetch_optional(pool)
            .await?;
    current.ok_or_else(|| AppError::NotFound("User not found".to_string()))
}

/// Daily streak bookkeeping, called when the user opens the app.
///
/// lastActiveDate == today: already credited, no-op. == yesterday: streak
/// continues. Any older date (or none): a streak freeze is consumed if one
/// is available, otherwise the streak resets to 1 and the broken signal
/// fires.
pub async fn check_and_update_streak(
    pool: &PgPool,
    uid: &str,
    today: NaiveDate,
) -> Result<StreakStatus, AppError> {
    let profile = fetch_profile(pool, uid).await?;
    let yesterday = dates::yesterday(today);

    if profile.last_active_date == Some(today) {
        return Ok(StreakStatus {
            current_streak: profile.current_streak,
            is_new_day: false,
            streak_broken: false,
            used_freeze: false,
        });
    }

    if profile.last_active_date == Some(yesterday) {
        let continued: Option<i64> = sqlx::query_scalar(
            r#"
            UPDATE users SET
                current_streak = current_streak + 1,
                longest_streak = GREATEST(longest_streak, current_streak + 1),
                last_active_date = $2
            WHERE uid = $1 AND last_active_date = $3
            RETURNING current_streak
            "#,
        )
        .bind(uid)
        .bind(today)
        .bind(yesterday)
        .fetch_optional(pool)
        .await?;

        if let Some(streak) = continued {
            return Ok(StreakStatus {
                current_streak: streak,
                is_new_day: true,
                streak_broken: false,
                used_freeze: false,
            });
        }
        // Another device advanced the streak first; report stored state.
        let refreshed = fetch_profile(pool, uid).await?;
        return Ok(StreakStatus {
            current_streak: refreshed.current_streak,
            is_new_day: false,
            streak_broken: false,
            used_freeze: false,
        });
    }

    // Gap of two or more days, or first activity ever.
    if profile.streak_freezes > 0 {
        let consumed = sqlx::query(
            r#"
            UPDATE users SET
                streak_freezes = streak_freezes - 1,
                last_active_date = $2
            WHERE uid = $1 AND streak_freezes > 0
            "#,
        )
        .bind(uid)
        .bind(today)
        .execute(pool)
        .await?;

        if consumed.rows_affected() == 1 {
            tracing::info!(uid, streak = profile.current_streak, "streak preserved via freeze");
            return Ok(StreakStatus {
                current_streak: profile.current_streak,
                is_new_day: true,
                streak_broken: false,
                used_freeze: true,
            });
        }
    }

    sqlx::query(
        r#"
        UPDATE users SET
            current_streak = 1,
            last_active_date = $2
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(today)
    .execute(pool)
    .await?;

    Ok(StreakStatus {
        current_streak: 1,
        is_new_day: true,
        streak_broken: true,
        used_freeze: false,
    })
}

/// Buys one streak freeze for a fixed XP cost. Insufficient XP is a normal
/// business outcome: returns false with no mutation.
pub async fn purchase_streak_freeze(pool: &PgPool, uid: &str) -> Result<bool, AppError> {
    let res = sqlx::query(
        r#"
        UPDATE users SET
            xp = xp - $2,
            streak_freezes = streak_freezes + 1
        WHERE uid = $1 AND xp >= $2
        "#,
    )
    .bind(uid)
    .bind(STREAK_FREEZE_COST)
    .execute(pool)
    .await?;

    let purchased = res.rows_affected() == 1;
    if purchased {
        // Spending XP can drop the derived level.
        refresh_level(pool, uid).await?;
    }
    Ok(purchased)
}

/// Records the user's completion of the day's challenge and awards the
/// bonus XP in the same transaction. The per-(uid, date) primary key makes
/// the bonus exactly-once; a repeat call returns false and changes nothing.
pub async fn complete_daily_challenge(
    pool: &PgPool,
    uid: &str,
    date: NaiveDate,
    lesson_id: &str,
    xp_earned: i64,
) -> Result<bool, AppError> {
    let mut tx = pool.begin().await?;

    let inserted = sqlx::query(
        r#"
        INSERT INTO daily_challenge_completions (uid, date, lesson_id, xp_earned)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (uid, date) DO NOTHING
        "#,
    )
    .bind(uid)
    .bind(date)
    .bind(lesson_id)
    .bind(xp_earned + DAILY_CHALLENGE_BONUS)
    .execute(&mut *tx)
    .await?;

    if inserted.rows_affected() == 0 {
        tx.rollback().await?;
        return Ok(false);
    }

    sqlx::query(
        r#"
        UPDATE users SET
            xp = xp + $2,
            daily_xp = daily_xp + $2,
            weekly_xp = weekly_xp + $2
        WHERE uid = $1
        "#,
    )
    .bind(uid)
    .bind(DAILY_CHALLENGE_BONUS)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    refresh_level(pool, uid).await?;
    Ok(true)
}
