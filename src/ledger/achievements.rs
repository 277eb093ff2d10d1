// src/ledger/achievements.rs

//! Static achievement catalog and the grant evaluator.
//!
//! Grants are append-only and idempotent: the persisted grant set is the
//! source of truth, and the insert carries an `ON CONFLICT DO NOTHING`
//! double-guard so a concurrent evaluation can never duplicate a grant or
//! its XP reward.

use sqlx::PgPool;
use std::collections::HashSet;

use crate::error::AppError;
use crate::models::achievement::{
    AchievementCategory, AchievementCondition, AchievementDef, StatField,
};
use crate::models::user::UserProfile;

pub const CATALOG: &[AchievementDef] = &[
    AchievementDef {
        id: "first_steps",
        name: "First Steps",
        description: "Complete your first lesson",
        icon: "👣",
        category: AchievementCategory::Learning,
        xp_reward: 25,
        condition: AchievementCondition {
            field: StatField::LessonsCompleted,
            threshold: 1,
        },
    },
    AchievementDef {
        id: "dedicated_student",
        name: "Dedicated Student",
        description: "Complete 10 lessons",
        icon: "📚",
        category: AchievementCategory::Learning,
        xp_reward: 50,
        condition: AchievementCondition {
            field: StatField::LessonsCompleted,
            threshold: 10,
        },
    },
    AchievementDef {
        id: "history_buff",
        name: "History Buff",
        description: "Complete 50 lessons",
        icon: "🏛️",
        category: AchievementCategory::Learning,
        xp_reward: 150,
        condition: AchievementCondition {
            field: StatField::LessonsCompleted,
            threshold: 50,
        },
    },
    AchievementDef {
        id: "century_scholar",
        name: "Century Scholar",
        description: "Complete 100 lessons",
        icon: "💯",
        category: AchievementCategory::Learning,
        xp_reward: 300,
        condition: AchievementCondition {
            field: StatField::LessonsCompleted,
            threshold: 100,
        },
    },
    AchievementDef {
        id: "on_a_roll",
        name: "On a Roll",
        description: "Reach a 3-day streak",
        icon: "🔥",
        category: AchievementCategory::Streak,
        xp_reward: 30,
        condition: AchievementCondition {
            field: StatField::CurrentStreak,
            threshold: 3,
        },
    },
    AchievementDef {
        id: "week_warrior",
        name: "Week Warrior",
        description: "Reach a 7-day streak",
        icon: "🗓️",
        category: AchievementCategory::Streak,
        xp_reward: 75,
        condition: AchievementCondition {
            field: StatField::CurrentStreak,
            threshold: 7,
        },
    },
    AchievementDef {
        id: "unstoppable",
        name: "Unstoppable",
        description: "Reach a 30-day streak",
        icon: "⚡",
        category: AchievementCategory::Streak,
        xp_reward: 250,
        condition: AchievementCondition {
            field: StatField::LongestStreak,
            threshold: 30,
        },
    },
    AchievementDef {
        id: "flawless",
        name: "Flawless",
        description: "Finish a lesson with a perfect score",
        icon: "🌟",
        category: AchievementCategory::Mastery,
        xp_reward: 40,
        condition: AchievementCondition {
            field: StatField::PerfectLessons,
            threshold: 1,
        },
    },
    AchievementDef {
        id: "perfectionist",
        name: "Perfectionist",
        description: "Finish 10 lessons with a perfect score",
        icon: "💎",
        category: AchievementCategory::Mastery,
        xp_reward: 120,
        condition: AchievementCondition {
            field: StatField::PerfectLessons,
            threshold: 10,
        },
    },
    AchievementDef {
        id: "scholar",
        name: "Scholar",
        description: "Reach level 6",
        icon: "🎓",
        category: AchievementCategory::Level,
        xp_reward: 60,
        condition: AchievementCondition {
            field: StatField::Level,
            threshold: 6,
        },
    },
    AchievementDef {
        id: "historian",
        name: "Historian",
        description: "Reach level 16",
        icon: "📜",
        category: AchievementCategory::Level,
        xp_reward: 200,
        condition: AchievementCondition {
            field: StatField::Level,
            threshold: 16,
        },
    },
    AchievementDef {
        id: "xp_collector",
        name: "XP Collector",
        description: "Earn 1,000 total XP",
        icon: "✨",
        category: AchievementCategory::Xp,
        xp_reward: 50,
        condition: AchievementCondition {
            field: StatField::Xp,
            threshold: 1000,
        },
    },
    AchievementDef {
        id: "xp_hoarder",
        name: "XP Hoarder",
        description: "Earn 10,000 total XP",
        icon: "🏆",
        category: AchievementCategory::Xp,
        xp_reward: 250,
        condition: AchievementCondition {
            field: StatField::Xp,
            threshold: 10_000,
        },
    },
];

/// Catalog entries the profile now qualifies for, excluding already-granted
/// ids, in catalog order.
pub fn qualifying(earned: &HashSet<String>, profile: &UserProfile) -> Vec<&'static AchievementDef> {
    CATALOG
        .iter()
        .filter(|a| !earned.contains(a.id))
        .filter(|a| a.condition.field.value(profile) >= a.condition.threshold)
        .collect()
}

/// Compares the user's refreshed stats against every not-yet-granted
/// definition, grants all qualifying achievements and their summed XP reward
/// in one transaction, and returns the newly unlocked definitions so the
/// caller can queue celebration events in order.
pub async fn check_achievements(
    pool: &PgPool,
    uid: &str,
) -> Result<Vec<&'static AchievementDef>, AppError> {
    let profile = super::fetch_profile(pool, uid).await?;

    let earned: Vec<String> =
        sqlx::query_scalar("SELECT achievement_id FROM user_achievements WHERE uid = $1")
            .bind(uid)
            .fetch_all(pool)
            .await?;
    let earned: HashSet<String> = earned.into_iter().collect();

    let candidates = qualifying(&earned, &profile);
    if candidates.is_empty() {
        return Ok(candidates);
    }

    let mut tx = pool.begin().await?;
    let mut granted = Vec::new();
    let mut total_reward = 0i64;

    for def in candidates {
        let res = sqlx::query(
            r#"
            INSERT INTO user_achievements (uid, achievement_id, xp_rewarded)
            VALUES ($1, $2, $3)
            ON CONFLICT (uid, achievement_id) DO NOTHING
            "#,
        )
        .bind(uid)
        .bind(def.id)
        .bind(def.xp_reward)
        .execute(&mut *tx)
        .await?;

        if res.rows_affected() == 1 {
            total_reward += def.xp_reward;
            granted.push(def);
        }
    }

    if total_reward > 0 {
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
        .bind(total_reward)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    if total_reward > 0 {
        super::refresh_level(pool, uid).await?;
    }

    if !granted.is_empty() {
        tracing::info!(
            uid,
            count = granted.len(),
            xp = total_reward,
            "achievements unlocked"
        );
    }

    Ok(granted)
}

pub async fn list_user_achievements(
    pool: &PgPool,
    uid: &str,
) -> Result<Vec<crate::models::achievement::UserAchievement>, AppError> {
    let rows = sqlx::query_as::<_, crate::models::achievement::UserAchievement>(
        r#"
        SELECT achievement_id, unlocked_at, xp_rewarded
        FROM user_achievements
        WHERE uid = $1
        ORDER BY unlocked_at ASC
        "#,
    )
    .bind(uid)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use sqlx::types::Json;

    fn profile(xp: i64, lessons: i64, streak: i64, perfect: i64) -> UserProfile {
        UserProfile {
            uid: "u1".to_string(),
            display_name: "Test".to_string(),
            email: "t@example.com".to_string(),
            avatar_url: String::new(),
            age_group: "18-25".to_string(),
            skill_level: "beginner".to_string(),
            selected_topics: Json(vec![]),
            interests: Json(vec![]),
            xp,
            level: crate::ledger::levels::calculate_level(xp),
            current_streak: streak,
            longest_streak: streak,
            last_active_date: None,
            streak_freezes: 0,
            hearts_remaining: 5,
            hearts_regen_at: None,
            lessons_completed: lessons,
            perfect_lessons: perfect,
            daily_xp: 0,
            weekly_xp: 0,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn catalog_ids_are_unique() {
        let mut seen = HashSet::new();
        for def in CATALOG {
            assert!(seen.insert(def.id), "duplicate id {}", def.id);
        }
    }

    #[test]
    fn fresh_user_qualifies_for_nothing() {
        let p = profile(0, 0, 0, 0);
        assert!(qualifying(&HashSet::new(), &p).is_empty());
    }

    #[test]
    fn first_lesson_unlocks_first_steps() {
        let p = profile(80, 1, 1, 0);
        let ids: Vec<&str> = qualifying(&HashSet::new(), &p)
            .iter()
            .map(|a| a.id)
            .collect();
        assert_eq!(ids, vec!["first_steps"]);
    }

    #[test]
    fn granted_ids_are_excluded() {
        let p = profile(80, 1, 1, 0);
        let earned: HashSet<String> = ["first_steps".to_string()].into_iter().collect();
        assert!(qualifying(&earned, &p).is_empty());
    }

    #[test]
    fn thresholds_can_unlock_together() {
        // 10 lessons and a 3-day streak crossed in the same evaluation.
        let p = profile(900, 10, 3, 0);
        let ids: Vec<&str> = qualifying(&HashSet::new(), &p)
            .iter()
            .map(|a| a.id)
            .collect();
        assert!(ids.contains(&"first_steps"));
        assert!(ids.contains(&"dedicated_student"));
        assert!(ids.contains(&"on_a_roll"));
    }
}
