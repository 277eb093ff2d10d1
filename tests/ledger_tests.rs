// tests/ledger_tests.rs
//
// Exercises the progression ledger directly against Postgres. Skipped when
// DATABASE_URL is not set.

use chrono::{Duration, Utc};
use historia_backend::ledger::{self, achievements};
use historia_backend::models::lesson::LessonResult;
use historia_backend::models::user::{CreateProfileRequest, Preferences};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping integration test");
        return None;
    };

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&database_url)
        .await
        .expect("Failed to connect to Postgres for testing.");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    Some(pool)
}

fn unique_uid() -> String {
    format!("u_{}", &uuid::Uuid::new_v4().to_string()[..8])
}

async fn seed_user(pool: &PgPool) -> String {
    let uid = unique_uid();
    let req = CreateProfileRequest {
        display_name: "Ledger Test".to_string(),
        email: "ledger@example.com".to_string(),
        age_group: "18-25".to_string(),
        skill_level: "beginner".to_string(),
        preferences: Preferences {
            selected_topics: vec!["ancient-egypt".to_string()],
            interests: vec![],
        },
    };
    ledger::create_profile(pool, &uid, &req).await.unwrap();
    uid
}

fn lesson_result(correct: i64, total: i64, xp: i64) -> LessonResult {
    LessonResult {
        lesson_id: "lesson-test".to_string(),
        topic_id: "ancient-egypt".to_string(),
        score: ((correct as f64 / total as f64) * 100.0).round() as i64,
        total_questions: total,
        correct_answers: correct,
        xp_earned: xp,
        perfect_lesson: correct == total,
        time_spent_seconds: 120,
    }
}

#[tokio::test]
async fn hearts_floor_at_zero_and_arm_the_timer_once() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;

    let now = Utc::now();
    for expected in (0..5).rev() {
        let remaining = ledger::deduct_heart(&pool, &uid, now).await.unwrap();
        assert_eq!(remaining, expected);
    }

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.hearts_remaining, 0);
    let armed_at = profile.hearts_regen_at.expect("regen timer should be set");

    // Deducting at zero neither goes negative nor re-arms the timer.
    let later = now + Duration::minutes(5);
    let remaining = ledger::deduct_heart(&pool, &uid, later).await.unwrap();
    assert_eq!(remaining, 0);
    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.hearts_regen_at, Some(armed_at));
}

#[tokio::test]
async fn heart_regen_restores_after_elapse_and_is_idempotent() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;

    // Depleted, with a timer already in the past.
    sqlx::query(
        "UPDATE users SET hearts_remaining = 0, hearts_regen_at = now() - interval '1 minute' WHERE uid = $1",
    )
    .bind(&uid)
    .execute(&pool)
    .await
    .unwrap();

    assert_eq!(ledger::check_heart_regen(&pool, &uid).await.unwrap(), 5);
    assert_eq!(ledger::check_heart_regen(&pool, &uid).await.unwrap(), 5);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.hearts_remaining, 5);
    assert!(profile.hearts_regen_at.is_none());
}

#[tokio::test]
async fn heart_regen_waits_for_the_timer() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;

    sqlx::query(
        "UPDATE users SET hearts_remaining = 0, hearts_regen_at = now() + interval '10 minutes' WHERE uid = $1",
    )
    .bind(&uid)
    .execute(&pool)
    .await
    .unwrap();

    assert_eq!(ledger::check_heart_regen(&pool, &uid).await.unwrap(), 0);
}

#[tokio::test]
async fn streak_continues_from_yesterday() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    sqlx::query(
        "UPDATE users SET current_streak = 3, longest_streak = 3, last_active_date = $2 WHERE uid = $1",
    )
    .bind(&uid)
    .bind(today - Duration::days(1))
    .execute(&pool)
    .await
    .unwrap();

    let status = ledger::check_and_update_streak(&pool, &uid, today).await.unwrap();
    assert_eq!(status.current_streak, 4);
    assert!(status.is_new_day);
    assert!(!status.streak_broken);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.longest_streak, 4);
}

#[tokio::test]
async fn streak_gap_consumes_a_freeze_before_breaking() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    sqlx::query(
        "UPDATE users SET current_streak = 7, longest_streak = 7, streak_freezes = 1, last_active_date = $2 WHERE uid = $1",
    )
    .bind(&uid)
    .bind(today - Duration::days(3))
    .execute(&pool)
    .await
    .unwrap();

    let status = ledger::check_and_update_streak(&pool, &uid, today).await.unwrap();
    assert_eq!(status.current_streak, 7);
    assert!(status.used_freeze);
    assert!(!status.streak_broken);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.streak_freezes, 0);
    assert_eq!(profile.last_active_date, Some(today));
}

#[tokio::test]
async fn streak_gap_without_freeze_resets_to_one() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    sqlx::query(
        "UPDATE users SET current_streak = 7, longest_streak = 9, last_active_date = $2 WHERE uid = $1",
    )
    .bind(&uid)
    .bind(today - Duration::days(3))
    .execute(&pool)
    .await
    .unwrap();

    let status = ledger::check_and_update_streak(&pool, &uid, today).await.unwrap();
    assert_eq!(status.current_streak, 1);
    assert!(status.streak_broken);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.current_streak, 1);
    assert_eq!(profile.longest_streak, 9);
}

#[tokio::test]
async fn freeze_purchase_spends_xp_atomically() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;

    sqlx::query("UPDATE users SET xp = 250 WHERE uid = $1")
        .bind(&uid)
        .execute(&pool)
        .await
        .unwrap();

    assert!(ledger::purchase_streak_freeze(&pool, &uid).await.unwrap());
    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.xp, 50);
    assert_eq!(profile.streak_freezes, 1);

    // 50 XP left is not enough for a second freeze.
    assert!(!ledger::purchase_streak_freeze(&pool, &uid).await.unwrap());
    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.xp, 50);
    assert_eq!(profile.streak_freezes, 1);
}

#[tokio::test]
async fn lesson_result_updates_counters_and_topic_progress() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    let outcome = ledger::apply_lesson_result(&pool, &uid, &lesson_result(6, 8, 60), today)
        .await
        .unwrap();
    assert_eq!(outcome.xp_earned, 60);
    assert_eq!(outcome.new_level, 0);
    assert!(!outcome.level_up);
    // First completed lesson unlocks the first-steps achievement (+25 XP).
    assert!(outcome.unlocked.iter().any(|a| a.id == "first_steps"));

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.xp, 85);
    assert_eq!(profile.lessons_completed, 1);
    assert_eq!(profile.perfect_lessons, 0);
    assert_eq!(profile.last_active_date, Some(today));

    let progress = ledger::fetch_topic_progress(&pool, &uid).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert_eq!(progress[0].topic_id, "ancient-egypt");
    assert_eq!(progress[0].completed_lessons, 1);
    assert_eq!(progress[0].best_score, 75);

    // A later, better run raises bestScore; a worse one would not.
    ledger::apply_lesson_result(&pool, &uid, &lesson_result(8, 8, 130), today)
        .await
        .unwrap();
    let progress = ledger::fetch_topic_progress(&pool, &uid).await.unwrap();
    assert_eq!(progress[0].completed_lessons, 2);
    assert_eq!(progress[0].best_score, 100);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.perfect_lessons, 1);
}

#[tokio::test]
async fn level_up_fires_when_the_curve_is_crossed() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    let outcome = ledger::apply_lesson_result(&pool, &uid, &lesson_result(8, 8, 130), today)
        .await
        .unwrap();

    // 130 lesson XP plus achievement rewards stays above the level-1
    // threshold of 100.
    assert!(outcome.level_up);
    assert_eq!(outcome.new_level, 1);

    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.level, 1);
}

#[tokio::test]
async fn achievements_are_granted_exactly_once() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    ledger::apply_lesson_result(&pool, &uid, &lesson_result(6, 8, 60), today)
        .await
        .unwrap();

    let granted = achievements::list_user_achievements(&pool, &uid).await.unwrap();
    let first_steps: Vec<_> = granted
        .iter()
        .filter(|a| a.achievement_id == "first_steps")
        .collect();
    assert_eq!(first_steps.len(), 1);
    let xp_after_first = ledger::fetch_profile(&pool, &uid).await.unwrap().xp;

    // Re-evaluating with unchanged stats grants nothing and awards no XP.
    let newly = achievements::check_achievements(&pool, &uid).await.unwrap();
    assert!(newly.is_empty());
    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.xp, xp_after_first);
}

#[tokio::test]
async fn daily_challenge_completion_bonus_is_exactly_once() {
    let Some(pool) = test_pool().await else { return };
    let uid = seed_user(&pool).await;
    let today = Utc::now().date_naive();

    let first = ledger::complete_daily_challenge(&pool, &uid, today, "lesson-dc", 160)
        .await
        .unwrap();
    assert!(first);
    let xp_after = ledger::fetch_profile(&pool, &uid).await.unwrap().xp;
    assert_eq!(xp_after, 50);

    let second = ledger::complete_daily_challenge(&pool, &uid, today, "lesson-dc", 160)
        .await
        .unwrap();
    assert!(!second);
    let profile = ledger::fetch_profile(&pool, &uid).await.unwrap();
    assert_eq!(profile.xp, 50);
}
