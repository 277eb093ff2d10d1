// src/jobs/daily_challenge.rs

use chrono::NaiveDate;
use rand::seq::SliceRandom;
use sqlx::{PgPool, types::Json};

use crate::config::DAILY_CHALLENGE_BONUS;
use crate::content::{self, ContentProvider, GeneratedLesson, LessonSpec};
use crate::error::AppError;
use crate::models::lesson::{AgeCategory, Difficulty};

/// Generates the day's challenge lesson at most once per calendar date.
///
/// The existence check on `daily_challenges/{date}` is the only dedup
/// mechanism, so nothing is persisted until generation has fully succeeded;
/// any provider or validation failure propagates and the next scheduled run
/// starts over. Returns false when today's challenge already exists.
pub async fn generate_daily_challenge(
    pool: &PgPool,
    provider: Option<&dyn ContentProvider>,
    today: NaiveDate,
) -> Result<bool, AppError> {
    let existing: Option<NaiveDate> =
        sqlx::query_scalar("SELECT date FROM daily_challenges WHERE date = $1")
            .bind(today)
            .fetch_optional(pool)
            .await?;
    if existing.is_some() {
        tracing::info!(%today, "daily challenge already exists");
        return Ok(false);
    }

    let provider = provider
        .ok_or_else(|| AppError::Upstream("No content provider configured".to_string()))?;

    let picked: Option<(String, String, Json<Vec<String>>)> =
        sqlx::query_as("SELECT id, name, subcategories FROM topics ORDER BY RANDOM() LIMIT 1")
            .fetch_optional(pool)
            .await?;
    let (topic_id, topic_name, subcategories) =
        picked.ok_or_else(|| AppError::InternalServerError("No topics seeded".to_string()))?;

    let subcategory = subcategories
        .0
        .choose(&mut rand::thread_rng())
        .cloned()
        .unwrap_or_else(|| topic_name.clone());

    let spec = LessonSpec {
        topic_id: topic_id.clone(),
        topic_name: topic_name.clone(),
        subcategory,
        difficulty: Difficulty::Advanced,
        age_group: AgeCategory::Adult,
        lesson_order: -1,
    };

    let generated = provider.generate(&spec).await?;
    content::validate::validate_generated(&generated)?;

    let challenge_title = generated.title.clone();
    let challenge_description = generated.description.clone();

    let stored = GeneratedLesson {
        title: format!("Daily Challenge: {}", generated.title),
        ..generated
    };
    let lesson_id = content::store_lesson(pool, &spec, &stored).await?;

    sqlx::query(
        r#"
        INSERT INTO daily_challenges (date, topic_id, topic_name, lesson_id,
                                      title, description, xp_bonus)
        VALUES ($1, $2, $3, $4, $5, $6, $7)
        ON CONFLICT (date) DO NOTHING
        "#,
    )
    .bind(today)
    .bind(&topic_id)
    .bind(&topic_name)
    .bind(&lesson_id)
    .bind(&challenge_title)
    .bind(&challenge_description)
    .bind(DAILY_CHALLENGE_BONUS)
    .execute(pool)
    .await?;

    tracing::info!(%today, topic = %topic_id, lesson = %lesson_id, title = %challenge_title,
        "daily challenge generated");
    Ok(true)
}
