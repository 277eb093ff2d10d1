// src/content/mod.rs

//! Lesson catalog access and the generation service around the external
//! content provider.

pub mod provider;
pub mod validate;

pub use provider::{ContentError, ContentProvider, GeneratedLesson, HttpContentProvider, LessonSpec};

use sqlx::{PgPool, types::Json};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::lesson::{Lesson, LessonRow};
use crate::models::topic::Topic;

pub async fn list_topics(pool: &PgPool) -> Result<Vec<Topic>, AppError> {
    let topics = sqlx::query_as::<_, Topic>(
        r#"
        SELECT id, name, description, icon, color, sort_order,
               required_xp_to_unlock, subcategories
        FROM topics
        ORDER BY sort_order ASC
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(topics)
}

pub async fn fetch_topic(pool: &PgPool, topic_id: &str) -> Result<Option<Topic>, AppError> {
    let topic = sqlx::query_as::<_, Topic>(
        r#"
        SELECT id, name, description, icon, color, sort_order,
               required_xp_to_unlock, subcategories
        FROM topics
        WHERE id = $1
        "#,
    )
    .bind(topic_id)
    .fetch_optional(pool)
    .await?;
    Ok(topic)
}

/// Lessons of a topic in sequence order. Daily-challenge lessons
/// (sort_order = -1) are not part of the normal sequence.
pub async fn list_lessons(pool: &PgPool, topic_id: &str) -> Result<Vec<Lesson>, AppError> {
    let rows = sqlx::query_as::<_, LessonRow>(
        r#"
        SELECT id, topic_id, title, description, difficulty, age_group,
               sort_order, xp_reward, estimated_minutes, questions, fun_facts, reviewed
        FROM lessons
        WHERE topic_id = $1 AND sort_order >= 0
        ORDER BY sort_order ASC
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await?;
    Ok(rows.into_iter().map(Lesson::from).collect())
}

pub async fn fetch_lesson(
    pool: &PgPool,
    topic_id: &str,
    lesson_id: &str,
) -> Result<Option<Lesson>, AppError> {
    let row = sqlx::query_as::<_, LessonRow>(
        r#"
        SELECT id, topic_id, title, description, difficulty, age_group,
               sort_order, xp_reward, estimated_minutes, questions, fun_facts, reviewed
        FROM lessons
        WHERE topic_id = $1 AND id = $2
        "#,
    )
    .bind(topic_id)
    .bind(lesson_id)
    .fetch_optional(pool)
    .await?;
    Ok(row.map(Lesson::from))
}

/// Persists a validated generated lesson, deriving the XP reward from the
/// question count and difficulty tier and the time estimate from the
/// question count. Returns the new lesson id.
pub async fn store_lesson(
    pool: &PgPool,
    spec: &LessonSpec,
    generated: &GeneratedLesson,
) -> Result<String, AppError> {
    let id = Uuid::new_v4().to_string();
    let question_count = generated.questions.len() as f64;
    let xp_reward = (question_count * 10.0 * spec.difficulty.multiplier()).round() as i64;
    let estimated_minutes = (question_count * 0.5).ceil() as i64;

    let res = sqlx::query(
        r#"
        INSERT INTO lessons (id, topic_id, title, description, difficulty, age_group,
                             sort_order, xp_reward, estimated_minutes, questions, fun_facts)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&id)
    .bind(&spec.topic_id)
    .bind(&generated.title)
    .bind(&generated.description)
    .bind(spec.difficulty.as_str())
    .bind(spec.age_group.as_str())
    .bind(spec.lesson_order)
    .bind(xp_reward)
    .bind(estimated_minutes)
    .bind(Json(&generated.questions))
    .bind(Json(&generated.fun_facts))
    .execute(pool)
    .await;

    match res {
        Ok(_) => Ok(id),
        // A concurrent generation won the slot; hand back its lesson.
        Err(e) if e.to_string().contains("idx_lessons_topic_slot") => {
            let existing: Option<String> =
                sqlx::query_scalar("SELECT id FROM lessons WHERE topic_id = $1 AND sort_order = $2")
                    .bind(&spec.topic_id)
                    .bind(spec.lesson_order)
                    .fetch_optional(pool)
                    .await?;
            existing.ok_or_else(|| AppError::InternalServerError(e.to_string()))
        }
        Err(e) => Err(e.into()),
    }
}

/// Generates (or reuses) the lesson for a sequence slot. Idempotent by
/// (topic, order): an existing lesson short-circuits without touching the
/// provider. Provider failures propagate; nothing is persisted on failure.
pub async fn generate_lesson(
    pool: &PgPool,
    provider: Option<&dyn ContentProvider>,
    spec: &LessonSpec,
) -> Result<String, AppError> {
    if spec.lesson_order >= 0 {
        let existing: Option<String> =
            sqlx::query_scalar("SELECT id FROM lessons WHERE topic_id = $1 AND sort_order = $2")
                .bind(&spec.topic_id)
                .bind(spec.lesson_order)
                .fetch_optional(pool)
                .await?;
        if let Some(id) = existing {
            tracing::debug!(topic = %spec.topic_id, order = spec.lesson_order, lesson = %id,
                "lesson already generated for slot");
            return Ok(id);
        }
    }

    let provider = provider
        .ok_or_else(|| AppError::Upstream("No content provider configured".to_string()))?;

    let generated = provider.generate(spec).await?;
    validate::validate_generated(&generated)?;

    let id = store_lesson(pool, spec, &generated).await?;
    tracing::info!(topic = %spec.topic_id, order = spec.lesson_order, lesson = %id,
        title = %generated.title, "lesson generated");
    Ok(id)
}
