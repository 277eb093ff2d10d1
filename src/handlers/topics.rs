// src/handlers/topics.rs

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};
use serde::Deserialize;
use sqlx::PgPool;
use validator::Validate;

use crate::{
    content::{self, LessonSpec},
    error::AppError,
    models::lesson::{AgeCategory, Difficulty, Lesson, LessonSummary},
    state::AppState,
};

/// Topic catalog, in display order. Clients gate entry by comparing the
/// user's XP against `requiredXpToUnlock`.
pub async fn list_topics(State(pool): State<PgPool>) -> Result<impl IntoResponse, AppError> {
    let topics = content::list_topics(&pool).await?;
    Ok(Json(topics))
}

/// Lesson sequence of a topic, metadata only.
pub async fn list_lessons(
    State(pool): State<PgPool>,
    Path(topic_id): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let lessons = content::list_lessons(&pool, &topic_id).await?;
    let summaries: Vec<LessonSummary> = lessons.iter().map(Lesson::summary).collect();
    Ok(Json(summaries))
}

/// One playable lesson with answers stripped.
pub async fn get_lesson(
    State(pool): State<PgPool>,
    Path((topic_id, lesson_id)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = content::fetch_lesson(&pool, &topic_id, &lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;
    Ok(Json(lesson.public()))
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct GenerateLessonRequest {
    #[validate(length(min = 1, max = 100))]
    pub subcategory: String,

    /// 'beginner', 'intermediate' or 'advanced'.
    pub difficulty: Difficulty,

    /// 'child', 'teen' or 'adult'.
    pub age_group: AgeCategory,

    #[validate(range(min = 1, max = 100, message = "lessonOrder out of range"))]
    pub lesson_order: i64,
}

/// Requests lesson generation for a sequence slot. Idempotent by
/// (topic, lessonOrder): an existing lesson returns its id without another
/// provider call.
pub async fn generate_lesson(
    State(state): State<AppState>,
    Path(topic_id): Path<String>,
    Json(req): Json<GenerateLessonRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let topic = content::fetch_topic(&state.pool, &topic_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Topic not found".to_string()))?;

    let spec = LessonSpec {
        topic_id: topic.id,
        topic_name: topic.name,
        subcategory: req.subcategory,
        difficulty: req.difficulty,
        age_group: req.age_group,
        lesson_order: req.lesson_order,
    };

    let lesson_id = content::generate_lesson(&state.pool, state.provider.as_deref(), &spec).await?;

    Ok(Json(serde_json::json!({ "lessonId": lesson_id })))
}
