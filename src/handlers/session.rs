// src/handlers/session.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    content,
    engine::{Advance, LessonSession, SessionEvent},
    error::AppError,
    ledger,
    models::{
        achievement::AchievementDef,
        lesson::LessonResult,
        question::{PublicQuestion, SubmittedAnswer},
    },
    state::{AppState, CompletedLesson, SessionEntry},
    utils::jwt::Claims,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionRequest {
    pub topic_id: String,
    pub lesson_id: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionResponse {
    pub lesson_id: String,
    pub topic_id: String,
    pub title: String,
    pub total_questions: usize,
    pub question_index: usize,
    pub question: PublicQuestion,
}

#[derive(Debug, Deserialize)]
pub struct AnswerRequest {
    pub answer: SubmittedAnswer,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerResponse {
    pub correct: bool,
    pub explanation: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fun_fact: Option<String>,
    /// Per-blank verdicts, story-completion only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub blank_results: Option<Vec<bool>>,
    /// Optimistic XP delta for the UI; the authoritative award lands when
    /// the finished lesson is applied to the ledger.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xp_awarded: Option<i64>,
    /// Present when a heart was deducted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hearts_remaining: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvanceResponse {
    pub lesson_complete: bool,
    pub question_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<PublicQuestion>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStateResponse {
    pub lesson_id: String,
    pub topic_id: String,
    pub question_index: usize,
    pub total_questions: usize,
    pub correct_count: i64,
    pub answered: Vec<bool>,
    pub is_correct: Option<bool>,
    pub show_explanation: bool,
    pub lesson_complete: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FinishResponse {
    pub result: LessonResult,
    pub new_level: i64,
    pub level_up: bool,
    pub unlocked_achievements: Vec<&'static AchievementDef>,
}

impl From<&CompletedLesson> for FinishResponse {
    fn from(done: &CompletedLesson) -> Self {
        FinishResponse {
            result: done.result.clone(),
            new_level: done.outcome.new_level,
            level_up: done.outcome.level_up,
            unlocked_achievements: done.outcome.unlocked.clone(),
        }
    }
}

/// Opens a lesson attempt, replacing any previous session for this user
/// (abandoning a lesson never writes to the ledger).
pub async fn start_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<StartSessionRequest>,
) -> Result<impl IntoResponse, AppError> {
    let lesson = content::fetch_lesson(&state.pool, &req.topic_id, &req.lesson_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Lesson not found".to_string()))?;

    if lesson.questions.is_empty() {
        return Err(AppError::InternalServerError(
            "Lesson has no questions".to_string(),
        ));
    }

    let session = LessonSession::start(lesson, Utc::now());
    let response = StartSessionResponse {
        lesson_id: session.lesson().id.clone(),
        topic_id: session.lesson().topic_id.clone(),
        title: session.lesson().title.clone(),
        total_questions: session.total_questions(),
        question_index: 0,
        // start() never produces a complete session, so the first question
        // is always present.
        question: session
            .current_question()
            .map(|q| q.public())
            .ok_or_else(|| AppError::InternalServerError("Lesson has no questions".to_string()))?,
    };

    state.sessions.write().await.insert(
        claims.sub.clone(),
        SessionEntry {
            session,
            completed: None,
        },
    );

    Ok(Json(response))
}

/// Submits an answer for the current question. A wrong answer deducts a
/// heart through the ledger; a right one reports the optimistic XP delta.
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<AnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    let outcome = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions
            .get_mut(&claims.sub)
            .ok_or_else(|| AppError::NotFound("No active lesson session".to_string()))?;
        entry.session.submit_answer(req.answer)?
    };

    let mut xp_awarded = None;
    let mut hearts_remaining = None;
    for event in &outcome.events {
        match event {
            SessionEvent::XpAwarded(amount) => xp_awarded = Some(*amount),
            SessionEvent::HeartLost => {
                hearts_remaining =
                    Some(ledger::deduct_heart(&state.pool, &claims.sub, Utc::now()).await?);
            }
        }
    }

    Ok(Json(AnswerResponse {
        correct: outcome.correct,
        explanation: outcome.explanation,
        fun_fact: outcome.fun_fact,
        blank_results: outcome.blank_results,
        xp_awarded,
        hearts_remaining,
    }))
}

/// Moves past an answered question; on the last question this completes the
/// lesson and the client should call finish.
pub async fn advance(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let mut sessions = state.sessions.write().await;
    let entry = sessions
        .get_mut(&claims.sub)
        .ok_or_else(|| AppError::NotFound("No active lesson session".to_string()))?;

    let response = match entry.session.advance()? {
        Advance::Complete => AdvanceResponse {
            lesson_complete: true,
            question_index: entry.session.current_index(),
            question: None,
        },
        Advance::Next { index } => AdvanceResponse {
            lesson_complete: false,
            question_index: index,
            question: entry.session.current_question().map(|q| q.public()),
        },
    };

    Ok(Json(response))
}

/// Read model of the live session for re-rendering clients.
pub async fn session_state(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let sessions = state.sessions.read().await;
    let entry = sessions
        .get(&claims.sub)
        .ok_or_else(|| AppError::NotFound("No active lesson session".to_string()))?;

    let s = &entry.session;
    Ok(Json(SessionStateResponse {
        lesson_id: s.lesson().id.clone(),
        topic_id: s.lesson().topic_id.clone(),
        question_index: s.current_index(),
        total_questions: s.total_questions(),
        correct_count: s.correct_count(),
        answered: s.answered(),
        is_correct: s.is_correct(),
        show_explanation: s.show_explanation(),
        lesson_complete: s.is_complete(),
    }))
}

/// Applies the completed lesson to the ledger exactly once and returns the
/// result. A duplicate call returns the recorded response; a failed ledger
/// write releases the guard so the client can retry.
pub async fn finish_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let now = Utc::now();

    let result = {
        let mut sessions = state.sessions.write().await;
        let entry = sessions
            .get_mut(&claims.sub)
            .ok_or_else(|| AppError::NotFound("No active lesson session".to_string()))?;

        if let Some(done) = &entry.completed {
            return Ok(Json(FinishResponse::from(done)));
        }

        let result = entry.session.result(now)?;
        if !entry.session.begin_submit() {
            return Err(AppError::Conflict(
                "Lesson result submission already in progress".to_string(),
            ));
        }
        result
    };

    let outcome =
        match ledger::apply_lesson_result(&state.pool, &claims.sub, &result, now.date_naive())
            .await
        {
            Ok(outcome) => outcome,
            Err(e) => {
                let mut sessions = state.sessions.write().await;
                if let Some(entry) = sessions.get_mut(&claims.sub) {
                    entry.session.abort_submit();
                }
                return Err(e);
            }
        };

    let completed = CompletedLesson { result, outcome };
    let response = FinishResponse::from(&completed);

    let mut sessions = state.sessions.write().await;
    if let Some(entry) = sessions.get_mut(&claims.sub) {
        entry.completed = Some(completed);
    }

    Ok(Json(response))
}

/// Discards the active session without any ledger write.
pub async fn abandon_session(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<impl IntoResponse, AppError> {
    let removed = state.sessions.write().await.remove(&claims.sub).is_some();
    Ok(Json(serde_json::json!({ "removed": removed })))
}
