// src/content/provider.rs

use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

use crate::models::lesson::{AgeCategory, Difficulty};
use crate::models::question::Question;

/// What the engine asks the external generator for.
#[derive(Debug, Clone)]
pub struct LessonSpec {
    pub topic_id: String,
    pub topic_name: String,
    pub subcategory: String,
    pub difficulty: Difficulty,
    pub age_group: AgeCategory,
    /// Slot in the topic sequence; -1 marks a daily challenge.
    pub lesson_order: i64,
}

/// Raw lesson content returned by the provider, before validation and
/// before reward/metadata computation.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedLesson {
    pub title: String,
    pub description: String,
    pub questions: Vec<Question>,
    pub fun_facts: Vec<String>,
}

#[derive(Debug)]
pub enum ContentError {
    /// Provider not configured, unreachable, or returned a failure status.
    Unavailable(String),
    /// Provider responded but the payload failed schema validation.
    Invalid(String),
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Unavailable(msg) => write!(f, "Content provider unavailable: {msg}"),
            ContentError::Invalid(msg) => write!(f, "Generated lesson rejected: {msg}"),
        }
    }
}

impl std::error::Error for ContentError {}

/// External AI lesson generator. The engine never fabricates content: a
/// provider failure surfaces as "no lesson available", never as a partial
/// lesson.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    async fn generate(&self, spec: &LessonSpec) -> Result<GeneratedLesson, ContentError>;
}

/// HTTP-backed provider calling the hosted generation service.
pub struct HttpContentProvider {
    client: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl HttpContentProvider {
    pub fn new(endpoint: String, token: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint,
            token,
        }
    }
}

#[async_trait]
impl ContentProvider for HttpContentProvider {
    async fn generate(&self, spec: &LessonSpec) -> Result<GeneratedLesson, ContentError> {
        let body = serde_json::json!({
            "topicId": spec.topic_id,
            "topic": spec.topic_name,
            "subcategory": spec.subcategory,
            "difficulty": spec.difficulty,
            "ageGroup": spec.age_group,
            "lessonNumber": spec.lesson_order,
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ContentError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ContentError::Unavailable(format!(
                "provider returned {}",
                response.status()
            )));
        }

        response
            .json::<GeneratedLesson>()
            .await
            .map_err(|e| ContentError::Invalid(e.to_string()))
    }
}
